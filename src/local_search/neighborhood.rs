//! Neighborhood enumeration: full scan, random sampling and shaking.

use rand::Rng;

use crate::evaluation::{Evaluator, EPSILON};
use crate::models::Solution;

use super::moves::{
    relocate_delta, relocate_intra_delta, swap_delta, tail_exchange_delta, tail_exchange_loads,
    two_opt_delta, Move, MoveDelta,
};
use super::tabu::TabuList;

/// Attempts per random move draw before giving up.
const RANDOM_ATTEMPTS: usize = 16;

/// A move together with its per-route delta.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub mv: Move,
    pub delta: MoveDelta,
}

/// Everything the admissibility test needs for one iteration.
pub(crate) struct Scan<'s, 'p> {
    evaluator: Evaluator<'p>,
    solution: &'s Solution,
    tabu: &'s TabuList,
    iteration: u64,
    best_cost: f64,
    chosen: Option<Candidate>,
}

impl<'s, 'p> Scan<'s, 'p> {
    pub(crate) fn new(
        evaluator: Evaluator<'p>,
        solution: &'s Solution,
        tabu: &'s TabuList,
        iteration: u64,
        best_cost: f64,
    ) -> Self {
        Self {
            evaluator,
            solution,
            tabu,
            iteration,
            best_cost,
            chosen: None,
        }
    }

    /// Keeps `mv` if it beats the current choice and is admissible.
    ///
    /// Capacity must already have been checked by the caller. Ties keep the
    /// earlier candidate.
    fn offer(&mut self, mv: Move, delta: MoveDelta) {
        let total = delta.total();
        if self
            .chosen
            .as_ref()
            .is_some_and(|c| total >= c.delta.total() - EPSILON)
        {
            return;
        }
        let tabu = self
            .tabu
            .any_tabu(&mv.placements(self.solution), self.iteration);
        let aspirates = self.solution.total_cost() + total < self.best_cost - EPSILON;
        if tabu && !aspirates {
            return;
        }
        if !mv.time_ok(&self.evaluator, self.solution) {
            return;
        }
        self.chosen = Some(Candidate { mv, delta });
    }

    /// Best admissible move over the whole neighborhood.
    pub(crate) fn full(mut self) -> Option<Candidate> {
        self.relocations();
        self.swaps();
        self.two_opts();
        self.tail_exchanges();
        self.chosen
    }

    /// Best admissible move among `samples` random draws.
    pub(crate) fn sampled<R: Rng>(mut self, samples: usize, rng: &mut R) -> Option<Candidate> {
        for _ in 0..samples {
            let Some(mv) = random_move(self.solution, rng) else {
                break;
            };
            if !mv.capacity_ok(&self.evaluator, self.solution) {
                continue;
            }
            let delta = mv.cost_delta(&self.evaluator, self.solution);
            self.offer(mv, delta);
        }
        self.chosen
    }

    fn relocations(&mut self) {
        let eval = self.evaluator;
        let problem = eval.problem();
        let solution = self.solution;
        let routes = solution.routes();
        for (a, from) in routes.iter().enumerate() {
            for p in 0..from.len() {
                let demand = problem.demand(from.stops()[p]);
                for (b, to) in routes.iter().enumerate() {
                    if a == b {
                        for q in (0..from.len()).filter(|&q| q != p) {
                            let delta = relocate_intra_delta(&eval, from, p, q);
                            let mv = Move::Relocate {
                                from_route: a,
                                from_pos: p,
                                to_route: a,
                                to_pos: q,
                            };
                            self.offer(mv, MoveDelta::single(delta));
                        }
                        continue;
                    }
                    if to.load() + demand > problem.capacity(to.vehicle()) {
                        continue;
                    }
                    for q in 0..=to.len() {
                        let delta = relocate_delta(&eval, from, p, to, q);
                        let mv = Move::Relocate {
                            from_route: a,
                            from_pos: p,
                            to_route: b,
                            to_pos: q,
                        };
                        self.offer(mv, delta);
                    }
                }
            }
        }
    }

    fn swaps(&mut self) {
        let eval = self.evaluator;
        let problem = eval.problem();
        let solution = self.solution;
        let routes = solution.routes();
        for (a, ra) in routes.iter().enumerate() {
            for (b, rb) in routes.iter().enumerate().skip(a + 1) {
                for i in 0..ra.len() {
                    let di = problem.demand(ra.stops()[i]);
                    for j in 0..rb.len() {
                        let dj = problem.demand(rb.stops()[j]);
                        if ra.load() - di + dj > problem.capacity(ra.vehicle())
                            || rb.load() - dj + di > problem.capacity(rb.vehicle())
                        {
                            continue;
                        }
                        let delta = swap_delta(&eval, ra, i, rb, j);
                        let mv = Move::Swap {
                            route_a: a,
                            pos_a: i,
                            route_b: b,
                            pos_b: j,
                        };
                        self.offer(mv, delta);
                    }
                }
            }
        }
    }

    fn two_opts(&mut self) {
        let eval = self.evaluator;
        let solution = self.solution;
        for (r, route) in solution.routes().iter().enumerate() {
            let stops = route.stops();
            for start in 0..route.len().saturating_sub(1) {
                let (mut forward, mut backward) = (0.0, 0.0);
                for end in start + 1..route.len() {
                    let u = eval.location(stops[end - 1]);
                    let v = eval.location(stops[end]);
                    forward += eval.arc(u, v);
                    backward += eval.arc(v, u);
                    let delta = two_opt_delta(&eval, route, start, end, forward, backward);
                    self.offer(
                        Move::TwoOpt {
                            route: r,
                            start,
                            end,
                        },
                        MoveDelta::single(delta),
                    );
                }
            }
        }
    }

    fn tail_exchanges(&mut self) {
        let eval = self.evaluator;
        let problem = eval.problem();
        let solution = self.solution;
        let routes = solution.routes();
        let profiles: Vec<RouteProfile> = routes
            .iter()
            .map(|route| RouteProfile::of(&eval, route.stops()))
            .collect();

        for (a, ra) in routes.iter().enumerate() {
            for (b, rb) in routes.iter().enumerate().skip(a + 1) {
                if ra.is_empty() && rb.is_empty() {
                    continue;
                }
                let (pa, pb) = (&profiles[a], &profiles[b]);
                for cut_a in 0..=ra.len() {
                    for cut_b in 0..=rb.len() {
                        if cut_a == ra.len() && cut_b == rb.len() {
                            continue;
                        }
                        let (load_a, load_b) = tail_exchange_loads(
                            pa.head_load[cut_a],
                            ra.load(),
                            pb.head_load[cut_b],
                            rb.load(),
                        );
                        if load_a > problem.capacity(ra.vehicle())
                            || load_b > problem.capacity(rb.vehicle())
                        {
                            continue;
                        }
                        let delta = tail_exchange_delta(
                            &eval,
                            ra,
                            cut_a,
                            pa.tail_internal[cut_a],
                            rb,
                            cut_b,
                            pb.tail_internal[cut_b],
                        );
                        let mv = Move::TailExchange {
                            route_a: a,
                            cut_a,
                            route_b: b,
                            cut_b,
                        };
                        self.offer(mv, delta);
                    }
                }
            }
        }
    }
}

/// Prefix loads and suffix internal arc sums of one route, indexed by cut.
struct RouteProfile {
    head_load: Vec<u64>,
    tail_internal: Vec<f64>,
}

impl RouteProfile {
    fn of(evaluator: &Evaluator<'_>, stops: &[usize]) -> Self {
        let problem = evaluator.problem();
        let n = stops.len();

        let mut head_load = Vec::with_capacity(n + 1);
        head_load.push(0);
        for &stop in stops {
            let last = head_load[head_load.len() - 1];
            head_load.push(last + problem.demand(stop));
        }

        let mut tail_internal = vec![0.0; n + 1];
        for k in (0..n.saturating_sub(1)).rev() {
            let arc = evaluator.arc(evaluator.location(stops[k]), evaluator.location(stops[k + 1]));
            tail_internal[k] = tail_internal[k + 1] + arc;
        }

        Self {
            head_load,
            tail_internal,
        }
    }
}

/// Draws a structurally valid random move, or `None` if the solution has
/// no stops or every attempt produced an identity move.
pub(crate) fn random_move<R: Rng>(solution: &Solution, rng: &mut R) -> Option<Move> {
    let routes = solution.routes();
    let active: Vec<usize> = (0..routes.len()).filter(|&r| !routes[r].is_empty()).collect();
    if active.is_empty() {
        return None;
    }

    for _ in 0..RANDOM_ATTEMPTS {
        let a = active[rng.random_range(0..active.len())];
        let len_a = routes[a].len();
        let mv = match rng.random_range(0..4u8) {
            0 => {
                let b = rng.random_range(0..routes.len());
                let p = rng.random_range(0..len_a);
                let q = if a == b {
                    rng.random_range(0..len_a)
                } else {
                    rng.random_range(0..=routes[b].len())
                };
                Move::Relocate {
                    from_route: a,
                    from_pos: p,
                    to_route: b,
                    to_pos: q,
                }
            }
            1 => {
                let b = active[rng.random_range(0..active.len())];
                Move::Swap {
                    route_a: a,
                    pos_a: rng.random_range(0..len_a),
                    route_b: b,
                    pos_b: rng.random_range(0..routes[b].len()),
                }
            }
            2 => {
                if len_a < 2 {
                    continue;
                }
                let start = rng.random_range(0..len_a - 1);
                let end = rng.random_range(start + 1..len_a);
                Move::TwoOpt {
                    route: a,
                    start,
                    end,
                }
            }
            _ => {
                let b = rng.random_range(0..routes.len());
                let cut_a = rng.random_range(0..=len_a);
                let cut_b = rng.random_range(0..=routes[b].len());
                if a < b {
                    Move::TailExchange {
                        route_a: a,
                        cut_a,
                        route_b: b,
                        cut_b,
                    }
                } else {
                    Move::TailExchange {
                        route_a: b,
                        cut_a: cut_b,
                        route_b: a,
                        cut_b: cut_a,
                    }
                }
            }
        };
        if mv.is_valid(solution) {
            return Some(mv);
        }
    }
    None
}

/// Applies up to `moves` random feasible moves, regardless of cost.
///
/// Returns how many were applied.
pub(crate) fn shake<R: Rng>(
    evaluator: &Evaluator<'_>,
    solution: &mut Solution,
    moves: usize,
    rng: &mut R,
) -> usize {
    let mut applied = 0;
    for _ in 0..moves {
        let Some(mv) = random_move(solution, rng) else {
            break;
        };
        if mv.apply(evaluator, solution).is_some() {
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{Problem, Stop, Vehicle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn problem(capacity: u32) -> Problem {
        let costs = CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.0, 2.0, 3.0],
            vec![3.0, 2.0, 0.0, 2.0],
            vec![4.0, 3.0, 2.0, 0.0],
        ])
        .expect("square");
        Problem::build(
            vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)],
            vec![Vehicle::new(0, capacity), Vehicle::new(1, capacity)],
            0,
            costs,
        )
        .expect("valid")
    }

    #[test]
    fn test_full_scan_finds_improvement() {
        let p = problem(10);
        let eval = Evaluator::new(&p);
        // D-B-D (6) + D-A-C-D (9); one vehicle can serve all three for 10.
        let sol = Solution::from_indices(&p, vec![vec![1], vec![0, 2]]);
        let tabu = TabuList::new(0);
        let best = Scan::new(eval, &sol, &tabu, 0, sol.total_cost())
            .full()
            .expect("a move exists");
        assert!(best.delta.total() < -1e-9);
        assert!(best.mv.is_feasible(&eval, &sol));
        let predicted = best.mv.cost_delta(&eval, &sol);
        assert!((predicted.total() - best.delta.total()).abs() < 1e-9);
    }

    #[test]
    fn test_tabu_blocks_without_aspiration() {
        let p = problem(10);
        let eval = Evaluator::new(&p);
        let sol = Solution::from_indices(&p, vec![vec![1], vec![0, 2]]);
        let mut tabu = TabuList::new(5);
        let free = Scan::new(eval, &sol, &tabu, 0, sol.total_cost())
            .full()
            .expect("a move exists");
        for attr in free.mv.placements(&sol).into_iter().flatten() {
            tabu.forbid(attr, 0);
        }
        // With a best cost already far below, aspiration cannot rescue it.
        let constrained = Scan::new(eval, &sol, &tabu, 1, 0.0).full();
        assert!(constrained.is_none_or(|c| c.mv != free.mv));
    }

    #[test]
    fn test_empty_solution_has_no_moves() {
        let p = problem(5);
        let eval = Evaluator::new(&p);
        let sol = Solution::empty(&p);
        let tabu = TabuList::new(3);
        assert!(Scan::new(eval, &sol, &tabu, 0, 0.0).full().is_none());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_move(&sol, &mut rng).is_none());
    }

    #[test]
    fn test_shake_keeps_feasibility_and_cost() {
        let p = problem(5);
        let eval = Evaluator::new(&p);
        let mut sol = Solution::from_indices(&p, vec![vec![0, 2], vec![1]]);
        let mut rng = StdRng::seed_from_u64(11);
        shake(&eval, &mut sol, 25, &mut rng);
        assert!(eval.is_feasible(&sol));
        assert!((sol.total_cost() - eval.total_cost(&sol)).abs() < 1e-9);
    }

    #[test]
    fn test_sampled_moves_are_feasible() {
        let p = problem(5);
        let eval = Evaluator::new(&p);
        let sol = Solution::from_indices(&p, vec![vec![1], vec![0, 2]]);
        let tabu = TabuList::new(0);
        let mut rng = StdRng::seed_from_u64(3);
        if let Some(c) = Scan::new(eval, &sol, &tabu, 0, sol.total_cost()).sampled(32, &mut rng) {
            assert!(c.mv.is_feasible(&eval, &sol));
        }
    }
}
