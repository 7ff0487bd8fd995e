//! Greedy cheapest feasible insertion.
//!
//! # Algorithm
//!
//! Every vehicle is open from the start. At each step, pick the
//! (stop, vehicle, position) triple with the lowest insertion delta among
//! all unassigned stops, subject to remaining capacity and time
//! feasibility, and commit it. Ties go to the lowest stop id, then the
//! lowest vehicle index, then the earliest position.
//!
//! The best position of every unassigned stop in every route is cached.
//! Committing an insertion only invalidates the column of the route that
//! changed, so each step costs one scan of the cache plus one rescan of a
//! single route.
//!
//! # Complexity
//!
//! O(n²·v + n²·L) where n = stops, v = vehicles, L = longest route.

use tracing::debug;

use crate::error::ConstructionError;
use crate::evaluation::{Evaluator, EPSILON};
use crate::models::{Problem, Route, Solution};

use super::leftover_error;

#[derive(Debug, Clone, Copy)]
struct Insertion {
    delta: f64,
    pos: usize,
}

/// Constructs a solution by repeated cheapest feasible insertion.
///
/// Fails with [`ConstructionError::InsufficientFleetCapacity`] if some stop
/// cannot be placed in any route; no partial solution is returned.
///
/// # Examples
///
/// ```
/// use u_lastmile::constructive::cheapest_insertion;
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::evaluation::is_feasible;
/// use u_lastmile::models::{Problem, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0, 4.0],
///     vec![2.0, 0.0, 2.0, 3.0],
///     vec![3.0, 2.0, 0.0, 2.0],
///     vec![4.0, 3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)],
///     vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
///     0,
///     costs,
/// )
/// .unwrap();
///
/// let solution = cheapest_insertion(&problem).unwrap();
/// assert_eq!(solution.num_served(), 3);
/// assert!(is_feasible(&solution, &problem));
/// ```
pub fn cheapest_insertion(problem: &Problem) -> Result<Solution, ConstructionError> {
    let evaluator = Evaluator::new(problem);
    let mut solution = Solution::empty(problem);
    let num_vehicles = problem.num_vehicles();

    let mut order: Vec<usize> = (0..problem.num_stops()).collect();
    order.sort_by_key(|&s| problem.stop(s).id());

    let mut assigned = vec![false; problem.num_stops()];
    let mut cache: Vec<Vec<Option<Insertion>>> = order
        .iter()
        .map(|&stop| {
            solution
                .routes()
                .iter()
                .map(|route| best_position(&evaluator, route, stop))
                .collect()
        })
        .collect();

    for _ in 0..order.len() {
        let mut chosen: Option<(usize, usize, Insertion)> = None;
        for (rank, &stop) in order.iter().enumerate() {
            if assigned[stop] {
                continue;
            }
            for vehicle in 0..num_vehicles {
                let Some(candidate) = cache[rank][vehicle] else {
                    continue;
                };
                let better = chosen
                    .as_ref()
                    .is_none_or(|(_, _, best)| candidate.delta < best.delta - EPSILON);
                if better {
                    chosen = Some((rank, vehicle, candidate));
                }
            }
        }

        let Some((rank, vehicle, insertion)) = chosen else {
            break;
        };
        let stop = order[rank];
        assigned[stop] = true;
        solution.routes_mut()[vehicle].insert(
            insertion.pos,
            stop,
            problem.demand(stop),
            insertion.delta,
        );
        solution.add_cost(insertion.delta);

        let route = &solution.routes()[vehicle];
        for (rank, &other) in order.iter().enumerate() {
            if !assigned[other] {
                cache[rank][vehicle] = best_position(&evaluator, route, other);
            }
        }
    }

    let leftover: Vec<usize> = order.iter().copied().filter(|&s| !assigned[s]).collect();
    if !leftover.is_empty() {
        return Err(leftover_error(problem, &leftover));
    }

    debug!(
        stops = problem.num_stops(),
        active_routes = solution.num_active_routes(),
        cost = solution.total_cost(),
        "cheapest insertion finished"
    );
    Ok(solution)
}

/// Cheapest feasible position for `stop` in `route`, if any.
fn best_position(evaluator: &Evaluator<'_>, route: &Route, stop: usize) -> Option<Insertion> {
    let problem = evaluator.problem();
    if route.load() + problem.demand(stop) > problem.capacity(route.vehicle()) {
        return None;
    }
    let stops = route.stops();
    let mut best: Option<Insertion> = None;
    for pos in 0..=stops.len() {
        let delta = evaluator.insertion_delta(route, pos, stop);
        if best.as_ref().is_some_and(|b| delta >= b.delta - EPSILON) {
            continue;
        }
        let sequence = stops[..pos]
            .iter()
            .copied()
            .chain(std::iter::once(stop))
            .chain(stops[pos..].iter().copied());
        if evaluator.time_feasible(route.vehicle(), sequence) {
            best = Some(Insertion { delta, pos });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{Stop, TimeWindow, Vehicle};

    fn costs() -> CostMatrix {
        CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.0, 2.0, 3.0],
            vec![3.0, 2.0, 0.0, 2.0],
            vec![4.0, 3.0, 2.0, 0.0],
        ])
        .expect("square")
    }

    fn three_stops(capacities: &[u32]) -> Problem {
        Problem::build(
            vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)],
            capacities
                .iter()
                .enumerate()
                .map(|(id, &c)| Vehicle::new(id, c))
                .collect(),
            0,
            costs(),
        )
        .expect("valid")
    }

    #[test]
    fn test_three_stop_example() {
        let p = three_stops(&[5, 5]);
        let sol = cheapest_insertion(&p).expect("feasible");
        let eval = Evaluator::new(&p);
        assert!(eval.is_feasible(&sol));
        assert_eq!(sol.num_served(), 3);
        for route in sol.routes() {
            assert!(route.load() <= 5);
        }
        assert!((sol.total_cost() - eval.total_cost(&sol)).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_choice() {
        let p = three_stops(&[5, 5]);
        let sol = cheapest_insertion(&p).expect("feasible");
        // A (delta 4) opens vehicle 0. B no longer fits there, C does at
        // delta 5 with both positions tied, so the earlier one wins. B then
        // opens vehicle 1 at delta 6.
        assert_eq!(sol.route(0).stops(), &[2, 0]);
        assert_eq!(sol.route(1).stops(), &[1]);
        assert!((sol.total_cost() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_fleet() {
        let p = Problem::build(
            vec![Stop::new(1, 5, 1), Stop::new(2, 5, 2)],
            vec![Vehicle::new(0, 5)],
            0,
            costs(),
        )
        .expect("valid");
        let err = cheapest_insertion(&p).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::InsufficientFleetCapacity {
                unassigned: 1,
                remaining_demand: 5,
                total_capacity: 5
            }
        );
    }

    #[test]
    fn test_no_stops() {
        let p = Problem::build(vec![], vec![Vehicle::new(0, 5)], 0, costs()).expect("valid");
        let sol = cheapest_insertion(&p).expect("trivial");
        assert_eq!(sol.num_served(), 0);
        assert_eq!(sol.total_cost(), 0.0);
    }

    #[test]
    fn test_respects_time_windows() {
        // C must be reached by t=4: only directly from the depot.
        let tw = TimeWindow::new(0.0, 4.0).expect("valid");
        let p = Problem::build(
            vec![Stop::new(1, 1, 1), Stop::new(3, 1, 3).with_time_window(tw)],
            vec![Vehicle::new(0, 10)],
            0,
            costs(),
        )
        .expect("valid");
        let sol = cheapest_insertion(&p).expect("feasible");
        assert_eq!(sol.route(0).stops(), &[1, 0]);
        assert!(Evaluator::new(&p).is_feasible(&sol));
    }

    #[test]
    fn test_time_windows_can_exhaust_fleet() {
        let tw = TimeWindow::new(0.0, 1.0).expect("valid");
        let p = Problem::build(
            vec![Stop::new(1, 1, 1).with_time_window(tw)],
            vec![Vehicle::new(0, 10)],
            0,
            costs(),
        )
        .expect("valid");
        assert!(matches!(
            cheapest_insertion(&p),
            Err(ConstructionError::InsufficientFleetCapacity { unassigned: 1, .. })
        ));
    }

    /// A opens at 10 and is cheap to reach directly, but only the detour
    /// through C keeps the wait short.
    fn waiting_problem(max_waiting: Option<f64>) -> Problem {
        let mut costs = costs();
        costs.set(3, 1, 5.0);
        let tw = TimeWindow::new(10.0, 100.0).expect("valid");
        let mut vehicle = Vehicle::new(0, 10);
        if let Some(max) = max_waiting {
            vehicle = vehicle.with_max_waiting(max);
        }
        Problem::build(
            vec![
                Stop::new(1, 1, 1).with_time_window(tw),
                Stop::new(3, 1, 3),
            ],
            vec![vehicle],
            0,
            costs,
        )
        .expect("valid")
    }

    #[test]
    fn test_respects_waiting_limit() {
        let free = cheapest_insertion(&waiting_problem(None)).expect("feasible");
        assert_eq!(free.route(0).stops(), &[0, 1]);
        assert!((free.total_cost() - 9.0).abs() < 1e-9);

        let p = waiting_problem(Some(3.0));
        let sol = cheapest_insertion(&p).expect("feasible");
        // D-C-A-D reaches A at 9 and waits 1.
        assert_eq!(sol.route(0).stops(), &[1, 0]);
        assert!((sol.total_cost() - 11.0).abs() < 1e-9);
        assert!(Evaluator::new(&p).is_feasible(&sol));
    }
}
