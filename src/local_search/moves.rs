//! The closed set of neighborhood moves.
//!
//! Every move reports per-route cost deltas, so cached route costs and the
//! solution total stay current without re-evaluating whole routes. Delta
//! formulas treat an empty route as the arc start→end and reconcile through
//! [`Evaluator::emptiness_correction`].

use crate::evaluation::Evaluator;
use crate::models::{Route, Solution};

use super::tabu::TabuAttribute;

/// A neighborhood move. Positions are indices into the current routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// Move one stop to another position, in the same or another route.
    ///
    /// For an intra-route move `to_pos` indexes the route *after* the stop
    /// has been removed.
    Relocate {
        /// Source route.
        from_route: usize,
        /// Position of the stop being moved.
        from_pos: usize,
        /// Destination route.
        to_route: usize,
        /// Insertion position in the destination route.
        to_pos: usize,
    },
    /// Exchange two stops between different routes.
    Swap {
        /// First route.
        route_a: usize,
        /// Position in the first route.
        pos_a: usize,
        /// Second route.
        route_b: usize,
        /// Position in the second route.
        pos_b: usize,
    },
    /// Reverse the segment `start..=end` of one route.
    TwoOpt {
        /// Route index.
        route: usize,
        /// First reversed position.
        start: usize,
        /// Last reversed position.
        end: usize,
    },
    /// Exchange route tails (2-opt*): `a[..cut_a] + b[cut_b..]` and
    /// `b[..cut_b] + a[cut_a..]`.
    TailExchange {
        /// First route.
        route_a: usize,
        /// Cut position in the first route.
        cut_a: usize,
        /// Second route.
        route_b: usize,
        /// Cut position in the second route.
        cut_b: usize,
    },
}

/// Cost change of a move, split by touched route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveDelta {
    /// Change on the first touched route.
    pub first: f64,
    /// Change on the second touched route; zero for single-route moves.
    pub second: f64,
}

impl MoveDelta {
    /// Delta for a move touching one route.
    pub fn single(delta: f64) -> Self {
        Self {
            first: delta,
            second: 0.0,
        }
    }

    /// Change in total solution cost.
    pub fn total(&self) -> f64 {
        self.first + self.second
    }
}

impl Move {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Move::Relocate {
                from_route,
                to_route,
                ..
            } if from_route == to_route => "relocate_intra",
            Move::Relocate { .. } => "relocate",
            Move::Swap { .. } => "swap",
            Move::TwoOpt { .. } => "two_opt",
            Move::TailExchange { .. } => "tail_exchange",
        }
    }

    /// Route indices touched, in [`MoveDelta`] order.
    pub fn routes(&self) -> (usize, Option<usize>) {
        match *self {
            Move::Relocate {
                from_route,
                to_route,
                ..
            } if from_route == to_route => (from_route, None),
            Move::Relocate {
                from_route,
                to_route,
                ..
            } => (from_route, Some(to_route)),
            Move::Swap {
                route_a, route_b, ..
            }
            | Move::TailExchange {
                route_a, route_b, ..
            } => (route_a, Some(route_b)),
            Move::TwoOpt { route, .. } => (route, None),
        }
    }

    /// Whether the indices describe a real, non-identity move on `solution`.
    pub fn is_valid(&self, solution: &Solution) -> bool {
        let routes = solution.routes();
        let len = |r: usize| routes.get(r).map(Route::len);
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => match (len(from_route), len(to_route)) {
                (Some(n), Some(_)) if from_route == to_route => {
                    from_pos < n && to_pos < n && to_pos != from_pos
                }
                (Some(n), Some(m)) => from_pos < n && to_pos <= m,
                _ => false,
            },
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                route_a != route_b
                    && len(route_a).is_some_and(|n| pos_a < n)
                    && len(route_b).is_some_and(|n| pos_b < n)
            }
            Move::TwoOpt { route, start, end } => {
                start < end && len(route).is_some_and(|n| end < n)
            }
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => match (len(route_a), len(route_b)) {
                (Some(n), Some(m)) => {
                    route_a != route_b && cut_a <= n && cut_b <= m && !(cut_a == n && cut_b == m)
                }
                _ => false,
            },
        }
    }

    /// Per-route cost change of applying this move to `solution`.
    ///
    /// O(1), except for [`Move::TwoOpt`] and [`Move::TailExchange`], which
    /// sum the internal edges of the affected segment.
    ///
    /// # Panics
    ///
    /// Panics if the move is not [valid](Self::is_valid) for `solution`.
    pub fn cost_delta(&self, evaluator: &Evaluator<'_>, solution: &Solution) -> MoveDelta {
        let routes = solution.routes();
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } if from_route == to_route => MoveDelta::single(relocate_intra_delta(
                evaluator,
                &routes[from_route],
                from_pos,
                to_pos,
            )),
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => relocate_delta(
                evaluator,
                &routes[from_route],
                from_pos,
                &routes[to_route],
                to_pos,
            ),
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => swap_delta(evaluator, &routes[route_a], pos_a, &routes[route_b], pos_b),
            Move::TwoOpt { route, start, end } => {
                let r = &routes[route];
                let (forward, backward) = segment_sums(evaluator, r.stops(), start, end);
                MoveDelta::single(two_opt_delta(evaluator, r, start, end, forward, backward))
            }
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let a = &routes[route_a];
                let b = &routes[route_b];
                tail_exchange_delta(
                    evaluator,
                    a,
                    cut_a,
                    tail_internal(evaluator, a.stops(), cut_a),
                    b,
                    cut_b,
                    tail_internal(evaluator, b.stops(), cut_b),
                )
            }
        }
    }

    /// Whether the resulting routes stay within vehicle capacity.
    pub(crate) fn capacity_ok(&self, evaluator: &Evaluator<'_>, solution: &Solution) -> bool {
        let problem = evaluator.problem();
        let routes = solution.routes();
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                ..
            } => {
                if from_route == to_route {
                    return true;
                }
                let to = &routes[to_route];
                let demand = problem.demand(routes[from_route].stops()[from_pos]);
                to.load() + demand <= problem.capacity(to.vehicle())
            }
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                let (a, b) = (&routes[route_a], &routes[route_b]);
                let da = problem.demand(a.stops()[pos_a]);
                let db = problem.demand(b.stops()[pos_b]);
                a.load() - da + db <= problem.capacity(a.vehicle())
                    && b.load() - db + da <= problem.capacity(b.vehicle())
            }
            Move::TwoOpt { .. } => true,
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let (a, b) = (&routes[route_a], &routes[route_b]);
                let head_a = evaluator.route_load(&a.stops()[..cut_a]);
                let head_b = evaluator.route_load(&b.stops()[..cut_b]);
                let (new_a, new_b) = tail_exchange_loads(head_a, a.load(), head_b, b.load());
                new_a <= problem.capacity(a.vehicle()) && new_b <= problem.capacity(b.vehicle())
            }
        }
    }

    /// Whether the resulting routes meet time windows and duration limits.
    pub(crate) fn time_ok(&self, evaluator: &Evaluator<'_>, solution: &Solution) -> bool {
        if !evaluator.problem().has_time_constraints() {
            return true;
        }
        self.rewritten(solution)
            .into_iter()
            .flatten()
            .all(|(route, stops)| {
                let vehicle = solution.routes()[route].vehicle();
                evaluator.time_feasible(vehicle, stops)
            })
    }

    /// Whether the move is valid and keeps the solution feasible.
    pub fn is_feasible(&self, evaluator: &Evaluator<'_>, solution: &Solution) -> bool {
        self.is_valid(solution)
            && self.capacity_ok(evaluator, solution)
            && self.time_ok(evaluator, solution)
    }

    /// Applies the move if it is valid and feasible, returning its delta.
    ///
    /// Leaves `solution` untouched and returns `None` otherwise.
    pub fn apply(&self, evaluator: &Evaluator<'_>, solution: &mut Solution) -> Option<MoveDelta> {
        if !self.is_feasible(evaluator, solution) {
            return None;
        }
        let delta = self.cost_delta(evaluator, solution);
        self.apply_unchecked(evaluator, solution, delta);
        Some(delta)
    }

    /// Applies a move already checked for feasibility, with its known delta.
    pub(crate) fn apply_unchecked(
        &self,
        evaluator: &Evaluator<'_>,
        solution: &mut Solution,
        delta: MoveDelta,
    ) {
        let (first, second) = self.routes();
        let rewritten = self.rewritten(solution);
        let routes = solution.routes_mut();
        for (route, stops) in rewritten.into_iter().flatten() {
            let load = evaluator.route_load(&stops);
            let r = &mut routes[route];
            *r.stops_mut() = stops;
            r.set_load(load);
        }
        routes[first].add_cost(delta.first);
        if let Some(second) = second {
            routes[second].add_cost(delta.second);
        }
        solution.add_cost(delta.total());
    }

    /// Stop sequences of the touched routes after the move.
    fn rewritten(&self, solution: &Solution) -> [Option<(usize, Vec<usize>)>; 2] {
        let routes = solution.routes();
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => {
                let mut from = routes[from_route].stops().to_vec();
                let stop = from.remove(from_pos);
                if from_route == to_route {
                    from.insert(to_pos, stop);
                    return [Some((from_route, from)), None];
                }
                let mut to = routes[to_route].stops().to_vec();
                to.insert(to_pos, stop);
                [Some((from_route, from)), Some((to_route, to))]
            }
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                let mut a = routes[route_a].stops().to_vec();
                let mut b = routes[route_b].stops().to_vec();
                std::mem::swap(&mut a[pos_a], &mut b[pos_b]);
                [Some((route_a, a)), Some((route_b, b))]
            }
            Move::TwoOpt { route, start, end } => {
                let mut stops = routes[route].stops().to_vec();
                stops[start..=end].reverse();
                [Some((route, stops)), None]
            }
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let (a, b) = (routes[route_a].stops(), routes[route_b].stops());
                let new_a = a[..cut_a].iter().chain(&b[cut_b..]).copied().collect();
                let new_b = b[..cut_b].iter().chain(&a[cut_a..]).copied().collect();
                [Some((route_a, new_a)), Some((route_b, new_b))]
            }
        }
    }

    /// Attributes this move would re-create; the move is tabu if any is.
    pub(crate) fn placements(&self, solution: &Solution) -> [Option<TabuAttribute>; 2] {
        let routes = solution.routes();
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => {
                let stop = routes[from_route].stops()[from_pos];
                if from_route == to_route {
                    let attr = TabuAttribute::StopAtPosition {
                        stop,
                        route: to_route,
                        pos: to_pos,
                    };
                    [Some(attr), None]
                } else {
                    [
                        Some(TabuAttribute::StopInRoute {
                            stop,
                            route: to_route,
                        }),
                        None,
                    ]
                }
            }
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                let x = routes[route_a].stops()[pos_a];
                let y = routes[route_b].stops()[pos_b];
                [
                    Some(TabuAttribute::StopInRoute {
                        stop: x,
                        route: route_b,
                    }),
                    Some(TabuAttribute::StopInRoute {
                        stop: y,
                        route: route_a,
                    }),
                ]
            }
            Move::TwoOpt { route, start, end } => {
                let stops = routes[route].stops();
                [Some(TabuAttribute::reversal(route, stops[start], stops[end])), None]
            }
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let head_of = |r: usize, cut: usize, dest: usize| {
                    routes[r]
                        .stops()
                        .get(cut)
                        .map(|&stop| TabuAttribute::StopInRoute { stop, route: dest })
                };
                [head_of(route_b, cut_b, route_a), head_of(route_a, cut_a, route_b)]
            }
        }
    }

    /// Attributes this move destroys; forbidden after it is applied.
    pub(crate) fn departures(&self, solution: &Solution) -> [Option<TabuAttribute>; 2] {
        let routes = solution.routes();
        match *self {
            Move::Relocate {
                from_route,
                from_pos,
                to_route,
                ..
            } => {
                let stop = routes[from_route].stops()[from_pos];
                if from_route == to_route {
                    let attr = TabuAttribute::StopAtPosition {
                        stop,
                        route: from_route,
                        pos: from_pos,
                    };
                    [Some(attr), None]
                } else {
                    [
                        Some(TabuAttribute::StopInRoute {
                            stop,
                            route: from_route,
                        }),
                        None,
                    ]
                }
            }
            Move::Swap {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                let x = routes[route_a].stops()[pos_a];
                let y = routes[route_b].stops()[pos_b];
                [
                    Some(TabuAttribute::StopInRoute {
                        stop: x,
                        route: route_a,
                    }),
                    Some(TabuAttribute::StopInRoute {
                        stop: y,
                        route: route_b,
                    }),
                ]
            }
            Move::TwoOpt { .. } => self.placements(solution),
            Move::TailExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let stays = |r: usize, cut: usize| {
                    routes[r]
                        .stops()
                        .get(cut)
                        .map(|&stop| TabuAttribute::StopInRoute { stop, route: r })
                };
                [stays(route_a, cut_a), stays(route_b, cut_b)]
            }
        }
    }
}

/// Inter-route relocation of `from.stops()[p]` to position `q` of `to`.
pub(crate) fn relocate_delta(
    evaluator: &Evaluator<'_>,
    from: &Route,
    p: usize,
    to: &Route,
    q: usize,
) -> MoveDelta {
    MoveDelta {
        first: evaluator.removal_delta(from, p),
        second: evaluator.insertion_delta(to, q, from.stops()[p]),
    }
}

/// Intra-route relocation; `q` indexes the route with `p` removed.
pub(crate) fn relocate_intra_delta(
    evaluator: &Evaluator<'_>,
    route: &Route,
    p: usize,
    q: usize,
) -> f64 {
    let here = evaluator.location(route.stops()[p]);
    let prev = evaluator.pred(route, p);
    let next = evaluator.at_or_end(route, p + 1);
    let removal = evaluator.arc(prev, next) - evaluator.arc(prev, here) - evaluator.arc(here, next);

    let reduced = |i: usize| evaluator.at_or_end(route, if i < p { i } else { i + 1 });
    let before = match q {
        0 => evaluator.pred(route, 0),
        _ => reduced(q - 1),
    };
    let after = reduced(q);
    removal + evaluator.arc(before, here) + evaluator.arc(here, after)
        - evaluator.arc(before, after)
}

/// Exchange of `a.stops()[i]` and `b.stops()[j]`.
pub(crate) fn swap_delta(
    evaluator: &Evaluator<'_>,
    a: &Route,
    i: usize,
    b: &Route,
    j: usize,
) -> MoveDelta {
    let x = evaluator.location(a.stops()[i]);
    let y = evaluator.location(b.stops()[j]);
    let replace = |route: &Route, pos: usize, old: usize, new: usize| {
        let prev = evaluator.pred(route, pos);
        let next = evaluator.at_or_end(route, pos + 1);
        evaluator.arc(prev, new) + evaluator.arc(new, next)
            - evaluator.arc(prev, old)
            - evaluator.arc(old, next)
    };
    MoveDelta {
        first: replace(a, i, x, y),
        second: replace(b, j, y, x),
    }
}

/// Reversal of `start..=end`, given the forward and backward sums of the
/// segment's internal arcs.
pub(crate) fn two_opt_delta(
    evaluator: &Evaluator<'_>,
    route: &Route,
    start: usize,
    end: usize,
    forward: f64,
    backward: f64,
) -> f64 {
    let prev = evaluator.pred(route, start);
    let next = evaluator.at_or_end(route, end + 1);
    let first = evaluator.location(route.stops()[start]);
    let last = evaluator.location(route.stops()[end]);
    evaluator.arc(prev, last) + evaluator.arc(first, next)
        - evaluator.arc(prev, first)
        - evaluator.arc(last, next)
        + backward
        - forward
}

/// Forward and backward internal arc sums of `stops[start..=end]`.
pub(crate) fn segment_sums(
    evaluator: &Evaluator<'_>,
    stops: &[usize],
    start: usize,
    end: usize,
) -> (f64, f64) {
    stops[start..=end]
        .windows(2)
        .fold((0.0, 0.0), |(forward, backward), pair| {
            let (u, v) = (evaluator.location(pair[0]), evaluator.location(pair[1]));
            (forward + evaluator.arc(u, v), backward + evaluator.arc(v, u))
        })
}

/// Sum of internal arcs of `stops[cut..]`.
pub(crate) fn tail_internal(evaluator: &Evaluator<'_>, stops: &[usize], cut: usize) -> f64 {
    stops[cut..]
        .windows(2)
        .map(|pair| evaluator.arc(evaluator.location(pair[0]), evaluator.location(pair[1])))
        .sum()
}

/// Loads after a tail exchange, from head loads and route loads.
pub(crate) fn tail_exchange_loads(
    head_a: u64,
    load_a: u64,
    head_b: u64,
    load_b: u64,
) -> (u64, u64) {
    (head_a + (load_b - head_b), head_b + (load_a - head_a))
}

/// Tail exchange, given each route's tail internal arc sum at its cut.
pub(crate) fn tail_exchange_delta(
    evaluator: &Evaluator<'_>,
    a: &Route,
    cut_a: usize,
    internal_a: f64,
    b: &Route,
    cut_b: usize,
    internal_b: f64,
) -> MoveDelta {
    let problem = evaluator.problem();
    let tail_a = Tail::of(evaluator, a, cut_a, internal_a);
    let tail_b = Tail::of(evaluator, b, cut_b, internal_b);
    let head_a = evaluator.pred(a, cut_a);
    let head_b = evaluator.pred(b, cut_b);
    let end_a = problem.end_location(a.vehicle());
    let end_b = problem.end_location(b.vehicle());

    let a_empties = cut_a == 0 && tail_b.is_empty();
    let b_empties = cut_b == 0 && tail_a.is_empty();
    let first = tail_b.leg(evaluator, head_a, end_a) - tail_a.leg(evaluator, head_a, end_a)
        + evaluator.emptiness_correction(a.vehicle(), a.is_empty(), a_empties);
    let second = tail_a.leg(evaluator, head_b, end_b) - tail_b.leg(evaluator, head_b, end_b)
        + evaluator.emptiness_correction(b.vehicle(), b.is_empty(), b_empties);
    MoveDelta { first, second }
}

/// A route suffix as seen by the tail-exchange delta.
struct Tail {
    ends: Option<(usize, usize)>,
    internal: f64,
}

impl Tail {
    fn of(evaluator: &Evaluator<'_>, route: &Route, cut: usize, internal: f64) -> Self {
        let stops = route.stops();
        let ends = match (stops.get(cut), stops.last()) {
            (Some(&first), Some(&last)) => {
                Some((evaluator.location(first), evaluator.location(last)))
            }
            _ => None,
        };
        Self { ends, internal }
    }

    fn is_empty(&self) -> bool {
        self.ends.is_none()
    }

    /// Cost from `head` through this tail to `end`.
    fn leg(&self, evaluator: &Evaluator<'_>, head: usize, end: usize) -> f64 {
        match self.ends {
            Some((first, last)) => {
                evaluator.arc(head, first) + self.internal + evaluator.arc(last, end)
            }
            None => evaluator.arc(head, end),
        }
    }
}
