//! Solution evaluator: cost, load, timing and feasibility.

use crate::models::{Problem, Route, Solution};

use super::schedule::{Schedule, Visit};
use super::violation::{Violation, ViolationType};
use super::EPSILON;

/// Evaluates routes and solutions against one [`Problem`].
///
/// Whole-solution methods ([`total_cost`](Self::total_cost),
/// [`violations`](Self::violations)) recompute everything from scratch and
/// are meant for validation. The delta methods run in O(1) and are what the
/// heuristics use per move.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::evaluation::Evaluator;
/// use u_lastmile::models::{Problem, Solution, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0],
///     vec![2.0, 0.0, 2.0],
///     vec![3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2)],
///     vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
///     0,
///     costs,
/// )
/// .unwrap();
/// let evaluator = Evaluator::new(&problem);
///
/// let overloaded = Solution::from_stop_ids(&problem, &[vec![1, 2], vec![]]).unwrap();
/// assert!(!evaluator.is_feasible(&overloaded));
///
/// let split = Solution::from_stop_ids(&problem, &[vec![1], vec![2]]).unwrap();
/// assert!(evaluator.is_feasible(&split));
/// assert_eq!(evaluator.total_cost(&split), 4.0 + 6.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    problem: &'a Problem,
}

impl<'a> Evaluator<'a> {
    /// Creates a new evaluator for the given problem.
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem }
    }

    /// The problem being evaluated.
    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Travel cost of visiting `stops` with `vehicle`: start→first,
    /// consecutive pairs, last→end. Zero for an empty sequence.
    pub fn route_cost(&self, vehicle: usize, stops: &[usize]) -> f64 {
        let (Some(&first), Some(&last)) = (stops.first(), stops.last()) else {
            return 0.0;
        };
        let mut cost = self.arc(self.problem.start_location(vehicle), self.location(first));
        for pair in stops.windows(2) {
            cost += self.arc(self.location(pair[0]), self.location(pair[1]));
        }
        cost + self.arc(self.location(last), self.problem.end_location(vehicle))
    }

    /// Summed demand of `stops`.
    pub fn route_load(&self, stops: &[usize]) -> u64 {
        stops.iter().map(|&s| self.problem.demand(s)).sum()
    }

    /// Builds a route with freshly computed load and cost caches.
    pub fn build_route(&self, vehicle: usize, stops: Vec<usize>) -> Route {
        let load = self.route_load(&stops);
        let cost = self.route_cost(vehicle, &stops);
        Route::from_parts(vehicle, stops, load, cost)
    }

    /// Computes visit timing for a route, leaving the start at time zero.
    ///
    /// Early arrivals wait for the window to open; late arrivals are
    /// recorded as-is (see [`violations`](Self::violations)).
    pub fn schedule(&self, vehicle: usize, stops: &[usize]) -> Schedule {
        let mut visits = Vec::with_capacity(stops.len());
        if stops.is_empty() {
            return Schedule {
                visits,
                duration: 0.0,
            };
        }
        let mut current_time = 0.0;
        let mut current_load = 0;
        let mut prev = self.problem.start_location(vehicle);

        for &stop in stops {
            let here = self.location(stop);
            let arrival = current_time + self.problem.travel_time(prev, here);
            let data = self.problem.stop(stop);
            let waiting = data.time_window().map_or(0.0, |tw| tw.waiting_time(arrival));
            let departure = arrival + waiting + data.service_duration();
            current_load += self.problem.demand(stop);

            visits.push(Visit {
                stop,
                arrival_time: arrival,
                waiting_time: waiting,
                departure_time: departure,
                load_after: current_load,
            });

            current_time = departure;
            prev = here;
        }

        let duration =
            current_time + self.problem.travel_time(prev, self.problem.end_location(vehicle));
        Schedule { visits, duration }
    }

    /// Returns `true` if the sequence meets every time window and the
    /// vehicle's waiting and duration limits.
    ///
    /// Always `true` for problems without time constraints. Otherwise runs
    /// in O(sequence length) and stops at the first late arrival.
    pub fn time_feasible<I>(&self, vehicle: usize, stops: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        if !self.problem.has_time_constraints() {
            return true;
        }
        let limits = self.problem.vehicle(vehicle);
        let max_waiting = limits.max_waiting();
        let mut current_time = 0.0;
        let mut prev = self.problem.start_location(vehicle);
        let mut visited_any = false;

        for stop in stops {
            visited_any = true;
            let here = self.location(stop);
            let arrival = current_time + self.problem.travel_time(prev, here);
            let data = self.problem.stop(stop);
            let service_start = match data.time_window() {
                Some(tw) if tw.is_violated(arrival) => return false,
                Some(tw) => {
                    let waiting = tw.waiting_time(arrival);
                    if max_waiting.is_some_and(|max| waiting > max + EPSILON) {
                        return false;
                    }
                    arrival + waiting
                }
                None => arrival,
            };
            current_time = service_start + data.service_duration();
            prev = here;
        }

        if !visited_any {
            return true;
        }
        match limits.max_duration() {
            Some(max) => {
                let duration = current_time
                    + self.problem.travel_time(prev, self.problem.end_location(vehicle));
                duration <= max + EPSILON
            }
            None => true,
        }
    }

    /// Total cost of a solution, recomputed from scratch.
    pub fn total_cost(&self, solution: &Solution) -> f64 {
        solution
            .routes()
            .iter()
            .map(|r| self.route_cost(r.vehicle(), r.stops()))
            .sum()
    }

    /// Every broken invariant in `solution`.
    ///
    /// Checks one route per vehicle, each stop routed exactly once, stop
    /// indices in range and capacities. When present, time windows, waiting
    /// limits and route durations are checked too.
    pub fn violations(&self, solution: &Solution) -> Vec<Violation> {
        let mut violations = Vec::new();
        let num_vehicles = self.problem.num_vehicles();
        let num_stops = self.problem.num_stops();

        if solution.routes().len() != num_vehicles {
            violations.push(Violation::new(ViolationType::RouteCountMismatch {
                expected: num_vehicles,
                actual: solution.routes().len(),
            }));
        }

        let mut seen = vec![0usize; num_stops];
        for (idx, route) in solution.routes().iter().enumerate() {
            if route.vehicle() != idx {
                violations.push(Violation::new(ViolationType::VehicleMismatch {
                    route_index: idx,
                    vehicle: route.vehicle(),
                }));
            }

            let mut all_known = true;
            for &stop in route.stops() {
                match seen.get_mut(stop) {
                    Some(count) => *count += 1,
                    None => {
                        all_known = false;
                        violations.push(Violation::new(ViolationType::UnknownStop {
                            route_index: idx,
                            stop_index: stop,
                        }));
                    }
                }
            }
            if !all_known || idx >= num_vehicles {
                continue;
            }

            let load = self.route_load(route.stops());
            let capacity = self.problem.capacity(idx);
            if load > capacity {
                violations.push(Violation::new(ViolationType::CapacityExceeded {
                    route_index: idx,
                    load,
                    capacity,
                }));
            }

            if self.problem.has_time_constraints() {
                violations.extend(self.timing_violations(idx, route.stops()));
            }
        }

        for (stop, &count) in seen.iter().enumerate() {
            let stop_id = self.problem.stop(stop).id();
            match count {
                0 => violations.push(Violation::new(ViolationType::MissingStop { stop_id })),
                1 => {}
                occurrences => violations.push(Violation::new(ViolationType::DuplicateStop {
                    stop_id,
                    occurrences,
                })),
            }
        }

        violations
    }

    /// Returns `true` if `solution` satisfies every invariant.
    pub fn is_feasible(&self, solution: &Solution) -> bool {
        self.violations(solution).is_empty()
    }

    /// Cost change from inserting `stop` at `pos` in `route`.
    ///
    /// Accounts for an empty route becoming active.
    pub fn insertion_delta(&self, route: &Route, pos: usize, stop: usize) -> f64 {
        let prev = self.pred(route, pos);
        let next = self.at_or_end(route, pos);
        let here = self.location(stop);
        self.arc(prev, here) + self.arc(here, next) - self.arc(prev, next)
            + self.emptiness_correction(route.vehicle(), route.is_empty(), false)
    }

    /// Cost change from removing the stop at `pos` from `route`.
    ///
    /// Accounts for the route becoming empty.
    pub fn removal_delta(&self, route: &Route, pos: usize) -> f64 {
        let prev = self.pred(route, pos);
        let next = self.at_or_end(route, pos + 1);
        let here = self.location(route.stops()[pos]);
        self.arc(prev, next) - self.arc(prev, here) - self.arc(here, next)
            + self.emptiness_correction(route.vehicle(), false, route.len() == 1)
    }

    /// Cost between two location keys.
    pub(crate) fn arc(&self, from: usize, to: usize) -> f64 {
        self.problem.cost(from, to)
    }

    /// Location key of a stop.
    pub(crate) fn location(&self, stop: usize) -> usize {
        self.problem.stop_location(stop)
    }

    /// Location visited just before position `pos` (the start if `pos == 0`).
    pub(crate) fn pred(&self, route: &Route, pos: usize) -> usize {
        match pos {
            0 => self.problem.start_location(route.vehicle()),
            _ => self.location(route.stops()[pos - 1]),
        }
    }

    /// Location at position `pos`, or the end location past the last stop.
    pub(crate) fn at_or_end(&self, route: &Route, pos: usize) -> usize {
        match route.stops().get(pos) {
            Some(&stop) => self.location(stop),
            None => self.problem.end_location(route.vehicle()),
        }
    }

    /// Delta formulas treat an empty route as the single arc start→end.
    /// Empty routes actually cost nothing; this term reconciles the two.
    pub(crate) fn emptiness_correction(
        &self,
        vehicle: usize,
        was_empty: bool,
        now_empty: bool,
    ) -> f64 {
        if was_empty == now_empty {
            return 0.0;
        }
        let closing = self.arc(
            self.problem.start_location(vehicle),
            self.problem.end_location(vehicle),
        );
        if was_empty {
            closing
        } else {
            -closing
        }
    }

    fn timing_violations(&self, route_index: usize, stops: &[usize]) -> Vec<Violation> {
        let mut violations = Vec::new();
        let schedule = self.schedule(route_index, stops);
        let limits = self.problem.vehicle(route_index);
        for visit in &schedule.visits {
            let stop = self.problem.stop(visit.stop);
            if let Some(tw) = stop.time_window() {
                if tw.is_violated(visit.arrival_time) {
                    violations.push(Violation::new(ViolationType::TimeWindowViolated {
                        stop_id: stop.id(),
                        arrival: visit.arrival_time,
                        due: tw.due(),
                    }));
                }
            }
            if let Some(max_waiting) = limits.max_waiting() {
                if visit.waiting_time > max_waiting + EPSILON {
                    violations.push(Violation::new(ViolationType::WaitingExceeded {
                        stop_id: stop.id(),
                        waiting: visit.waiting_time,
                        max_waiting,
                    }));
                }
            }
        }
        if let Some(max_duration) = limits.max_duration() {
            if !stops.is_empty() && schedule.duration > max_duration + EPSILON {
                violations.push(Violation::new(ViolationType::MaxDurationExceeded {
                    route_index,
                    duration: schedule.duration,
                    max_duration,
                }));
            }
        }
        violations
    }
}

/// Total travel cost of `solution`, recomputed from scratch.
pub fn total_cost(solution: &Solution, problem: &Problem) -> f64 {
    Evaluator::new(problem).total_cost(solution)
}

/// Returns `true` if `solution` routes every stop exactly once within
/// capacity (and time constraints, when present).
pub fn is_feasible(solution: &Solution, problem: &Problem) -> bool {
    Evaluator::new(problem).is_feasible(solution)
}
