//! Solution type.

use crate::evaluation::Evaluator;

use super::{Problem, Route};

/// A complete assignment: exactly one route per vehicle, possibly empty.
///
/// `routes()[v]` belongs to the vehicle at arena index `v`. The total cost is
/// tracked incrementally alongside the per-route caches; the
/// [`Evaluator`] recomputes it from scratch when validation is needed.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::models::{Problem, Solution, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0],
///     vec![2.0, 0.0, 2.0],
///     vec![3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 1, 1), Stop::new(2, 1, 2)],
///     vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
///     0,
///     costs,
/// )
/// .unwrap();
///
/// let sol = Solution::from_stop_ids(&problem, &[vec![1, 2], vec![]]).unwrap();
/// assert_eq!(sol.num_served(), 2);
/// assert_eq!(sol.total_cost(), 2.0 + 2.0 + 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    routes: Vec<Route>,
    total_cost: f64,
}

impl Solution {
    /// Creates a solution with one empty route per vehicle.
    pub fn empty(problem: &Problem) -> Self {
        Self {
            routes: (0..problem.num_vehicles()).map(Route::new).collect(),
            total_cost: 0.0,
        }
    }

    /// Builds a solution from per-vehicle sequences of stop identifiers.
    ///
    /// Returns `None` if the number of sequences differs from the fleet size
    /// or an identifier is unknown. Capacity and completeness are *not*
    /// checked here; use the [`Evaluator`] for that.
    pub fn from_stop_ids(problem: &Problem, sequences: &[Vec<usize>]) -> Option<Self> {
        if sequences.len() != problem.num_vehicles() {
            return None;
        }
        let indices = sequences
            .iter()
            .map(|seq| seq.iter().map(|&id| problem.stop_index(id)).collect())
            .collect::<Option<Vec<Vec<usize>>>>()?;
        Some(Self::from_indices(problem, indices))
    }

    /// Builds a solution from per-vehicle sequences of stop arena indices.
    ///
    /// Callers guarantee one sequence per vehicle and in-range indices.
    pub(crate) fn from_indices(problem: &Problem, sequences: Vec<Vec<usize>>) -> Self {
        let evaluator = Evaluator::new(problem);
        let routes: Vec<Route> = sequences
            .into_iter()
            .enumerate()
            .map(|(vehicle, stops)| evaluator.build_route(vehicle, stops))
            .collect();
        let total_cost = routes.iter().map(Route::cost).sum();
        Self { routes, total_cost }
    }

    /// Returns the routes, indexed by vehicle.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route of the vehicle at arena index `vehicle`.
    pub fn route(&self, vehicle: usize) -> &Route {
        &self.routes[vehicle]
    }

    pub(crate) fn routes_mut(&mut self) -> &mut [Route] {
        &mut self.routes
    }

    /// Incrementally tracked total cost.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub(crate) fn add_cost(&mut self, delta: f64) {
        self.total_cost += delta;
    }

    /// Total number of stops served across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }

    /// Number of vehicles that leave the depot.
    pub fn num_active_routes(&self) -> usize {
        self.routes.iter().filter(|r| !r.is_empty()).count()
    }
}
