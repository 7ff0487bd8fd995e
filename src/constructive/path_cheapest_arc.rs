//! Path-cheapest-arc constructive heuristic.
//!
//! Fills vehicles one at a time: starting from the vehicle's start
//! location, always extend the path with the unassigned stop reached by the
//! cheapest arc. When nothing else fits, move on to the next vehicle.
//!
//! # Complexity
//!
//! O(n²) where n = number of stops.

use crate::error::ConstructionError;
use crate::evaluation::{Evaluator, EPSILON};
use crate::models::{Problem, Solution};

use super::leftover_error;

/// Constructs a solution by greedy cheapest-arc path extension.
///
/// Faster than [`cheapest_insertion`](super::cheapest_insertion) and usually
/// worse. Ties between equally cheap arcs go to the lowest stop id.
///
/// # Examples
///
/// ```
/// use u_lastmile::constructive::path_cheapest_arc;
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::models::{Problem, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 1.0, 2.0, 3.0],
///     vec![1.0, 0.0, 1.0, 2.0],
///     vec![2.0, 1.0, 0.0, 1.0],
///     vec![3.0, 2.0, 1.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 10, 1), Stop::new(2, 10, 2), Stop::new(3, 10, 3)],
///     vec![Vehicle::new(0, 30)],
///     0,
///     costs,
/// )
/// .unwrap();
///
/// let solution = path_cheapest_arc(&problem).unwrap();
/// assert_eq!(solution.route(0).stops(), &[0, 1, 2]);
/// assert_eq!(solution.total_cost(), 6.0);
/// ```
pub fn path_cheapest_arc(problem: &Problem) -> Result<Solution, ConstructionError> {
    let evaluator = Evaluator::new(problem);
    let n = problem.num_stops();

    let mut by_id: Vec<usize> = (0..n).collect();
    by_id.sort_by_key(|&s| problem.stop(s).id());

    let mut visited = vec![false; n];
    let mut remaining = n;
    let mut sequences: Vec<Vec<usize>> = Vec::with_capacity(problem.num_vehicles());

    for vehicle in 0..problem.num_vehicles() {
        let capacity = problem.capacity(vehicle);
        let mut current = problem.start_location(vehicle);
        let mut path: Vec<usize> = Vec::new();
        let mut load: u64 = 0;

        while remaining > 0 {
            let mut best: Option<(usize, f64)> = None;
            for &stop in &by_id {
                if visited[stop] || load + problem.demand(stop) > capacity {
                    continue;
                }
                let d = evaluator.arc(current, evaluator.location(stop));
                if best.is_some_and(|(_, bd)| d >= bd - EPSILON) {
                    continue;
                }
                let candidate = path.iter().copied().chain(std::iter::once(stop));
                if evaluator.time_feasible(vehicle, candidate) {
                    best = Some((stop, d));
                }
            }

            match best {
                Some((next, _)) => {
                    visited[next] = true;
                    remaining -= 1;
                    path.push(next);
                    load += problem.demand(next);
                    current = evaluator.location(next);
                }
                None => break,
            }
        }
        sequences.push(path);
    }

    if remaining > 0 {
        let leftover: Vec<usize> = by_id.into_iter().filter(|&s| !visited[s]).collect();
        return Err(leftover_error(problem, &leftover));
    }

    Ok(Solution::from_indices(problem, sequences))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{Stop, Vehicle};

    fn line_problem(capacities: &[u32]) -> Problem {
        let costs = CostMatrix::from_rows(vec![
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 0.0, 1.0, 2.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![3.0, 2.0, 1.0, 0.0],
        ])
        .expect("square");
        Problem::build(
            vec![Stop::new(1, 10, 1), Stop::new(2, 10, 2), Stop::new(3, 10, 3)],
            capacities
                .iter()
                .enumerate()
                .map(|(id, &c)| Vehicle::new(id, c))
                .collect(),
            0,
            costs,
        )
        .expect("valid")
    }

    #[test]
    fn test_single_vehicle_follows_line() {
        let p = line_problem(&[30]);
        let sol = path_cheapest_arc(&p).expect("fits");
        assert_eq!(sol.route(0).stops(), &[0, 1, 2]);
        assert!((sol.total_cost() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_capacity_splits_routes() {
        let p = line_problem(&[20, 20]);
        let sol = path_cheapest_arc(&p).expect("fits");
        assert_eq!(sol.route(0).stops(), &[0, 1]);
        assert_eq!(sol.route(1).stops(), &[2]);
        assert!(Evaluator::new(&p).is_feasible(&sol));
    }

    #[test]
    fn test_unused_vehicle_stays_empty() {
        let p = line_problem(&[30, 30]);
        let sol = path_cheapest_arc(&p).expect("fits");
        assert!(sol.route(1).is_empty());
        assert_eq!(sol.route(1).cost(), 0.0);
    }

    #[test]
    fn test_fleet_exhausted() {
        let p = line_problem(&[10]);
        assert_eq!(
            path_cheapest_arc(&p).unwrap_err(),
            ConstructionError::InsufficientFleetCapacity {
                unassigned: 2,
                remaining_demand: 20,
                total_capacity: 10,
            }
        );
    }
}
