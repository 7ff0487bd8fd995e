//! Immutable routing problem instance.

use std::collections::{HashMap, HashSet};

use crate::distance::CostMatrix;
use crate::error::FeasibilityError;

use super::{Stop, Vehicle};

/// One validated CVRP instance.
///
/// Stops and vehicles live in flat arenas; routes and solutions refer to them
/// by index (`0..num_stops()`, `0..num_vehicles()`), never by reference.
/// A `Problem` is read-only once built and can be shared freely across
/// threads.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::models::{Problem, Stop, Vehicle};
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
/// assert_eq!(problem.num_stops(), 2);
/// assert_eq!(problem.total_demand(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Problem {
    stops: Vec<Stop>,
    vehicles: Vec<Vehicle>,
    depot: usize,
    costs: CostMatrix,
    travel_times: Option<CostMatrix>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    index_by_id: HashMap<usize, usize>,
    timed: bool,
}

impl Problem {
    /// Validates the inputs and builds a problem.
    ///
    /// Travel times default to the cost matrix; use [`Problem::builder`] to
    /// supply a separate travel-time matrix.
    pub fn build(
        stops: Vec<Stop>,
        vehicles: Vec<Vehicle>,
        depot: usize,
        costs: CostMatrix,
    ) -> Result<Self, FeasibilityError> {
        Self::builder(depot, costs)
            .stops(stops)
            .vehicles(vehicles)
            .build()
    }

    /// Starts a builder for a problem rooted at `depot`.
    pub fn builder(depot: usize, costs: CostMatrix) -> ProblemBuilder {
        ProblemBuilder {
            stops: Vec::new(),
            vehicles: Vec::new(),
            depot,
            costs,
            travel_times: None,
        }
    }

    /// All stops, in arena order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// All vehicles, in arena order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Stop at arena index `index`.
    pub fn stop(&self, index: usize) -> &Stop {
        &self.stops[index]
    }

    /// Vehicle at arena index `index`.
    pub fn vehicle(&self, index: usize) -> &Vehicle {
        &self.vehicles[index]
    }

    /// Number of stops.
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Depot location key.
    pub fn depot(&self) -> usize {
        self.depot
    }

    /// The cost matrix.
    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.costs
    }

    /// Arena index of the stop with identifier `id`.
    pub fn stop_index(&self, id: usize) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    /// Travel cost between two location keys.
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.costs.get(from, to)
    }

    /// Travel time between two location keys.
    pub fn travel_time(&self, from: usize, to: usize) -> f64 {
        self.travel_times.as_ref().unwrap_or(&self.costs).get(from, to)
    }

    /// Location a vehicle's route starts from.
    pub fn start_location(&self, vehicle: usize) -> usize {
        self.starts[vehicle]
    }

    /// Location a vehicle's route ends at.
    pub fn end_location(&self, vehicle: usize) -> usize {
        self.ends[vehicle]
    }

    /// Location of the stop at arena index `stop`.
    pub fn stop_location(&self, stop: usize) -> usize {
        self.stops[stop].location()
    }

    /// Demand of the stop at arena index `stop`.
    pub fn demand(&self, stop: usize) -> u64 {
        u64::from(self.stops[stop].demand())
    }

    /// Capacity of the vehicle at arena index `vehicle`.
    pub fn capacity(&self, vehicle: usize) -> u64 {
        u64::from(self.vehicles[vehicle].capacity())
    }

    /// Largest capacity in the fleet.
    pub fn max_capacity(&self) -> u32 {
        self.vehicles
            .iter()
            .map(Vehicle::capacity)
            .max()
            .unwrap_or(0)
    }

    /// Summed capacity of the fleet.
    pub fn total_capacity(&self) -> u64 {
        self.vehicles.iter().map(|v| u64::from(v.capacity())).sum()
    }

    /// Summed demand of all stops.
    pub fn total_demand(&self) -> u64 {
        self.stops.iter().map(|s| u64::from(s.demand())).sum()
    }

    /// Returns `true` if any stop has a time window or any vehicle a
    /// duration limit.
    pub fn has_time_constraints(&self) -> bool {
        self.timed
    }
}

/// Builder for [`Problem`].
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::models::{Problem, Stop, TimeWindow, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![vec![0.0, 4.0], vec![4.0, 0.0]]).unwrap();
/// let times = CostMatrix::from_rows(vec![vec![0.0, 9.0], vec![9.0, 0.0]]).unwrap();
/// let problem = Problem::builder(0, costs)
///     .travel_times(times)
///     .stop(Stop::new(1, 1, 1).with_time_window(TimeWindow::new(0.0, 10.0).unwrap()))
///     .vehicle(Vehicle::new(0, 3))
///     .build()
///     .unwrap();
/// assert!(problem.has_time_constraints());
/// assert_eq!(problem.travel_time(0, 1), 9.0);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    stops: Vec<Stop>,
    vehicles: Vec<Vehicle>,
    depot: usize,
    costs: CostMatrix,
    travel_times: Option<CostMatrix>,
}

impl ProblemBuilder {
    /// Appends one stop.
    pub fn stop(mut self, stop: Stop) -> Self {
        self.stops.push(stop);
        self
    }

    /// Appends several stops.
    pub fn stops(mut self, stops: impl IntoIterator<Item = Stop>) -> Self {
        self.stops.extend(stops);
        self
    }

    /// Appends one vehicle.
    pub fn vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    /// Appends several vehicles.
    pub fn vehicles(mut self, vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        self.vehicles.extend(vehicles);
        self
    }

    /// Uses a separate matrix for travel times.
    pub fn travel_times(mut self, times: CostMatrix) -> Self {
        self.travel_times = Some(times);
        self
    }

    /// Validates everything and produces the problem.
    pub fn build(self) -> Result<Problem, FeasibilityError> {
        let ProblemBuilder {
            stops,
            vehicles,
            depot,
            costs,
            travel_times,
        } = self;

        if vehicles.is_empty() {
            return Err(FeasibilityError::EmptyFleet);
        }
        let mut vehicle_ids = HashSet::with_capacity(vehicles.len());
        for v in &vehicles {
            if v.capacity() == 0 {
                return Err(FeasibilityError::InvalidCapacity { vehicle_id: v.id() });
            }
            if !vehicle_ids.insert(v.id()) {
                return Err(FeasibilityError::DuplicateVehicle { vehicle_id: v.id() });
            }
        }

        let starts: Vec<usize> = vehicles.iter().map(|v| v.start().unwrap_or(depot)).collect();
        let ends: Vec<usize> = vehicles.iter().map(|v| v.end().unwrap_or(depot)).collect();
        let mut anchors: Vec<usize> = std::iter::once(depot)
            .chain(starts.iter().copied())
            .chain(ends.iter().copied())
            .collect();
        anchors.sort_unstable();
        anchors.dedup();

        let matrices: Vec<&CostMatrix> = std::iter::once(&costs)
            .chain(travel_times.as_ref())
            .collect();
        if let Some(times) = &travel_times {
            if times.size() != costs.size() {
                return Err(FeasibilityError::MatrixSizeMismatch {
                    costs: costs.size(),
                    travel_times: times.size(),
                });
            }
        }
        for &location in &anchors {
            if !costs.contains(location) {
                return Err(FeasibilityError::UnreachableDepot {
                    location,
                    matrix_size: costs.size(),
                });
            }
        }
        for (&start, &end) in starts.iter().zip(&ends) {
            if matrices.iter().any(|m| !m.get(start, end).is_finite()) {
                return Err(FeasibilityError::UnreachableDepot {
                    location: end,
                    matrix_size: costs.size(),
                });
            }
        }

        let mut index_by_id = HashMap::with_capacity(stops.len());
        for (index, stop) in stops.iter().enumerate() {
            if index_by_id.insert(stop.id(), index).is_some() {
                return Err(FeasibilityError::DuplicateStop { stop_id: stop.id() });
            }
        }

        // Every arc the solver could ever traverse must have a finite entry.
        let mut referenced = anchors.clone();
        referenced.extend(stops.iter().map(Stop::location));
        for stop in &stops {
            let here = stop.location();
            let unreachable = !costs.contains(here)
                || referenced.iter().any(|&other| {
                    costs.contains(other)
                        && matrices
                            .iter()
                            .any(|m| {
                                !m.get(here, other).is_finite() || !m.get(other, here).is_finite()
                            })
                });
            if unreachable {
                return Err(FeasibilityError::UnreachableStop {
                    stop_id: stop.id(),
                    location: here,
                });
            }
        }

        let max_capacity = vehicles.iter().map(Vehicle::capacity).max().unwrap_or(0);
        if let Some(stop) = stops.iter().find(|s| s.demand() > max_capacity) {
            return Err(FeasibilityError::OverCapacityStop {
                stop_id: stop.id(),
                demand: stop.demand(),
                max_capacity,
            });
        }

        let timed = stops.iter().any(|s| s.time_window().is_some())
            || vehicles.iter().any(|v| v.max_duration().is_some());

        Ok(Problem {
            stops,
            vehicles,
            depot,
            costs,
            travel_times,
            starts,
            ends,
            index_by_id,
            timed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn triangle() -> CostMatrix {
        CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.0, 2.0, 3.0],
            vec![3.0, 2.0, 0.0, 2.0],
            vec![4.0, 3.0, 2.0, 0.0],
        ])
        .expect("square")
    }

    #[test]
    fn test_build_valid() {
        let problem = Problem::build(
            vec![Stop::new(10, 3, 1), Stop::new(11, 4, 2), Stop::new(12, 2, 3)],
            vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
            0,
            triangle(),
        )
        .expect("valid");
        assert_eq!(problem.num_stops(), 3);
        assert_eq!(problem.num_vehicles(), 2);
        assert_eq!(problem.stop_index(11), Some(1));
        assert_eq!(problem.stop_index(99), None);
        assert_eq!(problem.max_capacity(), 5);
        assert_eq!(problem.total_capacity(), 10);
        assert_eq!(problem.total_demand(), 9);
        assert_eq!(problem.start_location(1), 0);
        assert!(!problem.has_time_constraints());
        assert_eq!(problem.travel_time(0, 3), 4.0);
    }

    #[test]
    fn test_vehicle_depot_overrides() {
        let problem = Problem::build(
            vec![Stop::new(1, 1, 1)],
            vec![Vehicle::new(0, 5).with_start(2).with_end(3)],
            0,
            triangle(),
        )
        .expect("valid");
        assert_eq!(problem.start_location(0), 2);
        assert_eq!(problem.end_location(0), 3);
    }

    #[test]
    fn test_over_capacity_stop() {
        let err = Problem::build(
            vec![Stop::new(1, 6, 1)],
            vec![Vehicle::new(0, 5), Vehicle::new(1, 4)],
            0,
            triangle(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FeasibilityError::OverCapacityStop {
                stop_id: 1,
                demand: 6,
                max_capacity: 5
            }
        );
    }

    #[test]
    fn test_stop_outside_matrix() {
        let err = Problem::build(
            vec![Stop::new(1, 1, 1), Stop::new(2, 1, 9)],
            vec![Vehicle::new(0, 5)],
            0,
            triangle(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FeasibilityError::UnreachableStop {
                stop_id: 2,
                location: 9
            }
        );
    }

    #[test]
    fn test_stop_with_missing_entry() {
        let mut costs = triangle();
        costs.set(2, 3, f64::NAN);
        let err = Problem::build(
            vec![Stop::new(1, 1, 2), Stop::new(2, 1, 3)],
            vec![Vehicle::new(0, 5)],
            0,
            costs,
        )
        .unwrap_err();
        assert!(matches!(err, FeasibilityError::UnreachableStop { stop_id: 1, .. }));
    }

    #[test]
    fn test_unreferenced_missing_entry_is_fine() {
        let mut costs = triangle();
        costs.set(2, 3, f64::INFINITY);
        let problem = Problem::build(vec![Stop::new(1, 1, 1)], vec![Vehicle::new(0, 5)], 0, costs);
        assert!(problem.is_ok());
    }

    #[test]
    fn test_duplicate_stop() {
        let err = Problem::build(
            vec![Stop::new(1, 1, 1), Stop::new(1, 1, 2)],
            vec![Vehicle::new(0, 5)],
            0,
            triangle(),
        )
        .unwrap_err();
        assert_eq!(err, FeasibilityError::DuplicateStop { stop_id: 1 });
    }

    #[test]
    fn test_fleet_validation() {
        assert_eq!(
            Problem::build(vec![], vec![], 0, triangle()).unwrap_err(),
            FeasibilityError::EmptyFleet
        );
        assert_eq!(
            Problem::build(vec![], vec![Vehicle::new(3, 0)], 0, triangle()).unwrap_err(),
            FeasibilityError::InvalidCapacity { vehicle_id: 3 }
        );
        assert_eq!(
            Problem::build(vec![], vec![Vehicle::new(3, 1), Vehicle::new(3, 2)], 0, triangle())
                .unwrap_err(),
            FeasibilityError::DuplicateVehicle { vehicle_id: 3 }
        );
    }

    #[test]
    fn test_depot_outside_matrix() {
        let err = Problem::build(vec![], vec![Vehicle::new(0, 1)], 7, triangle()).unwrap_err();
        assert_eq!(
            err,
            FeasibilityError::UnreachableDepot {
                location: 7,
                matrix_size: 4
            }
        );
        let err = Problem::build(vec![], vec![Vehicle::new(0, 1).with_end(5)], 0, triangle())
            .unwrap_err();
        assert!(matches!(err, FeasibilityError::UnreachableDepot { location: 5, .. }));
    }

    #[test]
    fn test_travel_time_size_mismatch() {
        let err = Problem::builder(0, triangle())
            .travel_times(CostMatrix::new(2))
            .vehicle(Vehicle::new(0, 1))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            FeasibilityError::MatrixSizeMismatch {
                costs: 4,
                travel_times: 2
            }
        );
    }

    #[test]
    fn test_time_constraints_detected() {
        let tw = TimeWindow::new(0.0, 5.0).expect("valid");
        let problem = Problem::builder(0, triangle())
            .stop(Stop::new(1, 1, 1).with_time_window(tw))
            .vehicle(Vehicle::new(0, 5))
            .build()
            .expect("valid");
        assert!(problem.has_time_constraints());

        let problem = Problem::builder(0, triangle())
            .stop(Stop::new(1, 1, 1))
            .vehicle(Vehicle::new(0, 5).with_max_duration(10.0))
            .build()
            .expect("valid");
        assert!(problem.has_time_constraints());
    }
}
