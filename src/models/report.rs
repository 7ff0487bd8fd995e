//! Plain-data view of a solution for reporting collaborators.

use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluator;

use super::{Problem, Solution};

/// Arrival and departure at one stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopTiming {
    /// Stop identifier.
    pub stop_id: usize,
    /// Arrival time, before any waiting.
    pub arrival_time: f64,
    /// Departure time, after waiting and service.
    pub departure_time: f64,
}

/// One vehicle's route in caller terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    /// Vehicle identifier.
    pub vehicle_id: usize,
    /// Stop identifiers in visit order.
    pub stop_ids: Vec<usize>,
    /// Travel cost of this route.
    pub cost: f64,
    /// Summed demand carried.
    pub load: u64,
    /// Per-stop timing, only for problems with time constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Vec<StopTiming>>,
    /// Arrival back at the end location, alongside `timing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// A solution expressed with caller identifiers instead of arena indices.
///
/// Costs and loads are recomputed by the [`Evaluator`], not copied from the
/// solution's caches.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::models::{Problem, Solution, SolutionReport, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![vec![0.0, 5.0], vec![5.0, 0.0]]).unwrap();
/// let problem =
///     Problem::build(vec![Stop::new(8, 2, 1)], vec![Vehicle::new(3, 4)], 0, costs).unwrap();
/// let sol = Solution::from_stop_ids(&problem, &[vec![8]]).unwrap();
///
/// let report = SolutionReport::new(&sol, &problem);
/// assert_eq!(report.routes[0].vehicle_id, 3);
/// assert_eq!(report.routes[0].stop_ids, vec![8]);
/// assert_eq!(report.total_cost, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionReport {
    /// Sum of route costs.
    pub total_cost: f64,
    /// One entry per vehicle, in fleet order.
    pub routes: Vec<RouteReport>,
}

impl SolutionReport {
    /// Builds the report for `solution`.
    pub fn new(solution: &Solution, problem: &Problem) -> Self {
        let evaluator = Evaluator::new(problem);
        let timed = problem.has_time_constraints();
        let routes: Vec<RouteReport> = solution
            .routes()
            .iter()
            .map(|route| {
                let schedule = timed.then(|| evaluator.schedule(route.vehicle(), route.stops()));
                RouteReport {
                    vehicle_id: problem.vehicle(route.vehicle()).id(),
                    stop_ids: route.stops().iter().map(|&s| problem.stop(s).id()).collect(),
                    cost: evaluator.route_cost(route.vehicle(), route.stops()),
                    load: evaluator.route_load(route.stops()),
                    timing: schedule.as_ref().map(|s| {
                        s.visits
                            .iter()
                            .map(|v| StopTiming {
                                stop_id: problem.stop(v.stop).id(),
                                arrival_time: v.arrival_time,
                                departure_time: v.departure_time,
                            })
                            .collect()
                    }),
                    duration: schedule.map(|s| s.duration),
                }
            })
            .collect();
        let total_cost = routes.iter().map(|r| r.cost).sum();
        Self { total_cost, routes }
    }

    /// Serialises the report as JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{Stop, TimeWindow, Vehicle};

    #[test]
    fn test_report_uses_caller_ids() {
        let costs = CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0],
            vec![2.0, 0.0, 2.0],
            vec![3.0, 2.0, 0.0],
        ])
        .expect("square");
        let problem = Problem::build(
            vec![Stop::new(100, 3, 1), Stop::new(200, 4, 2)],
            vec![Vehicle::new(7, 5), Vehicle::new(9, 5)],
            0,
            costs,
        )
        .expect("valid");
        let sol = Solution::from_stop_ids(&problem, &[vec![], vec![200, 100]]).expect("ids");
        let report = SolutionReport::new(&sol, &problem);

        assert_eq!(report.routes.len(), 2);
        assert_eq!(report.routes[0].vehicle_id, 7);
        assert!(report.routes[0].stop_ids.is_empty());
        assert_eq!(report.routes[0].cost, 0.0);
        assert_eq!(report.routes[1].vehicle_id, 9);
        assert_eq!(report.routes[1].stop_ids, vec![200, 100]);
        assert_eq!(report.routes[1].load, 7);
        // D-200-100-D = 3 + 2 + 2
        assert!((report.total_cost - 7.0).abs() < 1e-10);
        assert!(report.routes.iter().all(|r| r.timing.is_none()));
    }

    #[test]
    fn test_report_carries_arrivals_when_timed() {
        let costs = CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0],
            vec![2.0, 0.0, 2.0],
            vec![3.0, 2.0, 0.0],
        ])
        .expect("square");
        let tw = TimeWindow::new(5.0, 20.0).expect("valid");
        let problem = Problem::build(
            vec![
                Stop::new(100, 1, 1).with_time_window(tw).with_service_duration(1.0),
                Stop::new(200, 1, 2),
            ],
            vec![Vehicle::new(7, 5)],
            0,
            costs,
        )
        .expect("valid");
        let sol = Solution::from_stop_ids(&problem, &[vec![100, 200]]).expect("ids");
        let report = SolutionReport::new(&sol, &problem);

        // Arrive at 100 at t=2, wait until 5, serve 1; reach 200 at 8; home at 11.
        let timing = report.routes[0].timing.as_ref().expect("timed problem");
        assert_eq!(timing.len(), 2);
        assert_eq!(timing[0].stop_id, 100);
        assert!((timing[0].arrival_time - 2.0).abs() < 1e-10);
        assert!((timing[0].departure_time - 6.0).abs() < 1e-10);
        assert_eq!(timing[1].stop_id, 200);
        assert!((timing[1].arrival_time - 8.0).abs() < 1e-10);
        assert!((timing[1].departure_time - 8.0).abs() < 1e-10);
        assert_eq!(report.routes[0].duration, Some(11.0));
    }

    #[test]
    fn test_report_serialises() {
        let report = SolutionReport {
            total_cost: 4.0,
            routes: vec![RouteReport {
                vehicle_id: 1,
                stop_ids: vec![2, 3],
                cost: 4.0,
                load: 5,
                timing: None,
                duration: None,
            }],
        };
        let json = serde_json::to_string(&report).expect("serialise");
        assert!(!json.contains("timing"));
        let back: SolutionReport = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, report);
    }
}
