//! # u-lastmile
//!
//! Last-mile delivery routing: a capacitated vehicle routing (CVRP) solver
//! over a caller-supplied cost matrix, with optional time windows and route
//! duration limits.
//!
//! ## Modules
//!
//! - [`models`]: stops, vehicles, the validated [`Problem`](models::Problem),
//!   routes and solutions
//! - [`distance`]: dense [`CostMatrix`](distance::CostMatrix) and the
//!   provider trait
//! - [`evaluation`]: cost, feasibility and O(1) insertion/removal deltas
//! - [`constructive`]: cheapest insertion and path-cheapest-arc
//! - [`local_search`]: tabu search over relocate, swap, 2-opt and 2-opt*
//! - [`solver`]: the construct → improve → validate pipeline
//! - [`error`]: error enums
//!
//! ## Example
//!
//! ```
//! use u_lastmile::distance::CostMatrix;
//! use u_lastmile::local_search::Budget;
//! use u_lastmile::models::{Problem, Stop, Vehicle};
//! use u_lastmile::solver::solve;
//!
//! let costs = CostMatrix::from_rows(vec![
//!     vec![0.0, 2.0, 3.0, 4.0],
//!     vec![2.0, 0.0, 2.0, 3.0],
//!     vec![3.0, 2.0, 0.0, 2.0],
//!     vec![4.0, 3.0, 2.0, 0.0],
//! ])
//! .unwrap();
//! let problem = Problem::builder(0, costs)
//!     .stops([Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)])
//!     .vehicles([Vehicle::new(0, 5), Vehicle::new(1, 5)])
//!     .build()
//!     .unwrap();
//!
//! let outcome = solve(&problem, Budget::iterations(200)).unwrap();
//! let report = outcome.report(&problem);
//! assert_eq!(report.routes.len(), 2);
//! assert_eq!(report.total_cost, 15.0);
//! ```

pub mod constructive;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod models;
pub mod solver;
