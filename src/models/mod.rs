//! Domain model types for delivery routing.
//!
//! Stops and vehicles are stored in flat arenas inside an immutable
//! [`Problem`]; [`Route`] and [`Solution`] refer to them by index.

mod problem;
mod report;
mod route;
mod solution;
mod stop;
mod vehicle;

pub use problem::{Problem, ProblemBuilder};
pub use report::{RouteReport, SolutionReport, StopTiming};
pub use route::Route;
pub use solution::Solution;
pub use stop::{Stop, TimeWindow};
pub use vehicle::Vehicle;
