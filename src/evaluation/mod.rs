//! Cost and feasibility evaluation.
//!
//! The [`Evaluator`] is the single source of truth for feasibility. It also
//! provides the O(1) insertion/removal deltas the heuristics build on, so no
//! caller ever needs to re-sum a whole solution to judge a move.

mod evaluator;
mod schedule;
mod violation;

pub use evaluator::{is_feasible, total_cost, Evaluator};
pub use schedule::{Schedule, Visit};
pub use violation::{Violation, ViolationType};

/// Absolute tolerance used when comparing costs and times.
pub(crate) const EPSILON: f64 = 1e-9;
