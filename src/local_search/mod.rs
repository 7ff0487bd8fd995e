//! Tabu local search for improving CVRP solutions.
//!
//! - [`Move`]: relocate, swap, 2-opt and 2-opt* (tail exchange), each with
//!   O(1) or O(segment) per-route cost deltas
//! - [`TabuList`]: attribute memory with aspiration by new global best
//! - [`LocalSearch`]: the search loop, driven by a [`Budget`]
//! - [`CancellationToken`] and [`SharedBound`]: cooperative stop and a
//!   cross-worker pruning hint

mod budget;
mod config;
mod engine;
mod moves;
mod neighborhood;
mod tabu;

pub use budget::{Budget, CancellationToken, SharedBound, Termination};
pub use config::{AcceptanceRule, SearchConfig};
pub use engine::{LocalSearch, SearchOutcome};
pub use moves::{Move, MoveDelta};
pub use tabu::{TabuAttribute, TabuList};

pub(crate) use neighborhood::shake;
