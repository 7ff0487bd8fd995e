//! Constructive heuristics for building the initial assignment.
//!
//! - [`cheapest_insertion`]: cached cheapest feasible insertion, the default
//! - [`path_cheapest_arc`]: greedy path extension per vehicle, O(n²)
//!
//! Both are deterministic and either place every stop or fail with
//! [`ConstructionError::InsufficientFleetCapacity`].

mod insertion;
mod path_cheapest_arc;

pub use insertion::cheapest_insertion;
pub use path_cheapest_arc::path_cheapest_arc;

use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;
use crate::models::{Problem, Solution};

/// Which constructive heuristic seeds the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStrategy {
    /// [`cheapest_insertion`].
    #[default]
    CheapestInsertion,
    /// [`path_cheapest_arc`].
    PathCheapestArc,
}

/// Builds the initial assignment with cheapest insertion.
pub fn construct(problem: &Problem) -> Result<Solution, ConstructionError> {
    construct_with(problem, ConstructionStrategy::CheapestInsertion)
}

/// Builds the initial assignment with the chosen heuristic.
pub fn construct_with(
    problem: &Problem,
    strategy: ConstructionStrategy,
) -> Result<Solution, ConstructionError> {
    match strategy {
        ConstructionStrategy::CheapestInsertion => cheapest_insertion(problem),
        ConstructionStrategy::PathCheapestArc => path_cheapest_arc(problem),
    }
}

/// Error for stops (arena indices) that no vehicle could take.
pub(crate) fn leftover_error(problem: &Problem, leftover: &[usize]) -> ConstructionError {
    ConstructionError::InsufficientFleetCapacity {
        unassigned: leftover.len(),
        remaining_demand: leftover.iter().map(|&s| problem.demand(s)).sum(),
        total_capacity: problem.total_capacity(),
    }
}
