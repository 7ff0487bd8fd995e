//! Error types for problem construction, initial assignment and solving.

use thiserror::Error;

use crate::evaluation::Violation;

/// Errors raised while building a [`Problem`](crate::models::Problem).
///
/// These describe bad input data. The caller must fix the instance; nothing
/// here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeasibilityError {
    /// The fleet has no vehicles.
    #[error("the fleet has no vehicles")]
    EmptyFleet,
    /// A vehicle has zero capacity.
    #[error("vehicle {vehicle_id} has zero capacity")]
    InvalidCapacity {
        /// Offending vehicle.
        vehicle_id: usize,
    },
    /// Two vehicles share an identifier.
    #[error("vehicle id {vehicle_id} appears more than once")]
    DuplicateVehicle {
        /// Repeated identifier.
        vehicle_id: usize,
    },
    /// The depot (or a vehicle's start/end location) is outside the matrix.
    #[error("depot location {location} is not covered by the cost matrix (size {matrix_size})")]
    UnreachableDepot {
        /// Location key that was referenced.
        location: usize,
        /// Number of locations in the matrix.
        matrix_size: usize,
    },
    /// The travel-time matrix does not match the cost matrix.
    #[error("travel-time matrix has {travel_times} locations, cost matrix has {costs}")]
    MatrixSizeMismatch {
        /// Locations in the cost matrix.
        costs: usize,
        /// Locations in the travel-time matrix.
        travel_times: usize,
    },
    /// Two stops share an identifier.
    #[error("stop id {stop_id} appears more than once")]
    DuplicateStop {
        /// Repeated identifier.
        stop_id: usize,
    },
    /// A stop has no usable cost-matrix entry.
    #[error("stop {stop_id} at location {location} has no cost-matrix entry")]
    UnreachableStop {
        /// Offending stop.
        stop_id: usize,
        /// Its location key.
        location: usize,
    },
    /// A stop's demand exceeds every vehicle's capacity.
    #[error("stop {stop_id} demands {demand} but the largest vehicle holds {max_capacity}")]
    OverCapacityStop {
        /// Offending stop.
        stop_id: usize,
        /// Its demand.
        demand: u32,
        /// Largest capacity in the fleet.
        max_capacity: u32,
    },
}

/// Errors raised by the construction heuristics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// No vehicle can take any of the remaining stops.
    #[error("{unassigned} stops unplaced: demand {remaining_demand}, capacity {total_capacity}")]
    InsufficientFleetCapacity {
        /// Stops left without a route.
        unassigned: usize,
        /// Their summed demand.
        remaining_demand: u64,
        /// Summed capacity of the whole fleet.
        total_capacity: u64,
    },
}

/// A search budget with neither a time nor an iteration limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Neither `time_budget_ms` nor `max_iterations` was given.
    #[error("a budget needs a time limit, an iteration limit, or both")]
    Unbounded,
}

/// Invalid solver or search settings.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// `parallel_restarts` must be at least 1.
    #[error("parallel_restarts must be at least 1")]
    NoRestarts,
    /// Threshold acceptance needs a finite, non-negative tolerance.
    #[error("max_worsening must be finite and non-negative, got {value}")]
    InvalidThreshold {
        /// Value supplied.
        value: f64,
    },
    /// Annealing parameters out of range.
    #[error("invalid annealing: temperature {temperature}, cooling rate {cooling_rate}")]
    InvalidAnnealing {
        /// Initial temperature supplied.
        temperature: f64,
        /// Cooling rate supplied.
        cooling_rate: f64,
    },
    /// Neighborhood sample size of zero.
    #[error("neighborhood_sample must be at least 1 when set")]
    EmptySample,
    /// Bound slack must be finite and non-negative.
    #[error("bound_slack must be finite and non-negative, got {value}")]
    InvalidBoundSlack {
        /// Value supplied.
        value: f64,
    },
}

/// Diagnostic state attached to [`SolveError::InternalInconsistency`].
#[derive(Debug, Clone, PartialEq)]
pub enum Inconsistency {
    /// The returned solution breaks one or more invariants.
    Violations(Vec<Violation>),
    /// Incrementally tracked cost disagrees with a from-scratch evaluation.
    CostDrift {
        /// Cost maintained through move deltas.
        tracked: f64,
        /// Cost recomputed by the evaluator.
        recomputed: f64,
    },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::Violations(violations) => {
                write!(f, "{} invariant violation(s)", violations.len())?;
                for v in violations {
                    write!(f, "; {v}")?;
                }
                Ok(())
            }
            Inconsistency::CostDrift {
                tracked,
                recomputed,
            } => write!(f, "tracked cost {tracked} but evaluator computed {recomputed}"),
        }
    }
}

/// Errors surfaced by the [`Solver`](crate::solver::Solver).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The instance was rejected while building the problem.
    #[error(transparent)]
    Feasibility(#[from] FeasibilityError),
    /// The solver settings were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No feasible initial assignment exists for this fleet.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    /// The solver produced a result the evaluator disagrees with. This is a bug.
    #[error("internal inconsistency: {detail}")]
    InternalInconsistency {
        /// What the evaluator found.
        detail: Inconsistency,
    },
}
