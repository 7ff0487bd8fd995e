//! Constraint violation types.

use std::fmt;

/// A type of invariant violation in a solution.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// The solution does not hold exactly one route per vehicle.
    RouteCountMismatch {
        /// Fleet size.
        expected: usize,
        /// Routes present.
        actual: usize,
    },
    /// A route claims a different vehicle than its slot.
    VehicleMismatch {
        /// Route slot.
        route_index: usize,
        /// Vehicle index stored on the route.
        vehicle: usize,
    },
    /// A route refers to a stop index outside the problem.
    UnknownStop {
        /// Route slot.
        route_index: usize,
        /// Offending arena index.
        stop_index: usize,
    },
    /// A stop is on no route.
    MissingStop {
        /// Stop identifier.
        stop_id: usize,
    },
    /// A stop is on more than one route, or twice on one.
    DuplicateStop {
        /// Stop identifier.
        stop_id: usize,
        /// How many times it was seen.
        occurrences: usize,
    },
    /// Vehicle capacity exceeded.
    CapacityExceeded {
        /// Route index in the solution.
        route_index: usize,
        /// Load that exceeded capacity.
        load: u64,
        /// Vehicle capacity.
        capacity: u64,
    },
    /// Arrival after the stop's time window closes.
    TimeWindowViolated {
        /// Stop identifier.
        stop_id: usize,
        /// Actual arrival time.
        arrival: f64,
        /// Time window due date.
        due: f64,
    },
    /// The vehicle waited longer than it may for a window to open.
    WaitingExceeded {
        /// Stop identifier.
        stop_id: usize,
        /// Actual wait.
        waiting: f64,
        /// Longest allowed wait.
        max_waiting: f64,
    },
    /// Route duration exceeds vehicle's maximum.
    MaxDurationExceeded {
        /// Route index.
        route_index: usize,
        /// Actual duration.
        duration: f64,
        /// Maximum allowed duration.
        max_duration: f64,
    },
}

/// A constraint violation in a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationType::RouteCountMismatch { expected, actual } => {
                write!(f, "{actual} routes for {expected} vehicles")
            }
            ViolationType::VehicleMismatch {
                route_index,
                vehicle,
            } => write!(f, "route {route_index} is tagged with vehicle {vehicle}"),
            ViolationType::UnknownStop {
                route_index,
                stop_index,
            } => write!(f, "route {route_index} visits unknown stop index {stop_index}"),
            ViolationType::MissingStop { stop_id } => write!(f, "stop {stop_id} is not routed"),
            ViolationType::DuplicateStop {
                stop_id,
                occurrences,
            } => write!(f, "stop {stop_id} is routed {occurrences} times"),
            ViolationType::CapacityExceeded {
                route_index,
                load,
                capacity,
            } => write!(f, "route {route_index} carries {load} > capacity {capacity}"),
            ViolationType::TimeWindowViolated {
                stop_id,
                arrival,
                due,
            } => write!(f, "stop {stop_id} reached at {arrival} after due {due}"),
            ViolationType::WaitingExceeded {
                stop_id,
                waiting,
                max_waiting,
            } => write!(f, "stop {stop_id} waits {waiting} > {max_waiting}"),
            ViolationType::MaxDurationExceeded {
                route_index,
                duration,
                max_duration,
            } => write!(f, "route {route_index} lasts {duration} > {max_duration}"),
        }
    }
}
