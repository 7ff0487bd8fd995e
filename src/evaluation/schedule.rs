//! Route timing.

/// A single timed visit within a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    /// Stop arena index.
    pub stop: usize,
    /// Arrival time at this stop.
    pub arrival_time: f64,
    /// Time spent waiting for the window to open.
    pub waiting_time: f64,
    /// Departure time (arrival + waiting + service duration).
    pub departure_time: f64,
    /// Cumulative load after this visit.
    pub load_after: u64,
}

/// Timing of one route, leaving its start location at time zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Visits in route order.
    pub visits: Vec<Visit>,
    /// Arrival time back at the end location. Zero for an empty route.
    pub duration: f64,
}
