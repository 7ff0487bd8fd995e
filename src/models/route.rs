//! Route type.

/// An ordered sequence of stops assigned to a single vehicle.
///
/// Stops are arena indices into the owning [`Problem`](super::Problem). The
/// vehicle's start and end locations are implicit and not stored. Load and
/// cost are cached and kept current by the construction heuristics and the
/// local search, which update them from incremental deltas.
///
/// # Examples
///
/// ```
/// use u_lastmile::models::Route;
///
/// let route = Route::new(2);
/// assert!(route.is_empty());
/// assert_eq!(route.vehicle(), 2);
/// assert_eq!(route.cost(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    vehicle: usize,
    stops: Vec<usize>,
    load: u64,
    cost: f64,
}

impl Route {
    /// Creates an empty route for the vehicle at arena index `vehicle`.
    pub fn new(vehicle: usize) -> Self {
        Self {
            vehicle,
            stops: Vec::new(),
            load: 0,
            cost: 0.0,
        }
    }

    pub(crate) fn from_parts(vehicle: usize, stops: Vec<usize>, load: u64, cost: f64) -> Self {
        Self {
            vehicle,
            stops,
            load,
            cost,
        }
    }

    /// Arena index of the vehicle serving this route.
    pub fn vehicle(&self) -> usize {
        self.vehicle
    }

    /// Stop indices in visit order.
    pub fn stops(&self) -> &[usize] {
        &self.stops
    }

    /// Number of stops (excluding start and end).
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if this route visits no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Cached summed demand.
    pub fn load(&self) -> u64 {
        self.load
    }

    /// Cached travel cost. Zero for an empty route.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub(crate) fn stops_mut(&mut self) -> &mut Vec<usize> {
        &mut self.stops
    }

    pub(crate) fn set_load(&mut self, load: u64) {
        self.load = load;
    }

    pub(crate) fn add_cost(&mut self, delta: f64) {
        self.cost += delta;
    }

    pub(crate) fn insert(&mut self, pos: usize, stop: usize, demand: u64, delta: f64) {
        self.stops.insert(pos, stop);
        self.load += demand;
        self.cost += delta;
    }
}
