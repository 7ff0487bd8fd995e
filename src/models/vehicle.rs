//! Vehicle type with capacity and depot assignment.

/// A delivery vehicle.
///
/// Start and end locations default to the problem depot when unset.
///
/// # Examples
///
/// ```
/// use u_lastmile::models::Vehicle;
///
/// let v = Vehicle::new(0, 200).with_end(4);
/// assert_eq!(v.id(), 0);
/// assert_eq!(v.capacity(), 200);
/// assert_eq!(v.start(), None);
/// assert_eq!(v.end(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: usize,
    capacity: u32,
    start: Option<usize>,
    end: Option<usize>,
    max_duration: Option<f64>,
    max_waiting: Option<f64>,
}

impl Vehicle {
    /// Creates a vehicle with the given ID and capacity.
    pub fn new(id: usize, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            start: None,
            end: None,
            max_duration: None,
            max_waiting: None,
        }
    }

    /// Sets the location the route starts from.
    pub fn with_start(mut self, location: usize) -> Self {
        self.start = Some(location);
        self
    }

    /// Sets the location the route returns to.
    pub fn with_end(mut self, location: usize) -> Self {
        self.end = Some(location);
        self
    }

    /// Sets maximum route duration.
    pub fn with_max_duration(mut self, max: f64) -> Self {
        self.max_duration = Some(max);
        self
    }

    /// Caps the time spent waiting for any single window to open.
    pub fn with_max_waiting(mut self, max: f64) -> Self {
        self.max_waiting = Some(max);
        self
    }

    /// Vehicle ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Maximum load capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Start location override.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// End location override.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Maximum duration limit, if any.
    pub fn max_duration(&self) -> Option<f64> {
        self.max_duration
    }

    /// Longest allowed wait at one stop, if any.
    pub fn max_waiting(&self) -> Option<f64> {
        self.max_waiting
    }
}
