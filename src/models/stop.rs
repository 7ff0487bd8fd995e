//! Delivery stops and time windows.

use crate::evaluation::EPSILON;

/// A time window constraint for service at a stop.
///
/// The vehicle must arrive no later than `due` and may arrive as early as
/// `ready` (waiting is allowed if early).
///
/// # Examples
///
/// ```
/// use u_lastmile::models::TimeWindow;
///
/// let tw = TimeWindow::new(100.0, 200.0).unwrap();
/// assert!(tw.ready() <= tw.due());
/// assert_eq!(tw.waiting_time(40.0), 60.0);
/// assert!(tw.is_violated(250.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    ready: f64,
    due: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `ready > due` or either value is non-finite.
    pub fn new(ready: f64, due: f64) -> Option<Self> {
        if !ready.is_finite() || !due.is_finite() || ready > due {
            return None;
        }
        Some(Self { ready, due })
    }

    /// Earliest allowable service start.
    pub fn ready(&self) -> f64 {
        self.ready
    }

    /// Latest allowable arrival time.
    pub fn due(&self) -> f64 {
        self.due
    }

    /// Returns the waiting time if arriving at the given time.
    ///
    /// Zero if the vehicle arrives within or after the window.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        if arrival < self.ready {
            self.ready - arrival
        } else {
            0.0
        }
    }

    /// Returns `true` if arriving at the given time violates this window,
    /// within the evaluator's tolerance.
    pub fn is_violated(&self, arrival: f64) -> bool {
        arrival > self.due + EPSILON
    }
}

/// A delivery stop.
///
/// The location is an opaque key into the problem's cost matrix. Service
/// duration and time window only matter when the problem carries time
/// constraints; plain CVRP instances leave them at their defaults.
///
/// # Examples
///
/// ```
/// use u_lastmile::models::Stop;
///
/// let s = Stop::new(17, 4, 3);
/// assert_eq!(s.id(), 17);
/// assert_eq!(s.demand(), 4);
/// assert_eq!(s.location(), 3);
/// assert!(s.time_window().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    id: usize,
    demand: u32,
    location: usize,
    service_duration: f64,
    time_window: Option<TimeWindow>,
}

impl Stop {
    /// Creates a stop with the given identifier, demand and location key.
    pub fn new(id: usize, demand: u32, location: usize) -> Self {
        Self {
            id,
            demand,
            location,
            service_duration: 0.0,
            time_window: None,
        }
    }

    /// Sets the time spent servicing this stop.
    pub fn with_service_duration(mut self, duration: f64) -> Self {
        self.service_duration = duration;
        self
    }

    /// Sets a time window for this stop.
    pub fn with_time_window(mut self, tw: TimeWindow) -> Self {
        self.time_window = Some(tw);
        self
    }

    /// Caller-supplied identifier.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Units delivered at this stop.
    pub fn demand(&self) -> u32 {
        self.demand
    }

    /// Location key into the cost matrix.
    pub fn location(&self) -> usize {
        self.location
    }

    /// Service duration at this stop.
    pub fn service_duration(&self) -> f64 {
        self.service_duration
    }

    /// Time window constraint, if any.
    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }
}
