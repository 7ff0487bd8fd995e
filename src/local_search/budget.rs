//! Search budget, cooperative cancellation and the cross-worker bound.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

/// Limits on one search run. Whichever limit fires first ends the run.
///
/// No `Default`. Deserialising a budget with neither a time nor an
/// iteration limit fails with [`BudgetError::Unbounded`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_lastmile::local_search::Budget;
///
/// let budget = Budget::iterations(500).with_time_limit(Duration::from_millis(200));
/// assert_eq!(budget.max_iterations(), Some(500));
///
/// assert!(Budget::from_limits(None, None).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BudgetRepr", into = "BudgetRepr")]
pub struct Budget {
    time_limit: Option<Duration>,
    max_iterations: Option<u64>,
    stagnation_limit: Option<u64>,
}

impl Budget {
    /// Iteration-bounded budget. Runs with such a budget are reproducible.
    pub fn iterations(max_iterations: u64) -> Self {
        Self {
            time_limit: None,
            max_iterations: Some(max_iterations),
            stagnation_limit: None,
        }
    }

    /// Wall-clock budget.
    pub fn time(limit: Duration) -> Self {
        Self {
            time_limit: Some(limit),
            max_iterations: None,
            stagnation_limit: None,
        }
    }

    /// Wall-clock budget in milliseconds.
    pub fn time_ms(ms: u64) -> Self {
        Self::time(Duration::from_millis(ms))
    }

    /// Budget from optional limits; at least one must be present.
    pub fn from_limits(
        time_budget_ms: Option<u64>,
        max_iterations: Option<u64>,
    ) -> Result<Self, BudgetError> {
        match (time_budget_ms, max_iterations) {
            (None, None) => Err(BudgetError::Unbounded),
            (time, iters) => Ok(Self {
                time_limit: time.map(Duration::from_millis),
                max_iterations: iters,
                stagnation_limit: None,
            }),
        }
    }

    /// Adds or replaces the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Adds or replaces the iteration limit.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Stops after `n` consecutive iterations without a new best.
    pub fn with_stagnation_limit(mut self, n: u64) -> Self {
        self.stagnation_limit = Some(n);
        self
    }

    /// Wall-clock limit, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Iteration limit, if any.
    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    /// Stagnation limit, if any.
    pub fn stagnation_limit(&self) -> Option<u64> {
        self.stagnation_limit
    }

    /// Checkpoint run at the top of every iteration.
    ///
    /// Checked in order: cancellation, time, iterations, stagnation.
    pub(crate) fn check(
        &self,
        started: Instant,
        iterations: u64,
        since_improvement: u64,
        cancel: Option<&CancellationToken>,
    ) -> Option<Termination> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Some(Termination::Cancelled);
        }
        if self.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
            return Some(Termination::TimeLimit);
        }
        if self.max_iterations.is_some_and(|max| iterations >= max) {
            return Some(Termination::IterationLimit);
        }
        if self.stagnation_limit.is_some_and(|max| since_improvement >= max) {
            return Some(Termination::Stagnation);
        }
        None
    }
}

/// Wire form of [`Budget`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BudgetRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_budget_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stagnation_limit: Option<u64>,
}

impl TryFrom<BudgetRepr> for Budget {
    type Error = BudgetError;

    fn try_from(repr: BudgetRepr) -> Result<Self, Self::Error> {
        let budget = Budget::from_limits(repr.time_budget_ms, repr.max_iterations)?;
        Ok(Budget {
            stagnation_limit: repr.stagnation_limit,
            ..budget
        })
    }
}

impl From<Budget> for BudgetRepr {
    fn from(budget: Budget) -> Self {
        BudgetRepr {
            time_budget_ms: budget
                .time_limit
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            max_iterations: budget.max_iterations,
            stagnation_limit: budget.stagnation_limit,
        }
    }
}

/// Why a search run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The iteration limit was reached.
    IterationLimit,
    /// The wall-clock limit was reached.
    TimeLimit,
    /// A [`CancellationToken`] fired.
    Cancelled,
    /// No admissible move remained.
    LocalOptimum,
    /// Too many iterations passed without a new best.
    Stagnation,
}

/// Cooperative cancellation flag, checked once per iteration.
///
/// # Examples
///
/// ```
/// use u_lastmile::local_search::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Best cost seen by any worker, shared as a pruning hint.
///
/// Stored as `f64` bits. Relaxed ordering is enough: a stale read only
/// makes pruning less aggressive.
#[derive(Debug)]
pub struct SharedBound {
    bits: AtomicU64,
}

impl SharedBound {
    /// Creates a bound at `+∞`.
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    /// Current bound.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Lowers the bound to `cost` if it is better.
    pub fn offer(&self, cost: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        while cost < f64::from_bits(current) {
            match self.bits.compare_exchange_weak(
                current,
                cost.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for SharedBound {
    fn default() -> Self {
        Self::new()
    }
}
