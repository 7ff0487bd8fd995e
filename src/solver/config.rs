//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::constructive::ConstructionStrategy;
use crate::error::ConfigError;
use crate::local_search::{AcceptanceRule, Budget, SearchConfig};

/// Configuration for [`Solver`](super::Solver).
///
/// Only the budget is required; everything else has a default.
///
/// # Examples
///
/// ```
/// use u_lastmile::local_search::Budget;
/// use u_lastmile::solver::SolverConfig;
///
/// let config = SolverConfig::new(Budget::iterations(1_000))
///     .with_parallel_restarts(4)
///     .with_random_seed(7);
/// assert_eq!(config.parallel_restarts, 4);
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserialising requires a budget with at least one limit:
///
/// ```
/// use u_lastmile::solver::SolverConfig;
///
/// let ok: Result<SolverConfig, _> =
///     serde_json::from_str(r#"{"budget": {"time_budget_ms": 500}, "tabu_tenure": 9}"#);
/// assert_eq!(ok.unwrap().tabu_tenure, 9);
///
/// let unbounded: Result<SolverConfig, _> = serde_json::from_str(r#"{"budget": {}}"#);
/// assert!(unbounded.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Search budget applied to every worker.
    pub budget: Budget,
    /// Iterations a move attribute stays tabu.
    #[serde(default = "default_tabu_tenure")]
    pub tabu_tenure: usize,
    /// Rule for applying non-improving moves.
    #[serde(default)]
    pub acceptance: AcceptanceRule,
    /// Base seed; worker `k` uses `random_seed + k`.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// Number of independent search workers.
    #[serde(default = "default_parallel_restarts")]
    pub parallel_restarts: usize,
    /// Heuristic for the initial assignment.
    #[serde(default)]
    pub construction: ConstructionStrategy,
    /// Moves sampled per iteration; `None` scans the full neighborhood.
    #[serde(default)]
    pub neighborhood_sample: Option<usize>,
    /// Share the best cost across workers as a pruning hint.
    ///
    /// Results then depend on thread timing.
    #[serde(default)]
    pub share_bound: bool,
    /// Random moves applied to the initial solution of workers `k > 0`.
    #[serde(default = "default_shake_moves")]
    pub shake_moves: usize,
    /// Relative slack over the shared bound before worsening moves are
    /// pruned.
    #[serde(default = "default_bound_slack")]
    pub bound_slack: f64,
}

fn default_tabu_tenure() -> usize {
    7
}

fn default_random_seed() -> u64 {
    42
}

fn default_parallel_restarts() -> usize {
    1
}

fn default_shake_moves() -> usize {
    10
}

fn default_bound_slack() -> f64 {
    0.1
}

impl SolverConfig {
    /// Default configuration with the given budget.
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            tabu_tenure: default_tabu_tenure(),
            acceptance: AcceptanceRule::default(),
            random_seed: default_random_seed(),
            parallel_restarts: default_parallel_restarts(),
            construction: ConstructionStrategy::default(),
            neighborhood_sample: None,
            share_bound: false,
            shake_moves: default_shake_moves(),
            bound_slack: default_bound_slack(),
        }
    }

    /// Sets the budget.
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the tabu tenure.
    pub fn with_tabu_tenure(mut self, tenure: usize) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    /// Sets the acceptance rule.
    pub fn with_acceptance(mut self, rule: AcceptanceRule) -> Self {
        self.acceptance = rule;
        self
    }

    /// Sets the base random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Sets the number of workers.
    pub fn with_parallel_restarts(mut self, n: usize) -> Self {
        self.parallel_restarts = n;
        self
    }

    /// Sets the construction heuristic.
    pub fn with_construction(mut self, strategy: ConstructionStrategy) -> Self {
        self.construction = strategy;
        self
    }

    /// Samples `n` moves per iteration.
    pub fn with_neighborhood_sample(mut self, n: usize) -> Self {
        self.neighborhood_sample = Some(n);
        self
    }

    /// Enables or disables the shared bound.
    pub fn with_share_bound(mut self, share: bool) -> Self {
        self.share_bound = share;
        self
    }

    /// Sets how many random moves perturb restarts.
    pub fn with_shake_moves(mut self, n: usize) -> Self {
        self.shake_moves = n;
        self
    }

    /// Sets the shared-bound slack.
    pub fn with_bound_slack(mut self, slack: f64) -> Self {
        self.bound_slack = slack;
        self
    }

    /// Checks every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel_restarts == 0 {
            return Err(ConfigError::NoRestarts);
        }
        self.search_config(0).validate()
    }

    /// Search settings for worker `worker`.
    pub fn search_config(&self, worker: usize) -> SearchConfig {
        SearchConfig {
            tabu_tenure: self.tabu_tenure,
            acceptance: self.acceptance,
            seed: self.random_seed.wrapping_add(worker as u64),
            neighborhood_sample: self.neighborhood_sample,
            bound_slack: self.bound_slack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_seeds() {
        let config = SolverConfig::new(Budget::iterations(10)).with_random_seed(100);
        assert_eq!(config.search_config(0).seed, 100);
        assert_eq!(config.search_config(3).seed, 103);
    }

    #[test]
    fn test_rejects_zero_restarts() {
        let config = SolverConfig::new(Budget::iterations(10)).with_parallel_restarts(0);
        assert_eq!(config.validate(), Err(ConfigError::NoRestarts));
    }

    #[test]
    fn test_serde_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"budget": {"max_iterations": 20}}"#).expect("valid");
        assert_eq!(config, SolverConfig::new(Budget::iterations(20)));
    }

    #[test]
    fn test_serde_roundtrip_with_overrides() {
        let config = SolverConfig::new(Budget::time_ms(300))
            .with_construction(ConstructionStrategy::PathCheapestArc)
            .with_share_bound(true)
            .with_neighborhood_sample(16);
        let json = serde_json::to_string(&config).expect("ser");
        let back: SolverConfig = serde_json::from_str(&json).expect("de");
        assert_eq!(back, config);
    }
}
