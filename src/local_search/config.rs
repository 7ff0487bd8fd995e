//! Local search configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When a non-improving move may be applied.
///
/// Improving moves are always applied. Tabu moves are never applied as
/// worsening moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AcceptanceRule {
    /// Accept a worsening delta up to `max_worsening × current cost`.
    ///
    /// `0.0` gives a strict descent: sideways moves are refused too.
    Threshold {
        /// Relative tolerance, e.g. `0.02` for 2 %.
        max_worsening: f64,
    },
    /// Accept a worsening delta with probability `exp(-delta / T)`.
    ///
    /// `T` starts at `initial_temperature` and is multiplied by
    /// `cooling_rate` every iteration. Below `min_temperature` no worsening
    /// move is accepted.
    Annealing {
        /// Starting temperature.
        initial_temperature: f64,
        /// Geometric cooling factor in (0, 1).
        cooling_rate: f64,
        /// Temperature floor.
        min_temperature: f64,
    },
}

impl Default for AcceptanceRule {
    fn default() -> Self {
        AcceptanceRule::Threshold {
            max_worsening: 0.02,
        }
    }
}

impl AcceptanceRule {
    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            AcceptanceRule::Threshold { max_worsening } => {
                if !max_worsening.is_finite() || max_worsening < 0.0 {
                    return Err(ConfigError::InvalidThreshold {
                        value: max_worsening,
                    });
                }
            }
            AcceptanceRule::Annealing {
                initial_temperature,
                cooling_rate,
                min_temperature,
            } => {
                let temperature_ok = initial_temperature.is_finite()
                    && initial_temperature > 0.0
                    && min_temperature.is_finite()
                    && min_temperature >= 0.0;
                let cooling_ok = cooling_rate > 0.0 && cooling_rate < 1.0;
                if !temperature_ok || !cooling_ok {
                    return Err(ConfigError::InvalidAnnealing {
                        temperature: initial_temperature,
                        cooling_rate,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Parameters for one [`LocalSearch`](super::LocalSearch) run.
///
/// # Examples
///
/// ```
/// use u_lastmile::local_search::{AcceptanceRule, SearchConfig};
///
/// let config = SearchConfig::default()
///     .with_tabu_tenure(10)
///     .with_seed(7)
///     .with_acceptance(AcceptanceRule::Threshold { max_worsening: 0.05 });
/// assert_eq!(config.tabu_tenure, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Iterations a reversal attribute stays forbidden.
    pub tabu_tenure: usize,
    /// Rule for applying non-improving moves.
    pub acceptance: AcceptanceRule,
    /// Seed for sampling and annealing draws.
    pub seed: u64,
    /// Candidate moves drawn per iteration; `None` scans the full
    /// neighborhood every time.
    pub neighborhood_sample: Option<usize>,
    /// Relative slack over the shared bound beyond which worsening moves
    /// are pruned.
    pub bound_slack: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tabu_tenure: 7,
            acceptance: AcceptanceRule::default(),
            seed: 42,
            neighborhood_sample: None,
            bound_slack: 0.1,
        }
    }
}

impl SearchConfig {
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

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Samples `n` random moves per iteration instead of a full scan.
    pub fn with_neighborhood_sample(mut self, n: usize) -> Self {
        self.neighborhood_sample = Some(n);
        self
    }

    /// Sets the shared-bound slack.
    pub fn with_bound_slack(mut self, slack: f64) -> Self {
        self.bound_slack = slack;
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.acceptance.validate()?;
        if self.neighborhood_sample == Some(0) {
            return Err(ConfigError::EmptySample);
        }
        if !self.bound_slack.is_finite() || self.bound_slack < 0.0 {
            return Err(ConfigError::InvalidBoundSlack {
                value: self.bound_slack,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_annealing() {
        let rule = AcceptanceRule::Annealing {
            initial_temperature: 10.0,
            cooling_rate: 1.5,
            min_temperature: 0.01,
        };
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::InvalidAnnealing { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_sample() {
        let config = SearchConfig::default().with_neighborhood_sample(0);
        assert_eq!(config.validate(), Err(ConfigError::EmptySample));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = SearchConfig::default().with_acceptance(AcceptanceRule::Threshold {
            max_worsening: -0.1,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_acceptance_serde_tagged() {
        let json = r#"{
            "rule": "annealing",
            "initial_temperature": 5.0,
            "cooling_rate": 0.99,
            "min_temperature": 0.001
        }"#;
        let rule: AcceptanceRule = serde_json::from_str(json).expect("de");
        assert!(matches!(rule, AcceptanceRule::Annealing { .. }));
        assert!(rule.validate().is_ok());
    }
}
