//! Tabu local search engine.
//!
//! # Algorithm
//!
//! 1. Checkpoint: cancellation, time, iterations, stagnation
//! 2. Pick the best admissible move: a full scan, or a random sample with a
//!    confirming full scan when the sample holds no improvement
//! 3. Apply it if it improves; otherwise ask the [`AcceptanceRule`]
//! 4. Forbid the attributes the move destroyed for `tabu_tenure` iterations
//! 5. Record the best solution seen
//!
//! A tabu move is admissible only when it yields a new global best
//! (aspiration).
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search - Part I", *ORSA Journal on Computing* 1(3), 190-206.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::evaluation::{Evaluator, EPSILON};
use crate::models::{Problem, Solution};

use super::budget::{Budget, CancellationToken, SharedBound, Termination};
use super::config::{AcceptanceRule, SearchConfig};
use super::neighborhood::{Candidate, Scan};
use super::tabu::TabuList;

/// Iterations between tabu list purges.
const PURGE_INTERVAL: u64 = 64;

/// Result of one [`LocalSearch::improve`] run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best solution found.
    pub best: Solution,
    /// Its tracked cost.
    pub best_cost: f64,
    /// Iterations executed.
    pub iterations: u64,
    /// Why the run stopped.
    pub termination: Termination,
    /// Best cost after each iteration, starting with the initial cost.
    /// Non-increasing.
    pub best_cost_history: Vec<f64>,
}

/// What to do with a non-improving candidate.
enum Verdict {
    Accept,
    Reject,
    Stop,
}

/// Tabu search over relocate, swap, 2-opt and 2-opt* moves.
///
/// # Examples
///
/// ```
/// use u_lastmile::constructive::construct;
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::local_search::{Budget, LocalSearch, SearchConfig};
/// use u_lastmile::models::{Problem, Stop, Vehicle};
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0, 4.0],
///     vec![2.0, 0.0, 2.0, 3.0],
///     vec![3.0, 2.0, 0.0, 2.0],
///     vec![4.0, 3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)],
///     vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
///     0,
///     costs,
/// )
/// .unwrap();
///
/// let initial = construct(&problem).unwrap();
/// let start = initial.total_cost();
/// let outcome = LocalSearch::new(&problem, SearchConfig::default())
///     .improve(initial, &Budget::iterations(50));
/// assert!(outcome.best_cost <= start);
/// ```
pub struct LocalSearch<'a> {
    problem: &'a Problem,
    config: SearchConfig,
    cancel: Option<CancellationToken>,
    bound: Option<&'a SharedBound>,
}

impl<'a> LocalSearch<'a> {
    /// Creates an engine for `problem`.
    pub fn new(problem: &'a Problem, config: SearchConfig) -> Self {
        Self {
            problem,
            config,
            cancel: None,
            bound: None,
        }
    }

    /// Checks `token` at every iteration.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Publishes best costs to `bound` and prunes worsening moves that land
    /// too far above it.
    pub fn with_shared_bound(mut self, bound: &'a SharedBound) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Improves `initial` until the budget runs out or no admissible move
    /// remains. The returned best is never worse than `initial`.
    pub fn improve(&self, initial: Solution, budget: &Budget) -> SearchOutcome {
        let evaluator = Evaluator::new(self.problem);
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut tabu = TabuList::new(self.config.tabu_tenure);
        let mut temperature = match self.config.acceptance {
            AcceptanceRule::Annealing {
                initial_temperature,
                ..
            } => initial_temperature,
            AcceptanceRule::Threshold { .. } => 0.0,
        };

        let mut current = initial;
        let mut best = current.clone();
        let mut best_cost = current.total_cost();
        let mut history = vec![best_cost];
        let mut iteration: u64 = 0;
        let mut since_improvement: u64 = 0;
        if let Some(bound) = self.bound {
            bound.offer(best_cost);
        }

        let termination = loop {
            if let Some(reason) =
                budget.check(started, iteration, since_improvement, self.cancel.as_ref())
            {
                break reason;
            }

            let Some(Candidate { mv, delta }) =
                self.select(&evaluator, &current, &tabu, iteration, best_cost, &mut rng)
            else {
                break Termination::LocalOptimum;
            };

            let total = delta.total();
            let verdict = if total < -EPSILON {
                Verdict::Accept
            } else {
                self.judge(total, current.total_cost(), temperature, &mut rng)
            };

            match verdict {
                Verdict::Stop => break Termination::LocalOptimum,
                Verdict::Reject => {}
                Verdict::Accept => {
                    let departures = mv.departures(&current);
                    mv.apply_unchecked(&evaluator, &mut current, delta);
                    for attr in departures.into_iter().flatten() {
                        tabu.forbid(attr, iteration);
                    }
                    trace!(
                        iteration,
                        kind = mv.kind(),
                        delta = total,
                        cost = current.total_cost(),
                        "move applied"
                    );
                }
            }

            if current.total_cost() < best_cost - EPSILON {
                best = current.clone();
                best_cost = current.total_cost();
                since_improvement = 0;
                if let Some(bound) = self.bound {
                    bound.offer(best_cost);
                }
            } else {
                since_improvement += 1;
            }

            iteration += 1;
            history.push(best_cost);
            if let AcceptanceRule::Annealing { cooling_rate, .. } = self.config.acceptance {
                temperature *= cooling_rate;
            }
            if iteration % PURGE_INTERVAL == 0 {
                tabu.purge(iteration);
            }
        };

        debug!(
            iterations = iteration,
            best_cost,
            ?termination,
            tabu_tenure = tabu.tenure(),
            tabu_entries = tabu.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "local search finished"
        );

        SearchOutcome {
            best,
            best_cost,
            iterations: iteration,
            termination,
            best_cost_history: history,
        }
    }

    fn select(
        &self,
        evaluator: &Evaluator<'_>,
        current: &Solution,
        tabu: &TabuList,
        iteration: u64,
        best_cost: f64,
        rng: &mut StdRng,
    ) -> Option<Candidate> {
        if let Some(samples) = self.config.neighborhood_sample {
            let sampled = Scan::new(*evaluator, current, tabu, iteration, best_cost)
                .sampled(samples, rng);
            if sampled.is_some_and(|c| c.delta.total() < -EPSILON) {
                return sampled;
            }
        }
        Scan::new(*evaluator, current, tabu, iteration, best_cost).full()
    }

    /// Decides on a non-improving move with the given delta.
    ///
    /// `Stop` means no move of this iteration's neighborhood can pass,
    /// because the candidate is the least worsening one.
    fn judge(&self, delta: f64, current_cost: f64, temperature: f64, rng: &mut StdRng) -> Verdict {
        if let Some(bound) = self.bound {
            let limit = bound.get() * (1.0 + self.config.bound_slack);
            if delta > EPSILON && current_cost + delta > limit {
                return Verdict::Stop;
            }
        }
        match self.config.acceptance {
            AcceptanceRule::Threshold { max_worsening } => {
                if max_worsening > 0.0 && delta <= max_worsening * current_cost + EPSILON {
                    Verdict::Accept
                } else {
                    Verdict::Stop
                }
            }
            AcceptanceRule::Annealing {
                min_temperature, ..
            } => {
                if temperature < min_temperature {
                    return Verdict::Stop;
                }
                if delta <= EPSILON || rng.random::<f64>() < (-delta / temperature).exp() {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                }
            }
        }
    }
}
