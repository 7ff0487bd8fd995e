//! Solve pipeline: construct, improve in parallel, validate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constructive::construct_with;
use crate::distance::CostMatrix;
use crate::error::{ConfigError, Inconsistency, SolveError};
use crate::evaluation::Evaluator;
use crate::local_search::{
    shake, Budget, CancellationToken, LocalSearch, SearchOutcome, SharedBound, Termination,
};
use crate::models::{Problem, Solution, SolutionReport, Stop, Vehicle};

use super::config::SolverConfig;

/// Relative tolerance between tracked and recomputed cost.
const COST_TOLERANCE: f64 = 1e-6;

/// Whether the run finished on its own or was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A budget limit or a local optimum ended the search.
    Completed,
    /// A [`CancellationToken`] fired; the solution is the best found so far.
    Cancelled,
}

/// A validated solution with run statistics.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Best solution over all workers.
    pub solution: Solution,
    /// Its total cost, confirmed by the evaluator.
    pub total_cost: f64,
    /// Completed or cancelled.
    pub status: SolveStatus,
    /// Why the winning worker stopped.
    pub termination: Termination,
    /// Iterations run by the winning worker.
    pub iterations: u64,
    /// Wall-clock time of the whole solve.
    pub elapsed: Duration,
    /// Index of the winning worker.
    pub worker: usize,
}

impl SolveOutcome {
    /// Plain-data view with caller identifiers.
    pub fn report(&self, problem: &Problem) -> SolutionReport {
        SolutionReport::new(&self.solution, problem)
    }
}

struct WorkerResult {
    worker: usize,
    ticket: usize,
    outcome: SearchOutcome,
}

/// CVRP solver: construction followed by tabu search with restarts.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::local_search::Budget;
/// use u_lastmile::models::{Problem, Stop, Vehicle};
/// use u_lastmile::solver::{SolveStatus, Solver, SolverConfig};
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
/// let solver = Solver::new(SolverConfig::new(Budget::iterations(100)).with_parallel_restarts(2));
/// let outcome = solver.solve(&problem).unwrap();
/// assert_eq!(outcome.status, SolveStatus::Completed);
/// assert_eq!(outcome.solution.num_served(), 3);
/// assert_eq!(outcome.total_cost, 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Creates a solver.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The solver's configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves `problem` within the configured budget.
    pub fn solve(&self, problem: &Problem) -> Result<SolveOutcome, SolveError> {
        self.run(problem, None)
    }

    /// Like [`solve`](Self::solve), but stops early when `token` fires and
    /// returns the best solution found so far.
    pub fn solve_with_cancel(
        &self,
        problem: &Problem,
        token: &CancellationToken,
    ) -> Result<SolveOutcome, SolveError> {
        self.run(problem, Some(token))
    }

    /// Builds the problem from its parts, then solves it.
    pub fn solve_parts(
        &self,
        stops: Vec<Stop>,
        vehicles: Vec<Vehicle>,
        depot: usize,
        costs: CostMatrix,
    ) -> Result<SolveOutcome, SolveError> {
        let problem = Problem::build(stops, vehicles, depot, costs)?;
        self.solve(&problem)
    }

    fn run(
        &self,
        problem: &Problem,
        cancel: Option<&CancellationToken>,
    ) -> Result<SolveOutcome, SolveError> {
        self.config.validate()?;
        let started = Instant::now();
        let restarts = self.config.parallel_restarts;
        info!(
            stops = problem.num_stops(),
            vehicles = problem.num_vehicles(),
            restarts,
            "solve started"
        );

        let initial = construct_with(problem, self.config.construction)?;
        check(problem, &initial)?;
        debug!(cost = initial.total_cost(), "initial assignment built");

        let tickets = AtomicUsize::new(0);
        let bound = SharedBound::new();
        let shared = self.config.share_bound.then_some(&bound);

        let results: Vec<WorkerResult> = if restarts == 1 {
            vec![self.work(problem, &initial, 0, cancel, shared, &tickets)]
        } else {
            (0..restarts)
                .into_par_iter()
                .map(|worker| self.work(problem, &initial, worker, cancel, shared, &tickets))
                .collect()
        };

        let cancelled = results
            .iter()
            .any(|r| r.outcome.termination == Termination::Cancelled);
        let winner = results
            .into_iter()
            .min_by(|a, b| {
                a.outcome
                    .best_cost
                    .total_cmp(&b.outcome.best_cost)
                    .then(a.ticket.cmp(&b.ticket))
            })
            .ok_or(ConfigError::NoRestarts)?;

        let total_cost = check(problem, &winner.outcome.best)?;
        let status = if cancelled {
            SolveStatus::Cancelled
        } else {
            SolveStatus::Completed
        };
        let elapsed = started.elapsed();
        info!(
            total_cost,
            worker = winner.worker,
            iterations = winner.outcome.iterations,
            ?status,
            elapsed_ms = elapsed.as_millis() as u64,
            "solve finished"
        );

        Ok(SolveOutcome {
            solution: winner.outcome.best,
            total_cost,
            status,
            termination: winner.outcome.termination,
            iterations: winner.outcome.iterations,
            elapsed,
            worker: winner.worker,
        })
    }

    fn work(
        &self,
        problem: &Problem,
        initial: &Solution,
        worker: usize,
        cancel: Option<&CancellationToken>,
        bound: Option<&SharedBound>,
        tickets: &AtomicUsize,
    ) -> WorkerResult {
        let config = self.config.search_config(worker);
        let mut start = initial.clone();
        if worker > 0 && self.config.shake_moves > 0 {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let applied = shake(
                &Evaluator::new(problem),
                &mut start,
                self.config.shake_moves,
                &mut rng,
            );
            debug!(worker, applied, cost = start.total_cost(), "restart shaken");
        }

        let mut engine = LocalSearch::new(problem, config);
        if let Some(token) = cancel {
            engine = engine.with_cancellation(token.clone());
        }
        if let Some(bound) = bound {
            engine = engine.with_shared_bound(bound);
        }
        let outcome = engine.improve(start, &self.config.budget);
        let ticket = tickets.fetch_add(1, Ordering::Relaxed);
        debug!(
            worker,
            ticket,
            cost = outcome.best_cost,
            iterations = outcome.iterations,
            termination = ?outcome.termination,
            "worker finished"
        );
        WorkerResult {
            worker,
            ticket,
            outcome,
        }
    }
}

/// Solves `problem` with default settings and the given budget.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
/// use u_lastmile::error::{ConstructionError, SolveError};
/// use u_lastmile::local_search::Budget;
/// use u_lastmile::models::{Problem, Stop, Vehicle};
/// use u_lastmile::solver::solve;
///
/// let costs = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0],
///     vec![2.0, 0.0, 2.0],
///     vec![3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let problem = Problem::build(
///     vec![Stop::new(1, 5, 1), Stop::new(2, 5, 2)],
///     vec![Vehicle::new(0, 5)],
///     0,
///     costs,
/// )
/// .unwrap();
///
/// let err = solve(&problem, Budget::iterations(10)).unwrap_err();
/// assert!(matches!(
///     err,
///     SolveError::Construction(ConstructionError::InsufficientFleetCapacity { .. })
/// ));
/// ```
pub fn solve(problem: &Problem, budget: Budget) -> Result<SolveOutcome, SolveError> {
    Solver::new(SolverConfig::new(budget)).solve(problem)
}

/// Confirms `solution` against the evaluator, returning its cost.
fn check(problem: &Problem, solution: &Solution) -> Result<f64, SolveError> {
    let evaluator = Evaluator::new(problem);
    let violations = evaluator.violations(solution);
    if !violations.is_empty() {
        return Err(SolveError::InternalInconsistency {
            detail: Inconsistency::Violations(violations),
        });
    }
    let tracked = solution.total_cost();
    let recomputed = evaluator.total_cost(solution);
    if (tracked - recomputed).abs() > COST_TOLERANCE * recomputed.abs().max(1.0) {
        return Err(SolveError::InternalInconsistency {
            detail: Inconsistency::CostDrift {
                tracked,
                recomputed,
            },
        });
    }
    Ok(recomputed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::ConstructionStrategy;
    use crate::error::{ConstructionError, FeasibilityError};
    use crate::evaluation::ViolationType;
    use crate::local_search::AcceptanceRule;
    use crate::models::TimeWindow;

    fn costs() -> CostMatrix {
        CostMatrix::from_rows(vec![
            vec![0.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.0, 2.0, 3.0],
            vec![3.0, 2.0, 0.0, 2.0],
            vec![4.0, 3.0, 2.0, 0.0],
        ])
        .expect("square")
    }

    fn three_stops() -> Problem {
        Problem::build(
            vec![Stop::new(1, 3, 1), Stop::new(2, 4, 2), Stop::new(3, 2, 3)],
            vec![Vehicle::new(0, 5), Vehicle::new(1, 5)],
            0,
            costs(),
        )
        .expect("valid")
    }

    /// Twelve stops on a 4×3 grid with Manhattan costs, depot in a corner.
    fn grid_problem() -> Problem {
        let points: Vec<(f64, f64)> = (0..13)
            .map(|i| match i {
                0 => (0.0, 0.0),
                _ => (((i - 1) % 4) as f64, ((i - 1) / 4 + 1) as f64),
            })
            .collect();
        let rows = points
            .iter()
            .map(|a| points.iter().map(|b| (a.0 - b.0).abs() + (a.1 - b.1).abs()).collect())
            .collect();
        let costs = CostMatrix::from_rows(rows).expect("square");
        Problem::build(
            (1..13).map(|i| Stop::new(i, 1 + (i as u32 % 4), i)).collect(),
            (0..4).map(|v| Vehicle::new(v, 10)).collect(),
            0,
            costs,
        )
        .expect("valid")
    }

    #[test]
    fn test_three_stop_example() {
        let p = three_stops();
        let outcome = solve(&p, Budget::iterations(50)).expect("solvable");
        let eval = Evaluator::new(&p);
        assert!(eval.is_feasible(&outcome.solution));
        // A and C share a vehicle, B rides alone: 9 + 6.
        assert!((outcome.total_cost - 15.0).abs() < 1e-9);
        let literal: f64 = outcome
            .solution
            .routes()
            .iter()
            .map(|r| {
                let mut locs = vec![0];
                locs.extend(r.stops().iter().map(|&s| p.stop_location(s)));
                locs.push(0);
                if r.is_empty() {
                    0.0
                } else {
                    locs.windows(2).map(|w| p.cost(w[0], w[1])).sum()
                }
            })
            .sum();
        assert_eq!(literal, outcome.total_cost);
    }

    #[test]
    fn test_insufficient_fleet_propagates() {
        let p = Problem::build(
            vec![Stop::new(1, 5, 1), Stop::new(2, 5, 2)],
            vec![Vehicle::new(0, 5)],
            0,
            costs(),
        )
        .expect("valid");
        let err = solve(&p, Budget::iterations(10)).unwrap_err();
        assert_eq!(
            err,
            SolveError::Construction(ConstructionError::InsufficientFleetCapacity {
                unassigned: 1,
                remaining_demand: 5,
                total_capacity: 5,
            })
        );
    }

    #[test]
    fn test_solve_parts_reports_feasibility() {
        let solver = Solver::new(SolverConfig::new(Budget::iterations(10)));
        let err = solver
            .solve_parts(vec![Stop::new(1, 9, 1)], vec![Vehicle::new(0, 5)], 0, costs())
            .unwrap_err();
        assert!(matches!(
            err,
            SolveError::Feasibility(FeasibilityError::OverCapacityStop { stop_id: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SolverConfig::new(Budget::iterations(10)).with_parallel_restarts(0);
        let solver = Solver::new(config);
        assert_eq!(
            solver.solve(&three_stops()).unwrap_err(),
            SolveError::Config(ConfigError::NoRestarts)
        );
    }

    #[test]
    fn test_check_accepts_consistent_solution() {
        let p = three_stops();
        let sol = Solution::from_stop_ids(&p, &[vec![1, 3], vec![2]]).expect("ids");
        assert_eq!(check(&p, &sol), Ok(15.0));
    }

    #[test]
    fn test_check_reports_cost_drift() {
        let p = three_stops();
        let mut sol = Solution::from_stop_ids(&p, &[vec![1, 3], vec![2]]).expect("ids");
        sol.add_cost(0.5);
        assert_eq!(
            check(&p, &sol),
            Err(SolveError::InternalInconsistency {
                detail: Inconsistency::CostDrift {
                    tracked: 15.5,
                    recomputed: 15.0,
                },
            })
        );
    }

    #[test]
    fn test_check_tolerates_rounding() {
        let p = three_stops();
        let mut sol = Solution::from_stop_ids(&p, &[vec![1, 3], vec![2]]).expect("ids");
        sol.add_cost(1e-9);
        assert!(check(&p, &sol).is_ok());
    }

    #[test]
    fn test_check_reports_violations() {
        let p = three_stops();
        let sol = Solution::from_indices(&p, vec![vec![0, 2], vec![0]]);
        let Err(SolveError::InternalInconsistency {
            detail: Inconsistency::Violations(violations),
        }) = check(&p, &sol)
        else {
            panic!("duplicated stop must be reported");
        };
        let kinds: Vec<&ViolationType> = violations.iter().map(|v| &v.kind).collect();
        assert!(kinds.contains(&&ViolationType::DuplicateStop {
            stop_id: 1,
            occurrences: 2,
        }));
        assert!(kinds.contains(&&ViolationType::MissingStop { stop_id: 2 }));
    }

    #[test]
    fn test_parallel_restarts_not_worse_than_single() {
        let p = grid_problem();
        let budget = Budget::iterations(150);
        let single = Solver::new(SolverConfig::new(budget))
            .solve(&p)
            .expect("solvable");
        let multi = Solver::new(SolverConfig::new(budget).with_parallel_restarts(4))
            .solve(&p)
            .expect("solvable");
        assert!(multi.total_cost <= single.total_cost + 1e-9);
        assert!(multi.worker < 4);
    }

    #[test]
    fn test_deterministic_single_worker() {
        let p = grid_problem();
        let config = SolverConfig::new(Budget::iterations(120))
            .with_random_seed(17)
            .with_neighborhood_sample(12);
        let a = Solver::new(config.clone()).solve(&p).expect("solvable");
        let b = Solver::new(config).solve(&p).expect("solvable");
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_cancelled_returns_best_so_far() {
        let p = grid_problem();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = Solver::new(SolverConfig::new(Budget::time_ms(10_000)))
            .solve_with_cancel(&p, &token)
            .expect("cancellation is not an error");
        assert_eq!(outcome.status, SolveStatus::Cancelled);
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.solution.num_served(), 12);
    }

    #[test]
    fn test_path_cheapest_arc_with_annealing() {
        let p = grid_problem();
        let config = SolverConfig::new(Budget::iterations(200))
            .with_construction(ConstructionStrategy::PathCheapestArc)
            .with_acceptance(AcceptanceRule::Annealing {
                initial_temperature: 3.0,
                cooling_rate: 0.97,
                min_temperature: 0.01,
            });
        let outcome = Solver::new(config).solve(&p).expect("solvable");
        assert!(Evaluator::new(&p).is_feasible(&outcome.solution));
    }

    #[test]
    fn test_shared_bound_stays_feasible() {
        let p = grid_problem();
        let config = SolverConfig::new(Budget::iterations(100))
            .with_parallel_restarts(3)
            .with_share_bound(true);
        let outcome = Solver::new(config).solve(&p).expect("solvable");
        assert!(Evaluator::new(&p).is_feasible(&outcome.solution));
    }

    #[test]
    fn test_time_windows_respected() {
        let tw = TimeWindow::new(0.0, 4.0).expect("valid");
        let p = Problem::build(
            vec![
                Stop::new(1, 1, 1),
                Stop::new(2, 1, 2),
                Stop::new(3, 1, 3).with_time_window(tw),
            ],
            vec![Vehicle::new(0, 10), Vehicle::new(1, 10)],
            0,
            costs(),
        )
        .expect("valid");
        let outcome = solve(&p, Budget::iterations(100)).expect("solvable");
        assert!(Evaluator::new(&p).is_feasible(&outcome.solution));
    }

    #[test]
    fn test_report_matches_outcome() {
        let p = three_stops();
        let outcome = solve(&p, Budget::iterations(20)).expect("solvable");
        let report = outcome.report(&p);
        assert!((report.total_cost - outcome.total_cost).abs() < 1e-9);
        let served: usize = report.routes.iter().map(|r| r.stop_ids.len()).sum();
        assert_eq!(served, 3);
    }
}
