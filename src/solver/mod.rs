//! Solver facade.
//!
//! [`Solver::solve`] builds the initial assignment, improves it with
//! `parallel_restarts` independent tabu searches (rayon), keeps the cheapest
//! result and confirms it with the [`Evaluator`](crate::evaluation::Evaluator)
//! before returning.

mod config;
mod runner;

pub use config::SolverConfig;
pub use runner::{solve, SolveOutcome, SolveStatus, Solver};
