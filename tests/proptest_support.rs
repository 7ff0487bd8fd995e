//! Proptest strategies for solver property tests.
//!
//! Generated instances are always constructible: every vehicle holds an
//! even share of the total demand plus the largest single demand, so greedy
//! insertion can never strand a stop.

use proptest::prelude::*;
use u_lastmile::distance::CostMatrix;
use u_lastmile::models::{Problem, Stop, Vehicle};

/// Largest generated demand.
pub const MAX_DEMAND: u32 = 5;

/// Strategy for a symmetric instance on an integer grid with Manhattan costs.
pub fn grid_problem_strategy(
    min_stops: usize,
    max_stops: usize,
) -> impl Strategy<Value = Problem> {
    (min_stops..=max_stops, 1_usize..=4).prop_flat_map(|(n, vehicles)| {
        (
            proptest::collection::vec((0_i32..20, 0_i32..20), n + 1),
            proptest::collection::vec(1_u32..=MAX_DEMAND, n),
            Just(vehicles),
        )
            .prop_map(|(points, demands, vehicles)| {
                let rows = points
                    .iter()
                    .map(|a| {
                        points
                            .iter()
                            .map(|b| f64::from((a.0 - b.0).abs() + (a.1 - b.1).abs()))
                            .collect()
                    })
                    .collect();
                let costs = CostMatrix::from_rows(rows).expect("square by construction");
                build(demands, vehicles, costs)
            })
    })
}

/// Strategy for an instance with an arbitrary asymmetric integer matrix.
pub fn asymmetric_problem_strategy(
    min_stops: usize,
    max_stops: usize,
) -> impl Strategy<Value = Problem> {
    (min_stops..=max_stops, 1_usize..=4).prop_flat_map(|(n, vehicles)| {
        (
            proptest::collection::vec(1_u32..30, (n + 1) * (n + 1)),
            proptest::collection::vec(1_u32..=MAX_DEMAND, n),
            Just(vehicles),
        )
            .prop_map(move |(cells, demands, vehicles)| {
                let size = n + 1;
                let data = cells
                    .iter()
                    .enumerate()
                    .map(|(k, &c)| if k / size == k % size { 0.0 } else { f64::from(c) })
                    .collect();
                let costs = CostMatrix::from_data(size, data).expect("size² entries");
                build(demands, vehicles, costs)
            })
    })
}

fn build(demands: Vec<u32>, vehicles: usize, costs: CostMatrix) -> Problem {
    let total: u32 = demands.iter().sum();
    let capacity = total.div_ceil(vehicles as u32) + MAX_DEMAND;
    let stops = demands
        .into_iter()
        .enumerate()
        .map(|(i, d)| Stop::new(100 + i, d, i + 1))
        .collect();
    let fleet = (0..vehicles).map(|v| Vehicle::new(v, capacity)).collect();
    Problem::build(stops, fleet, 0, costs).expect("generated instance is valid")
}
