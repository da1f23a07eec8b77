//! Benchmarks of full solves on random constrained least-distance problems
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use proxopt_core::prelude::*;
use proxopt_solver::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

/// `dim`-dimensional projection onto `dim / 2` random half-spaces and one
/// random hyperplane.
fn build(dim: usize, seed: u64) -> (Arc<dyn Manifold<f64>>, Arc<Problem<f64>>, DVector<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(dim));
    let target = DVector::from_fn(dim, |_, _| rng.gen_range(-5.0..5.0));
    let cost: Arc<dyn CostFunction<f64>> =
        Arc::new(QuadraticDistanceCost::with_target(space.clone(), target).unwrap());

    let eq: Arc<dyn ResidualFunction<f64>> = Arc::new(
        LinearResidual::new(
            DMatrix::from_fn(1, dim, |_, _| rng.gen_range(-1.0..1.0)),
            DVector::from_element(1, 0.5),
        )
        .unwrap(),
    );
    let ineq: Arc<dyn ResidualFunction<f64>> = Arc::new(
        LinearResidual::new(
            DMatrix::from_fn(dim / 2, dim, |_, _| rng.gen_range(-1.0..1.0)),
            DVector::from_element(dim / 2, -1.0),
        )
        .unwrap(),
    );
    let problem = Problem::new(
        cost,
        vec![Constraint::equality(eq), Constraint::negative_orthant(ineq)],
    )
    .unwrap();
    (space, Arc::new(problem), DVector::zeros(dim))
}

fn benchmark_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");

    for &dim in &[4, 16, 64] {
        let (space, problem, x0) = build(dim, 42);
        let mut ws = Workspace::from_problem(&problem);
        let mut results = Results::from_problem(&problem);

        group.bench_with_input(BenchmarkId::new("violation_ratio", dim), &dim, |b, _| {
            let mut solver =
                Solver::new(space.clone(), problem.clone(), SolverConfig::default()).unwrap();
            b.iter(|| solver.solve(black_box(&mut ws), &mut results, black_box(&x0), None));
        });

        group.bench_with_input(BenchmarkId::new("bcl", dim), &dim, |b, _| {
            let config = SolverConfig::default()
                .with_penalty_update(PenaltyUpdate::Bcl(BclParams::default()));
            let mut solver = Solver::new(space.clone(), problem.clone(), config).unwrap();
            b.iter(|| solver.solve(black_box(&mut ws), &mut results, black_box(&x0), None));
        });
    }

    group.finish();
}

fn benchmark_merit(c: &mut Criterion) {
    let mut group = c.benchmark_group("merit_value");

    for &dim in &[16, 128] {
        let (_, problem, x0) = build(dim, 7);
        let lams = problem.zero_multipliers();
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |b, _| {
            b.iter(|| problem.merit_value(black_box(&x0), &lams, 10.0));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_solve, benchmark_merit);
criterion_main!(benches);
