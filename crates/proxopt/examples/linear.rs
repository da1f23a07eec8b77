//! Projection of a random target onto a random line, first as an equality
//! then as an inequality constraint.
//!
//! Run with: cargo run --example linear

use proxopt::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

fn main() -> std::result::Result<(), SolverError> {
    tracing_subscriber::fmt::init();

    let mut rng = StdRng::seed_from_u64(12);
    let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));

    let a = DMatrix::from_fn(1, 2, |_, _| rng.gen_range(-1.0..1.0));
    let b = DVector::from_fn(1, |_, _| rng.gen_range(-1.0..1.0));
    let residual: Arc<dyn ResidualFunction<f64>> = Arc::new(LinearResidual::new(a, b)?);

    let target = DVector::from_fn(2, |_, _| rng.gen_range(-5.0..5.0));
    let cost: Arc<dyn CostFunction<f64>> =
        Arc::new(QuadraticDistanceCost::with_target(space.clone(), target.clone())?);
    println!("target: {}", target.transpose());

    let config = SolverConfig::default().with_verbose(VerboseLevel::Verbose);
    for constraint in [
        Constraint::equality(residual.clone()),
        Constraint::negative_orthant(residual.clone()),
    ] {
        let kind = constraint.kind();
        let problem = Arc::new(Problem::new(cost.clone(), vec![constraint])?);
        let mut workspace = Workspace::new(problem.nx(), problem.ndx(), &problem)?;
        let mut results = Results::new(problem.nx(), &problem)?;

        let history = HistoryCallback::new();
        let storage = history.storage();
        let mut solver = Solver::new(space.clone(), problem.clone(), config.clone())?;
        solver.register_callback(Box::new(history));

        // start from a feasible point
        let mut x0 = space.random_point(&mut rng);
        let r0 = residual.evaluate(&x0)?;
        if r0[0] > 0.0 {
            let row = residual.jacobian(&x0)?;
            x0 -= row.row(0).transpose() * ((r0[0] + 1.0) / row.norm_squared());
        }

        let flag = solver.solve(&mut workspace, &mut results, &x0, None)?;
        println!("{kind} constraint: {flag}");
        println!("{results}");
        println!("residual at solution: {}", residual.evaluate(&results.x_opt)?[0]);
        let recorded = storage.lock();
        for (k, (x, merit)) in recorded.xs.iter().zip(&recorded.merits).enumerate() {
            println!("  iter {k:>2}: x = [{:+.6}, {:+.6}], merit = {merit:.6e}", x[0], x[1]);
        }
    }
    Ok(())
}
