//! The facade prelude is enough to state and solve a problem.

use approx::assert_relative_eq;
use proxopt::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;

#[test]
fn test_random_start_on_equality_line() {
    let mut rng = StdRng::seed_from_u64(3);
    let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
    let cost: Arc<dyn CostFunction<f64>> = Arc::new(
        QuadraticDistanceCost::with_target(space.clone(), DVector::from_vec(vec![-3.0, 8.0])).unwrap(),
    );
    // 2·x₀ − x₁ + 1 = 0
    let line: Arc<dyn ResidualFunction<f64>> = Arc::new(
        LinearResidual::new(
            DMatrix::from_row_slice(1, 2, &[2.0, -1.0]),
            DVector::from_vec(vec![1.0]),
        )
        .unwrap(),
    );
    let problem = Arc::new(Problem::new(cost, vec![Constraint::equality(line.clone())]).unwrap());

    let mut ws = Workspace::new(2, 2, &problem).unwrap();
    let mut results = Results::new(2, &problem).unwrap();
    let mut solver = Solver::new(space.clone(), problem, SolverConfig::default()).unwrap();
    let x0 = space.random_point(&mut rng);
    let flag = solver.solve(&mut ws, &mut results, &x0, None).unwrap();

    assert_eq!(flag, ConvergenceFlag::Success);
    assert!(line.evaluate(&results.x_opt).unwrap()[0].abs() <= 1e-6);
    // x̄ − aᵀ(a·x̄ + b)/‖a‖² with a·x̄ + b = −13
    assert_relative_eq!(results.x_opt[0], -3.0 + 2.0 * 13.0 / 5.0, epsilon = 1e-5);
    assert_relative_eq!(results.x_opt[1], 8.0 - 13.0 / 5.0, epsilon = 1e-5);
}
