//! Integration tests for residuals, costs and problems.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use proxopt_core::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;

fn random_affine(rng: &mut StdRng, nr: usize, nx: usize) -> LinearResidual<f64> {
    let space = EuclideanSpace::new(nr * nx + nr);
    let coeffs: DVector<f64> = space.random_point(rng);
    let a = DMatrix::from_row_slice(nr, nx, &coeffs.as_slice()[..nr * nx]);
    let b = DVector::from_column_slice(&coeffs.as_slice()[nr * nx..]);
    LinearResidual::new(a, b).unwrap()
}

#[test]
fn test_affine_residual_vanishes_at_least_squares_solution() {
    let mut rng = StdRng::seed_from_u64(42);
    for nr in 1..=3 {
        let res = random_affine(&mut rng, nr, 3);
        let a = res.matrix().clone();
        let b = res.offset().clone();

        // Minimum-norm solution of A x = -b through the normal equations.
        let gram = &a * a.transpose();
        let y = gram.cholesky().unwrap().solve(&(-&b));
        let x = a.transpose() * y;

        let r = res.evaluate(&x).unwrap();
        assert!(r.amax() < 1e-10, "residual {r}");
        assert_eq!(res.jacobian(&x).unwrap(), a);
        assert_eq!(res.jacobian(&DVector::zeros(3)).unwrap(), a);
    }
}

#[test]
fn test_quadratic_distance_gradient_and_hessian() {
    let mut rng = StdRng::seed_from_u64(3);
    let space = EuclideanSpace::new(3);
    let manifold: Arc<dyn Manifold<f64>> = Arc::new(space);

    let target: DVector<f64> = space.random_point(&mut rng);
    let l = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.5, 2.0, 0.0, -0.3, 0.1, 1.5]);
    let weights = &l * l.transpose();
    let cost = QuadraticDistanceCost::new(manifold, target.clone(), weights.clone()).unwrap();

    for _ in 0..5 {
        let x: DVector<f64> = space.random_point(&mut rng);
        let expected = &weights * (&x - &target);
        assert_relative_eq!(cost.gradient(&x).unwrap(), expected, epsilon = 1e-12);
        assert_eq!(cost.hessian(&x).unwrap(), weights);

        let (ok, err) = DerivativeChecker::check_gradient::<f64>(&cost, &space, &x, 1e-6).unwrap();
        assert!(ok, "gradient error {err}");
    }
}

#[test]
fn test_state_residual_jacobian_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(11);
    let space = EuclideanSpace::new(4);
    let manifold: Arc<dyn Manifold<f64>> = Arc::new(space);
    let res = StateResidual::new(manifold, space.random_point(&mut rng)).unwrap();
    let x: DVector<f64> = space.random_point(&mut rng);
    let (ok, err) = DerivativeChecker::check_jacobian::<f64>(&res, &space, &x, 1e-6).unwrap();
    assert!(ok, "jacobian error {err}");
}

#[test]
fn test_problem_with_mixed_constraints() {
    let mut rng = StdRng::seed_from_u64(5);
    let space = EuclideanSpace::new(3);
    let manifold: Arc<dyn Manifold<f64>> = Arc::new(space);
    let cost: Arc<dyn CostFunction<f64>> =
        Arc::new(QuadraticDistanceCost::at_neutral(manifold).unwrap());

    let eq: Arc<dyn ResidualFunction<f64>> = Arc::new(random_affine(&mut rng, 2, 3));
    let ineq: Arc<dyn ResidualFunction<f64>> = Arc::new(random_affine(&mut rng, 1, 3));
    let bounds: Arc<dyn ResidualFunction<f64>> =
        Arc::new(LinearResidual::from_matrix(DMatrix::identity(3, 3)).unwrap());

    let problem = Problem::new(
        cost,
        vec![
            Constraint::equality(eq),
            Constraint::negative_orthant(ineq),
            Constraint::boxed(bounds, DVector::repeat(3, -1.0), DVector::repeat(3, 1.0)).unwrap(),
        ],
    )
    .unwrap();

    assert_eq!(problem.total_constraint_dim(), 6);
    assert_eq!(
        (0..3).map(|i| problem.index(i)).collect::<Vec<_>>(),
        vec![0, 2, 3]
    );

    let x: DVector<f64> = space.random_point(&mut rng);
    let mut values = problem.zero_multipliers();
    problem.evaluate_constraints(&x, &mut values).unwrap();
    let mut jacs: Vec<DMatrix<f64>> = (0..3)
        .map(|i| DMatrix::zeros(problem.constraint_dim(i), 3))
        .collect();
    problem.compute_constraint_jacobians(&x, &mut jacs).unwrap();
    assert_eq!(jacs[2], DMatrix::identity(3, 3));
    assert_eq!(values[2], x);

    // With zero multipliers the merit is the cost plus half the squared
    // normal-cone parts scaled by the penalty.
    let mu = 7.0;
    let mut expected = problem.cost().evaluate(&x).unwrap();
    for (constraint, value) in problem.constraints().iter().zip(&values) {
        expected += 0.5 * mu * constraint.set().normal_cone_projection(value).norm_squared();
    }
    assert_relative_eq!(
        problem.merit_value(&x, &problem.zero_multipliers(), mu).unwrap(),
        expected,
        epsilon = 1e-10
    );
}
