//! Callback registry, history recording and logging output.

use approx::assert_relative_eq;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proxopt_core::prelude::*;
use proxopt_solver::prelude::*;
use std::sync::Arc;

fn equality_problem() -> (Arc<dyn Manifold<f64>>, Arc<Problem<f64>>) {
    let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
    let cost: Arc<dyn CostFunction<f64>> = Arc::new(
        QuadraticDistanceCost::with_target(space.clone(), DVector::from_vec(vec![4.0, -1.0])).unwrap(),
    );
    // 0.5·x₀ + 2·x₁ − 1 = 0
    let res: Arc<dyn ResidualFunction<f64>> = Arc::new(
        LinearResidual::new(
            DMatrix::from_row_slice(1, 2, &[0.5, 2.0]),
            DVector::from_vec(vec![-1.0]),
        )
        .unwrap(),
    );
    let problem = Problem::new(cost, vec![Constraint::equality(res)]).unwrap();
    (space, Arc::new(problem))
}

/// Records its id in a shared log on every call.
struct Tagged {
    id: usize,
    log: Arc<Mutex<Vec<usize>>>,
}

impl Callback<f64> for Tagged {
    fn call(&mut self, _workspace: &Workspace<f64>, _results: &Results<f64>) {
        self.log.lock().push(self.id);
    }
}

/// Checks the iterate handed to callbacks against the results.
struct Consistency {
    calls: Arc<Mutex<usize>>,
}

impl Callback<f64> for Consistency {
    fn call(&mut self, workspace: &Workspace<f64>, results: &Results<f64>) {
        let mut calls = self.calls.lock();
        *calls += 1;
        assert_eq!(results.num_iters, *calls);
        assert_eq!(workspace.x(), &results.x_opt);
        assert_eq!(workspace.prim_infeas(), results.prim_infeas);
        assert_eq!(workspace.mu(), results.mu);
    }
}

#[test]
fn test_callbacks_run_in_registration_order() {
    let (space, problem) = equality_problem();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut solver = Solver::new(space, problem.clone(), SolverConfig::default()).unwrap();
    solver.register_callback(Box::new(Tagged { id: 0, log: log.clone() }));
    solver.register_callback(Box::new(Tagged { id: 1, log: log.clone() }));
    assert_eq!(solver.num_callbacks(), 2);

    let mut ws = Workspace::from_problem(&problem);
    let mut results = Results::from_problem(&problem);
    solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();

    let expected: Vec<usize> = (0..results.num_iters).flat_map(|_| [0, 1]).collect();
    assert_eq!(*log.lock(), expected);
}

#[test]
fn test_clear_callbacks() {
    let (space, problem) = equality_problem();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut solver = Solver::new(space, problem.clone(), SolverConfig::default()).unwrap();
    solver.register_callback(Box::new(Tagged { id: 7, log: log.clone() }));
    solver.clear_callbacks();
    assert_eq!(solver.num_callbacks(), 0);

    let mut ws = Workspace::from_problem(&problem);
    let mut results = Results::from_problem(&problem);
    solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();
    assert!(log.lock().is_empty());
    assert!(results.converged);
}

#[test]
fn test_callbacks_see_written_results() {
    let (space, problem) = equality_problem();
    let calls = Arc::new(Mutex::new(0));
    let mut solver = Solver::new(space, problem.clone(), SolverConfig::default()).unwrap();
    solver.register_callback(Box::new(Consistency { calls: calls.clone() }));

    let mut ws = Workspace::from_problem(&problem);
    let mut results = Results::from_problem(&problem);
    solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();
    assert_eq!(*calls.lock(), results.num_iters);
}

#[test]
fn test_history_records_every_outer_iteration() {
    let (space, problem) = equality_problem();
    let history = HistoryCallback::new();
    let storage = history.storage();
    let mut solver = Solver::new(space, problem.clone(), SolverConfig::default()).unwrap();
    solver.register_callback(Box::new(history));

    let mut ws = Workspace::from_problem(&problem);
    let mut results = Results::from_problem(&problem);
    solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();

    let recorded = storage.lock();
    assert_eq!(recorded.len(), results.num_iters);
    assert_eq!(recorded.values.len(), results.num_iters);
    assert_eq!(recorded.merits.len(), results.num_iters);
    assert_eq!(recorded.xs.last(), Some(&results.x_opt));
    assert_eq!(recorded.values.last(), Some(&results.value));
    assert_eq!(recorded.prim_infeas.last(), Some(&results.prim_infeas));
    // violation never grows on this problem
    for pair in recorded.prim_infeas.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12);
    }

    // A second solve appends to the same storage.
    let first_len = recorded.len();
    drop(recorded);
    solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();
    assert_eq!(storage.lock().len(), first_len + results.num_iters);
}

#[test]
fn test_logging_callback_and_verbose_output() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();

    let (space, problem) = equality_problem();
    let config = SolverConfig::default().with_verbose(VerboseLevel::VeryVerbose);
    let mut solver = Solver::new(space, problem.clone(), config).unwrap();
    solver.register_callback(Box::new(LoggingCallback::new(2)));
    solver.register_callback(Box::new(NoOpCallback));

    let mut ws = Workspace::from_problem(&problem);
    let mut results = Results::from_problem(&problem);
    let flag = solver
        .solve(&mut ws, &mut results, &DVector::zeros(2), None)
        .unwrap();

    assert_eq!(flag, ConvergenceFlag::Success);
    // x* = x̄ − aᵀ(a·x̄ + b)/‖a‖²
    let scale = (0.5 * 4.0 + 2.0 * -1.0 - 1.0) / (0.25 + 4.0);
    assert_relative_eq!(results.x_opt[0], 4.0 - 0.5 * scale, epsilon = 1e-5);
    assert_relative_eq!(results.x_opt[1], -1.0 - 2.0 * scale, epsilon = 1e-5);
    assert!(results.to_string().contains("SUCCESS"));
}
