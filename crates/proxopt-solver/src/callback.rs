//! Callback support for the solver.
//!
//! Callbacks observe the solver once per completed outer iteration, after the
//! multiplier update and the convergence check. They receive the workspace
//! and the results by shared reference and cannot alter the iteration.

use crate::{results::Results, workspace::Workspace};
use parking_lot::Mutex;
use proxopt_core::core::types::{DVector, Scalar};
use std::sync::Arc;

/// Trait for solver callbacks.
///
/// Callbacks are stored by the [`Solver`](crate::Solver) in registration
/// order and called in that order.
pub trait Callback<T: Scalar>: Send {
    /// Called at the end of each outer iteration.
    fn call(&mut self, workspace: &Workspace<T>, results: &Results<T>);
}

/// A callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl<T: Scalar> Callback<T> for NoOpCallback {
    fn call(&mut self, _workspace: &Workspace<T>, _results: &Results<T>) {}
}

/// A callback that logs one line per outer iteration through `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct LoggingCallback {
    print_every: usize,
}

impl LoggingCallback {
    /// Create a callback logging every `print_every` outer iterations.
    pub fn new(print_every: usize) -> Self {
        Self {
            print_every: print_every.max(1),
        }
    }
}

impl Default for LoggingCallback {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T: Scalar> Callback<T> for LoggingCallback {
    fn call(&mut self, workspace: &Workspace<T>, results: &Results<T>) {
        if results.num_iters % self.print_every != 0 {
            return;
        }
        tracing::info!(
            iter = results.num_iters,
            value = <T as Scalar>::to_f64(results.value),
            prim_infeas = <T as Scalar>::to_f64(results.prim_infeas),
            dual_infeas = <T as Scalar>::to_f64(results.dual_infeas),
            mu = <T as Scalar>::to_f64(workspace.mu()),
            status = %results.status,
            "outer iteration"
        );
    }
}

/// Sequences recorded by a [`HistoryCallback`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryStorage<T: Scalar> {
    /// Primal iterate after each outer iteration.
    pub xs: Vec<DVector<T>>,
    /// Multipliers after each outer iteration.
    pub lams: Vec<Vec<DVector<T>>>,
    /// Cost values.
    pub values: Vec<T>,
    /// Merit values.
    pub merits: Vec<T>,
    /// Primal infeasibilities.
    pub prim_infeas: Vec<T>,
    /// Dual infeasibilities.
    pub dual_infeas: Vec<T>,
}

impl<T: Scalar> HistoryStorage<T> {
    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Drops every recorded entry.
    pub fn clear(&mut self) {
        self.xs.clear();
        self.lams.clear();
        self.values.clear();
        self.merits.clear();
        self.prim_infeas.clear();
        self.dual_infeas.clear();
    }
}

/// A callback recording the iterates and merit values of every outer
/// iteration.
///
/// The storage is shared: keep a handle from [`storage`](Self::storage)
/// before registering the callback to inspect the history after a solve.
///
/// # Example
///
/// ```
/// use proxopt_solver::callback::HistoryCallback;
///
/// let history = HistoryCallback::<f64>::new();
/// let storage = history.storage();
/// assert!(storage.lock().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback<T: Scalar> {
    storage: Arc<Mutex<HistoryStorage<T>>>,
}

impl<T: Scalar> HistoryCallback<T> {
    /// Create a callback with empty storage.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(Mutex::new(HistoryStorage::default())),
        }
    }

    /// Shared handle on the recorded history.
    pub fn storage(&self) -> Arc<Mutex<HistoryStorage<T>>> {
        Arc::clone(&self.storage)
    }

    /// Copy of the recorded history.
    pub fn snapshot(&self) -> HistoryStorage<T> {
        self.storage.lock().clone()
    }
}

impl<T: Scalar> Callback<T> for HistoryCallback<T> {
    fn call(&mut self, workspace: &Workspace<T>, results: &Results<T>) {
        let mut storage = self.storage.lock();
        storage.xs.push(workspace.x().clone());
        storage.lams.push(workspace.multipliers().to_vec());
        storage.values.push(results.value);
        storage.merits.push(results.merit);
        storage.prim_infeas.push(results.prim_infeas);
        storage.dual_infeas.push(results.dual_infeas);
    }
}
