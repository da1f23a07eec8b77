//! The constrained optimization problem.
//!
//! A [`Problem`] aggregates one cost and an ordered list of constraints:
//!
//! ```text
//! min_x  f(x)   s.t.  r_i(x) ∈ C_i,  i = 0..m
//! ```
//!
//! The constraint order fixes the layout of the multiplier vector: the
//! multiplier of constraint `i` occupies `nr_i` entries starting at
//! [`Problem::index`]`(i)`. The layout never changes after construction.
//!
//! # Augmented Lagrangian
//!
//! With a single penalty parameter `μ > 0`, the merit value is
//!
//! ```text
//! M(x; λ, μ) = f(x) + Σ_i (1/(2μ)) (‖Π_N,i(λ_i + μ r_i(x))‖² − ‖λ_i‖²)
//! ```
//!
//! evaluated through the shifted residual `s_i = r_i(x) + λ_i/μ` as
//! `(μ/2)‖Π_N,i(s_i)‖² − ‖λ_i‖²/(2μ)`. For cones both forms coincide; the
//! shifted form also covers boxes.

use crate::{
    constraints::Constraint,
    core::{
        error::{check_len, ModelError, Result},
        types::{infty_norm, DMatrix, DVector, Scalar},
    },
    functions::cost_function::CostFunction,
};
use num_traits::Float;
use std::sync::Arc;

/// A cost with an ordered list of constraints.
#[derive(Debug, Clone)]
pub struct Problem<T: Scalar> {
    cost: Arc<dyn CostFunction<T>>,
    constraints: Vec<Constraint<T>>,
    indices: Vec<usize>,
    total_dim: usize,
}

impl<T: Scalar> Problem<T> {
    /// Creates a problem.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if a constraint residual is defined on a
    /// space other than the cost's.
    pub fn new(cost: Arc<dyn CostFunction<T>>, constraints: Vec<Constraint<T>>) -> Result<Self> {
        let mut indices = Vec::with_capacity(constraints.len());
        let mut total_dim = 0;
        for (i, constraint) in constraints.iter().enumerate() {
            let res = constraint.residual();
            if res.nx() != cost.nx() || res.ndx() != cost.ndx() {
                return Err(ModelError::dimension_mismatch(
                    format!("constraint {i} on ({}, {})", cost.nx(), cost.ndx()),
                    format!("({}, {})", res.nx(), res.ndx()),
                ));
            }
            indices.push(total_dim);
            total_dim += constraint.nr();
        }
        Ok(Self {
            cost,
            constraints,
            indices,
            total_dim,
        })
    }

    /// Creates a problem without constraints.
    pub fn unconstrained(cost: Arc<dyn CostFunction<T>>) -> Self {
        Self {
            cost,
            constraints: Vec::new(),
            indices: Vec::new(),
            total_dim: 0,
        }
    }

    /// The objective.
    pub fn cost(&self) -> &Arc<dyn CostFunction<T>> {
        &self.cost
    }

    /// The constraints, in multiplier-layout order.
    pub fn constraints(&self) -> &[Constraint<T>] {
        &self.constraints
    }

    /// Ambient dimension of the variable.
    pub fn nx(&self) -> usize {
        self.cost.nx()
    }

    /// Tangent dimension of the variable.
    pub fn ndx(&self) -> usize {
        self.cost.ndx()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Output dimension of constraint `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_constraints()`.
    pub fn constraint_dim(&self, i: usize) -> usize {
        self.constraints[i].nr()
    }

    /// Offset of constraint `i` in the flat multiplier vector.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_constraints()`.
    pub fn index(&self, i: usize) -> usize {
        self.indices[i]
    }

    /// Total multiplier dimension.
    pub fn total_constraint_dim(&self) -> usize {
        self.total_dim
    }

    /// Zero multipliers, one vector per constraint.
    pub fn zero_multipliers(&self) -> Vec<DVector<T>> {
        self.constraints
            .iter()
            .map(|c| DVector::zeros(c.nr()))
            .collect()
    }

    /// Checks that `lams` holds one correctly sized vector per constraint.
    pub fn check_multipliers(&self, lams: &[DVector<T>]) -> Result<()> {
        check_len("multiplier list", self.num_constraints(), lams.len())?;
        for (constraint, lam) in self.constraints.iter().zip(lams) {
            check_len("multiplier", constraint.nr(), lam.len())?;
        }
        Ok(())
    }

    /// Evaluates every constraint residual at `x` into `values`.
    pub fn evaluate_constraints(&self, x: &DVector<T>, values: &mut [DVector<T>]) -> Result<()> {
        check_len("constraint value list", self.num_constraints(), values.len())?;
        for (constraint, value) in self.constraints.iter().zip(values.iter_mut()) {
            constraint.residual().evaluate_into(x, value)?;
        }
        Ok(())
    }

    /// Computes every constraint Jacobian at `x` into `jacs`.
    pub fn compute_constraint_jacobians(&self, x: &DVector<T>, jacs: &mut [DMatrix<T>]) -> Result<()> {
        check_len("constraint Jacobian list", self.num_constraints(), jacs.len())?;
        for (constraint, jac) in self.constraints.iter().zip(jacs.iter_mut()) {
            constraint.residual().compute_jacobian(x, jac)?;
        }
        Ok(())
    }

    /// Augmented-Lagrangian merit value at `x` for multipliers `lams` and
    /// penalty `mu`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `mu` is not positive, or a dimension
    /// error if `lams` does not match the multiplier layout.
    pub fn merit_value(&self, x: &DVector<T>, lams: &[DVector<T>], mu: T) -> Result<T> {
        if !(mu > T::zero()) {
            return Err(ModelError::invalid_parameter(format!(
                "penalty parameter must be positive, got {mu}"
            )));
        }
        self.check_multipliers(lams)?;
        let half = <T as Scalar>::from_f64(0.5);
        let mut merit = self.cost.evaluate(x)?;
        for (constraint, lam) in self.constraints.iter().zip(lams) {
            let mut shifted = constraint.residual().evaluate(x)?;
            shifted.axpy(T::one() / mu, lam, T::one());
            let normal = constraint.set().normal_cone_projection(&shifted);
            merit += half * mu * normal.norm_squared() - half * lam.norm_squared() / mu;
        }
        Ok(merit)
    }

    /// Largest violation `‖Π_N,i(r_i(x))‖∞` over all constraints (zero
    /// without constraints).
    pub fn constraint_violation(&self, x: &DVector<T>) -> Result<T> {
        let mut violation = T::zero();
        for constraint in &self.constraints {
            let value = constraint.residual().evaluate(x)?;
            let normal = constraint.set().normal_cone_projection(&value);
            violation = <T as Float>::max(violation, infty_norm(&normal));
        }
        Ok(violation)
    }
}
