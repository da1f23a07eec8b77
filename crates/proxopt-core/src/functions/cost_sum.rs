//! Weighted sums of cost functions.

use crate::{
    core::{
        error::{ModelError, Result},
        types::{DMatrix, DVector, Scalar},
    },
    functions::cost_function::CostFunction,
};
use std::{
    fmt,
    ops::{AddAssign, MulAssign, Neg},
    sync::Arc,
};

/// The cost `Σ_i w_i f_i(x)` over shared components.
///
/// Components are held by shared reference, so the same cost can appear in
/// several sums.
///
/// # Example
///
/// ```
/// use proxopt_core::prelude::*;
/// use std::sync::Arc;
///
/// let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
/// let c1: Arc<dyn CostFunction<f64>> =
///     Arc::new(QuadraticDistanceCost::at_neutral(space.clone()).unwrap());
/// let c2: Arc<dyn CostFunction<f64>> =
///     Arc::new(QuadraticDistanceCost::with_target(space, DVector::from_vec(vec![1.0, 0.0])).unwrap());
///
/// let mut sum = CostSum::new(2, 2);
/// sum.add_component(c1, 1.0).unwrap();
/// sum.add_component(c2, 0.5).unwrap();
/// assert_eq!(sum.to_string(), "CostSum(num_components=2, weights=(1, 0.5))");
/// ```
#[derive(Debug, Clone)]
pub struct CostSum<T: Scalar> {
    nx: usize,
    ndx: usize,
    components: Vec<Arc<dyn CostFunction<T>>>,
    weights: Vec<T>,
}

impl<T: Scalar> CostSum<T> {
    /// Creates an empty sum (identically zero) on a space of the given dimensions.
    pub fn new(nx: usize, ndx: usize) -> Self {
        Self {
            nx,
            ndx,
            components: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Creates a sum from components and matching weights.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the two lists differ in length and
    /// `DimensionMismatch` if a component lives on another space.
    pub fn from_components(
        nx: usize,
        ndx: usize,
        components: Vec<Arc<dyn CostFunction<T>>>,
        weights: Vec<T>,
    ) -> Result<Self> {
        if components.len() != weights.len() {
            return Err(ModelError::invalid_parameter(format!(
                "got {} cost components but {} weights",
                components.len(),
                weights.len()
            )));
        }
        let mut sum = Self::new(nx, ndx);
        for (component, weight) in components.into_iter().zip(weights) {
            sum.add_component(component, weight)?;
        }
        Ok(sum)
    }

    /// Appends `weight · cost` to the sum.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `cost` lives on another space.
    pub fn add_component(&mut self, cost: Arc<dyn CostFunction<T>>, weight: T) -> Result<()> {
        if cost.nx() != self.nx || cost.ndx() != self.ndx {
            return Err(ModelError::dimension_mismatch(
                format!("cost on ({}, {})", self.nx, self.ndx),
                format!("({}, {})", cost.nx(), cost.ndx()),
            ));
        }
        self.components.push(cost);
        self.weights.push(weight);
        Ok(())
    }

    /// Appends every component of `other` with its weight.
    pub fn extend(&mut self, other: &CostSum<T>) -> Result<()> {
        for (component, weight) in other.components.iter().zip(&other.weights) {
            self.add_component(Arc::clone(component), *weight)?;
        }
        Ok(())
    }

    /// Number of components.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Component weights, in insertion order.
    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    /// Components, in insertion order.
    pub fn components(&self) -> &[Arc<dyn CostFunction<T>>] {
        &self.components
    }
}

impl<T: Scalar> CostFunction<T> for CostSum<T> {
    fn nx(&self) -> usize {
        self.nx
    }

    fn ndx(&self) -> usize {
        self.ndx
    }

    fn evaluate(&self, x: &DVector<T>) -> Result<T> {
        self.check_input(x)?;
        let mut value = T::zero();
        for (component, weight) in self.components.iter().zip(&self.weights) {
            value += *weight * component.evaluate(x)?;
        }
        Ok(value)
    }

    fn compute_gradient(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        self.check_input(x)?;
        self.check_gradient(out)?;
        out.fill(T::zero());
        let mut buf = DVector::zeros(self.ndx);
        for (component, weight) in self.components.iter().zip(&self.weights) {
            component.compute_gradient(x, &mut buf)?;
            out.axpy(*weight, &buf, T::one());
        }
        Ok(())
    }

    fn compute_hessian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.check_input(x)?;
        self.check_hessian(out)?;
        out.fill(T::zero());
        let mut buf = DMatrix::zeros(self.ndx, self.ndx);
        for (component, weight) in self.components.iter().zip(&self.weights) {
            component.compute_hessian(x, &mut buf)?;
            out.zip_apply(&buf, |o, b| *o += *weight * b);
        }
        Ok(())
    }
}

/// # Panics
///
/// Panics if `rhs` lives on another space. Use [`CostSum::add_component`]
/// for a fallible version.
impl<T: Scalar> AddAssign<Arc<dyn CostFunction<T>>> for CostSum<T> {
    fn add_assign(&mut self, rhs: Arc<dyn CostFunction<T>>) {
        if let Err(err) = self.add_component(rhs, T::one()) {
            panic!("{err}");
        }
    }
}

/// # Panics
///
/// Panics if `rhs` lives on another space. Use [`CostSum::extend`] for a
/// fallible version.
impl<T: Scalar> AddAssign<&CostSum<T>> for CostSum<T> {
    fn add_assign(&mut self, rhs: &CostSum<T>) {
        if let Err(err) = self.extend(rhs) {
            panic!("{err}");
        }
    }
}

impl<T: Scalar> MulAssign<T> for CostSum<T> {
    fn mul_assign(&mut self, rhs: T) {
        for w in &mut self.weights {
            *w *= rhs;
        }
    }
}

impl<T: Scalar> Neg for CostSum<T> {
    type Output = CostSum<T>;

    fn neg(mut self) -> Self::Output {
        for w in &mut self.weights {
            *w = -*w;
        }
        self
    }
}

impl<T: Scalar> fmt::Display for CostSum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CostSum(num_components={}, weights=(", self.num_components())?;
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{w}")?;
        }
        write!(f, "))")
    }
}
