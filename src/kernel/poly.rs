//! Polynomial kernels.

use ndarray::{Array1, ArrayView1};

use super::{check_positive, BuiltRows, Kernel};
use crate::dataset::Dataset;
use crate::error::KernelError;

/// Polynomial kernel `(x·y + c)^exponent`, with `c = 1` when lower-order
/// terms are enabled and `0` otherwise.
///
/// With the default exponent of 1 this is the plain dot product.
#[derive(Debug, Clone)]
pub struct PolyKernel {
    exponent: f64,
    lower_order: bool,
    data: BuiltRows,
}

impl Default for PolyKernel {
    fn default() -> Self {
        Self {
            exponent: 1.0,
            lower_order: false,
            data: BuiltRows::default(),
        }
    }
}

impl PolyKernel {
    pub fn new(exponent: f64) -> Self {
        Self {
            exponent,
            ..Self::default()
        }
    }

    /// Adds the constant term, giving `(x·y + 1)^exponent`.
    pub fn with_lower_order(mut self, lower_order: bool) -> Self {
        self.lower_order = lower_order;
        self
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    fn apply(&self, x: &ArrayView1<'_, f64>, y: &ArrayView1<'_, f64>) -> f64 {
        let mut dot = x.dot(y);
        if self.lower_order {
            dot += 1.0;
        }
        if self.exponent == 1.0 {
            dot
        } else {
            dot.powf(self.exponent)
        }
    }
}

impl Kernel for PolyKernel {
    fn name(&self) -> String {
        format!(
            "poly(exponent={}, lower_order={})",
            self.exponent, self.lower_order
        )
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        check_positive("exponent", self.exponent)?;
        self.data.build(data)
    }

    fn eval(&self, _i: usize, j: usize, item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        let item_j = self.data.partner(j, &item_i)?;
        Ok(self.apply(&item_i, &item_j))
    }
}

/// Polynomial kernel normalised so that every item has self-similarity 1.
///
/// `K'(x, y) = K(x, y) / sqrt(K(x, x) K(y, y))`. Items whose
/// self-similarity is zero get similarity 0 to everything.
#[derive(Debug, Clone)]
pub struct NormalizedPolyKernel {
    inner: PolyKernel,
    /// `K(x_j, x_j)` for every built row.
    diagonal: Option<Array1<f64>>,
}

impl Default for NormalizedPolyKernel {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl NormalizedPolyKernel {
    pub fn new(exponent: f64) -> Self {
        Self {
            inner: PolyKernel::new(exponent),
            diagonal: None,
        }
    }

    pub fn with_lower_order(mut self, lower_order: bool) -> Self {
        self.inner = self.inner.with_lower_order(lower_order);
        self
    }
}

impl Kernel for NormalizedPolyKernel {
    fn name(&self) -> String {
        format!(
            "normalized-poly(exponent={}, lower_order={})",
            self.inner.exponent, self.inner.lower_order
        )
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        self.inner.build(data)?;
        let rows = self.inner.data.rows().ok_or(KernelError::NotBuilt)?;
        let diagonal = rows
            .outer_iter()
            .map(|row| self.inner.apply(&row, &row))
            .collect::<Array1<f64>>();
        self.diagonal = Some(diagonal);
        Ok(())
    }

    fn eval(&self, _i: usize, j: usize, item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        let diagonal = self.diagonal.as_ref().ok_or(KernelError::NotBuilt)?;
        let item_j = self.inner.data.partner(j, &item_i)?;

        let denom = (self.inner.apply(&item_i, &item_i) * diagonal[j]).sqrt();
        if denom <= 0.0 || !denom.is_finite() {
            return Ok(0.0);
        }
        Ok(self.inner.apply(&item_i, &item_j) / denom)
    }
}
