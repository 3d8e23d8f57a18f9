//! Kernel oracles: pairwise similarity functions over a dataset.
//!
//! The herding selector never looks at item contents. It asks a [`Kernel`]
//! for pairwise similarities after letting it prepare itself once over the
//! whole collection.
//!
//! # Contract
//!
//! - [`Kernel::build`] is called exactly once per selection, with the full
//!   collection, before any evaluation.
//! - [`Kernel::eval`] returns the similarity between item `i` (also passed
//!   by value as `item_i`) and item `j`. Symmetry is assumed but not
//!   checked.
//!
//! # Provided kernels
//!
//! | Kernel | Similarity |
//! |---|---|
//! | [`PolyKernel`] | `(x·y + lower_order)^exponent` |
//! | [`NormalizedPolyKernel`] | `K(x,y) / sqrt(K(x,x) K(y,y))` |
//! | [`RbfKernel`] | `exp(-gamma ‖x - y‖²)` |
//! | [`PrecomputedKernel`] | lookup into a supplied Gram matrix |
//! | [`CachedKernel`] | any kernel, with its Gram matrix computed at build |
//!
//! [`KernelSpec`] describes a kernel in configuration files and on the
//! command line.

pub mod poly;
pub mod precomputed;
pub mod rbf;
pub mod spec;

use ndarray::{Array2, ArrayView1};

use crate::dataset::Dataset;
use crate::error::KernelError;

pub use poly::{NormalizedPolyKernel, PolyKernel};
pub use precomputed::{CachedKernel, PrecomputedKernel};
pub use rbf::RbfKernel;
pub use spec::KernelSpec;

/// A pairwise similarity oracle.
pub trait Kernel {
    /// Short human-readable description, used in logs and metrics.
    fn name(&self) -> String;

    /// Prepares internal state from the full collection.
    fn build(&mut self, data: &Dataset) -> Result<(), KernelError>;

    /// Similarity between item `i` and item `j`.
    fn eval(&self, i: usize, j: usize, item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError>;
}

impl<K: Kernel + ?Sized> Kernel for Box<K> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        (**self).build(data)
    }

    fn eval(&self, i: usize, j: usize, item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        (**self).eval(i, j, item_i)
    }
}

/// Rows captured at build time by the vector-space kernels.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuiltRows {
    rows: Option<Array2<f64>>,
}

impl BuiltRows {
    pub(crate) fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        if data.is_empty() {
            return Err(KernelError::EmptyCollection);
        }
        self.rows = Some(data.rows().clone());
        Ok(())
    }

    /// Returns row `j` after checking `item_i` has the same width.
    pub(crate) fn partner(
        &self,
        j: usize,
        item_i: &ArrayView1<'_, f64>,
    ) -> Result<ArrayView1<'_, f64>, KernelError> {
        let rows = self.rows.as_ref().ok_or(KernelError::NotBuilt)?;
        if j >= rows.nrows() {
            return Err(KernelError::IndexOutOfRange {
                index: j,
                len: rows.nrows(),
            });
        }
        if item_i.len() != rows.ncols() {
            return Err(KernelError::DimensionMismatch {
                expected: rows.ncols(),
                actual: item_i.len(),
            });
        }
        Ok(rows.row(j))
    }

    pub(crate) fn rows(&self) -> Option<&Array2<f64>> {
        self.rows.as_ref()
    }
}

/// Checks that a positive, finite kernel parameter is valid.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KernelError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be positive and finite, got {value}"),
        })
    }
}
