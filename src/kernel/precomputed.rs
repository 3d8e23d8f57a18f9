//! Gram-matrix backed kernels.

use ndarray::{Array2, ArrayView1};

use super::Kernel;
use crate::dataset::Dataset;
use crate::error::KernelError;

fn lookup(gram: &Array2<f64>, i: usize, j: usize) -> Result<f64, KernelError> {
    let len = gram.nrows();
    for index in [i, j] {
        if index >= len {
            return Err(KernelError::IndexOutOfRange { index, len });
        }
    }
    Ok(gram[[i, j]])
}

/// Kernel answering from a user-supplied `n × n` similarity matrix.
///
/// Item contents are ignored; only indices matter. Useful when the
/// similarities come from elsewhere, and in tests.
#[derive(Debug, Clone)]
pub struct PrecomputedKernel {
    gram: Array2<f64>,
    built: bool,
}

impl PrecomputedKernel {
    /// Wraps a square similarity matrix.
    pub fn new(gram: Array2<f64>) -> Result<Self, KernelError> {
        if gram.nrows() != gram.ncols() {
            return Err(KernelError::DimensionMismatch {
                expected: gram.nrows(),
                actual: gram.ncols(),
            });
        }
        Ok(Self { gram, built: false })
    }

    /// Builds the matrix by calling `f(i, j)` for every pair.
    pub fn from_fn<F>(n: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        Self {
            gram: Array2::from_shape_fn((n, n), |(i, j)| f(i, j)),
            built: false,
        }
    }

    pub fn gram(&self) -> &Array2<f64> {
        &self.gram
    }
}

impl Kernel for PrecomputedKernel {
    fn name(&self) -> String {
        format!("precomputed({}x{})", self.gram.nrows(), self.gram.ncols())
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        if data.is_empty() {
            return Err(KernelError::EmptyCollection);
        }
        if data.len() != self.gram.nrows() {
            return Err(KernelError::DimensionMismatch {
                expected: self.gram.nrows(),
                actual: data.len(),
            });
        }
        self.built = true;
        Ok(())
    }

    fn eval(&self, i: usize, j: usize, _item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        if !self.built {
            return Err(KernelError::NotBuilt);
        }
        lookup(&self.gram, i, j)
    }
}

/// Wraps a kernel and evaluates its full Gram matrix once at build time.
///
/// Trades `n²` memory for skipping repeated evaluations during selection.
#[derive(Debug, Clone)]
pub struct CachedKernel<K> {
    inner: K,
    gram: Option<Array2<f64>>,
}

impl<K: Kernel> CachedKernel<K> {
    pub fn new(inner: K) -> Self {
        Self { inner, gram: None }
    }
}

impl<K: Kernel> Kernel for CachedKernel<K> {
    fn name(&self) -> String {
        format!("cached({})", self.inner.name())
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        self.inner.build(data)?;

        let n = data.len();
        let mut gram = Array2::zeros((n, n));
        for i in 0..n {
            let item_i = data.item(i);
            for j in 0..n {
                gram[[i, j]] = self.inner.eval(i, j, item_i)?;
            }
        }

        tracing::debug!(kernel = %self.inner.name(), items = n, "Cached Gram matrix");
        self.gram = Some(gram);
        Ok(())
    }

    fn eval(&self, i: usize, j: usize, _item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        let gram = self.gram.as_ref().ok_or(KernelError::NotBuilt)?;
        lookup(gram, i, j)
    }
}
