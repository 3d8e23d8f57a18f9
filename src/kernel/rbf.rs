//! Radial basis function kernel.

use ndarray::ArrayView1;

use super::{check_positive, BuiltRows, Kernel};
use crate::dataset::Dataset;
use crate::error::KernelError;

/// Default width parameter.
const DEFAULT_GAMMA: f64 = 0.01;

/// Gaussian kernel `exp(-gamma ‖x - y‖²)`. Self-similarity is always 1.
#[derive(Debug, Clone)]
pub struct RbfKernel {
    gamma: f64,
    data: BuiltRows,
}

impl Default for RbfKernel {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}

impl RbfKernel {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            data: BuiltRows::default(),
        }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RbfKernel {
    fn name(&self) -> String {
        format!("rbf(gamma={})", self.gamma)
    }

    fn build(&mut self, data: &Dataset) -> Result<(), KernelError> {
        check_positive("gamma", self.gamma)?;
        self.data.build(data)
    }

    fn eval(&self, _i: usize, j: usize, item_i: ArrayView1<'_, f64>) -> Result<f64, KernelError> {
        let item_j = self.data.partner(j, &item_i)?;
        let squared: f64 = item_i
            .iter()
            .zip(item_j.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum();
        Ok((-self.gamma * squared).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rbf_self_similarity() {
        let data = Dataset::new(array![[1.0, 2.0], [-3.0, 0.5]]);
        let mut kernel = RbfKernel::new(0.7);
        kernel.build(&data).expect("build");
        assert_eq!(kernel.eval(1, 1, data.item(1)).expect("eval"), 1.0);
    }

    #[test]
    fn test_rbf_value() {
        let data = Dataset::new(array![[0.0, 0.0], [1.0, 1.0]]);
        let mut kernel = RbfKernel::new(0.5);
        kernel.build(&data).expect("build");

        let value = kernel.eval(0, 1, data.item(0)).expect("eval");
        assert!((value - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_rbf_symmetric() {
        let data = Dataset::new(array![[0.3, 1.0], [2.0, -1.0]]);
        let mut kernel = RbfKernel::default();
        kernel.build(&data).expect("build");

        let a = kernel.eval(0, 1, data.item(0)).expect("eval");
        let b = kernel.eval(1, 0, data.item(1)).expect("eval");
        assert!((a - b).abs() < 1e-15);
    }

    #[test]
    fn test_rbf_rejects_bad_gamma() {
        let data = Dataset::new(array![[0.0]]);
        let mut kernel = RbfKernel::new(-1.0);
        assert!(matches!(
            kernel.build(&data),
            Err(KernelError::InvalidParameter { .. })
        ));
    }
}
