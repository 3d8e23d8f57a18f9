//! Per-item similarity statistics.
//!
//! Two arrays drive the herding score of every candidate `j`:
//!
//! - `baseline[j]`: mean similarity of `j` to the whole collection,
//!   computed once before selection starts.
//! - `accumulated[j]`: running sum of similarities of `j` to every item
//!   selected so far, grown by one term per greedy step.

use crate::dataset::Dataset;
use crate::error::KernelError;
use crate::kernel::Kernel;

use super::config::SelfSimilarity;

/// Baseline and accumulated similarity for every item.
#[derive(Debug, Clone)]
pub struct SimilarityAccumulator {
    baseline: Vec<f64>,
    accumulated: Vec<f64>,
    evaluations: u64,
}

impl SimilarityAccumulator {
    /// Computes the baseline similarity of every item.
    ///
    /// `baseline[i] = (Σ_j eval(i, j, item_i) − c_i) / n`, where `c_i` is
    /// picked by `correction`. The kernel must already be built.
    pub fn compute<K: Kernel + ?Sized>(
        kernel: &K,
        data: &Dataset,
        correction: SelfSimilarity,
    ) -> Result<Self, KernelError> {
        let n = data.len();
        if n == 0 {
            return Err(KernelError::EmptyCollection);
        }

        let mut baseline = Vec::with_capacity(n);
        for i in 0..n {
            let item_i = data.item(i);
            let mut sum = 0.0;
            let mut self_term = 0.0;
            for j in 0..n {
                let value = kernel.eval(i, j, item_i)?;
                if i == j {
                    self_term = value;
                }
                sum += value;
            }

            sum -= match correction {
                SelfSimilarity::AssumeUnit => 1.0,
                SelfSimilarity::Exact => self_term,
                SelfSimilarity::Ignore => 0.0,
            };
            baseline.push(sum / n as f64);
        }

        Ok(Self {
            baseline,
            accumulated: vec![0.0; n],
            evaluations: (n * n) as u64,
        })
    }

    /// Adds every item's similarity to the most recently selected item.
    pub fn update<K: Kernel + ?Sized>(
        &mut self,
        kernel: &K,
        data: &Dataset,
        last_selected: usize,
    ) -> Result<(), KernelError> {
        for (j, acc) in self.accumulated.iter_mut().enumerate() {
            *acc += kernel.eval(j, last_selected, data.item(j))?;
        }
        self.evaluations += self.accumulated.len() as u64;
        Ok(())
    }

    /// Herding score of candidate `j` when `selected` items are chosen.
    ///
    /// `baseline[j] − accumulated[j] / (selected + 1)`.
    pub fn score(&self, j: usize, selected: usize) -> f64 {
        self.baseline[j] - self.accumulated[j] / (selected + 1) as f64
    }

    /// First index whose baseline strictly exceeds `floor` and every
    /// earlier maximum. Returns 0 if nothing beats `floor`.
    pub fn argmax_baseline(&self, floor: f64) -> usize {
        let mut best = 0;
        let mut best_value = floor;
        for (i, &value) in self.baseline.iter().enumerate() {
            if value > best_value {
                best_value = value;
                best = i;
            }
        }
        best
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn accumulated(&self) -> &[f64] {
        &self.accumulated
    }

    /// Kernel evaluations performed so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn len(&self) -> usize {
        self.baseline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }

    pub fn into_baseline(self) -> Vec<f64> {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PrecomputedKernel;
    use ndarray::Array2;

    fn half_kernel(n: usize) -> (PrecomputedKernel, Dataset) {
        let data = Dataset::new(Array2::zeros((n, 1)));
        let mut kernel = PrecomputedKernel::from_fn(n, |i, j| if i == j { 1.0 } else { 0.5 });
        kernel.build(&data).expect("build");
        (kernel, data)
    }

    #[test]
    fn test_baseline_assume_unit() {
        let (kernel, data) = half_kernel(4);
        let acc = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::AssumeUnit)
            .expect("compute");

        assert_eq!(acc.baseline(), &[0.375, 0.375, 0.375, 0.375]);
        assert_eq!(acc.accumulated(), &[0.0; 4]);
        assert_eq!(acc.evaluations(), 16);
    }

    #[test]
    fn test_baseline_corrections() {
        let data = Dataset::new(Array2::zeros((2, 1)));
        let mut kernel = PrecomputedKernel::from_fn(2, |i, j| if i == j { 3.0 } else { 1.0 });
        kernel.build(&data).expect("build");

        let exact = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::Exact)
            .expect("compute");
        assert_eq!(exact.baseline(), &[0.5, 0.5]);

        let ignore = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::Ignore)
            .expect("compute");
        assert_eq!(ignore.baseline(), &[2.0, 2.0]);

        let unit = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::AssumeUnit)
            .expect("compute");
        assert_eq!(unit.baseline(), &[1.5, 1.5]);
    }

    #[test]
    fn test_update_and_score() {
        let (kernel, data) = half_kernel(4);
        let mut acc = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::AssumeUnit)
            .expect("compute");

        acc.update(&kernel, &data, 0).expect("update");
        assert_eq!(acc.accumulated(), &[1.0, 0.5, 0.5, 0.5]);
        assert_eq!(acc.evaluations(), 20);

        // One item selected: divide by 2.
        assert_eq!(acc.score(0, 1), -0.125);
        assert_eq!(acc.score(1, 1), 0.125);
    }

    #[test]
    fn test_argmax_first_index_wins_ties() {
        let (kernel, data) = half_kernel(4);
        let acc = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::AssumeUnit)
            .expect("compute");
        assert_eq!(acc.argmax_baseline(0.0), 0);
        assert_eq!(acc.argmax_baseline(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_argmax_floor() {
        let data = Dataset::new(Array2::zeros((3, 1)));
        let values = [-0.5, -0.2, -0.9];
        let mut kernel = PrecomputedKernel::from_fn(3, |i, j| if i == j { values[i] } else { 0.0 });
        kernel.build(&data).expect("build");
        let acc = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::Ignore)
            .expect("compute");

        // Nothing beats a zero floor.
        assert_eq!(acc.argmax_baseline(0.0), 0);
        assert_eq!(acc.argmax_baseline(f64::NEG_INFINITY), 1);
    }

    #[test]
    fn test_kernel_failure_propagates() {
        let data = Dataset::new(Array2::zeros((2, 1)));
        let kernel = PrecomputedKernel::from_fn(2, |_, _| 1.0);
        let result = SimilarityAccumulator::compute(&kernel, &data, SelfSimilarity::AssumeUnit);
        assert_eq!(result.err(), Some(KernelError::NotBuilt));
    }
}
