//! Synthetic Gaussian blob datasets.
//!
//! Used by the `synth` command and by tests that need clustered data
//! with a known structure.

use ndarray::Array2;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use super::Dataset;
use crate::error::DatasetError;

/// Generator for isotropic Gaussian clusters.
#[derive(Debug, Clone)]
pub struct BlobGenerator {
    clusters: usize,
    per_cluster: usize,
    dimension: usize,
    spread: f64,
    center_range: f64,
    seed: Option<u64>,
}

impl Default for BlobGenerator {
    fn default() -> Self {
        Self {
            clusters: 3,
            per_cluster: 50,
            dimension: 2,
            spread: 0.5,
            center_range: 10.0,
            seed: None,
        }
    }
}

impl BlobGenerator {
    pub fn new(clusters: usize, per_cluster: usize, dimension: usize) -> Self {
        Self {
            clusters,
            per_cluster,
            dimension,
            ..Self::default()
        }
    }

    /// Standard deviation of each cluster.
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    /// Cluster centers are drawn uniformly from `[-range, range]` per axis.
    pub fn with_center_range(mut self, range: f64) -> Self {
        self.center_range = range;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generates the dataset. Rows are grouped by cluster.
    pub fn generate(&self) -> Result<Dataset, DatasetError> {
        if self.clusters == 0 || self.per_cluster == 0 || self.dimension == 0 {
            return Err(DatasetError::InvalidParameter(
                "clusters, per_cluster and dimension must be greater than 0".to_string(),
            ));
        }
        if !(self.center_range.is_finite() && self.center_range > 0.0) {
            return Err(DatasetError::InvalidParameter(format!(
                "center range must be positive, got {}",
                self.center_range
            )));
        }

        if !(self.spread.is_finite() && self.spread >= 0.0) {
            return Err(DatasetError::InvalidParameter(format!(
                "spread must be non-negative, got {}",
                self.spread
            )));
        }

        let noise = Normal::new(0.0, self.spread)
            .map_err(|e| DatasetError::InvalidParameter(format!("spread: {e}")))?;
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let n = self.clusters * self.per_cluster;
        let mut rows = Array2::zeros((n, self.dimension));
        for cluster in 0..self.clusters {
            let center: Vec<f64> = (0..self.dimension)
                .map(|_| rng.random_range(-self.center_range..self.center_range))
                .collect();

            for k in 0..self.per_cluster {
                let mut row = rows.row_mut(cluster * self.per_cluster + k);
                for (value, c) in row.iter_mut().zip(&center) {
                    *value = c + noise.sample(&mut rng);
                }
            }
        }

        tracing::debug!(
            clusters = self.clusters,
            per_cluster = self.per_cluster,
            dimension = self.dimension,
            "Generated blob dataset"
        );
        Ok(Dataset::new(rows))
    }
}
