//! Batch filter that subsamples only the first batch it sees.
//!
//! Training pipelines push a training batch followed by evaluation
//! batches through the same filter. Only the training batch should be
//! subsampled; later batches pass through untouched until the filter is
//! reset.

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::HerdingError;
use crate::herding::{
    BacktrackResolver, CollisionResolver, HerdingConfig, KernelHerding, SelectionStats,
};
use crate::kernel::Kernel;

/// Kernel herding wrapped in a first-batch-only lifecycle.
#[derive(Debug)]
pub struct HerdingFilter<K, R = BacktrackResolver> {
    herding: KernelHerding<R>,
    kernel: K,
    first_batch_done: bool,
    last_stats: Option<SelectionStats>,
}

impl<K: Kernel> HerdingFilter<K> {
    pub fn new(kernel: K, config: HerdingConfig) -> Self {
        Self {
            herding: KernelHerding::new(config),
            kernel,
            first_batch_done: false,
            last_stats: None,
        }
    }
}

impl HerdingFilter<Box<dyn Kernel>> {
    /// Builds the filter with the kernel named in `config`.
    pub fn from_config(config: HerdingConfig) -> Result<Self, HerdingError> {
        let kernel = config.build_kernel()?;
        Ok(Self::new(kernel, config))
    }
}

impl<K: Kernel, R: CollisionResolver> HerdingFilter<K, R> {
    /// Replaces the collision resolver.
    pub fn with_resolver<S: CollisionResolver>(self, resolver: S) -> HerdingFilter<K, S> {
        HerdingFilter {
            herding: self.herding.with_resolver(resolver),
            kernel: self.kernel,
            first_batch_done: self.first_batch_done,
            last_stats: self.last_stats,
        }
    }

    /// Subsamples the first batch; returns later batches unchanged.
    ///
    /// A failed first batch leaves the filter armed.
    pub fn process(&mut self, batch: Dataset) -> Result<Dataset, HerdingError> {
        if self.first_batch_done {
            debug!(items = batch.len(), "First batch already processed, passing through");
            return Ok(batch);
        }

        let selection = self.herding.select(&mut self.kernel, &batch)?;
        let output = selection.apply(&batch);

        info!(
            input = batch.len(),
            output = output.len(),
            "Subsampled first batch"
        );
        self.first_batch_done = true;
        self.last_stats = Some(selection.stats);
        Ok(output)
    }

    pub fn is_first_batch_done(&self) -> bool {
        self.first_batch_done
    }

    /// Statistics of the subsampling run, once it has happened.
    pub fn last_stats(&self) -> Option<&SelectionStats> {
        self.last_stats.as_ref()
    }

    /// Re-arms the filter so the next batch is subsampled again.
    pub fn reset(&mut self) {
        self.first_batch_done = false;
        self.last_stats = None;
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}
