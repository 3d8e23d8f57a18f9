//! Kernel herding subset selection.
//!
//! Kernel herding greedily picks items so that the mean kernel embedding of
//! the chosen subset tracks the mean embedding of the whole collection.
//! At every step it favours items that are similar to the collection on
//! average while penalising items similar to what is already selected.
//!
//! The module is split into:
//!
//! 1. **Accumulator** - baseline and running similarity per item
//! 2. **Selector** - the greedy loop and its termination
//! 3. **Resolver** - replacement policy when the best item is taken
//! 4. **Config** - subset size and numeric policies
//!
//! # Usage
//!
//! ```rust
//! use kernel_herding::dataset::Dataset;
//! use kernel_herding::herding::select_subset;
//! use kernel_herding::kernel::RbfKernel;
//!
//! let data = Dataset::from_rows(vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![4.0, 4.0],
//!     vec![4.1, 3.9],
//! ])
//! .unwrap();
//!
//! let subset = select_subset(&mut RbfKernel::new(0.5), &data, 50.0, Some(42)).unwrap();
//! assert_eq!(subset.len(), 2);
//! ```

pub mod accumulator;
pub mod config;
pub mod resolver;
pub mod selection;
pub mod selector;

pub use accumulator::SimilarityAccumulator;
pub use config::{HerdingConfig, ScoreFloor, SelfSimilarity, TrailWalk};
pub use resolver::{BacktrackResolver, CollisionResolver, Resolution};
pub use selection::{SelectedSet, Selection, SelectionStats};
pub use selector::KernelHerding;

use crate::dataset::Dataset;
use crate::error::HerdingError;
use crate::kernel::Kernel;

/// Selects `floor(n × percentage / 100)` items from `data`.
///
/// Returns the chosen items in selection order. `seed` fixes the generator
/// used when a collision cannot be resolved from the candidate trail.
pub fn select_subset<K: Kernel + ?Sized>(
    kernel: &mut K,
    data: &Dataset,
    percentage: f64,
    seed: Option<u64>,
) -> Result<Dataset, HerdingError> {
    let mut config = HerdingConfig::new().with_sample_size_percent(percentage);
    config.seed = seed;

    let selection = KernelHerding::new(config).select(kernel, data)?;
    Ok(selection.apply(data))
}
