//! kernel-herding: greedy, variance-reducing subset selection.
//!
//! Kernel herding picks items one at a time so that the mean kernel
//! embedding of the chosen subset tracks the mean embedding of the whole
//! collection. The selected subset is a smaller, representative stand-in
//! for the full dataset.
//!
//! # Usage
//!
//! ```
//! use kernel_herding::dataset::Dataset;
//! use kernel_herding::herding::select_subset;
//! use kernel_herding::kernel::RbfKernel;
//! use ndarray::array;
//!
//! let data = Dataset::new(array![[0.0, 0.0], [0.1, 0.0], [4.0, 4.0], [4.1, 3.9]]);
//! let mut kernel = RbfKernel::new(0.5);
//! let subset = select_subset(&mut kernel, &data, 50.0, Some(7)).unwrap();
//! assert_eq!(subset.len(), 2);
//! ```

pub mod cli;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod herding;
pub mod kernel;
pub mod metrics;

// Re-export commonly used types
pub use error::{ConfigError, DatasetError, HerdingError, KernelError};
pub use filter::HerdingFilter;
pub use herding::{select_subset, HerdingConfig, KernelHerding, Selection};
