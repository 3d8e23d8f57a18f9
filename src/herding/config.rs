//! Herding configuration.
//!
//! Configuration can be built in code or loaded from YAML:
//!
//! ```yaml
//! sample_size_percent: 25
//! seed: 42
//! score_floor: negative-infinity
//! self_similarity: exact
//! trail_walk: skip-first
//! kernel:
//!   type: rbf
//!   gamma: 0.5
//! cache_kernel: true
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, HerdingError, KernelError};
use crate::kernel::{CachedKernel, Kernel, KernelSpec};

/// Default subsample size: keep everything.
const DEFAULT_SAMPLE_SIZE_PERCENT: f64 = 100.0;

/// Initial value of the running maximum when scanning candidates.
///
/// Applies both to choosing the seed item and to every greedy step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreFloor {
    /// Start at 0. A step where no score is positive keeps the default
    /// best index (0) and usually falls through to collision handling.
    #[default]
    Zero,

    /// Start below every finite score, so the true argmax always wins.
    NegativeInfinity,
}

impl ScoreFloor {
    pub fn value(self) -> f64 {
        match self {
            ScoreFloor::Zero => 0.0,
            ScoreFloor::NegativeInfinity => f64::NEG_INFINITY,
        }
    }
}

/// How an item's similarity to itself is removed from its baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfSimilarity {
    /// Subtract 1.0, assuming a normalised kernel.
    #[default]
    AssumeUnit,

    /// Subtract the kernel's actual `eval(i, i)`.
    Exact,

    /// Keep the self term in the sum.
    Ignore,
}

/// How far back the collision resolver walks the candidate trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrailWalk {
    /// Every earlier trail entry is a candidate, the first one included.
    #[default]
    Full,

    /// The first trail entry is never used; reaching it falls through to
    /// the random fallback. Reproduces the selection order of the Java
    /// filter this algorithm is usually compared against.
    SkipFirst,
}

/// Settings for one herding selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HerdingConfig {
    /// Size of the subset as a percentage of the input, in (0, 100].
    pub sample_size_percent: f64,

    /// Seed for the collision fallback generator (None = OS entropy).
    pub seed: Option<u64>,

    /// Initial running maximum for every argmax scan.
    pub score_floor: ScoreFloor,

    /// Self-similarity correction applied to the baseline.
    pub self_similarity: SelfSimilarity,

    /// Extent of the backward trail walk on collisions.
    pub trail_walk: TrailWalk,

    /// Kernel used by the command line and the batch filter.
    pub kernel: KernelSpec,

    /// Evaluate the full Gram matrix once at build time.
    pub cache_kernel: bool,
}

impl Default for HerdingConfig {
    fn default() -> Self {
        Self {
            sample_size_percent: DEFAULT_SAMPLE_SIZE_PERCENT,
            seed: None,
            score_floor: ScoreFloor::default(),
            self_similarity: SelfSimilarity::default(),
            trail_walk: TrailWalk::default(),
            kernel: KernelSpec::default(),
            cache_kernel: false,
        }
    }
}

impl HerdingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_size_percent(mut self, percent: f64) -> Self {
        self.sample_size_percent = percent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_score_floor(mut self, floor: ScoreFloor) -> Self {
        self.score_floor = floor;
        self
    }

    pub fn with_self_similarity(mut self, correction: SelfSimilarity) -> Self {
        self.self_similarity = correction;
        self
    }

    pub fn with_trail_walk(mut self, walk: TrailWalk) -> Self {
        self.trail_walk = walk;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelSpec) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_cache_kernel(mut self, cache: bool) -> Self {
        self.cache_kernel = cache;
        self
    }

    /// Instantiates the configured kernel, cached if requested.
    pub fn build_kernel(&self) -> Result<Box<dyn Kernel>, KernelError> {
        let kernel = self.kernel.to_kernel()?;
        if self.cache_kernel {
            Ok(Box::new(CachedKernel::new(kernel)))
        } else {
            Ok(kernel)
        }
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.check_fields()?;
        Ok(config)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded herding configuration");
        Ok(config)
    }

    fn check_fields(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::InvalidValue {
            key: "sample_size_percent".to_string(),
            message: e.to_string(),
        })?;
        self.kernel
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "kernel".to_string(),
                message: e.to_string(),
            })
    }

    /// Checks that the percentage lies in (0, 100].
    pub fn validate(&self) -> Result<(), HerdingError> {
        let percent = self.sample_size_percent;
        if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
            return Err(HerdingError::InvalidConfiguration(format!(
                "sample size percent must be in (0, 100], got {percent}"
            )));
        }
        Ok(())
    }

    /// Number of items to select from a collection of `n`.
    ///
    /// `floor(n × percent / 100)`, truncating. Fails for an empty
    /// collection, or when the result would be zero or exceed `n`.
    pub fn target_size(&self, n: usize) -> Result<usize, HerdingError> {
        if n == 0 {
            return Err(HerdingError::EmptyCollection);
        }
        self.validate()?;

        let fraction = self.sample_size_percent / 100.0;
        let target = (n as f64 * fraction).floor() as usize;

        if target == 0 {
            return Err(HerdingError::InvalidConfiguration(format!(
                "{}% of {n} items rounds down to an empty subset",
                self.sample_size_percent
            )));
        }
        if target > n {
            return Err(HerdingError::InvalidConfiguration(format!(
                "target size {target} exceeds collection size {n}"
            )));
        }
        Ok(target)
    }
}
