//! The greedy herding loop.
//!
//! Algorithm:
//! 1. Build the kernel over the full collection
//! 2. Compute every item's baseline similarity
//! 3. Seed the subset with the item of highest baseline
//! 4. Repeatedly add the item maximising
//!    `baseline[j] − accumulated[j] / (|selected| + 1)`,
//!    asking the collision resolver when that item is already selected
//! 5. Stop once the target size is reached

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use super::accumulator::SimilarityAccumulator;
use super::config::HerdingConfig;
use super::resolver::{BacktrackResolver, CollisionResolver, Resolution};
use super::selection::{SelectedSet, Selection, SelectionStats};
use crate::dataset::Dataset;
use crate::error::HerdingError;
use crate::kernel::Kernel;

/// Phases of a selection run, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Seeding,
    Iterating,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not_started",
            Phase::Seeding => "seeding",
            Phase::Iterating => "iterating",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Herding phase transition");
    *phase = next;
}

/// Kernel herding subset selector.
///
/// # Example
///
/// ```
/// use kernel_herding::dataset::Dataset;
/// use kernel_herding::herding::{HerdingConfig, KernelHerding};
/// use kernel_herding::kernel::RbfKernel;
///
/// let data = Dataset::from_rows(vec![vec![0.0], vec![0.1], vec![5.0], vec![5.1]]).unwrap();
/// let config = HerdingConfig::new().with_sample_size_percent(50.0).with_seed(42);
///
/// let selection = KernelHerding::new(config)
///     .select(&mut RbfKernel::new(0.5), &data)
///     .unwrap();
/// assert_eq!(selection.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KernelHerding<R = BacktrackResolver> {
    config: HerdingConfig,
    resolver: R,
}

impl KernelHerding<BacktrackResolver> {
    /// Creates a selector with the default collision resolver.
    pub fn new(config: HerdingConfig) -> Self {
        let resolver = BacktrackResolver::new(config.trail_walk);
        Self { config, resolver }
    }
}

impl<R: CollisionResolver> KernelHerding<R> {
    /// Replaces the collision resolver.
    pub fn with_resolver<S: CollisionResolver>(self, resolver: S) -> KernelHerding<S> {
        KernelHerding {
            config: self.config,
            resolver,
        }
    }

    pub fn config(&self) -> &HerdingConfig {
        &self.config
    }

    /// Selects a subset using a generator seeded from the configuration.
    pub fn select<K: Kernel + ?Sized>(
        &mut self,
        kernel: &mut K,
        data: &Dataset,
    ) -> Result<Selection, HerdingError> {
        let mut rng = create_rng(self.config.seed);
        self.select_with_rng(kernel, data, &mut rng)
    }

    /// Selects a subset, drawing collision fallbacks from `rng`.
    ///
    /// The kernel is built over `data` first. Configuration errors are
    /// reported before the kernel is touched.
    pub fn select_with_rng<K, G>(
        &mut self,
        kernel: &mut K,
        data: &Dataset,
        rng: &mut G,
    ) -> Result<Selection, HerdingError>
    where
        K: Kernel + ?Sized,
        G: Rng + ?Sized,
    {
        let mut phase = Phase::NotStarted;
        let n = data.len();
        let target = self.config.target_size(n)?;
        let floor = self.config.score_floor.value();

        info!(
            kernel = %kernel.name(),
            items = n,
            target_size = target,
            "Starting kernel herding selection"
        );

        transition(&mut phase, Phase::Seeding);
        kernel.build(data)?;
        let mut accumulator =
            SimilarityAccumulator::compute(&*kernel, data, self.config.self_similarity)?;

        let seed_index = accumulator.argmax_baseline(floor);
        let mut selected = SelectedSet::new(n);
        selected.push(seed_index)?;
        debug!(
            index = seed_index,
            baseline = accumulator.baseline()[seed_index],
            "Seeded subset"
        );

        let mut stats = SelectionStats {
            items: n,
            target_size: target,
            seed_index,
            ..SelectionStats::default()
        };

        transition(&mut phase, Phase::Iterating);
        let mut trail: Vec<usize> = Vec::new();
        let mut last = seed_index;
        let mut count = 2;
        while count <= target {
            trail.clear();
            let mut best_score = floor;
            let mut best = 0;

            accumulator.update(&*kernel, data, last)?;

            for j in 0..n {
                let score = accumulator.score(j, selected.len());
                if score > best_score {
                    trail.push(j);
                    best_score = score;
                    best = j;
                }
            }

            let pick = if selected.contains(best) {
                stats.collisions += 1;
                let resolution = self.resolver.resolve(&trail, &selected, rng)?;
                match resolution {
                    Resolution::Trail(index) => {
                        stats.trail_resolutions += 1;
                        debug!(
                            collided = best,
                            replacement = index,
                            resolution = resolution.label(),
                            "Resolved collision"
                        );
                    }
                    Resolution::Random(index) => {
                        stats.random_fallbacks += 1;
                        warn!(
                            collided = best,
                            replacement = index,
                            step = count,
                            "No unselected candidate on trail, using random fallback"
                        );
                    }
                }
                resolution.index()
            } else {
                best
            };

            trace!(step = count, index = pick, score = best_score, "Selected item");
            selected.push(pick)?;
            last = pick;
            count += 1;
        }

        transition(&mut phase, Phase::Done);
        stats.kernel_evaluations = accumulator.evaluations();

        info!(
            selected = selected.len(),
            collisions = stats.collisions,
            random_fallbacks = stats.random_fallbacks,
            kernel_evaluations = stats.kernel_evaluations,
            "Kernel herding selection complete"
        );

        Ok(Selection {
            indices: selected.into_vec(),
            baseline: accumulator.into_baseline(),
            stats,
        })
    }
}

/// Creates the fallback generator.
pub(crate) fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::herding::config::{ScoreFloor, SelfSimilarity, TrailWalk};
    use crate::kernel::{PrecomputedKernel, RbfKernel};
    use ndarray::{array, Array2};
    use std::collections::HashSet;

    fn index_data(n: usize) -> Dataset {
        Dataset::new(Array2::zeros((n, 1)))
    }

    fn half_kernel(n: usize) -> PrecomputedKernel {
        PrecomputedKernel::from_fn(n, |i, j| if i == j { 1.0 } else { 0.5 })
    }

    /// Item 2 is similar to everything but barely to itself, so it keeps
    /// winning after it has been selected.
    fn sticky_kernel() -> PrecomputedKernel {
        PrecomputedKernel::new(array![[1.0, 0.0, 2.0], [0.0, 1.0, 2.0], [2.0, 2.0, 0.1]])
            .expect("square")
    }

    #[test]
    fn test_uniform_kernel_zero_floor() {
        let config = HerdingConfig::new().with_seed(1);
        let selection = KernelHerding::new(config)
            .select(&mut half_kernel(4), &index_data(4))
            .expect("select");

        assert_eq!(selection.baseline, vec![0.375; 4]);
        assert_eq!(selection.indices, vec![0, 1, 2, 3]);
        // The last step has no positive score and falls back to the only
        // unselected item.
        assert_eq!(selection.stats.collisions, 1);
        assert_eq!(selection.stats.random_fallbacks, 1);
    }

    #[test]
    fn test_uniform_kernel_negative_infinity_floor() {
        let config = HerdingConfig::new().with_score_floor(ScoreFloor::NegativeInfinity);
        let selection = KernelHerding::new(config)
            .select(&mut half_kernel(4), &index_data(4))
            .expect("select");

        assert_eq!(selection.indices, vec![0, 1, 2, 3]);
        assert_eq!(selection.stats.collisions, 0);
    }

    #[test]
    fn test_single_item_is_baseline_argmax() {
        let kernel_values = array![
            [1.0, 0.1, 0.2, 0.1],
            [0.1, 1.0, 0.9, 0.9],
            [0.2, 0.9, 1.0, 0.9],
            [0.1, 0.9, 0.9, 1.0]
        ];
        let config = HerdingConfig::new().with_sample_size_percent(25.0);
        let selection = KernelHerding::new(config)
            .select(
                &mut PrecomputedKernel::new(kernel_values).expect("square"),
                &index_data(4),
            )
            .expect("select");

        // Row 2 has the largest similarity sum.
        assert_eq!(selection.indices, vec![2]);
        assert_eq!(selection.stats.kernel_evaluations, 16);
    }

    #[test]
    fn test_collision_resolved_from_trail() {
        let config = HerdingConfig::new()
            .with_sample_size_percent(70.0)
            .with_score_floor(ScoreFloor::NegativeInfinity);
        let selection = KernelHerding::new(config)
            .select(&mut sticky_kernel(), &index_data(3))
            .expect("select");

        assert_eq!(selection.indices, vec![2, 0]);
        assert_eq!(selection.stats.collisions, 1);
        assert_eq!(selection.stats.trail_resolutions, 1);
    }

    #[test]
    fn test_skip_first_trail_walk_falls_back_to_random() {
        let config = HerdingConfig::new()
            .with_sample_size_percent(70.0)
            .with_score_floor(ScoreFloor::NegativeInfinity)
            .with_trail_walk(TrailWalk::SkipFirst)
            .with_seed(5);
        let selection = KernelHerding::new(config)
            .select(&mut sticky_kernel(), &index_data(3))
            .expect("select");

        // The only near-miss is the first trail entry, which is off limits.
        assert_eq!(selection.indices[0], 2);
        assert!(selection.indices[1] < 2);
        assert_eq!(selection.stats.trail_resolutions, 0);
        assert_eq!(selection.stats.random_fallbacks, 1);
    }

    #[test]
    fn test_collision_random_fallback_with_zero_floor() {
        let config = HerdingConfig::new()
            .with_sample_size_percent(70.0)
            .with_seed(9);
        let selection = KernelHerding::new(config)
            .select(&mut sticky_kernel(), &index_data(3))
            .expect("select");

        assert_eq!(selection.indices[0], 2);
        assert!(selection.indices[1] < 2);
        assert_eq!(selection.stats.random_fallbacks, 1);
    }

    #[test]
    fn test_full_selection_is_permutation() {
        let data = Dataset::new(array![
            [0.0, 0.0],
            [0.1, 0.0],
            [3.0, 3.0],
            [3.1, 2.9],
            [-2.0, 1.0],
            [0.05, 0.1],
            [2.9, 3.2]
        ]);
        let config = HerdingConfig::new().with_seed(3);
        let selection = KernelHerding::new(config)
            .select(&mut RbfKernel::new(0.5), &data)
            .expect("select");

        let mut sorted = selection.indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_never_duplicates() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for trial in 0..25u64 {
            let n = 3 + (trial as usize % 9);
            let values: Vec<f64> = (0..n * n)
                .map(|_| {
                    use rand::RngExt;
                    rng.random_range(-1.0..2.0)
                })
                .collect();
            let gram = Array2::from_shape_vec((n, n), values).expect("shape");
            let mut kernel = PrecomputedKernel::new(gram).expect("square");

            let config = HerdingConfig::new()
                .with_sample_size_percent(60.0 + (trial as f64))
                .with_seed(trial);
            let selection = KernelHerding::new(config.clone())
                .select(&mut kernel, &index_data(n))
                .expect("select");

            let unique: HashSet<_> = selection.indices.iter().collect();
            assert_eq!(unique.len(), selection.len(), "trial {trial}");
            assert_eq!(
                selection.len(),
                config.target_size(n).expect("valid"),
                "trial {trial}"
            );
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let data = index_data(12);
        let gram = Array2::from_shape_fn((12, 12), |(i, j)| {
            if i == j {
                1.0
            } else {
                ((i * 7 + j * 3) % 5) as f64 / 10.0
            }
        });

        let run = || {
            KernelHerding::new(HerdingConfig::new().with_sample_size_percent(75.0).with_seed(5))
                .select(
                    &mut PrecomputedKernel::new(gram.clone()).expect("square"),
                    &data,
                )
                .expect("select")
                .indices
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_self_similarity_exact() {
        // Diagonal of 3 with assume-unit leaves a large self term in the baseline.
        let kernel = || PrecomputedKernel::from_fn(3, |i, j| if i == j { 3.0 } else { 1.0 });
        let config = HerdingConfig::new()
            .with_sample_size_percent(34.0)
            .with_self_similarity(SelfSimilarity::Exact);
        let selection = KernelHerding::new(config)
            .select(&mut kernel(), &index_data(3))
            .expect("select");

        assert!(selection
            .baseline
            .iter()
            .all(|&b| (b - 2.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_empty_collection() {
        let result = KernelHerding::new(HerdingConfig::default())
            .select(&mut half_kernel(0), &index_data(0));
        assert!(matches!(result, Err(HerdingError::EmptyCollection)));
    }

    #[test]
    fn test_invalid_percent_rejected_before_build() {
        let config = HerdingConfig::new().with_sample_size_percent(0.0);
        let mut kernel = half_kernel(4);
        let result = KernelHerding::new(config).select(&mut kernel, &index_data(4));
        assert!(matches!(result, Err(HerdingError::InvalidConfiguration(_))));

        // Never built.
        assert!(kernel.eval(0, 0, index_data(1).item(0)).is_err());
    }

    #[test]
    fn test_kernel_error_propagates() {
        let mut kernel = half_kernel(3);
        let result =
            KernelHerding::new(HerdingConfig::default()).select(&mut kernel, &index_data(4));
        assert!(matches!(result, Err(HerdingError::Kernel(_))));
    }

    #[derive(Default)]
    struct LowestUnselected {
        calls: usize,
    }

    impl CollisionResolver for LowestUnselected {
        fn resolve<G: Rng + ?Sized>(
            &mut self,
            _trail: &[usize],
            selected: &SelectedSet,
            _rng: &mut G,
        ) -> Result<Resolution, HerdingError> {
            self.calls += 1;
            (0..selected.universe())
                .find(|&i| !selected.contains(i))
                .map(Resolution::Random)
                .ok_or(HerdingError::ExhaustedFallback {
                    selected: selected.len(),
                    total: selected.universe(),
                })
        }
    }

    #[test]
    fn test_custom_resolver() {
        let config = HerdingConfig::new().with_sample_size_percent(70.0);
        let mut herding = KernelHerding::new(config).with_resolver(LowestUnselected::default());
        let selection = herding
            .select(&mut sticky_kernel(), &index_data(3))
            .expect("select");

        assert_eq!(selection.indices, vec![2, 0]);
        assert_eq!(herding.resolver.calls, 1);
    }
}
