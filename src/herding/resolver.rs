//! Collision handling for the greedy selector.
//!
//! A collision happens when the best-scoring candidate of a step has
//! already been selected. The resolver picks the replacement.

use rand::{Rng, RngExt};

use super::config::TrailWalk;
use super::selection::SelectedSet;
use crate::error::HerdingError;

/// Where a replacement index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// An earlier entry of the candidate trail.
    Trail(usize),
    /// A uniformly drawn unselected index.
    Random(usize),
}

impl Resolution {
    pub fn index(self) -> usize {
        match self {
            Resolution::Trail(index) | Resolution::Random(index) => index,
        }
    }

    /// Metric label for this resolution.
    pub fn label(self) -> &'static str {
        match self {
            Resolution::Trail(_) => "trail",
            Resolution::Random(_) => "random",
        }
    }
}

/// Policy choosing a replacement for a colliding candidate.
pub trait CollisionResolver {
    /// Returns an index not contained in `selected`.
    ///
    /// `trail` lists, in scan order, every candidate that raised the running
    /// maximum during the step; its last entry is the colliding one.
    fn resolve<G: Rng + ?Sized>(
        &mut self,
        trail: &[usize],
        selected: &SelectedSet,
        rng: &mut G,
    ) -> Result<Resolution, HerdingError>;
}

/// Walks the trail backwards for the most recent unselected near-miss,
/// then falls back to rejection sampling over all items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BacktrackResolver {
    walk: TrailWalk,
}

impl BacktrackResolver {
    pub fn new(walk: TrailWalk) -> Self {
        Self { walk }
    }

    pub fn walk(&self) -> TrailWalk {
        self.walk
    }
}

impl CollisionResolver for BacktrackResolver {
    fn resolve<G: Rng + ?Sized>(
        &mut self,
        trail: &[usize],
        selected: &SelectedSet,
        rng: &mut G,
    ) -> Result<Resolution, HerdingError> {
        let total = selected.universe();
        if selected.is_full() {
            return Err(HerdingError::ExhaustedFallback {
                selected: selected.len(),
                total,
            });
        }

        // The last entry is the collision itself.
        let lower = match self.walk {
            TrailWalk::Full => 0,
            TrailWalk::SkipFirst => 1,
        };
        let upper = trail.len().saturating_sub(1);
        let candidates = trail.get(lower..upper).unwrap_or(&[]);

        if let Some(&index) = candidates
            .iter()
            .rev()
            .find(|&&index| !selected.contains(index))
        {
            return Ok(Resolution::Trail(index));
        }

        loop {
            let index = rng.random_range(0..total);
            if !selected.contains(index) {
                return Ok(Resolution::Random(index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_prefers_most_recent_unselected() {
        let selected = SelectedSet::from_indices(6, &[4, 1]).expect("valid");
        let resolution = BacktrackResolver::default()
            .resolve(&[3, 5, 1, 4], &selected, &mut rng())
            .expect("resolve");
        assert_eq!(resolution, Resolution::Trail(5));
    }

    #[test]
    fn test_skips_selected_trail_entries() {
        let selected = SelectedSet::from_indices(6, &[4, 1, 5]).expect("valid");
        let resolution = BacktrackResolver::default()
            .resolve(&[3, 5, 1, 4], &selected, &mut rng())
            .expect("resolve");
        assert_eq!(resolution, Resolution::Trail(3));
    }

    #[test]
    fn test_first_trail_entry_is_a_candidate() {
        let selected = SelectedSet::from_indices(3, &[2]).expect("valid");
        let resolution = BacktrackResolver::default()
            .resolve(&[0, 2], &selected, &mut rng())
            .expect("resolve");
        assert_eq!(resolution, Resolution::Trail(0));
    }

    #[test]
    fn test_skip_first_never_returns_first_entry() {
        let selected = SelectedSet::from_indices(5, &[4]).expect("valid");
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let resolution = BacktrackResolver::new(TrailWalk::SkipFirst)
                .resolve(&[1, 4], &selected, &mut rng)
                .expect("resolve");
            assert!(matches!(resolution, Resolution::Random(i) if i != 4));
        }
    }

    #[test]
    fn test_skip_first_still_uses_middle_entries() {
        let selected = SelectedSet::from_indices(6, &[4, 1]).expect("valid");
        let resolution = BacktrackResolver::new(TrailWalk::SkipFirst)
            .resolve(&[3, 5, 1, 4], &selected, &mut rng())
            .expect("resolve");
        assert_eq!(resolution, Resolution::Trail(5));

        let selected = SelectedSet::from_indices(6, &[4, 1, 5]).expect("valid");
        let resolution = BacktrackResolver::new(TrailWalk::SkipFirst)
            .resolve(&[3, 5, 1, 4], &selected, &mut rng())
            .expect("resolve");
        assert!(matches!(resolution, Resolution::Random(_)));
    }

    #[test]
    fn test_random_fallback_picks_unselected() {
        let selected = SelectedSet::from_indices(5, &[0, 1, 3, 4]).expect("valid");
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let resolution = BacktrackResolver::default()
                .resolve(&[3], &selected, &mut rng)
                .expect("resolve");
            assert_eq!(resolution, Resolution::Random(2));
        }
    }

    #[test]
    fn test_empty_trail_falls_back() {
        let selected = SelectedSet::from_indices(4, &[0]).expect("valid");
        let resolution = BacktrackResolver::default()
            .resolve(&[], &selected, &mut rng())
            .expect("resolve");
        assert!(matches!(resolution, Resolution::Random(i) if i != 0 && i < 4));
    }

    #[test]
    fn test_random_fallback_is_seeded() {
        let selected = SelectedSet::from_indices(100, &[7]).expect("valid");
        let a = BacktrackResolver::default()
            .resolve(&[7], &selected, &mut rng())
            .expect("resolve");
        let b = BacktrackResolver::default()
            .resolve(&[7], &selected, &mut rng())
            .expect("resolve");
        assert_eq!(a, b);
    }

    #[test]
    fn test_exhausted() {
        let selected = SelectedSet::from_indices(2, &[0, 1]).expect("valid");
        let result = BacktrackResolver::default().resolve(&[1], &selected, &mut rng());
        assert!(matches!(
            result,
            Err(HerdingError::ExhaustedFallback {
                selected: 2,
                total: 2
            })
        ));
    }

    #[test]
    fn test_resolution_accessors() {
        assert_eq!(Resolution::Trail(3).index(), 3);
        assert_eq!(Resolution::Random(9).label(), "random");
    }
}
