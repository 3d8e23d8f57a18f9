//! Selection bookkeeping and results.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::HerdingError;

/// Ordered, duplicate-free set of selected indices over `0..universe`.
///
/// Keeps insertion order for the output and a membership mask for O(1)
/// collision checks.
#[derive(Debug, Clone)]
pub struct SelectedSet {
    order: Vec<usize>,
    mask: Vec<bool>,
}

impl SelectedSet {
    /// Creates an empty set over `universe` items.
    pub fn new(universe: usize) -> Self {
        Self {
            order: Vec::new(),
            mask: vec![false; universe],
        }
    }

    /// Creates a set from indices in selection order.
    pub fn from_indices(universe: usize, indices: &[usize]) -> Result<Self, HerdingError> {
        let mut set = Self::new(universe);
        for &index in indices {
            set.push(index)?;
        }
        Ok(set)
    }

    /// Appends `index`; rejects duplicates and out-of-range indices.
    pub fn push(&mut self, index: usize) -> Result<(), HerdingError> {
        let total = self.mask.len();
        match self.mask.get_mut(index) {
            None => Err(HerdingError::InvalidSelection { index, total }),
            Some(true) => Err(HerdingError::DuplicateSelection(index)),
            Some(slot) => {
                *slot = true;
                self.order.push(index);
                Ok(())
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of items that could be selected.
    pub fn universe(&self) -> usize {
        self.mask.len()
    }

    /// True once every item has been selected.
    pub fn is_full(&self) -> bool {
        self.order.len() == self.mask.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.order
    }
}

/// Counters describing one selection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    /// Size of the input collection.
    pub items: usize,
    /// Number of items requested.
    pub target_size: usize,
    /// Index chosen before the greedy loop.
    pub seed_index: usize,
    /// Kernel evaluations, baseline included.
    pub kernel_evaluations: u64,
    /// Steps whose best candidate was already selected.
    pub collisions: usize,
    /// Collisions resolved from the candidate trail.
    pub trail_resolutions: usize,
    /// Collisions resolved by drawing a random unselected item.
    pub random_fallbacks: usize,
}

/// Result of a herding run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected indices in selection order.
    pub indices: Vec<usize>,
    /// Baseline similarity of every input item.
    pub baseline: Vec<f64>,
    pub stats: SelectionStats,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The selected items, in selection order.
    pub fn apply(&self, data: &Dataset) -> Dataset {
        data.subset(&self.indices)
    }
}
