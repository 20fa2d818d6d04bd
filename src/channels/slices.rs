//! Channel categories and the slice map
//!
//! The flattened state vector is laid out category by category in a fixed
//! order. Each category owns one contiguous half-open index range. The map is
//! built from per-category counts with a running sum, so the ranges partition
//! `[0, total)` by construction and empty categories get zero-width ranges.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::channels::Direction;

// =================================================================================================
// Channel Category
// =================================================================================================

/// Kind of channel, in state vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCategory {
    Signal,
    CoPump,
    CounterPump,
    ForwardAse,
    BackwardAse,
    ForwardRaman,
    BackwardRaman,
}

impl ChannelCategory {
    /// Every category in state vector order
    pub const ALL: [ChannelCategory; 7] = [
        ChannelCategory::Signal,
        ChannelCategory::CoPump,
        ChannelCategory::CounterPump,
        ChannelCategory::ForwardAse,
        ChannelCategory::BackwardAse,
        ChannelCategory::ForwardRaman,
        ChannelCategory::BackwardRaman,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position of the category in [`ChannelCategory::ALL`]
    pub fn index(self) -> usize {
        match self {
            ChannelCategory::Signal => 0,
            ChannelCategory::CoPump => 1,
            ChannelCategory::CounterPump => 2,
            ChannelCategory::ForwardAse => 3,
            ChannelCategory::BackwardAse => 4,
            ChannelCategory::ForwardRaman => 5,
            ChannelCategory::BackwardRaman => 6,
        }
    }

    /// Direction shared by every channel of the category
    pub fn direction(self) -> Direction {
        match self {
            ChannelCategory::Signal
            | ChannelCategory::CoPump
            | ChannelCategory::ForwardAse
            | ChannelCategory::ForwardRaman => Direction::Forward,
            ChannelCategory::CounterPump
            | ChannelCategory::BackwardAse
            | ChannelCategory::BackwardRaman => Direction::Backward,
        }
    }

    pub fn is_pump(self) -> bool {
        matches!(self, ChannelCategory::CoPump | ChannelCategory::CounterPump)
    }

    pub fn is_ase(self) -> bool {
        matches!(self, ChannelCategory::ForwardAse | ChannelCategory::BackwardAse)
    }

    pub fn is_raman(self) -> bool {
        matches!(self, ChannelCategory::ForwardRaman | ChannelCategory::BackwardRaman)
    }

    /// Short label used in logs and CSV headers
    pub fn label(self) -> &'static str {
        match self {
            ChannelCategory::Signal => "signal",
            ChannelCategory::CoPump => "co_pump",
            ChannelCategory::CounterPump => "counter_pump",
            ChannelCategory::ForwardAse => "forward_ase",
            ChannelCategory::BackwardAse => "backward_ase",
            ChannelCategory::ForwardRaman => "forward_raman",
            ChannelCategory::BackwardRaman => "backward_raman",
        }
    }
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =================================================================================================
// Slice Map
// =================================================================================================

/// Category → contiguous index range of the flattened channel list
///
/// Serialized as the per-category counts, so a deserialized map is always a
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[usize; 7]", from = "[usize; 7]")]
pub struct SliceMap {
    /// Start offset of each category, plus the total at the end
    offsets: [usize; ChannelCategory::COUNT + 1],
}

impl SliceMap {
    /// Build from the number of channels in each category, in
    /// [`ChannelCategory::ALL`] order
    pub fn from_counts(counts: [usize; ChannelCategory::COUNT]) -> Self {
        let mut offsets = [0; ChannelCategory::COUNT + 1];
        for (i, count) in counts.iter().enumerate() {
            offsets[i + 1] = offsets[i] + count;
        }
        Self { offsets }
    }

    /// Index range of a category
    pub fn slice(&self, category: ChannelCategory) -> Range<usize> {
        let i = category.index();
        self.offsets[i]..self.offsets[i + 1]
    }

    /// Number of channels in a category
    pub fn count(&self, category: ChannelCategory) -> usize {
        self.slice(category).len()
    }

    /// Total number of channels
    pub fn total(&self) -> usize {
        self.offsets[ChannelCategory::COUNT]
    }

    /// Category owning a flattened channel index
    pub fn category_of(&self, index: usize) -> Option<ChannelCategory> {
        ChannelCategory::ALL
            .into_iter()
            .find(|category| self.slice(*category).contains(&index))
    }

    /// (category, range) pairs in state vector order, empty ranges included
    pub fn iter(&self) -> impl Iterator<Item = (ChannelCategory, Range<usize>)> + '_ {
        ChannelCategory::ALL
            .into_iter()
            .map(move |category| (category, self.slice(category)))
    }
}

impl From<[usize; ChannelCategory::COUNT]> for SliceMap {
    fn from(counts: [usize; ChannelCategory::COUNT]) -> Self {
        Self::from_counts(counts)
    }
}

impl From<SliceMap> for [usize; ChannelCategory::COUNT] {
    fn from(map: SliceMap) -> Self {
        let mut counts = [0; ChannelCategory::COUNT];
        for (category, range) in map.iter() {
            counts[category.index()] = range.len();
        }
        counts
    }
}

// =================================================================================================
// Tests
// =================================================================================================
