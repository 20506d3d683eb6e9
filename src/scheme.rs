//! scheme.rs
//!
//! # Hierarchical Binning
//!
//! We can think about indexing a set of *reference ranges* (e.g. genomic features) such that an
//! external store can more efficiently look for reference range(s) that overlap a particular
//! *query range*. This module only computes the bin keys; storing them is left to the caller.
//!
//! A hierarchical binning strategy places each reference range into a unique *bin*, based on
//! its position and width. Bin widths form a geometric sequence: for the UCSC scheme they start
//! at 512Mb (2^29) for level 0 and decrease by a factor of 8 (2^3) at each level, down to 128kb
//! (2^17) bins at level 4.
//!
//! Each reference range [start, stop) is assigned *the smallest bin it fully fits into*. The bin
//! index at a level is found by right shifting a position by that level's width exponent, e.g.
//!
//!   >>> 100_000_000 >> 17   # start right shifted at level 4 (128kb bins)
//!   762                     # this is the first bin index
//!
//!   >>> 100_191_121 >> 17   # last position right shifted at level 4
//!   764                     # this is the last bin index.
//!
//! A query range needs to be checked against *all levels*, since an overlapping reference range
//! could have been assigned at any of them.
//!
//! ## The Offset Scheme
//!
//! Each level's offset is calculated to start *after* all bins in each previous level:
//!
//!  Level 0: 1 bin
//!  Level 1: needs to start after bin 0     -> starts at 1
//!  Level 2: needs to start after bin 8     -> starts at 9
//!  Level 3: needs to start after bin 72    -> starts at 73
//!  Level 4: needs to start after bin 584   -> starts at 585
//!
//! so the UCSC scheme numbers its bins 0 through 4680.

use std::ops::RangeInclusive;

use tracing::{debug, trace, warn};

use crate::error::{BinningError, Result};
use crate::layout::{SchemeLayout, UCSC_BIN_OFFSETS, UCSC_MAX_POSITION, UCSC_TOTAL_BINS};
use crate::GenomicCoordinates;

/// A fixed hierarchy of bins over the coordinate space `[0, max_position)`.
///
/// All per-level tables are indexed by level, coarsest (level 0, a single bin) first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinningScheme {
    layout: SchemeLayout,
    max_position: u64,
    /// Right shift turning a position into a bin index, per level.
    shifts: Vec<u32>,
    /// Number of bins per level.
    levels: Vec<u32>,
    /// Id of the first bin of each level.
    bin_offsets: Vec<u32>,
    total_bins: u32,
}

/// Calculate number of bins at each level, coarsest first.
///
/// Returns `None` if a level's bin count does not fit in a `u32`.
pub fn calc_level_sizes(level_shift: u32, num_levels: usize) -> Option<Vec<u32>> {
    (0..num_levels)
        .map(|i| {
            let exponent = level_shift.checked_mul(u32::try_from(i).ok()?)?;
            1u32.checked_shl(exponent)
        })
        .collect()
}

/// Calculate the bin offsets for these levels, i.e. the cumulative bin count of all coarser
/// levels.
///
/// Returns `None` if the offsets overflow a `u32`.
pub fn calc_offsets_from_levels(levels: &[u32]) -> Option<Vec<u32>> {
    let mut offsets = Vec::with_capacity(levels.len());
    let mut sum = 0u32;
    for &count in levels {
        offsets.push(sum);
        sum = sum.checked_add(count)?;
    }
    Some(offsets)
}

/// Calculate the bin offsets, from level 0 to level nlevels, with each level having
/// `2^level_shift` times more bins than the previous one.
pub fn calc_offsets(level_shift: u32, num_levels: usize) -> Option<Vec<u32>> {
    calc_offsets_from_levels(&calc_level_sizes(level_shift, num_levels)?)
}

/// The first and last bin id overlapping a range at one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelRange {
    pub level: usize,
    pub first: u32,
    pub last: u32,
}

impl LevelRange {
    /// Whether the range falls entirely within one bin at this level.
    pub fn is_single(&self) -> bool {
        self.first == self.last
    }

    pub fn bins(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }
}

/// Iterator over the [`LevelRange`]s of a range, from the finest level to level 0.
#[derive(Clone, Debug)]
pub struct LevelRanges<'a> {
    scheme: &'a BinningScheme,
    start: u64,
    last: u64,
    remaining: usize,
}

impl Iterator for LevelRanges<'_> {
    type Item = LevelRange;

    fn next(&mut self) -> Option<LevelRange> {
        let level = self.remaining.checked_sub(1)?;
        self.remaining = level;
        let shift = self.scheme.shifts[level];
        let offset = self.scheme.bin_offsets[level];
        // both positions are below max_position, so the indices fit the level's bin count
        Some(LevelRange {
            level,
            first: offset + (self.start >> shift) as u32,
            last: offset + (self.last >> shift) as u32,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for LevelRanges<'_> {}

impl Default for BinningScheme {
    fn default() -> Self {
        Self::ucsc()
    }
}

impl BinningScheme {
    /// The classic UCSC scheme: 128kb base bins, 8x scaling, 5 levels.
    pub fn ucsc() -> Self {
        BinningScheme {
            layout: SchemeLayout::ucsc(),
            max_position: UCSC_MAX_POSITION,
            shifts: vec![29, 26, 23, 20, 17],
            levels: vec![1, 8, 64, 512, 4096],
            bin_offsets: UCSC_BIN_OFFSETS.to_vec(),
            total_bins: UCSC_TOTAL_BINS,
        }
    }

    /// Build a scheme for an arbitrary layout.
    pub fn from_layout(layout: SchemeLayout) -> Result<Self> {
        let scheme = Self::build(layout).inspect_err(|e| {
            warn!(%layout, "rejected binning layout: {}", e);
        })?;
        debug!(
            %layout,
            max_position = scheme.max_position,
            total_bins = scheme.total_bins,
            "built binning scheme"
        );
        Ok(scheme)
    }

    fn build(layout: SchemeLayout) -> Result<Self> {
        let invalid = |msg: &str| BinningError::InvalidLayout(format!("{} ({})", msg, layout));

        if layout.num_levels == 0 {
            return Err(invalid("at least one level is required"));
        }
        if layout.level_shift == 0 {
            return Err(invalid("level_shift must be positive"));
        }
        let top_shift = layout.top_shift();
        if top_shift > 32 {
            return Err(invalid("coordinate space exceeds 2^32"));
        }

        let levels = calc_level_sizes(layout.level_shift, layout.num_levels)
            .ok_or_else(|| invalid("finest level has too many bins"))?;
        let bin_offsets =
            calc_offsets_from_levels(&levels).ok_or_else(|| invalid("too many bins"))?;
        let total_bins = levels
            .iter()
            .try_fold(0u32, |sum, &count| sum.checked_add(count))
            .ok_or_else(|| invalid("too many bins"))?;
        let shifts = (0..layout.num_levels)
            .map(|level| top_shift - layout.level_shift * level as u32)
            .collect();

        Ok(BinningScheme {
            layout,
            max_position: 1u64 << top_shift,
            shifts,
            levels,
            bin_offsets,
            total_bins,
        })
    }

    pub fn layout(&self) -> SchemeLayout {
        self.layout
    }

    /// One past the largest position covered, i.e. the largest valid `stop`.
    pub fn max_position(&self) -> u64 {
        self.max_position
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn total_bins(&self) -> u32 {
        self.total_bins
    }

    pub fn max_bin(&self) -> u32 {
        self.total_bins - 1
    }

    /// Bin ids of the first bin at each level, coarsest first.
    pub fn offsets(&self) -> &[u32] {
        &self.bin_offsets
    }

    /// Number of bins at each level, coarsest first.
    pub fn level_sizes(&self) -> &[u32] {
        &self.levels
    }

    fn check_level(&self, level: usize) -> Result<()> {
        if level < self.num_levels() {
            Ok(())
        } else {
            Err(BinningError::InvalidLevel {
                level,
                num_levels: self.num_levels(),
            })
        }
    }

    pub fn shift(&self, level: usize) -> Result<u32> {
        self.check_level(level)?;
        Ok(self.shifts[level])
    }

    pub fn bin_width(&self, level: usize) -> Result<u64> {
        Ok(1u64 << self.shift(level)?)
    }

    pub fn bins_at(&self, level: usize) -> Result<u32> {
        self.check_level(level)?;
        Ok(self.levels[level])
    }

    pub fn offset(&self, level: usize) -> Result<u32> {
        self.check_level(level)?;
        Ok(self.bin_offsets[level])
    }

    fn check_range(&self, start: u64, stop: u64) -> Result<()> {
        if start < stop && stop <= self.max_position {
            Ok(())
        } else {
            Err(BinningError::InvalidRange {
                start,
                stop,
                max: self.max_position,
            })
        }
    }

    /// For each level, starting with the smallest bins, the first and last bin overlapping
    /// [start, stop).
    pub fn range_per_level(&self, start: u64, stop: u64) -> Result<LevelRanges<'_>> {
        self.check_range(start, stop)?;
        Ok(LevelRanges {
            scheme: self,
            start,
            last: stop - 1, // Exclusive end, so subtract 1
            remaining: self.num_levels(),
        })
    }

    /// Find the smallest bin that fully contains this range, [start, stop).
    pub fn assign_bin(&self, start: u64, stop: u64) -> Result<u32> {
        let bin = self
            .range_per_level(start, stop)?
            .find(LevelRange::is_single)
            .map_or(0, |range| range.first); // level 0 has a single bin
        trace!(start, stop, bin, "assigned bin");
        Ok(bin)
    }

    /// Find the bin of a record's range.
    pub fn bin_for<C: GenomicCoordinates>(&self, record: &C) -> Result<u32> {
        self.assign_bin(record.start(), record.end())
    }

    /// Find all bins that could contain features overlapping this range [start, stop).
    ///
    /// Bins are ordered by level, smallest bins first, and ascending within a level. This is a
    /// candidate set: features found in these bins still need an exact overlap check.
    pub fn overlapping_bins(&self, start: u64, stop: u64) -> Result<Vec<u32>> {
        Ok(self
            .range_per_level(start, stop)?
            .flat_map(|range| range.bins())
            .collect())
    }

    /// Overlapping bins of the single position `pos`, i.e. of [pos, pos + 1).
    pub fn position_bins(&self, pos: u64) -> Result<Vec<u32>> {
        self.overlapping_bins(pos, pos.saturating_add(1))
    }

    /// Find all bins whose range fully contains [start, stop): the assigned bin and all of
    /// its ancestors, smallest first.
    pub fn containing_bins(&self, start: u64, stop: u64) -> Result<Vec<u32>> {
        Ok(self
            .range_per_level(start, stop)?
            .filter(LevelRange::is_single)
            .map(|range| range.first)
            .collect())
    }

    /// Find all bins whose range lies entirely within [start, stop), smallest first.
    pub fn contained_bins(&self, start: u64, stop: u64) -> Result<Vec<u32>> {
        self.check_range(start, stop)?;
        let mut bins = Vec::new();
        for level in (0..self.num_levels()).rev() {
            let shift = self.shifts[level];
            let first = start.div_ceil(1u64 << shift);
            let end = stop >> shift;
            let offset = self.bin_offsets[level];
            bins.extend((first..end).map(|index| offset + index as u32));
        }
        Ok(bins)
    }

    /// Find all bins that could contain features lying completely within [start, stop).
    ///
    /// Such a feature is assigned either the query's own bin or a bin at a finer level, so
    /// this is every overlapping bin numbered at or after the query's bin.
    pub fn contained_candidates(&self, start: u64, stop: u64) -> Result<Vec<u32>> {
        let ranges = self.range_per_level(start, stop)?;
        let min_bin = ranges
            .clone()
            .find(LevelRange::is_single)
            .map_or(0, |range| range.first);
        Ok(ranges
            .flat_map(|range| range.bins())
            .filter(|&bin| bin >= min_bin)
            .collect())
    }

    /// Resolve a bin id to its (level, index within level).
    pub fn locate_bin(&self, bin: u32) -> Result<(usize, u32)> {
        if bin >= self.total_bins {
            return Err(BinningError::InvalidBin {
                bin,
                max_bin: self.max_bin(),
            });
        }
        // offsets are ascending and start at 0, so at least one is <= bin
        let level = self.bin_offsets.partition_point(|&offset| offset <= bin) - 1;
        Ok((level, bin - self.bin_offsets[level]))
    }

    /// The [start, stop) range covered by a bin.
    pub fn covered_interval(&self, bin: u32) -> Result<(u64, u64)> {
        let (level, index) = self.locate_bin(bin)?;
        let shift = self.shifts[level];
        let index = u64::from(index);
        Ok((index << shift, (index + 1) << shift))
    }
}
