// layout.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base shift of the UCSC scheme: the finest bins are 128kb (2^17) wide.
pub const UCSC_BASE_SHIFT: u32 = 17;
/// Each coarser UCSC level is 8x (2^3) wider.
pub const UCSC_LEVEL_SHIFT: u32 = 3;
pub const UCSC_NUM_LEVELS: usize = 5;
/// One past the largest position the UCSC scheme covers (512Mb, 2^29).
pub const UCSC_MAX_POSITION: u64 = 1 << 29;
/// UCSC bin offsets, from level 0 (one 512Mb bin) to level 4 (4096 128kb bins).
pub const UCSC_BIN_OFFSETS: [u32; UCSC_NUM_LEVELS] = [0, 1, 9, 73, 585];
pub const UCSC_TOTAL_BINS: u32 = 4681;

/// The geometry of a hierarchical binning scheme.
///
/// The finest level's bins are `2^base_shift` wide, and each coarser level's bins are
/// `2^level_shift` times wider, up to a single bin at level 0. The coordinate space covered is
/// thus `[0, 2^(base_shift + level_shift * (num_levels - 1)))`.
///
/// A layout is plain configuration; it derives serde so it can be stored next to the bin
/// values it was used to compute, and read back with any serde format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemeLayout {
    pub base_shift: u32,
    pub level_shift: u32,
    pub num_levels: usize,
}

impl Default for SchemeLayout {
    fn default() -> Self {
        Self::ucsc()
    }
}

impl SchemeLayout {
    pub fn new(base_shift: u32, level_shift: u32, num_levels: usize) -> Self {
        Self {
            base_shift,
            level_shift,
            num_levels,
        }
    }

    // The classic UCSC configuration
    pub fn ucsc() -> Self {
        Self::new(UCSC_BASE_SHIFT, UCSC_LEVEL_SHIFT, UCSC_NUM_LEVELS) // 128kb base bins, 8x scaling, 5 levels
    }

    // A denser layout for higher resolution
    pub fn dense() -> Self {
        Self::new(14, 2, 6) // 16kb base bins, 4x scaling, 6 levels
    }

    // A sparser layout for large regions
    pub fn sparse() -> Self {
        Self::new(20, 4, 4) // 1Mb base bins, 16x scaling, 4 levels
    }

    /// The shift of the coarsest level, i.e. log2 of the covered space.
    ///
    /// Saturates rather than overflowing so absurd layouts can still be reported.
    pub fn top_shift(&self) -> u32 {
        let levels = u32::try_from(self.num_levels.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_shift
            .saturating_add(self.level_shift.saturating_mul(levels))
    }
}

impl fmt::Display for SchemeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "base_shift={},level_shift={},levels={}",
            self.base_shift, self.level_shift, self.num_levels
        )
    }
}
