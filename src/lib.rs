mod batch;
pub mod error;
pub mod layout;
pub mod scheme;

pub use error::{BinningError, Result};
pub use layout::*;
pub use scheme::{BinningScheme, LevelRange, LevelRanges};

/// Trait for types that have genomic coordinates
pub trait GenomicCoordinates {
    /// Get the start coordinate (0-based, inclusive)
    fn start(&self) -> u64;

    /// Get the end coordinate (0-based, exclusive)
    fn end(&self) -> u64;
}
