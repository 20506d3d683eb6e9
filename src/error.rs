// error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinningError {
    #[error("Invalid range [{start}, {stop}): stop must be greater than start and at most {max}")]
    InvalidRange { start: u64, stop: u64, max: u64 },

    #[error("Invalid bin number {bin} (maximum bin number is {max_bin})")]
    InvalidBin { bin: u32, max_bin: u32 },

    #[error("Invalid level {level} (scheme has {num_levels} levels)")]
    InvalidLevel { level: usize, num_levels: usize },

    #[error("Invalid scheme layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, BinningError>;
