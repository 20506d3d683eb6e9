// batch.rs

use rayon::prelude::*;

use crate::error::Result;
use crate::{BinningScheme, GenomicCoordinates};

impl BinningScheme {
    /// Assign bins to many [start, stop) ranges in parallel.
    ///
    /// Bins are returned in input order. Any invalid range fails the whole batch.
    pub fn assign_bins(&self, ranges: &[(u64, u64)]) -> Result<Vec<u32>> {
        ranges
            .par_iter()
            .map(|&(start, stop)| self.assign_bin(start, stop))
            .collect()
    }

    /// Assign bins to many records in parallel, in input order.
    pub fn assign_bins_for<C>(&self, records: &[C]) -> Result<Vec<u32>>
    where
        C: GenomicCoordinates + Sync,
    {
        records
            .par_iter()
            .map(|record| self.bin_for(record))
            .collect()
    }
}
