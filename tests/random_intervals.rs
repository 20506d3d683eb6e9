// Candidate bins must never lose a stored interval, checked against brute force filters on
// seeded random interval sets.

use std::collections::HashSet;

use hgbin::{BinningScheme, UCSC_MAX_POSITION, UCSC_TOTAL_BINS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_INTERVALS: usize = 1000;
const NUM_QUERIES: usize = 50;

fn random_interval<R: Rng>(rng: &mut R) -> (u64, u64) {
    let a = rng.gen_range(0..UCSC_MAX_POSITION);
    let b = rng.gen_range(0..=UCSC_MAX_POSITION);
    match a.cmp(&b) {
        std::cmp::Ordering::Less => (a, b),
        std::cmp::Ordering::Greater => (b, a),
        std::cmp::Ordering::Equal => (a, a + 1),
    }
}

// Mostly short intervals, as genomic features are.
fn random_short_interval<R: Rng>(rng: &mut R) -> (u64, u64) {
    let start = rng.gen_range(0..UCSC_MAX_POSITION - 1);
    let length = rng.gen_range(1..200_000).min(UCSC_MAX_POSITION - start);
    (start, start + length)
}

fn random_intervals(seed: u64) -> Vec<(u64, u64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..NUM_INTERVALS)
        .map(|i| {
            if i % 2 == 0 {
                random_interval(&mut rng)
            } else {
                random_short_interval(&mut rng)
            }
        })
        .collect()
}

/// Check that the intervals selected by their bins are a superset of `expected`.
fn check_binned<F, B>(seed: u64, expected: F, bins: B)
where
    F: Fn((u64, u64), (u64, u64)) -> bool,
    B: Fn(&BinningScheme, u64, u64) -> Vec<u32>,
{
    let scheme = BinningScheme::ucsc();
    let intervals = random_intervals(seed);
    let assigned = scheme.assign_bins(&intervals).unwrap();
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    for _ in 0..NUM_QUERIES {
        let query = if rng.gen_bool(0.5) {
            random_interval(&mut rng)
        } else {
            random_short_interval(&mut rng)
        };
        let candidates: HashSet<u32> = bins(&scheme, query.0, query.1).into_iter().collect();

        for (&interval, bin) in intervals.iter().zip(&assigned) {
            if expected(interval, query) {
                assert!(
                    candidates.contains(bin),
                    "interval {:?} in bin {} missed by query {:?}",
                    interval,
                    bin,
                    query
                );
            }
        }
    }
}

#[test]
fn test_overlapping() {
    check_binned(
        42,
        |(start, stop), (qs, qe)| start < qe && qs < stop,
        |scheme, qs, qe| scheme.overlapping_bins(qs, qe).unwrap(),
    );
}

#[test]
fn test_containing() {
    check_binned(
        43,
        |(start, stop), (qs, qe)| start <= qs && qe <= stop,
        |scheme, qs, qe| scheme.containing_bins(qs, qe).unwrap(),
    );
}

#[test]
fn test_contained() {
    check_binned(
        44,
        |(start, stop), (qs, qe)| qs <= start && stop <= qe,
        |scheme, qs, qe| scheme.contained_candidates(qs, qe).unwrap(),
    );
}

#[test]
fn test_covered_interval_assign_bin() {
    let scheme = BinningScheme::ucsc();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let bin = rng.gen_range(0..UCSC_TOTAL_BINS);
        let (start, stop) = scheme.covered_interval(bin).unwrap();
        assert_eq!(scheme.assign_bin(start, stop).unwrap(), bin);
    }
}

#[test]
fn test_overlapping_is_small() {
    let scheme = BinningScheme::ucsc();
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..1000 {
        let (start, stop) = random_short_interval(&mut rng);
        let bins = scheme.overlapping_bins(start, stop).unwrap();
        // the finest level spans the query, each coarser level adds at most two bins
        let finest = ((stop - 1) >> 17) - (start >> 17) + 1;
        assert!(bins.len() as u64 <= finest + 4 * 2);
        let unique: HashSet<u32> = bins.iter().copied().collect();
        assert_eq!(unique.len(), bins.len());
    }
}
