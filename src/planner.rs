//! Shared frame position planning.
//!
//! The positions every source is sampled at are drawn from a seeded RNG so
//! that the same seed always yields the same grid. When sources are added or
//! removed, or the sample count changes, the existing positions are
//! reconciled rather than redrawn: positions that are still valid stay where
//! they are, so slots that already show them need no decoding.
//!
//! All functions are pure. Position lists are sorted ascending and may
//! contain duplicates.
//!
//! # Example
//!
//! ```
//! use frame_compare::planner;
//!
//! let positions = planner::generate(42, 0, 1000, 5);
//! assert_eq!(positions, planner::generate(42, 0, 1000, 5));
//!
//! // A shorter source arrives: positions past its end are redrawn.
//! let reconciled = planner::reconcile(&[10, 50, 90], 60, 3, 42);
//! assert_eq!(&reconciled[..2], &[10, 50]);
//! assert!((51..=60).contains(&reconciled[2]));
//! ```

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Draw `count` positions uniformly from `[min, max]` and sort them.
///
/// A fresh RNG is seeded on every call. When `min > max` the range collapses
/// to `max`.
pub fn generate(seed: u64, min: u64, max: u64, count: usize) -> Vec<u64> {
    let min = min.min(max);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions: Vec<u64> = (0..count).map(|_| rng.random_range(min..=max)).collect();
    positions.sort_unstable();
    positions
}

/// Bring `existing` in line with a new upper bound and sample count.
///
/// Positions `<= max_position` are kept, up to `n_samples` of them. The
/// remainder is drawn from just past the last kept position to
/// `max_position`. An empty list is generated from scratch.
pub fn reconcile(existing: &[u64], max_position: u64, n_samples: usize, seed: u64) -> Vec<u64> {
    if existing.is_empty() {
        return generate(seed, 0, max_position, n_samples);
    }

    let valid = existing.partition_point(|&position| position <= max_position);
    let keep = valid.min(n_samples);
    if keep == existing.len() && keep == n_samples {
        return existing.to_vec();
    }

    let mut positions = existing[..keep].to_vec();
    let missing = n_samples - keep;
    if missing > 0 {
        let lower = positions
            .last()
            .map_or(0, |&last| last.saturating_add(1))
            .min(max_position);
        positions.extend(generate(seed, lower, max_position, missing));
    }

    log::debug!(
        "Reconciled {} positions against max {max_position}: kept {keep}, drew {missing}",
        existing.len(),
    );
    positions
}

/// Grow `existing` to `new_count` positions.
///
/// New positions are drawn from the span already covered and merged in
/// sorted order. Lists that are empty or already long enough are returned
/// as they are.
pub fn expand(existing: &[u64], new_count: usize, seed: u64) -> Vec<u64> {
    let (Some(&first), Some(&last)) = (existing.first(), existing.last()) else {
        return existing.to_vec();
    };
    if new_count <= existing.len() {
        return existing.to_vec();
    }

    let mut positions = existing.to_vec();
    positions.extend(generate(seed, first, last, new_count - existing.len()));
    positions.sort_unstable();
    positions
}

/// Expand if the list is short, then reconcile against `max_position`.
pub fn plan(existing: &[u64], max_position: u64, n_samples: usize, seed: u64) -> Vec<u64> {
    if existing.len() < n_samples {
        reconcile(&expand(existing, n_samples, seed), max_position, n_samples, seed)
    } else {
        reconcile(existing, max_position, n_samples, seed)
    }
}
