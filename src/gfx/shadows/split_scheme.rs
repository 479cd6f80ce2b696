//! Practical split scheme (PSSM)
//!
//! Each cascade's far bound blends a uniform and a logarithmic distribution of
//! the camera depth range:
//!
//! ```text
//! uniform_i = n + (f - n) * i / m
//! log_i     = n * (f / n) ^ (i / m)
//! c_i       = lambda * log_i + (1 - lambda) * uniform_i
//! ```
//!
//! `lambda = 0` gives uniform slices, `lambda = 1` logarithmic ones.

use smallvec::SmallVec;

use super::MAX_CASCADES;

/// Far bounds of every cascade, nearest first.
pub type SplitDepths = SmallVec<[f32; MAX_CASCADES]>;

/// Computes `split_count` far-bound depths between `near` and `far`.
///
/// The last bound is exactly `far`. Inputs are expected to be validated
/// (`0 < near < far`, `1 <= split_count <= MAX_CASCADES`, `lambda` in [0, 1]).
pub fn split_depths(near: f32, far: f32, split_count: usize, lambda: f32) -> SplitDepths {
    let count = split_count.max(1);
    let ratio = far / near;

    let mut depths: SplitDepths = (1..=count)
        .map(|i| {
            let si = i as f32 / count as f32;
            let uniform = near + (far - near) * si;
            let log = near * ratio.powf(si);
            lambda * log + (1.0 - lambda) * uniform
        })
        .collect();

    if let Some(last) = depths.last_mut() {
        *last = far;
    }
    depths
}

/// Pairs each far bound with the previous one as its near bound.
pub fn split_ranges(near: f32, depths: &[f32]) -> SmallVec<[(f32, f32); MAX_CASCADES]> {
    let mut prev = near;
    depths
        .iter()
        .map(|&far| {
            let range = (prev, far);
            prev = far;
            range
        })
        .collect()
}
