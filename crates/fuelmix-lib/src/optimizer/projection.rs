//! Feasible region of the blend search.
//!
//! Each leg contributes one block of candidate percentages constrained to
//! `{x_i ∈ [0, 100], Σ x_i ≤ 100}`; the region is the product of the blocks.

use std::ops::Range;

/// Upper bound on a single share and on the sum of a block.
pub const SHARE_CAP: f64 = 100.0;

/// Euclidean projection of one block onto the capped simplex.
pub fn project_block(values: &mut [f64]) {
    let clamped_sum: f64 = values.iter().map(|v| v.clamp(0.0, SHARE_CAP)).sum();
    if clamped_sum <= SHARE_CAP {
        for v in values.iter_mut() {
            *v = v.clamp(0.0, SHARE_CAP);
        }
        return;
    }

    // The sum constraint is active: project onto {x >= 0, Σx = cap}.
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, value) in sorted.iter().enumerate() {
        cumulative += value;
        let candidate = (cumulative - SHARE_CAP) / (i + 1) as f64;
        if *value - candidate > 0.0 {
            theta = candidate;
        }
    }
    for v in values.iter_mut() {
        *v = (*v - theta).max(0.0);
    }
}

/// Project every block of `x` in place.
pub fn project(x: &mut [f64], blocks: &[Range<usize>]) {
    for block in blocks {
        project_block(&mut x[block.clone()]);
    }
}

/// Clamp to the bounds and rescale blocks whose sum exceeds the cap.
///
/// Cheaper than [`project`] and keeps the direction of an overshooting
/// block, which suits repairing random trial vectors.
pub fn repair(x: &mut [f64], blocks: &[Range<usize>]) {
    for block in blocks {
        let values = &mut x[block.clone()];
        for v in values.iter_mut() {
            *v = if v.is_finite() { v.clamp(0.0, SHARE_CAP) } else { 0.0 };
        }
        let sum: f64 = values.iter().sum();
        if sum > SHARE_CAP {
            let scale = SHARE_CAP / sum;
            for v in values.iter_mut() {
                *v *= scale;
            }
        }
    }
}

/// Whether `x` lies in the feasible region (with absolute slack `eps`).
pub fn is_feasible(x: &[f64], blocks: &[Range<usize>], eps: f64) -> bool {
    blocks.iter().all(|block| {
        let values = &x[block.clone()];
        values
            .iter()
            .all(|v| v.is_finite() && *v >= -eps && *v <= SHARE_CAP + eps)
            && values.iter().sum::<f64>() <= SHARE_CAP + eps
    })
}
