//! Pruned Exact Linear Time segmentation
//!
//! Exact dynamic program over segment end points: the best total for prefix
//! `[0, end)` is the minimum over admissible starts `t` of
//! `best[t] + cost(t, end) + penalty`. A start whose total at `end` exceeds
//! the best total by more than `penalty` is beaten by `end` itself for every
//! later end that `end` may start, so it is dropped once those ends are
//! reached (`end + min_size`), not before.

use super::rbf_cost::RbfCost;

/// Segmentation limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeltParams {
    /// Cost added per segment
    pub penalty: f64,
    /// Shortest allowed segment (>= 1)
    pub min_size: usize,
    /// Candidate boundaries are multiples of this (>= 1)
    pub jump: usize,
}

/// Optimal boundaries for `cost`, ascending, terminal boundary included.
///
/// Returns an empty vector when no admissible segmentation of the whole
/// signal exists (signal shorter than `min_size`).
pub fn segment(cost: &RbfCost, params: PeltParams) -> Vec<usize> {
    let n = cost.len();
    let min_size = params.min_size.max(1);
    let jump = params.jump.max(1);
    let penalty = params.penalty;

    if n < min_size {
        return Vec::new();
    }

    // best[end]: minimal total for prefix [0, end); None = not a boundary
    let mut best: Vec<Option<f64>> = vec![None; n + 1];
    let mut last_start: Vec<usize> = vec![0; n + 1];
    best[0] = Some(0.0);

    let ends = (0..n)
        .step_by(jump)
        .filter(|&k| k >= min_size)
        .chain(std::iter::once(n));

    // (start, first end at which the start is dominated)
    let mut admissible: Vec<(usize, usize)> = Vec::new();

    for end in ends {
        admissible.retain(|&(_, drop_from)| end < drop_from);

        let new_start = ((end - min_size) / jump) * jump;
        if admissible.last().map(|&(t, _)| t) != Some(new_start) {
            admissible.push((new_start, usize::MAX));
        }

        let totals: Vec<Option<f64>> = admissible
            .iter()
            .map(|&(t, _)| best[t].map(|base| base + cost.error(t, end) + penalty))
            .collect();

        let mut winner: Option<(usize, f64)> = None;
        for (&(t, _), total) in admissible.iter().zip(&totals) {
            if let Some(total) = *total {
                if winner.map_or(true, |(_, w)| total < w) {
                    winner = Some((t, total));
                }
            }
        }

        let Some((start, total)) = winner else {
            continue;
        };
        best[end] = Some(total);
        last_start[end] = start;

        // Starts not yet evaluable stay admissible
        for (entry, t) in admissible.iter_mut().zip(&totals) {
            if matches!(t, Some(t) if *t > total + penalty) {
                entry.1 = entry.1.min(end + min_size);
            }
        }
    }

    if best[n].is_none() {
        return Vec::new();
    }

    let mut boundaries = Vec::new();
    let mut end = n;
    while end > 0 {
        boundaries.push(end);
        end = last_start[end];
    }
    boundaries.reverse();
    boundaries
}
