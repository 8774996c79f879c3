use std::collections::HashSet;

use cellstream_common::CellCoord;

/// Number of cells in a window of the given radius: `(2r + 1)^2`,
/// saturating at `usize::MAX`.
pub fn window_len(radius: u32) -> usize {
    let side = (radius as usize).saturating_mul(2).saturating_add(1);
    side.saturating_mul(side)
}

/// All cells within a square radius of a center cell, center included.
///
/// Near the edge of the `i32` grid the window is clipped, so it can hold
/// fewer than [`window_len`] cells.
pub fn window_around(center: CellCoord, radius: u32) -> HashSet<CellCoord> {
    let r = radius.min(i32::MAX as u32) as i32;
    let mut result = HashSet::with_capacity(window_len(radius).min(1 << 16));
    for dx in -r..=r {
        for dz in -r..=r {
            result.insert(center.offset(dx, dz));
        }
    }
    result
}
