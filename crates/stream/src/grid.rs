use cellstream_common::CellCoord;
use glam::Vec3;

/// Map a world position to the cell containing it.
///
/// Uses floor division on the X and Z axes so that negative positions land in
/// negative cells (`-0.1` with a cell size of 50 is cell `-1`, not `0`). The
/// Y component is ignored.
pub fn cell_of(pos: Vec3, cell_size: f32) -> CellCoord {
    CellCoord {
        x: (pos.x / cell_size).floor() as i32,
        z: (pos.z / cell_size).floor() as i32,
    }
}

/// Fixed-size grid over the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    cell_size: f32,
}

impl GridMapper {
    /// Create a mapper with the given cell size. The size must already have
    /// been validated as positive and finite.
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "cell_size must be positive");
        Self { cell_size }
    }

    /// Cell size used by this mapper.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert a world position to a cell coordinate.
    pub fn cell_of(&self, pos: Vec3) -> CellCoord {
        cell_of(pos, self.cell_size)
    }

    /// World-space minimum and maximum corners of a cell, spanning `height`
    /// upwards from y = 0.
    pub fn cell_bounds(&self, coord: CellCoord, height: f32) -> (Vec3, Vec3) {
        let min = coord.world_origin(self.cell_size);
        let max = min + Vec3::new(self.cell_size, height, self.cell_size);
        (min, max)
    }
}
