use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D cell coordinate in the world grid. The vertical axis is not
/// partitioned and is always treated as 0.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    pub const ORIGIN: CellCoord = CellCoord { x: 0, z: 0 };

    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The coordinate shifted by `(dx, dz)` cells, clamped to the
    /// representable range rather than wrapping.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// World-space position of the cell's minimum corner.
    pub fn world_origin(self, cell_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * cell_size, 0.0, self.z as f32 * cell_size)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Where a partition's data is placed when it is registered with a sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub offset: Vec3,
    pub rotation: Quat,
}

impl Placement {
    /// Placement of the partition authored for `coord`: translated to the
    /// cell's corner, never rotated.
    pub fn for_cell(coord: CellCoord, cell_size: f32) -> Self {
        Self {
            offset: coord.world_origin(cell_size),
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}
