use cellstream_common::CellCoord;
use cellstream_stream::{GridMapper, PartitionRegistry};
use glam::Vec3;

/// Height given to cell bounds; partitions are not split vertically.
const BOUNDS_HEIGHT: f32 = 1.0;

/// Registry inspector for developer tooling.
///
/// Everything a debug overlay needs (which cells are loaded and where they
/// sit in the world) derived from the registry's key set.
pub struct RegistryInspector;

impl RegistryInspector {
    /// Produce a summary of the active set.
    pub fn summary<H>(registry: &PartitionRegistry<H>, center: Option<CellCoord>) -> RegistrySummary {
        let cells = registry.sorted_cells();
        let extent = cells.iter().fold(None, |acc: Option<(CellCoord, CellCoord)>, c| {
            Some(match acc {
                None => (*c, *c),
                Some((lo, hi)) => (
                    CellCoord::new(lo.x.min(c.x), lo.z.min(c.z)),
                    CellCoord::new(hi.x.max(c.x), hi.z.max(c.z)),
                ),
            })
        });
        RegistrySummary {
            active_cells: cells.len(),
            center,
            extent,
        }
    }

    /// World-space bounds of every active cell, sorted by coordinate.
    pub fn cell_bounds<H>(registry: &PartitionRegistry<H>, grid: &GridMapper) -> Vec<CellBounds> {
        registry
            .sorted_cells()
            .into_iter()
            .map(|coord| {
                let (min, max) = grid.cell_bounds(coord, BOUNDS_HEIGHT);
                CellBounds { coord, min, max }
            })
            .collect()
    }

    /// Text map of the cells around `center`, north (+z) up.
    ///
    /// `@` marks the center when active, `o` the center when missing, `#`
    /// other active cells and `.` inactive ones.
    pub fn ascii_map<H>(registry: &PartitionRegistry<H>, center: CellCoord, radius: u32) -> String {
        let r = radius as i32;
        let mut out = String::new();
        for dz in (-r..=r).rev() {
            for dx in -r..=r {
                let coord = center.offset(dx, dz);
                let active = registry.contains(coord);
                out.push(match (coord == center, active) {
                    (true, true) => '@',
                    (true, false) => 'o',
                    (false, true) => '#',
                    (false, false) => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Summary of the active set for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySummary {
    pub active_cells: usize,
    pub center: Option<CellCoord>,
    /// Minimum and maximum active coordinates.
    pub extent: Option<(CellCoord, CellCoord)>,
}

impl std::fmt::Display for RegistrySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Registry: active={}", self.active_cells)?;
        if let Some(center) = self.center {
            write!(f, " center={center}")?;
        }
        if let Some((lo, hi)) = self.extent {
            write!(f, " extent={lo}..={hi}")?;
        }
        Ok(())
    }
}

/// World-space box covered by one active cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub coord: CellCoord,
    pub min: Vec3,
    pub max: Vec3,
}

impl CellBounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(cells: &[(i32, i32)]) -> PartitionRegistry<()> {
        let mut registry = PartitionRegistry::new();
        for &(x, z) in cells {
            registry.insert(CellCoord::new(x, z), ()).unwrap();
        }
        registry
    }

    #[test]
    fn summary_empty_registry() {
        let summary = RegistryInspector::summary(&registry(&[]), None);
        assert_eq!(summary.active_cells, 0);
        assert_eq!(summary.extent, None);
        assert_eq!(summary.to_string(), "Registry: active=0");
    }

    #[test]
    fn summary_extent() {
        let reg = registry(&[(0, 0), (-2, 1), (3, -4)]);
        let summary = RegistryInspector::summary(&reg, Some(CellCoord::ORIGIN));
        assert_eq!(summary.active_cells, 3);
        assert_eq!(
            summary.extent,
            Some((CellCoord::new(-2, -4), CellCoord::new(3, 1)))
        );
        let s = format!("{summary}");
        assert!(s.contains("center=(0, 0)"));
        assert!(s.contains("extent=(-2, -4)..=(3, 1)"));
    }

    #[test]
    fn bounds_follow_grid() {
        let reg = registry(&[(1, 0), (-1, 0)]);
        let bounds = RegistryInspector::cell_bounds(&reg, &GridMapper::new(50.0));
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].coord, CellCoord::new(-1, 0));
        assert_eq!(bounds[0].min, Vec3::new(-50.0, 0.0, 0.0));
        assert_eq!(bounds[1].center(), Vec3::new(75.0, 0.5, 25.0));
    }

    #[test]
    fn ascii_map_marks_cells() {
        let reg = registry(&[(0, 0), (1, 1), (-1, -1)]);
        let map = RegistryInspector::ascii_map(&reg, CellCoord::ORIGIN, 1);
        assert_eq!(map, "..#\n.@.\n#..\n");

        let empty = RegistryInspector::ascii_map(&registry(&[]), CellCoord::ORIGIN, 0);
        assert_eq!(empty, "o\n");
    }
}
