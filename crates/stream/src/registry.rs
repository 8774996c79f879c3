use std::collections::{HashMap, HashSet};

use cellstream_common::CellCoord;

/// Cells to load and unload to turn the current registry into a desired
/// window. Both lists are sorted so refreshes are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowDiff {
    pub to_load: Vec<CellCoord>,
    pub to_unload: Vec<CellCoord>,
}

impl WindowDiff {
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty() && self.to_unload.is_empty()
    }
}

/// Active partitions keyed by cell. Each cell holds at most one handle.
#[derive(Debug)]
pub struct PartitionRegistry<H> {
    entries: HashMap<CellCoord, H>,
}

impl<H> Default for PartitionRegistry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> PartitionRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a cell is currently active.
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    pub fn get(&self, coord: CellCoord) -> Option<&H> {
        self.entries.get(&coord)
    }

    /// Active cells in unspecified order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.entries.keys().copied()
    }

    /// Active cells, sorted.
    pub fn sorted_cells(&self) -> Vec<CellCoord> {
        let mut cells: Vec<_> = self.cells().collect();
        cells.sort_unstable();
        cells
    }

    /// Record a handle for `coord`. If the cell is already active the handle
    /// is given back untouched so the caller can release it.
    pub fn insert(&mut self, coord: CellCoord, handle: H) -> Result<(), H> {
        if self.entries.contains_key(&coord) {
            return Err(handle);
        }
        self.entries.insert(coord, handle);
        Ok(())
    }

    /// Take the handle for `coord` out of the registry. Removing an absent
    /// cell is a no-op.
    pub fn remove(&mut self, coord: CellCoord) -> Option<H> {
        self.entries.remove(&coord)
    }

    /// Compare the registry with the desired window.
    pub fn diff(&self, desired: &HashSet<CellCoord>) -> WindowDiff {
        let mut to_load: Vec<CellCoord> = desired
            .iter()
            .filter(|c| !self.entries.contains_key(*c))
            .copied()
            .collect();
        let mut to_unload: Vec<CellCoord> = self
            .entries
            .keys()
            .filter(|c| !desired.contains(*c))
            .copied()
            .collect();
        to_load.sort_unstable();
        to_unload.sort_unstable();
        WindowDiff { to_load, to_unload }
    }

    /// Remove every entry, yielding each cell and its handle exactly once.
    pub fn drain(&mut self) -> impl Iterator<Item = (CellCoord, H)> + '_ {
        self.entries.drain()
    }
}
