use std::collections::BTreeMap;

use cellstream_common::Placement;
use glam::Vec3;

use crate::partition::PartitionSink;

/// Opaque token for one registration in an [`ActiveSet`].
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActiveHandle(u64);

impl ActiveHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A partition currently registered with an [`ActiveSet`].
#[derive(Debug, Clone)]
pub struct ActivePartition<D> {
    pub data: D,
    pub placement: Placement,
}

/// In-memory partition sink: the data a query system would read from.
///
/// Each registered partition covers a square footprint of `extent` on X and Z
/// starting at its placement offset.
#[derive(Debug)]
pub struct ActiveSet<D> {
    extent: f32,
    entries: BTreeMap<u64, ActivePartition<D>>,
    next_id: u64,
    registered_total: u64,
    deregistered_total: u64,
}

impl<D> ActiveSet<D> {
    pub fn new(extent: f32) -> Self {
        Self {
            extent,
            entries: BTreeMap::new(),
            next_id: 0,
            registered_total: 0,
            deregistered_total: 0,
        }
    }

    /// Number of partitions currently registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, handle: &ActiveHandle) -> Option<&ActivePartition<D>> {
        self.entries.get(&handle.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivePartition<D>> {
        self.entries.values()
    }

    /// The registered partition whose footprint contains `pos`, if any.
    pub fn covering(&self, pos: Vec3) -> Option<&ActivePartition<D>> {
        self.entries.values().find(|p| {
            let o = p.placement.offset;
            pos.x >= o.x && pos.x < o.x + self.extent && pos.z >= o.z && pos.z < o.z + self.extent
        })
    }

    /// Registrations made over the set's lifetime.
    pub fn registered_total(&self) -> u64 {
        self.registered_total
    }

    /// Deregistrations made over the set's lifetime.
    pub fn deregistered_total(&self) -> u64 {
        self.deregistered_total
    }
}

impl<D> PartitionSink for ActiveSet<D> {
    type Data = D;
    type Handle = ActiveHandle;

    fn register(&mut self, data: D, placement: Placement) -> ActiveHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, ActivePartition { data, placement });
        self.registered_total += 1;
        ActiveHandle(id)
    }

    fn deregister(&mut self, handle: ActiveHandle) {
        if self.entries.remove(&handle.0).is_none() {
            tracing::warn!(handle = handle.0, "deregister of unknown handle ignored");
            return;
        }
        self.deregistered_total += 1;
    }
}
