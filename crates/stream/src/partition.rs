//! Collaborators the cache drives: where partition data comes from, where it
//! goes once loaded, and whose position decides the window.

use cellstream_common::{CellCoord, Placement};
use glam::Vec3;

/// Why a partition could not be loaded. Never fatal to a refresh.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("partition not found: {key}")]
    NotFound { key: String },
    #[error("partition {key} unreadable: {reason}")]
    Corrupt { key: String, reason: String },
}

impl PartitionError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Loads the data authored for one grid cell.
pub trait PartitionSource {
    type Data;

    /// Load the partition for `coord` under `namespace`. Blocks until the data
    /// is available or known to be missing.
    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<Self::Data, PartitionError>;
}

/// Runtime that loaded partitions are registered into.
///
/// `register` hands back a handle that owns the registration; passing it to
/// `deregister` consumes it, so a handle can only be released once.
pub trait PartitionSink {
    type Data;
    type Handle;

    fn register(&mut self, data: Self::Data, placement: Placement) -> Self::Handle;

    fn deregister(&mut self, handle: Self::Handle);
}

/// The tracked entity. Read once per refresh, never written.
pub trait PositionProvider {
    fn current_position(&self) -> Vec3;
}

impl<F> PositionProvider for F
where
    F: Fn() -> Vec3,
{
    fn current_position(&self) -> Vec3 {
        self()
    }
}

impl<S: PartitionSource + ?Sized> PartitionSource for &mut S {
    type Data = S::Data;

    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<Self::Data, PartitionError> {
        (**self).load(coord, namespace)
    }
}

impl<K: PartitionSink + ?Sized> PartitionSink for &mut K {
    type Data = K::Data;
    type Handle = K::Handle;

    fn register(&mut self, data: Self::Data, placement: Placement) -> Self::Handle {
        (**self).register(data, placement)
    }

    fn deregister(&mut self, handle: Self::Handle) {
        (**self).deregister(handle)
    }
}

/// Conventional key a coordinate resolves to: `{namespace}/Chunk_{x}_{z}`.
pub fn partition_key(namespace: &str, coord: CellCoord) -> String {
    format!(
        "{}/Chunk_{}_{}",
        namespace.trim_end_matches('/'),
        coord.x,
        coord.z
    )
}
