use std::collections::HashMap;

use cellstream_common::CellCoord;
use cellstream_stream::{PartitionError, PartitionSource, partition_key};

/// Partitions held in memory, looked up by their conventional key.
///
/// Loading clones the stored data, so the same partition can be streamed in
/// again after it has been evicted.
#[derive(Debug, Clone)]
pub struct MemorySource<D> {
    entries: HashMap<String, D>,
}

impl<D> Default for MemorySource<D> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<D> MemorySource<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the partition for `coord` under `namespace`, replacing any
    /// previous data.
    pub fn insert(&mut self, namespace: &str, coord: CellCoord, data: D) -> Option<D> {
        self.entries.insert(partition_key(namespace, coord), data)
    }

    pub fn remove(&mut self, namespace: &str, coord: CellCoord) -> Option<D> {
        self.entries.remove(&partition_key(namespace, coord))
    }

    pub fn contains(&self, namespace: &str, coord: CellCoord) -> bool {
        self.entries.contains_key(&partition_key(namespace, coord))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: Clone> PartitionSource for MemorySource<D> {
    type Data = D;

    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<D, PartitionError> {
        let key = partition_key(namespace, coord);
        self.entries
            .get(&key)
            .cloned()
            .ok_or(PartitionError::NotFound { key })
    }
}
