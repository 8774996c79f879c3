use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cellstream_common::CellCoord;
use cellstream_stream::{PartitionError, PartitionSource, partition_key};

use crate::PartitionBlob;

/// Partitions stored as files under a root directory, one per cell, at
/// `{root}/{namespace}/Chunk_{x}_{z}.{extension}`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// Path the partition for `coord` is expected at.
    pub fn path_for(&self, namespace: &str, coord: CellCoord) -> PathBuf {
        self.root
            .join(partition_key(namespace, coord))
            .with_extension(&self.extension)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PartitionSource for DirectorySource {
    type Data = PartitionBlob;

    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<PartitionBlob, PartitionError> {
        let key = partition_key(namespace, coord);
        let path = self.path_for(namespace, coord);
        match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::trace!(path = %path.display(), len = bytes.len(), "read partition file");
                Ok(PartitionBlob { key, bytes })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PartitionError::NotFound { key }),
            Err(e) => Err(PartitionError::Corrupt {
                key,
                reason: e.to_string(),
            }),
        }
    }
}
