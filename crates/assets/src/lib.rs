//! Partition sources: where the data for each grid cell is stored.
//!
//! A coordinate resolves to stored data either by naming convention
//! (`{namespace}/Chunk_{x}_{z}`, see [`MemorySource`] and [`DirectorySource`])
//! or through a [`PartitionManifest`] that lists each cell's file and content
//! hash.

mod directory;
mod manifest;
mod memory;

pub use directory::DirectorySource;
pub use manifest::{
    MANIFEST_FILE, ManifestEntry, ManifestError, ManifestSource, PartitionManifest,
    parse_chunk_name,
};
pub use memory::MemorySource;

use sha2::{Digest, Sha256};

/// Raw bytes of one partition as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionBlob {
    pub key: String,
    pub bytes: Vec<u8>,
}

impl PartitionBlob {
    /// Hex-encoded SHA-256 of the blob's bytes.
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn crate_info() -> &'static str {
    "cellstream-assets v0.1.0"
}
