//! Coordinate to file index with content hashes.
//!
//! Layout inside a partition directory:
//! ```text
//! {namespace}/
//!   manifest.json          - namespace, cell size and one entry per cell
//!   Chunk_0_0.bin          - partition files, named freely by the manifest
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cellstream_common::CellCoord;
use cellstream_stream::{PartitionError, PartitionSource, partition_key};
use serde::{Deserialize, Serialize};

use crate::{PartitionBlob, sha256_hex};

pub const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Errors from reading, writing or building a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("cell {0} listed more than once")]
    DuplicateCell(CellCoord),
}

/// One cell's file and its expected content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub coord: CellCoord,
    pub file: String,
    pub sha256: String,
}

/// Index of the partitions authored for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionManifest {
    pub schema_version: u32,
    pub namespace: String,
    pub cell_size: f32,
    pub entries: Vec<ManifestEntry>,
}

impl PartitionManifest {
    pub fn new(namespace: impl Into<String>, cell_size: f32) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            namespace: namespace.into(),
            cell_size,
            entries: Vec::new(),
        }
    }

    /// Index every `Chunk_{x}_{z}.*` file in `dir`, hashing its contents.
    /// Other files are skipped.
    pub fn build(
        dir: impl AsRef<Path>,
        namespace: impl Into<String>,
        cell_size: f32,
    ) -> Result<Self, ManifestError> {
        let mut manifest = Self::new(namespace, cell_size);
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(coord) = parse_chunk_name(name) else {
                tracing::debug!(file = name, "skipping non-partition file");
                continue;
            };
            let bytes = std::fs::read(&path)?;
            manifest.push(ManifestEntry {
                coord,
                file: name.to_string(),
                sha256: sha256_hex(&bytes),
            })?;
        }
        Ok(manifest)
    }

    /// Add an entry. Each cell may be listed once.
    pub fn push(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        if self.get(entry.coord).is_some() {
            return Err(ManifestError::DuplicateCell(entry.coord));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, coord: CellCoord) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.coord == coord)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let file = std::fs::File::open(path)?;
        let manifest: Self = serde_json::from_reader(file)?;
        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(ManifestError::SchemaMismatch {
                file_version: manifest.schema_version,
                expected_version: MANIFEST_SCHEMA_VERSION,
            });
        }
        Ok(manifest)
    }
}

/// Parse `Chunk_{x}_{z}` with any extension into its coordinate.
pub fn parse_chunk_name(name: &str) -> Option<CellCoord> {
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    let rest = stem.strip_prefix("Chunk_")?;
    // x may be negative, so split on the last underscore
    let (x, z) = rest.rsplit_once('_')?;
    Some(CellCoord::new(x.parse().ok()?, z.parse().ok()?))
}

/// Partition source backed by a manifest. Files are verified against their
/// recorded hash before being handed out.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    dir: PathBuf,
    manifest: PartitionManifest,
    index: HashMap<CellCoord, usize>,
}

impl ManifestSource {
    /// Open `{dir}/manifest.json`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let dir = dir.as_ref().to_path_buf();
        let manifest = PartitionManifest::load(dir.join(MANIFEST_FILE))?;
        Self::from_manifest(dir, manifest)
    }

    pub fn from_manifest(
        dir: impl AsRef<Path>,
        manifest: PartitionManifest,
    ) -> Result<Self, ManifestError> {
        let mut index = HashMap::with_capacity(manifest.entries.len());
        for (i, entry) in manifest.entries.iter().enumerate() {
            if index.insert(entry.coord, i).is_some() {
                return Err(ManifestError::DuplicateCell(entry.coord));
            }
        }
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            manifest,
            index,
        })
    }

    pub fn manifest(&self) -> &PartitionManifest {
        &self.manifest
    }
}

impl PartitionSource for ManifestSource {
    type Data = PartitionBlob;

    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<PartitionBlob, PartitionError> {
        let key = partition_key(namespace, coord);
        if namespace != self.manifest.namespace {
            return Err(PartitionError::NotFound { key });
        }
        let Some(entry) = self.index.get(&coord).map(|&i| &self.manifest.entries[i]) else {
            return Err(PartitionError::NotFound { key });
        };

        let bytes = std::fs::read(self.dir.join(&entry.file)).map_err(|e| {
            PartitionError::Corrupt {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;
        let actual = sha256_hex(&bytes);
        if actual != entry.sha256 {
            return Err(PartitionError::Corrupt {
                key,
                reason: format!("hash mismatch: expected {}, got {actual}", entry.sha256),
            });
        }
        Ok(PartitionBlob { key, bytes })
    }
}
