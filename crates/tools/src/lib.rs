//! Developer Tooling: read-only views over a streaming cache's registry.
//!
//! # Invariants
//! - Inspectors never mutate the registry they observe.

pub mod inspector;

pub use inspector::{CellBounds, RegistryInspector, RegistrySummary};

pub fn crate_info() -> &'static str {
    "cellstream-tools v0.1.0"
}
