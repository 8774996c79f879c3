//! Shared value types used across the cellstream crates.

mod types;

pub use types::{CellCoord, Placement};
