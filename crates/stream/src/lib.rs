//! Streaming: grid partitions loaded and unloaded around a tracked position.
//!
//! # Invariants
//! - A cell is either fully active (loaded and registered with the sink) or
//!   absent from the registry.
//! - Every handle the sink returns is deregistered exactly once, on eviction
//!   or at teardown.
//! - A missing partition never aborts a refresh; the cell stays absent and is
//!   retried while it remains in the window.

mod cache;
mod config;
mod grid;
mod partition;
mod registry;
mod scheduler;
mod sink;
mod stats;
mod window;

pub use cache::{StreamError, StreamingCache};
pub use config::{ConfigError, MAX_LOAD_RADIUS, RefreshPolicy, StreamConfig};
pub use grid::{GridMapper, cell_of};
pub use partition::{
    PartitionError, PartitionSink, PartitionSource, PositionProvider, partition_key,
};
pub use registry::{PartitionRegistry, WindowDiff};
pub use scheduler::RefreshScheduler;
pub use sink::{ActiveHandle, ActivePartition, ActiveSet};
pub use stats::{RefreshReport, RefreshTimer};
pub use window::{window_around, window_len};

pub use cellstream_common::{CellCoord, Placement};

pub fn crate_info() -> &'static str {
    "cellstream-stream v0.1.0"
}
