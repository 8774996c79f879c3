use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors from loading or validating a [`StreamConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cell_size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    #[error("refresh_interval_seconds must be non-negative and finite, got {0}")]
    InvalidRefreshInterval(f32),
    #[error("load_radius_cells must be at most {max}, got {0}", max = MAX_LOAD_RADIUS)]
    InvalidRadius(u32),
    #[error("partition_namespace must not be empty")]
    EmptyNamespace,
}

/// Largest accepted `load_radius_cells`; a window of this radius already
/// spans over four million cells.
pub const MAX_LOAD_RADIUS: u32 = 1024;

/// When a throttle tick turns into a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Refresh on start and afterwards only when the tracked cell changed.
    #[default]
    OnCellChange,
    /// Re-run the diff on every throttle tick. Missing partitions are retried
    /// even while the tracked entity stands still.
    EveryInterval,
}

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// World-space extent of one cell on X and Z. Must match the size the
    /// partitions were authored with.
    pub cell_size: f32,
    /// Cells kept active in each direction around the tracked cell.
    pub load_radius_cells: u32,
    /// Minimum time between re-evaluations of the window.
    pub refresh_interval_seconds: f32,
    /// Prefix the partition source resolves coordinates under.
    pub partition_namespace: String,
    pub refresh_policy: RefreshPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            load_radius_cells: 1,
            refresh_interval_seconds: 0.5,
            partition_namespace: "Chunks".into(),
            refresh_policy: RefreshPolicy::OnCellChange,
        }
    }
}

impl StreamConfig {
    /// Parse a config from YAML. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        self.checked_refresh_interval()?;
        if self.load_radius_cells > MAX_LOAD_RADIUS {
            return Err(ConfigError::InvalidRadius(self.load_radius_cells));
        }
        if self.partition_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }

    /// The refresh interval as a [`Duration`]. An interval that does not fit
    /// (rejected by `validate`) saturates to [`Duration::MAX`].
    pub fn refresh_interval(&self) -> Duration {
        self.checked_refresh_interval().unwrap_or(Duration::MAX)
    }

    fn checked_refresh_interval(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f32(self.refresh_interval_seconds)
            .map_err(|_| ConfigError::InvalidRefreshInterval(self.refresh_interval_seconds))
    }
}
