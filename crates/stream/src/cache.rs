use std::time::{Duration, Instant};

use cellstream_common::{CellCoord, Placement};

use crate::config::{ConfigError, StreamConfig};
use crate::grid::GridMapper;
use crate::partition::{PartitionSink, PartitionSource, PositionProvider};
use crate::registry::PartitionRegistry;
use crate::scheduler::RefreshScheduler;
use crate::stats::{RefreshReport, RefreshTimer};
use crate::window::window_around;

const TIMER_CAPACITY: usize = 64;

/// Errors that stop a cache from starting.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("no tracked entity provided")]
    MissingTracker,
}

/// Streams grid partitions in and out around a tracked position.
///
/// The cache owns every handle the sink gives it. Each one is deregistered
/// exactly once: when its cell leaves the window, on [`shutdown`], or when
/// the cache is dropped.
///
/// [`shutdown`]: StreamingCache::shutdown
pub struct StreamingCache<S, K, T>
where
    S: PartitionSource<Data = K::Data>,
    K: PartitionSink,
    T: PositionProvider,
{
    config: StreamConfig,
    grid: GridMapper,
    source: S,
    sink: K,
    tracker: T,
    registry: PartitionRegistry<K::Handle>,
    scheduler: RefreshScheduler,
    timer: RefreshTimer,
    last_report: RefreshReport,
}

impl<S, K, T> StreamingCache<S, K, T>
where
    S: PartitionSource<Data = K::Data>,
    K: PartitionSink,
    T: PositionProvider,
{
    /// Validate the configuration, then run the initial refresh around the
    /// tracker's current position.
    pub fn start(
        config: StreamConfig,
        source: S,
        sink: K,
        tracker: Option<T>,
    ) -> Result<Self, StreamError> {
        config.validate()?;
        let tracker = tracker.ok_or(StreamError::MissingTracker)?;

        let mut cache = Self {
            grid: GridMapper::new(config.cell_size),
            scheduler: RefreshScheduler::new(config.refresh_interval(), config.refresh_policy),
            config,
            source,
            sink,
            tracker,
            registry: PartitionRegistry::new(),
            timer: RefreshTimer::new(TIMER_CAPACITY),
            last_report: RefreshReport::default(),
        };
        tracing::info!(
            cell_size = cache.config.cell_size,
            radius = cache.config.load_radius_cells,
            namespace = %cache.config.partition_namespace,
            "streaming cache started"
        );
        cache.refresh();
        Ok(cache)
    }

    /// Advance host time by `dt`. Runs a refresh when the throttle interval
    /// has elapsed and the scheduler wants one.
    pub fn tick(&mut self, dt: Duration) -> Option<&RefreshReport> {
        if !self.scheduler.advance(dt) {
            return None;
        }
        let cell = self.current_cell();
        if !self.scheduler.wants_refresh(cell) {
            return None;
        }
        Some(self.refresh_around(cell))
    }

    /// Refresh now around the tracker's position, ignoring the throttle.
    pub fn refresh(&mut self) -> &RefreshReport {
        let cell = self.current_cell();
        self.refresh_around(cell)
    }

    fn refresh_around(&mut self, center: CellCoord) -> &RefreshReport {
        let _span = tracing::info_span!("stream_refresh", %center).entered();
        let started = Instant::now();

        let desired = window_around(center, self.config.load_radius_cells);
        let diff = self.registry.diff(&desired);

        let mut unloaded = Vec::with_capacity(diff.to_unload.len());
        for coord in diff.to_unload {
            if let Some(handle) = self.registry.remove(coord) {
                tracing::debug!(%coord, "unloading partition");
                self.sink.deregister(handle);
                unloaded.push(coord);
            }
        }

        let mut loaded = Vec::with_capacity(diff.to_load.len());
        let mut missing = Vec::new();
        for coord in diff.to_load {
            match self.source.load(coord, &self.config.partition_namespace) {
                Ok(data) => {
                    let placement = Placement::for_cell(coord, self.config.cell_size);
                    let handle = self.sink.register(data, placement);
                    if let Err(handle) = self.registry.insert(coord, handle) {
                        tracing::error!(%coord, "cell already active, releasing duplicate");
                        self.sink.deregister(handle);
                        continue;
                    }
                    tracing::debug!(%coord, "loaded partition");
                    loaded.push(coord);
                }
                Err(err) => {
                    tracing::warn!(%coord, error = %err, "partition unavailable");
                    missing.push(coord);
                }
            }
        }

        self.scheduler.mark_refreshed(center);
        let elapsed = started.elapsed();
        self.timer.record(elapsed);

        tracing::trace!(
            loaded = loaded.len(),
            unloaded = unloaded.len(),
            missing = missing.len(),
            total = self.registry.len(),
            "stream refresh complete"
        );

        self.last_report = RefreshReport {
            center,
            loaded,
            unloaded,
            missing,
            total_active: self.registry.len(),
            elapsed,
        };
        &self.last_report
    }

    /// Deregister every active partition and stop the cache. Returns how many
    /// partitions were released.
    pub fn shutdown(mut self) -> usize {
        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        let mut released = 0;
        for (coord, handle) in self.registry.drain() {
            tracing::debug!(%coord, "releasing partition");
            self.sink.deregister(handle);
            released += 1;
        }
        if released > 0 {
            tracing::info!(released, "streaming cache torn down");
        }
        released
    }

    /// Cell the tracked entity is in right now.
    pub fn current_cell(&self) -> CellCoord {
        self.grid.cell_of(self.tracker.current_position())
    }

    /// Cell the last refresh was centred on.
    pub fn center(&self) -> Option<CellCoord> {
        self.scheduler.last_cell()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridMapper {
        &self.grid
    }

    /// Read-only view of the active partitions.
    pub fn registry(&self) -> &PartitionRegistry<K::Handle> {
        &self.registry
    }

    /// Check if a cell is currently active.
    pub fn is_active(&self, coord: CellCoord) -> bool {
        self.registry.contains(coord)
    }

    pub fn last_report(&self) -> &RefreshReport {
        &self.last_report
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<S, K, T> Drop for StreamingCache<S, K, T>
where
    S: PartitionSource<Data = K::Data>,
    K: PartitionSink,
    T: PositionProvider,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
