use std::time::Duration;

use cellstream_common::CellCoord;

use crate::config::RefreshPolicy;

/// Decides when the cache re-evaluates its window.
///
/// Time is supplied by the host through [`RefreshScheduler::advance`]; the
/// scheduler keeps no clock of its own.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    policy: RefreshPolicy,
    elapsed: Duration,
    last_cell: Option<CellCoord>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, policy: RefreshPolicy) -> Self {
        Self {
            interval,
            policy,
            elapsed: Duration::ZERO,
            last_cell: None,
        }
    }

    /// Accumulate host time. Returns true when the throttle interval has
    /// elapsed, and restarts the interval.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = Duration::ZERO;
        true
    }

    /// Whether a throttle tick observing `current` should run a diff.
    pub fn wants_refresh(&self, current: CellCoord) -> bool {
        match self.policy {
            RefreshPolicy::EveryInterval => true,
            RefreshPolicy::OnCellChange => self.last_cell != Some(current),
        }
    }

    /// Note that a refresh ran centred on `cell`.
    pub fn mark_refreshed(&mut self, cell: CellCoord) {
        self.last_cell = Some(cell);
    }

    /// Cell observed at the previous refresh, if any has run.
    pub fn last_cell(&self) -> Option<CellCoord> {
        self.last_cell
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
