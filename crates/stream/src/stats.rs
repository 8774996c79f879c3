use std::time::Duration;

use cellstream_common::CellCoord;

/// Outcome of one refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Cell the window was centred on.
    pub center: CellCoord,
    pub loaded: Vec<CellCoord>,
    pub unloaded: Vec<CellCoord>,
    /// Cells in the window whose partition could not be loaded.
    pub missing: Vec<CellCoord>,
    /// Active cells after the refresh.
    pub total_active: usize,
    pub elapsed: Duration,
}

impl RefreshReport {
    /// True if the refresh neither loaded nor unloaded anything.
    pub fn is_noop(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// Ring buffer of recent refresh durations.
#[derive(Debug)]
pub struct RefreshTimer {
    history: Vec<Duration>,
    next: usize,
    filled: bool,
}

impl RefreshTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.history[self.next] = elapsed;
        self.next = (self.next + 1) % self.history.len();
        if self.next == 0 {
            self.filled = true;
        }
    }

    fn samples(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.next]
        }
    }

    /// Number of recorded samples, capped at the capacity.
    pub fn count(&self) -> usize {
        self.samples().len()
    }

    pub fn average(&self) -> Duration {
        let samples = self.samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.samples().iter().copied().min().unwrap_or_default()
    }
}
