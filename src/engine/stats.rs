use arc_swap::ArcSwap;
use std::sync::Arc;

/// Totals over every block the engine has emitted so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub blocks: u64,
    pub samples: u64,
    /// Largest absolute sample value seen.
    pub peak: f32,
}

impl RunStats {
    /// Peak level in dBFS, `None` while everything emitted has been silent.
    pub fn peak_dbfs(&self) -> Option<f32> {
        (self.peak > 0.0).then(|| 20.0 * self.peak.log10())
    }

    fn record(&mut self, block: &[f32]) {
        let block_peak = block.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
        self.peak = self.peak.max(block_peak);
        self.blocks += 1;
        self.samples += block.len() as u64;
    }
}

// Engine side: accumulates and republishes after every block.
pub(crate) struct StatsRecorder {
    current: RunStats,
    shared: Arc<ArcSwap<RunStats>>,
}

/// Reader side, cheap to clone and readable from any thread.
#[derive(Clone)]
pub struct StatsHandle {
    shared: Arc<ArcSwap<RunStats>>,
}

impl StatsRecorder {
    pub(crate) fn new() -> (Self, StatsHandle) {
        let shared = Arc::new(ArcSwap::from_pointee(RunStats::default()));
        (
            Self {
                current: RunStats::default(),
                shared: Arc::clone(&shared),
            },
            StatsHandle { shared },
        )
    }

    pub(crate) fn record(&mut self, block: &[f32]) {
        self.current.record(block);
        self.shared.store(Arc::new(self.current));
    }
}

impl StatsHandle {
    pub fn snapshot(&self) -> RunStats {
        **self.shared.load()
    }
}
