//! Plot-construction progress reporting. Kept as a trait boundary so the
//! core pipeline never depends on a UI or logging crate directly — the CLI
//! supplies whichever sink it wants, defaulting to the `tracing`-backed one.

/// Callback surface the plotter drives as it moves through its phases.
pub trait PlotProgressSink {
    /// A new phase (e.g. "table 1", "pruning") has started.
    fn phase_start(&self, phase: &str);
    /// `done` out of `total` units of the current phase have completed.
    fn phase_progress(&self, phase: &str, done: u64, total: u64);
    /// The current phase has finished.
    fn phase_end(&self, phase: &str);
}

/// A sink that discards every event — the default when the caller doesn't
/// care about progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl PlotProgressSink for NullProgressSink {
    fn phase_start(&self, _phase: &str) {}
    fn phase_progress(&self, _phase: &str, _done: u64, _total: u64) {}
    fn phase_end(&self, _phase: &str) {}
}

/// A sink that emits `tracing` events, used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl PlotProgressSink for TracingProgressSink {
    fn phase_start(&self, phase: &str) {
        tracing::info!(phase, "plot phase started");
    }

    fn phase_progress(&self, phase: &str, done: u64, total: u64) {
        tracing::debug!(phase, done, total, "plot phase progress");
    }

    fn phase_end(&self, phase: &str) {
        tracing::info!(phase, "plot phase finished");
    }
}
