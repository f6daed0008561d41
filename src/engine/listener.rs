//! Cancellation and progress reporting for a trace in flight (spec.md §5).

/// A listener a caller can install on a trace. Both methods default to
/// "keep going"; implement only the one you need.
pub trait TraceListener: Send + Sync {
    /// Polled at each stage (surface) boundary. Returning `false` cancels
    /// the trace between stages, the only always-safe cancellation point.
    fn on_stage(&self, stage: &str, index: usize, total: usize) -> bool {
        let _ = (stage, index, total);
        true
    }

    /// Polled every [`crate::core::CANCEL_POLL_INTERVAL`] rays inside a
    /// large per-ray loop.
    fn on_progress(&self, stage: &str, count: usize, total: usize) -> bool {
        let _ = (stage, count, total);
        true
    }
}

/// The outcome of one `trace()` call: how many rays terminated on a surface
/// versus missed one, and whether a listener requested cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceProgress {
    pub intercepted: usize,
    pub vignetted: usize,
    pub cancelled: bool,
}
