//! Background flush scheduler port.
//!
//! The durable job scheduler (network-constrained, exponential backoff) is
//! platform-owned; the core only signals that queued progress is waiting.

/// Port trait for scheduling a background "flush pending progress" job.
///
/// Implementations are expected to deduplicate: requesting a flush while one
/// is already scheduled keeps the existing job.
pub trait FlushSchedulerPort: Send + Sync {
    /// Ask the platform to run a flush once connectivity allows.
    fn request_flush(&self);
}

/// No-op scheduler for tests and headless embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFlushScheduler;

impl FlushSchedulerPort for NoopFlushScheduler {
    fn request_flush(&self) {}
}
