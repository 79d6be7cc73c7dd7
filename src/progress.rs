//! Progress-callback trait for job and per-batch events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::orchestrator::AnalysisOrchestrator::with_callback`] to receive
//! events as the sequential loop advances. The UI is a pure observer: it
//! drives `start`/`resume`/teardown and reads state, but the core knows
//! nothing about terminals or widgets.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, or a terminal progress bar
//! without the library knowing how the host application communicates.

use crate::orchestrator::PauseReason;
use std::sync::Arc;

/// Called by the orchestrator as the job advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called when the sequential loop starts or resumes.
    ///
    /// # Arguments
    /// * `total_batches` — total batches in the job
    /// * `completed`     — batches already completed (non-zero on resume)
    fn on_analysis_start(&self, total_batches: usize, completed: usize) {
        let _ = (total_batches, completed);
    }

    /// Called just before the analysis call is sent for a page.
    ///
    /// # Arguments
    /// * `page_num`      — 1-indexed page number
    /// * `total_batches` — total batches in the job
    fn on_batch_start(&self, page_num: usize, total_batches: usize) {
        let _ = (page_num, total_batches);
    }

    /// Called when a page's analysis completes successfully.
    ///
    /// # Arguments
    /// * `page_num`      — 1-indexed page number
    /// * `total_batches` — total batches
    /// * `result_len`    — byte length of the produced analysis text
    fn on_batch_complete(&self, page_num: usize, total_batches: usize, result_len: usize) {
        let _ = (page_num, total_batches, result_len);
    }

    /// Called when the loop halts and the job enters the paused state.
    fn on_job_paused(&self, reason: &PauseReason) {
        let _ = reason;
    }

    /// Called when every batch has completed and the job is done.
    ///
    /// # Arguments
    /// * `total_batches` — total batches in the job
    fn on_job_completed(&self, total_batches: usize) {
        let _ = total_batches;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type the orchestrator stores.
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        pauses: AtomicUsize,
        finished: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_batch_start(&self, _page_num: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _page_num: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_paused(&self, _reason: &PauseReason) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_completed(&self, total: usize) {
            self.finished.store(total, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start(5, 0);
        cb.on_batch_start(1, 5);
        cb.on_batch_complete(1, 5, 42);
        cb.on_job_paused(&PauseReason::QuotaExhausted);
        cb.on_job_completed(5);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        };

        tracker.on_batch_start(1, 3);
        tracker.on_batch_complete(1, 3, 100);
        tracker.on_batch_start(2, 3);
        tracker.on_job_paused(&PauseReason::CredentialInvalid);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pauses.load(Ordering::SeqCst), 1);

        tracker.on_job_completed(3);
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn AnalysisProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_analysis_start(10, 2);
        cb.on_batch_start(3, 10);
    }
}
