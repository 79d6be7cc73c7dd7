//! Per-page work units and the whole-job state machine.
//!
//! A [`Batch`] is one page plus its processing status and result. The batch
//! set is created once per document load, one batch per page index, and is
//! never resized or reordered; page order defines both the processing order
//! and the report assembly order.
//!
//! Status moves forward only: `pending → processing → {completed | error}`.
//! The single exception is a recoverable analysis failure (bad credential,
//! exhausted quota), which reverts `processing → pending` so the page is
//! re-attempted after resume without ever counting as failed.

use crate::pipeline::encode::PageImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Processing status of a single [`Batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Not yet attempted, or reverted after a recoverable failure.
    Pending,
    /// The analysis call for this page is in flight.
    Processing,
    /// Analysis succeeded; `result` holds the text. Terminal.
    Completed,
    /// Analysis failed non-recoverably; `failure_detail` holds the cause.
    /// Re-attempted on the next resume (only completed batches are skipped).
    Error,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// One unit of page-level work: a page image, its status, and its outcome.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Stable identifier, derived from the page position.
    pub id: String,
    /// Zero-based position in document order. Immutable once created.
    pub page_index: usize,
    /// The rasterised page. Shared with the page source output, not copied.
    pub image: Arc<PageImage>,
    /// Current processing status.
    pub status: BatchStatus,
    /// Analysis text. Present exactly when `status == Completed`.
    pub result: Option<String>,
    /// Human-readable cause of a non-recoverable failure.
    /// Present exactly when `status == Error`.
    pub failure_detail: Option<String>,
}

impl Batch {
    /// Create a fresh pending batch for the page at `page_index`.
    pub fn new(page_index: usize, image: Arc<PageImage>) -> Self {
        Self {
            id: format!("page-{}", page_index + 1),
            page_index,
            image,
            status: BatchStatus::Pending,
            result: None,
            failure_detail: None,
        }
    }

    /// Move into `processing` for a new analysis attempt.
    ///
    /// Allowed from `pending` and from `error` (a resume re-attempts failed
    /// batches); a stale `failure_detail` is cleared so the error invariant
    /// holds for the new attempt.
    pub fn begin_attempt(&mut self) {
        debug_assert!(
            matches!(self.status, BatchStatus::Pending | BatchStatus::Error),
            "attempt started from {}",
            self.status
        );
        self.failure_detail = None;
        self.status = BatchStatus::Processing;
    }

    /// Record a successful analysis. Terminal: `result` is immutable once set.
    pub fn complete(&mut self, result: String) {
        debug_assert_eq!(self.status, BatchStatus::Processing);
        self.result = Some(result);
        self.status = BatchStatus::Completed;
    }

    /// Record a non-recoverable failure for this page.
    pub fn fail(&mut self, detail: String) {
        debug_assert_eq!(self.status, BatchStatus::Processing);
        self.failure_detail = Some(detail);
        self.status = BatchStatus::Error;
    }

    /// Revert to `pending` after a recoverable failure, so the page is
    /// retried after resume. Never records a failure detail.
    pub fn revert_to_pending(&mut self) {
        debug_assert_eq!(self.status, BatchStatus::Processing);
        self.result = None;
        self.status = BatchStatus::Pending;
    }

    /// Whether this batch has reached a successful terminal state.
    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }
}

/// Whole-document job state, distinct from any single batch's status.
///
/// `Paused` is terminal until an external resume signal (a fresh credential
/// plus a `resume()` call) arrives. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// No document loaded.
    Idle,
    /// Rasterisation has begun; left once the batch list is populated.
    Converting,
    /// The sequential loop is running.
    Analyzing,
    /// The loop halted on a failure; awaiting an external resume.
    Paused,
    /// Every batch reached a terminal status with none left pending.
    Completed,
}

impl JobState {
    /// Stable lowercase name, used in error messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Converting => "converting",
            JobState::Analyzing => "analyzing",
            JobState::Paused => "paused",
            JobState::Completed => "completed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
