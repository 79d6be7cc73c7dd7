//! The resumable sequential analysis orchestrator.
//!
//! One orchestrator instance owns one job: the ordered batch list, the job
//! state, the derived progress set, and the growing report. Pages are driven
//! through the analysis client strictly one at a time, in page order, so
//! there is always at most one call in flight and the pause point is
//! unambiguous.
//!
//! On a recoverable failure (bad credential, exhausted quota) the loop stops
//! immediately, reverts the current batch to pending, and parks the job in
//! `paused` until a fresh credential arrives — attempting the remaining
//! pages would burn quota on failures with the same cause. A resumed loop
//! restarts from the first batch outside the progress set, so a page that
//! already succeeded is never sent to the remote service again.
//!
//! All mutation happens through `&mut self`, including across the client
//! await: a teardown can never interleave with an iteration's status write,
//! and cancelling the loop future drops the in-flight call before it touches
//! any state.

use crate::batch::{Batch, JobState};
use crate::credentials::CredentialGate;
use crate::error::{AnalyzeError, FailureKind};
use crate::pipeline::client::AnalysisClient;
use crate::pipeline::encode::PageImage;
use crate::progress::ProgressCallback;
use crate::report::ReportAggregator;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why the job is paused. Carried by the orchestrator while in
/// [`JobState::Paused`] so callers can tell the user what remediation the
/// pause needs — the three causes differ (wait out quota, supply a new
/// credential, give up on the page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseReason {
    /// The service reported rate or quota exhaustion. The affected batch was
    /// reverted to pending and no work was lost.
    QuotaExhausted,
    /// The credential was rejected or never supplied. The affected batch was
    /// reverted to pending and no work was lost.
    CredentialInvalid,
    /// A page failed non-recoverably; `detail` is the raw failure message.
    PageFailed { page: usize, detail: String },
}

impl PauseReason {
    /// Whether supplying a fresh credential is the expected remedy.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PauseReason::PageFailed { .. })
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::QuotaExhausted => write!(
                f,
                "Analysis quota exhausted. Wait for the quota window to reset \
                 or supply a credential with available quota."
            ),
            PauseReason::CredentialInvalid => write!(
                f,
                "Credential invalid or missing. Supply a new credential to continue."
            ),
            PauseReason::PageFailed { page, detail } => {
                write!(f, "Page {} failed: {}", page, detail)
            }
        }
    }
}

/// Drives batches through the analysis client with pause/resume and
/// exactly-once-success semantics.
pub struct AnalysisOrchestrator {
    client: Arc<dyn AnalysisClient>,
    gate: CredentialGate,
    callback: Option<ProgressCallback>,
    state: JobState,
    batches: Vec<Batch>,
    /// Page indices whose batch is completed. Derived from batch status and
    /// kept in lockstep with it; decides what a resumed loop skips.
    completed: BTreeSet<usize>,
    report: Option<ReportAggregator>,
    pause_reason: Option<PauseReason>,
}

impl AnalysisOrchestrator {
    /// Create an orchestrator with no document loaded.
    pub fn new(client: Arc<dyn AnalysisClient>, gate: CredentialGate) -> Self {
        Self {
            client,
            gate,
            callback: None,
            state: JobState::Idle,
            batches: Vec::new(),
            completed: BTreeSet::new(),
            report: None,
            pause_reason: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    // ── State accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    /// The progress set: page indices with a completed batch.
    pub fn progress(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Why the job is paused; `None` unless the state is paused.
    pub fn pause_reason(&self) -> Option<&PauseReason> {
        self.pause_reason.as_ref()
    }

    /// The report built so far; `None` until a document is loaded.
    pub fn report(&self) -> Option<&ReportAggregator> {
        self.report.as_ref()
    }

    pub fn credential_gate(&self) -> &CredentialGate {
        &self.gate
    }

    // ── Credential operations ─────────────────────────────────────────────

    /// Supply a credential. Callers do this while paused, then invoke
    /// [`resume`](Self::resume).
    pub fn set_credential(&mut self, value: impl Into<String>) {
        self.gate.set_credential(value);
    }

    /// Forget every credential and tear the job down to idle. This is a full
    /// teardown, not a pause: batches, progress, and report are discarded.
    pub fn clear_credentials(&mut self) {
        self.gate.clear();
        self.teardown();
    }

    // ── Job lifecycle ─────────────────────────────────────────────────────

    /// Install a freshly rasterised document, discarding any prior job.
    ///
    /// Creates one pending batch per page image, in page order, and seeds
    /// the report with its header. The job is left in `converting`, ready
    /// for [`start`](Self::start).
    pub fn load_document(&mut self, document_name: impl Into<String>, pages: Vec<Arc<PageImage>>) {
        self.teardown();
        self.state = JobState::Converting;

        let name = document_name.into();
        info!("loading document '{}' with {} pages", name, pages.len());

        self.batches = pages
            .into_iter()
            .enumerate()
            .map(|(idx, image)| Batch::new(idx, image))
            .collect();
        self.report = Some(ReportAggregator::new(name));
    }

    /// Begin analysing a freshly loaded document from the first batch.
    ///
    /// Returns the state the job settled in: `completed` if every page
    /// succeeded, `paused` if the loop halted on a failure.
    pub async fn start(&mut self) -> Result<JobState, AnalyzeError> {
        if self.state != JobState::Converting {
            return Err(AnalyzeError::InvalidJobState {
                operation: "start",
                state: self.state.as_str(),
            });
        }
        self.state = JobState::Analyzing;
        self.run_loop().await;
        Ok(self.state)
    }

    /// Resume a paused job from the first batch outside the progress set.
    ///
    /// A no-op when the job already completed. Errors when no credential is
    /// available — resuming without one would pause again immediately.
    pub async fn resume(&mut self) -> Result<JobState, AnalyzeError> {
        match self.state {
            JobState::Completed => return Ok(JobState::Completed),
            JobState::Paused => {}
            other => {
                return Err(AnalyzeError::InvalidJobState {
                    operation: "resume",
                    state: other.as_str(),
                })
            }
        }
        if !self.gate.has_credential() {
            return Err(AnalyzeError::CredentialRequired);
        }
        self.pause_reason = None;
        self.state = JobState::Analyzing;
        self.run_loop().await;
        Ok(self.state)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Discard all job state. Batches, progress, and report do not survive.
    fn teardown(&mut self) {
        if !self.batches.is_empty() {
            debug!("tearing down job with {} batches", self.batches.len());
        }
        self.batches.clear();
        self.completed.clear();
        self.report = None;
        self.pause_reason = None;
        self.state = JobState::Idle;
    }

    fn pause(&mut self, reason: PauseReason) {
        warn!("job paused: {}", reason);
        self.state = JobState::Paused;
        if let Some(ref cb) = self.callback {
            cb.on_job_paused(&reason);
        }
        self.pause_reason = Some(reason);
    }

    /// The sequential loop shared by `start` and `resume`.
    ///
    /// Walks batches in ascending page order, skipping completed ones, and
    /// stops on the first failure. Each iteration's status write and report
    /// append happen together, between awaits.
    async fn run_loop(&mut self) {
        let total = self.batches.len();
        if let Some(ref cb) = self.callback {
            cb.on_analysis_start(total, self.completed.len());
        }

        for idx in 0..total {
            if self.completed.contains(&idx) {
                continue;
            }

            self.batches[idx].begin_attempt();
            if let Some(ref cb) = self.callback {
                cb.on_batch_start(idx + 1, total);
            }

            let Some(credential) = self.gate.current().map(str::to_owned) else {
                self.batches[idx].revert_to_pending();
                self.pause(PauseReason::CredentialInvalid);
                return;
            };

            let image = Arc::clone(&self.batches[idx].image);
            match self.client.analyze(&image, &credential).await {
                Ok(text) => {
                    debug!("page {} analysed: {} chars", idx + 1, text.len());
                    if let Some(ref mut report) = self.report {
                        report.append_page(idx, &text);
                    }
                    let len = text.len();
                    self.batches[idx].complete(text);
                    self.completed.insert(idx);
                    if let Some(ref cb) = self.callback {
                        cb.on_batch_complete(idx + 1, total, len);
                    }
                }
                Err(err) => {
                    let signal = err.to_string();
                    match FailureKind::classify(&signal) {
                        FailureKind::QuotaExceeded => {
                            self.batches[idx].revert_to_pending();
                            self.pause(PauseReason::QuotaExhausted);
                            return;
                        }
                        FailureKind::InvalidCredential => {
                            self.batches[idx].revert_to_pending();
                            self.pause(PauseReason::CredentialInvalid);
                            return;
                        }
                        FailureKind::Fatal => {
                            self.batches[idx].fail(signal.clone());
                            self.pause(PauseReason::PageFailed {
                                page: idx + 1,
                                detail: signal,
                            });
                            return;
                        }
                    }
                }
            }
        }

        info!("analysis complete: {}/{} pages", self.completed.len(), total);
        self.state = JobState::Completed;
        if let Some(ref cb) = self.callback {
            cb.on_job_completed(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchStatus;
    use crate::pipeline::client::ClientError;
    use async_trait::async_trait;

    /// Always succeeds with a fixed string.
    struct EchoClient;

    #[async_trait]
    impl AnalysisClient for EchoClient {
        async fn analyze(
            &self,
            _image: &PageImage,
            _credential: &str,
        ) -> Result<String, ClientError> {
            Ok("analysis".into())
        }
    }

    fn page() -> Arc<PageImage> {
        Arc::new(PageImage {
            base64: "aGVsbG8=".into(),
            mime_type: "image/png",
            width: 8,
            height: 8,
        })
    }

    fn orchestrator() -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(Arc::new(EchoClient), CredentialGate::with_ambient("key"))
    }

    #[test]
    fn fresh_orchestrator_is_idle() {
        let orch = orchestrator();
        assert_eq!(orch.state(), JobState::Idle);
        assert!(orch.batches().is_empty());
        assert!(orch.report().is_none());
    }

    #[test]
    fn load_document_creates_one_batch_per_page() {
        let mut orch = orchestrator();
        orch.load_document("doc.pdf", vec![page(), page(), page()]);
        assert_eq!(orch.state(), JobState::Converting);
        assert_eq!(orch.total_batches(), 3);
        for (i, b) in orch.batches().iter().enumerate() {
            assert_eq!(b.page_index, i);
            assert_eq!(b.status, BatchStatus::Pending);
        }
        assert!(orch.report().is_some());
    }

    #[tokio::test]
    async fn start_requires_a_loaded_document() {
        let mut orch = orchestrator();
        let err = orch.start().await.unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidJobState { .. }));
    }

    #[tokio::test]
    async fn resume_requires_a_paused_job() {
        let mut orch = orchestrator();
        let err = orch.resume().await.unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidJobState { .. }));
    }

    #[tokio::test]
    async fn empty_document_completes_immediately() {
        let mut orch = orchestrator();
        orch.load_document("empty.pdf", vec![]);
        let state = orch.start().await.unwrap();
        assert_eq!(state, JobState::Completed);
    }

    #[tokio::test]
    async fn happy_path_completes_all_batches() {
        let mut orch = orchestrator();
        orch.load_document("doc.pdf", vec![page(), page()]);
        let state = orch.start().await.unwrap();
        assert_eq!(state, JobState::Completed);
        assert_eq!(orch.completed_count(), 2);
        assert!(orch.batches().iter().all(|b| b.is_completed()));
        assert_eq!(orch.report().unwrap().section_count(), 2);
    }

    #[tokio::test]
    async fn clear_credentials_tears_down() {
        let mut orch = orchestrator();
        orch.load_document("doc.pdf", vec![page()]);
        orch.start().await.unwrap();
        orch.clear_credentials();
        assert_eq!(orch.state(), JobState::Idle);
        assert!(orch.batches().is_empty());
        assert!(orch.report().is_none());
        assert!(!orch.credential_gate().has_credential());
    }
}
