//! Error types for the pdf2report library.
//!
//! Two distinct layers reflect two distinct failure modes:
//!
//! * [`AnalyzeError`] — **Fatal to the job**: analysis cannot proceed at all
//!   (bad input file, wrong password, rasterisation failure, orchestrator
//!   misuse). Returned as `Err(AnalyzeError)` from the top-level entry points.
//!
//! * [`crate::pipeline::client::ClientError`] — a single analysis call
//!   failed. These are never propagated upward directly; the orchestrator
//!   feeds their display string through [`FailureKind::classify`] and decides
//!   whether to pause the job (recoverable) or mark the batch failed (fatal
//!   for that page).
//!
//! The separation keeps the remote service a black box: the orchestrator only
//! ever reasons about the three [`FailureKind`] values, never about HTTP.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2report library.
///
/// Per-page analysis failures are recorded on the affected
/// [`crate::batch::Batch`] rather than propagated here.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Rasterisation errors (whole-job) ──────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error for a specific page. Aborts the whole job;
    /// no partial rasterisation path exists.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Orchestrator errors ───────────────────────────────────────────────
    /// An operation was invoked in a job state that does not allow it.
    #[error("Cannot {operation} while the job is {state}")]
    InvalidJobState {
        operation: &'static str,
        state: &'static str,
    },

    /// `resume()` was called while no credential is available.
    #[error(
        "No credential available to resume the job.\n\
         Supply one with set_credential() or set GEMINI_API_KEY."
    )]
    CredentialRequired,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy,\n\
or install pdfium where the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of a single failed analysis call.
///
/// The orchestrator's pause/continue decision depends only on this value:
/// the two recoverable kinds revert the batch to `pending` and pause the job
/// until a fresh credential arrives; [`FailureKind::Fatal`] marks the batch
/// failed and pauses so a human can decide what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate or quota exhaustion. The user must wait out the quota window or
    /// supply a credential with available quota.
    QuotaExceeded,
    /// The credential is missing, invalid, or expired. The user must supply
    /// a new one.
    InvalidCredential,
    /// Any other failure (network error, malformed response, empty result).
    Fatal,
}

impl FailureKind {
    /// Classify a raw failure signal from the analysis client.
    ///
    /// Pure substring/code inspection of whatever status or message the
    /// client raised: a 429-equivalent maps to quota exhaustion, a
    /// 401/403/not-found-equivalent to an invalid credential, anything else
    /// is fatal for that page. No I/O, no memory of prior classifications.
    pub fn classify(signal: &str) -> FailureKind {
        let msg = signal.to_lowercase();
        if msg.contains("429") || msg.contains("quota") || msg.contains("resource_exhausted") {
            FailureKind::QuotaExceeded
        } else if msg.contains("401")
            || msg.contains("403")
            || msg.contains("not found")
            || msg.contains("unauthenticated")
            || msg.contains("api key")
        {
            FailureKind::InvalidCredential
        } else {
            FailureKind::Fatal
        }
    }

    /// Whether a batch that failed this way may be retried after resume.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, FailureKind::Fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_signals() {
        assert_eq!(
            FailureKind::classify("HTTP 429: rate limited"),
            FailureKind::QuotaExceeded
        );
        assert_eq!(
            FailureKind::classify("Quota exceeded for quota metric"),
            FailureKind::QuotaExceeded
        );
        assert_eq!(
            FailureKind::classify("status: RESOURCE_EXHAUSTED"),
            FailureKind::QuotaExceeded
        );
    }

    #[test]
    fn credential_signals() {
        assert_eq!(
            FailureKind::classify("HTTP 401: unauthorized"),
            FailureKind::InvalidCredential
        );
        assert_eq!(
            FailureKind::classify("HTTP 403: forbidden"),
            FailureKind::InvalidCredential
        );
        assert_eq!(
            FailureKind::classify("model not found for this key"),
            FailureKind::InvalidCredential
        );
        assert_eq!(
            FailureKind::classify("API key not valid"),
            FailureKind::InvalidCredential
        );
    }

    #[test]
    fn anything_else_is_fatal() {
        assert_eq!(FailureKind::classify("network timeout"), FailureKind::Fatal);
        assert_eq!(
            FailureKind::classify("empty response: the model returned no text"),
            FailureKind::Fatal
        );
        assert_eq!(FailureKind::classify(""), FailureKind::Fatal);
    }

    #[test]
    fn recoverability() {
        assert!(FailureKind::QuotaExceeded.is_recoverable());
        assert!(FailureKind::InvalidCredential.is_recoverable());
        assert!(!FailureKind::Fatal.is_recoverable());
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            FailureKind::classify("QUOTA exceeded"),
            FailureKind::QuotaExceeded
        );
        assert_eq!(
            FailureKind::classify("Model Not Found"),
            FailureKind::InvalidCredential
        );
    }

    #[test]
    fn invalid_job_state_display() {
        let e = AnalyzeError::InvalidJobState {
            operation: "resume",
            state: "idle",
        };
        let msg = e.to_string();
        assert!(msg.contains("resume"), "got: {msg}");
        assert!(msg.contains("idle"), "got: {msg}");
    }

    #[test]
    fn rasterisation_failed_display() {
        let e = AnalyzeError::RasterisationFailed {
            page: 3,
            detail: "bitmap allocation failed".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }
}
