//! # pdf2report
//!
//! Analyse PDF documents page by page with a Vision Language Model,
//! accumulating the per-page analyses into a single Markdown report.
//!
//! ## Why this crate?
//!
//! Remote vision APIs fail in ways that should not cost you completed work:
//! rate limits trip mid-document, credentials expire, free-tier quotas run
//! dry. This crate drives each page through the analysis call one at a time
//! and treats those failures as a *pause*, not an abort — already-analysed
//! pages are kept, the interrupted page loses nothing, and supplying a fresh
//! credential resumes exactly where the job stopped.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Render     rasterise every page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode     PNG → base64 PageImage
//!  ├─ 4. Orchestrate  one batch per page, analysed strictly in page order;
//!  │                  pause on credential/quota failure, resume on a new key
//!  └─ 5. Report     header + one section per completed page, exportable at
//!                   any time
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2report::{
//!     AnalysisConfig, AnalysisOrchestrator, CredentialGate, GeminiClient, JobState,
//!     pipeline::{input, render},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let resolved = input::resolve_input("document.pdf", config.download_timeout_secs).await?;
//!     let pages = render::render_document(resolved.path(), &config).await?;
//!
//!     let client = Arc::new(GeminiClient::new(&config)?);
//!     let mut job = AnalysisOrchestrator::new(client, CredentialGate::from_env());
//!     job.load_document("document.pdf", pages);
//!
//!     if job.start().await? == JobState::Paused {
//!         // e.g. quota ran out on page 7: pages 1-6 are kept. Supply a new
//!         // key and continue from page 7.
//!         job.set_credential("fresh-api-key");
//!         job.resume().await?;
//!     }
//!
//!     if let Some(report) = job.report() {
//!         println!("{}", report.render());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2report` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2report = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{Batch, BatchStatus, JobState};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use credentials::{CredentialGate, CredentialStore};
pub use error::{AnalyzeError, FailureKind};
pub use orchestrator::{AnalysisOrchestrator, PauseReason};
pub use pipeline::client::{AnalysisClient, ClientError, GeminiClient};
pub use pipeline::encode::PageImage;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::ReportAggregator;
