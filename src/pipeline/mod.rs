//! Pipeline stages feeding the analysis orchestrator.
//!
//! One transformation step per submodule, each independently testable, so a
//! stage can be swapped (e.g. a different rendering backend) without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ client
//! (URL/path)  (pdfium)  (base64)  (remote analysis)
//! ```
//!
//! 1. [`input`]  — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`] — rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`] — PNG-encode and base64-wrap each page for the multimodal
//!    API request body
//! 4. [`client`] — the [`client::AnalysisClient`] boundary and its Gemini
//!    implementation; the only stage with network I/O
pub mod client;
pub mod encode;
pub mod input;
pub mod render;
