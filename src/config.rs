//! Configuration for page-by-page document analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, serialise them for logging, and diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A constructor with a dozen positional fields is unreadable and breaks on
//! every new field. The builder lets callers set only what they care about
//! and rely on documented defaults for the rest.

use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};

/// Configuration for a document analysis job.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2report::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .dpi(150)
///     .model("gemini-3-pro-preview")
///     .temperature(0.15)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 150.
    ///
    /// 150 DPI is the sweet spot: text is sharp enough for a VLM to read
    /// reliably while image sizes stay well below typical API upload limits.
    /// Increase to 200–300 for small-font documents.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of DPI. A 200-DPI render of an A0 poster
    /// could produce a 13 000 × 18 000 px image and exhaust memory; this
    /// caps either dimension, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// Model identifier sent to the analysis endpoint.
    /// Default: "gemini-3-pro-preview".
    pub model: String,

    /// Sampling temperature for the analysis completion. Default: 0.15.
    ///
    /// Low temperature keeps the model faithful to what is on the page.
    /// Higher values introduce creativity that worsens transcription
    /// accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    ///
    /// Dense pages can exceed 2 000 output tokens; setting this too low
    /// silently truncates the analysis mid-sentence.
    pub max_output_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Custom per-page user prompt. If None, uses the built-in default.
    pub user_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-analysis-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            model: "gemini-3-pro-preview".to_string(),
            temperature: 0.15,
            max_output_tokens: 4096,
            password: None,
            system_prompt: None,
            user_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
        }
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.user_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalyzeError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(AnalyzeError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.model.trim().is_empty() {
            return Err(AnalyzeError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::builder().build().unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.model, "gemini-3-pro-preview");
        assert_eq!(config.max_output_tokens, 4096);
    }

    #[test]
    fn dpi_is_clamped() {
        let config = AnalysisConfig::builder().dpi(50).build().unwrap();
        assert_eq!(config.dpi, 72);
        let config = AnalysisConfig::builder().dpi(1000).build().unwrap();
        assert_eq!(config.dpi, 400);
    }

    #[test]
    fn temperature_is_clamped() {
        let config = AnalysisConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = AnalysisConfig::builder().model("  ").build();
        assert!(matches!(err, Err(AnalyzeError::InvalidConfig(_))));
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let err = AnalysisConfig::builder().max_output_tokens(0).build();
        assert!(matches!(err, Err(AnalyzeError::InvalidConfig(_))));
    }
}
