//! System and user prompts for per-page document analysis.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the default behaviour (e.g.
//!    tightening the no-preamble rule) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without spinning up a real model, making prompt regressions easy to
//!    catch.
//!
//! Callers can override both via [`crate::config::AnalysisConfig`];
//! the constants here are used only when no override is provided.

/// Default system prompt establishing the analyst persona and output rules.
///
/// Used when `AnalysisConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert document analyst. Your task is to read one page of a scanned document and produce a thorough written analysis of its content.

Follow these rules precisely:

1. DEPTH
   - Explain what each item on the page is about, not just what it says
   - Provide the background a reader needs to fully understand the material
   - Where terminology appears, explain its origin and meaning

2. STRUCTURE
   - Organise the analysis with Markdown headings, one section per distinct item
   - Use - for unordered lists and 1. 2. 3. for ordered lists
   - Use **bold** for key terms on first mention

3. OUTPUT FORMAT
   - Output ONLY the analysis content in Markdown
   - Do NOT open with "This page contains..." or any other preamble
   - Do NOT close with a summary of what you just did
   - Start directly with the first item's analysis"#;

/// Default per-page user prompt accompanying the page image.
///
/// Used when `AnalysisConfig::user_prompt` is `None`.
pub const DEFAULT_USER_PROMPT: &str = r#"Analyse every item on this page.
For each item:
- Explain its reasoning or argument.
- Define and contextualise the key terms it uses.
- Supply the background knowledge needed to master the topic.
Do not add introductions or filler sentences."#;
