//! CLI binary for pdf2report.
//!
//! A thin shim over the library crate: maps CLI flags to `AnalysisConfig`,
//! drives the orchestrator, and — when the job pauses on a credential or
//! quota failure — prompts for a fresh API key on stdin and resumes.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2report::{
    pipeline::{input, render},
    AnalysisConfig, AnalysisOrchestrator, AnalysisProgressCallback, CredentialGate,
    CredentialStore, GeminiClient, JobState, PauseReason,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar anchored at the bottom, advanced as
/// the sequential loop completes each page. The same bar survives pause and
/// resume; `on_analysis_start` re-seeds position from the progress set.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Analysing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, total_batches: usize, completed: usize) {
        self.bar.set_length(total_batches as u64);
        self.bar.set_position(completed as u64);
        if completed > 0 {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!(
                    "Resuming: {completed}/{total_batches} pages already analysed"
                ))
            ));
        }
    }

    fn on_batch_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_batch_complete(&self, page_num: usize, _total: usize, result_len: usize) {
        self.bar.inc(1);
        self.bar.println(format!(
            "  {} page {page_num} ({result_len} chars)",
            green("✓")
        ));
    }

    fn on_job_paused(&self, reason: &PauseReason) {
        self.bar
            .println(format!("  {} paused: {reason}", yellow("⏸")));
    }

    fn on_job_completed(&self, total_batches: usize) {
        self.bar.set_message("done");
        self.bar.println(format!(
            "{} {}",
            green("◆"),
            bold(&format!("All {total_batches} pages analysed"))
        ));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pdf2report",
    version,
    about = "Analyse a PDF page by page with a Vision Language Model",
    long_about = "Analyse a PDF page by page with a Vision Language Model.\n\n\
        Completed pages are never lost: when the job pauses on a quota or\n\
        credential failure you can paste a fresh API key and resume from the\n\
        interrupted page."
)]
struct Cli {
    /// PDF file path or HTTP/HTTPS URL
    #[arg(required_unless_present = "forget_credential")]
    input: Option<String>,

    /// Output file for the Markdown report (default: derived from the input name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model identifier
    #[arg(long, default_value = "gemini-3-pro-preview")]
    model: String,

    /// API credential (overrides GEMINI_API_KEY and the stored credential)
    #[arg(long, env = "PDF2REPORT_CREDENTIAL", hide_env_values = true)]
    credential: Option<String>,

    /// Rendering DPI (72-400)
    #[arg(long, default_value_t = 150)]
    dpi: u32,

    /// Sampling temperature (0.0-2.0)
    #[arg(long, default_value_t = 0.15)]
    temperature: f32,

    /// Maximum output tokens per page
    #[arg(long, default_value_t = 4096)]
    max_tokens: usize,

    /// PDF password for encrypted documents
    #[arg(long)]
    password: Option<String>,

    /// Per-call API timeout in seconds
    #[arg(long, default_value_t = 120)]
    api_timeout: u64,

    /// Download timeout for URL inputs in seconds
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,

    /// Do not read or write the on-disk credential store
    #[arg(long)]
    no_store: bool,

    /// Delete the stored credential and exit
    #[arg(long)]
    forget_credential: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("pdf2report=debug,info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let store = CredentialStore::default_dir().map(CredentialStore::new);

    if cli.forget_credential {
        if let Some(ref store) = store {
            store.forget().context("could not remove stored credential")?;
            eprintln!("{} stored credential removed", green("◆"));
        }
        return Ok(());
    }

    let mut builder = AnalysisConfig::builder()
        .dpi(cli.dpi)
        .model(cli.model.as_str())
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    let config = builder.build()?;

    // Credential priority: --credential flag, then the stored key, then the
    // ambient environment variable.
    let mut gate = CredentialGate::from_env();
    if !cli.no_store {
        if let Some(stored) = store.as_ref().and_then(|s| s.load()) {
            gate.set_credential(stored);
        }
    }
    if let Some(ref key) = cli.credential {
        gate.set_credential(key.clone());
    }

    // ── Rasterise ────────────────────────────────────────────────────────
    let Some(ref input_arg) = cli.input else {
        anyhow::bail!("no PDF input given");
    };
    eprintln!("{} {}", cyan("◆"), bold(&format!("Opening {}", input_arg)));
    let resolved = input::resolve_input(input_arg, config.download_timeout_secs).await?;
    let pages = render::render_document(resolved.path(), &config).await?;
    eprintln!(
        "{} {}",
        cyan("◆"),
        bold(&format!("Rendered {} pages", pages.len()))
    );

    // ── Orchestrate ──────────────────────────────────────────────────────
    let callback = CliProgressCallback::new();
    let client = Arc::new(GeminiClient::new(&config)?);
    let mut job = AnalysisOrchestrator::new(client, gate).with_callback(callback.clone());

    let document_name = document_name(input_arg);
    job.load_document(document_name, pages);

    let mut state = job.start().await?;
    while state == JobState::Paused {
        let Some(reason) = job.pause_reason().cloned() else {
            break;
        };
        let resumed = callback.bar.suspend(|| prompt_for_resume(&reason));
        match resumed {
            ResumeChoice::NewCredential(key) => {
                if !cli.no_store {
                    if let Some(ref store) = store {
                        if let Err(e) = store.save(&key) {
                            eprintln!("{} could not persist credential: {e}", yellow("⚠"));
                        }
                    }
                }
                job.set_credential(key);
                state = job.resume().await?;
            }
            ResumeChoice::Retry => {
                state = job.resume().await?;
            }
            ResumeChoice::Abort => break,
        }
    }
    callback.bar.finish_and_clear();

    // ── Export ───────────────────────────────────────────────────────────
    let Some(report) = job.report() else {
        anyhow::bail!("no report was produced");
    };
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report.suggested_filename()));
    write_report_atomic(&output_path, &report.render()).await?;

    let completed = job.completed_count();
    let total = job.total_batches();
    if state == JobState::Completed {
        eprintln!(
            "{} {} ({} words) → {}",
            green("◆"),
            bold("Report complete"),
            report.word_count(),
            output_path.display()
        );
    } else {
        eprintln!(
            "{} {} — {completed}/{total} pages analysed → {}",
            yellow("◆"),
            bold("Partial report written"),
            output_path.display()
        );
        std::process::exit(1);
    }

    Ok(())
}

enum ResumeChoice {
    NewCredential(String),
    Retry,
    Abort,
}

/// Ask the user how to proceed after a pause. Recoverable pauses want a new
/// credential; a failed page offers a plain retry.
fn prompt_for_resume(reason: &PauseReason) -> ResumeChoice {
    eprintln!();
    eprintln!("{} {}", red("⚠"), bold(&reason.to_string()));
    if reason.is_recoverable() {
        eprint!("Paste a new API key to continue (blank to abort): ");
    } else {
        eprint!("Retry the failed page? [y/N]: ");
    }
    let _ = io::stderr().flush();

    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return ResumeChoice::Abort;
    }
    let line = line.trim();

    if reason.is_recoverable() {
        if line.is_empty() {
            ResumeChoice::Abort
        } else {
            ResumeChoice::NewCredential(line.to_string())
        }
    } else if line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes") {
        ResumeChoice::Retry
    } else {
        ResumeChoice::Abort
    }
}

/// Display name for the report header: last path/URL segment.
fn document_name(input: &str) -> String {
    input
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(input)
        .to_string()
}

/// Atomic write: temp file in the target directory, then rename.
async fn write_report_atomic(path: &PathBuf, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}
