//! Document input: turn a path-or-URL argument into an openable local PDF.
//!
//! pdfium only reads from the filesystem, so URL inputs are downloaded into a
//! temporary directory first; the directory lives as long as the resolved
//! input and is cleaned up on drop. Both paths validate the `%PDF` magic
//! before handing the file onward — a wrong file should fail here with a
//! clear message, not deep inside the rasteriser.

use crate::error::AnalyzeError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A validated PDF ready to open.
pub struct ResolvedInput {
    path: PathBuf,
    /// Present for URL inputs. Dropping it deletes the downloaded file, so
    /// it must outlive rasterisation.
    _download_dir: Option<TempDir>,
}

impl ResolvedInput {
    /// Filesystem path of the PDF, wherever it came from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether the argument names a remote document.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a user-supplied path or URL to a validated local PDF.
///
/// `timeout_secs` bounds the whole download for URL inputs and is unused for
/// local paths.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AnalyzeError> {
    if is_url(input) {
        fetch_remote(input, timeout_secs).await
    } else {
        open_local(Path::new(input))
    }
}

/// Reject anything that does not start with the PDF magic. Inputs shorter
/// than four bytes cannot be PDFs either.
fn check_magic(origin: &Path, head: &[u8]) -> Result<(), AnalyzeError> {
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    if &magic == b"%PDF" {
        Ok(())
    } else {
        Err(AnalyzeError::NotAPdf {
            path: origin.to_path_buf(),
            magic,
        })
    }
}

fn open_local(path: &Path) -> Result<ResolvedInput, AnalyzeError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => AnalyzeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AnalyzeError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut head = [0u8; 4];
    let read = file
        .read(&mut head)
        .map_err(|e| AnalyzeError::Internal(format!("reading {}: {}", path.display(), e)))?;
    check_magic(path, &head[..read])?;

    debug!("resolved local PDF {}", path.display());
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        _download_dir: None,
    })
}

async fn fetch_remote(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AnalyzeError> {
    info!("downloading {}", url);

    let transport_error = |e: &reqwest::Error| {
        if e.is_timeout() {
            AnalyzeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnalyzeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalyzeError::Internal(format!("http client: {}", e)))?;

    let response = http.get(url).send().await.map_err(|e| transport_error(&e))?;
    if !response.status().is_success() {
        return Err(AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
    check_magic(Path::new(url), &bytes)?;

    let dir = TempDir::new().map_err(|e| AnalyzeError::Internal(e.to_string()))?;
    let path = dir.path().join("input.pdf");
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("write failed: {}", e),
        })?;

    debug!("downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput {
        path,
        _download_dir: Some(dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let result = resolve_input("/definitely/not/a/real/file.pdf", 5).await;
        assert!(matches!(result, Err(AnalyzeError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"not a pdf at all").unwrap();

        let result = resolve_input(path.to_str().unwrap(), 5).await;
        assert!(matches!(result, Err(AnalyzeError::NotAPdf { .. })));
    }

    #[tokio::test]
    async fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.pdf");
        std::fs::write(&path, b"%P").unwrap();

        let result = resolve_input(path.to_str().unwrap(), 5).await;
        assert!(matches!(result, Err(AnalyzeError::NotAPdf { .. })));
    }

    #[tokio::test]
    async fn valid_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7 minimal").unwrap();

        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), path);
    }
}
