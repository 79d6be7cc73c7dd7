//! PDF rasterisation: render every page to an encoded [`PageImage`].
//!
//! This is the page-source side of the job: document in, ordered finite
//! sequence of page images out. Any failure here is fatal to the whole job —
//! there is no partial-rasterisation path.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size, keeping memory bounded and matching the
//! image-size sweet spot for current vision models.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::pipeline::encode::{self, PageImage};
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rasterise every page of a PDF into encoded page images, in page order.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_document(
    pdf_path: &Path,
    config: &AnalysisConfig,
) -> Result<Vec<Arc<PageImage>>, AnalyzeError> {
    let path = pdf_path.to_path_buf();
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        render_document_blocking(&path, max_pixels, password.as_deref())
    })
    .await
    .map_err(|e| AnalyzeError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to the pdfium shared library: `PDFIUM_LIB_PATH` first, then the
/// system loader path.
fn bind_pdfium() -> Result<Pdfium, AnalyzeError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AnalyzeError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of whole-document rendering.
fn render_document_blocking(
    pdf_path: &Path,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<Arc<PageImage>>, AnalyzeError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                AnalyzeError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                AnalyzeError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            AnalyzeError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = pages
            .get(idx as u16)
            .map_err(|e| AnalyzeError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| AnalyzeError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        let encoded =
            encode::encode_page(&image).map_err(|e| AnalyzeError::RasterisationFailed {
                page: idx + 1,
                detail: format!("image encoding failed: {}", e),
            })?;

        results.push(Arc::new(encoded));
    }

    Ok(results)
}
