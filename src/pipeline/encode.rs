//! Image encoding: `DynamicImage` → base64 PNG wrapped in [`PageImage`].
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG is chosen over JPEG because it is lossless — text crispness
//! matters far more than file size for reading accuracy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// An encoded page ready for the analysis API.
///
/// Batches hold this behind an `Arc` — the rasterised page is referenced,
/// never copied, and the orchestrator treats it as opaque.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Base64-encoded PNG bytes.
    pub base64: String,
    /// MIME type of the encoded bytes.
    pub mime_type: &'static str,
    /// Pixel width of the rendered page.
    pub width: u32,
    /// Pixel height of the rendered page.
    pub height: u32,
}

/// Encode a rasterised page as a base64 PNG.
///
/// Lossless compression preserves text crispness; JPEG artefacts on rendered
/// text confuse vision models and degrade accuracy at low DPI.
pub fn encode_page(img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(PageImage {
        base64: b64,
        mime_type: "image/png",
        width: img.width(),
        height: img.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_page(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(data.width, 10);
        assert_eq!(data.height, 10);
        assert!(!data.base64.is_empty());
        // Verify it's valid base64
        let decoded = STANDARD.decode(&data.base64).expect("valid base64");
        assert!(!decoded.is_empty());
    }
}
