pub mod image;
pub mod ocr;
pub mod pdf;

use std::path::Path;

use ::image::DynamicImage;

use crate::error::ProcessError;

pub use self::image::{downscale_half, ColorKind, EmbeddedImage, ImageEncoding};
pub use self::ocr::OcrProcessor;
pub use self::pdf::{page_lacks_text, LopdfSource};

/// One page of an opened PDF: its embedded text and its raster images in
/// discovery order.
#[derive(Debug, Clone, Default)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
    pub images: Vec<EmbeddedImage>,
}

/// Opens a document and exposes its pages.
pub trait DocumentSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<Vec<PdfPage>, ProcessError>;

    /// Rasterizes a whole page (1-based), used when none of its embedded
    /// images can be decoded.
    fn render_page(&self, _path: &Path, page: u32) -> Result<DynamicImage, ProcessError> {
        Err(ProcessError::RenderPage {
            page,
            reason: "page rendering is not available".to_string(),
        })
    }
}

/// Recognizes text in a raster image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError>;
}
