use std::io::Cursor;
use std::sync::Arc;

use image::DynamicImage;

use crate::error::ProcessError;
use crate::processor::OcrEngine;

/// Tesseract-backed recognizer. A fresh engine is created per image so the
/// processor can be shared freely between worker threads.
#[derive(Clone)]
pub struct OcrProcessor {
    inner: Arc<OcrProcessorInner>,
}

struct OcrProcessorInner {
    languages: String,
}

impl OcrProcessor {
    pub fn new(languages: &[String]) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(OcrProcessorInner {
                languages: lang_str,
            }),
        }
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }
}

impl OcrEngine for OcrProcessor {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr", languages = %self.inner.languages)
            .entered();

        // leptess only takes encoded images
        let mut png_data = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to convert image: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))
    }
}
