use crate::common_types::OcrTextFragment;
use crate::file_converters::ocr::Ocr;
use crate::AppResult;
use std::path::PathBuf;
use std::sync::Arc;

pub mod ocr;

#[cfg(feature = "ocr")]
pub mod ocr_ocrs;

/// Image decoding plus the process-wide OCR engine.
///
/// The engine is loaded once and shared read-only between all requests.
#[derive(Clone)]
pub struct FileConverters {
    pub ocr: Arc<dyn Ocr + 'static>,
}

impl FileConverters {
    pub fn new(ocr: Arc<dyn Ocr + 'static>) -> Self {
        Self { ocr }
    }

    #[cfg(feature = "ocr")]
    pub fn init(ocr_models_dir: Option<PathBuf>) -> AppResult<Self> {
        let ocrs = ocr_ocrs::Ocrs::new(ocr_models_dir)?;
        Ok(Self::new(Arc::new(ocrs)))
    }

    #[cfg(not(feature = "ocr"))]
    pub fn init(_ocr_models_dir: Option<PathBuf>) -> AppResult<Self> {
        Err(crate::errors::AppError::ExtractorConfigError {
            message: "OCR support is not enabled in this build (cargo feature `ocr`)".to_string(),
        })
    }

    /// Decodes uploaded bytes into an RGB image and runs OCR over it.
    /// CPU bound, so callers on the async runtime should use `spawn_blocking`.
    pub fn image_bytes_to_text(&self, image_bytes: &[u8]) -> AppResult<Vec<OcrTextFragment>> {
        let image = image::load_from_memory(image_bytes)?;
        let rgb_image = image::DynamicImage::ImageRgb8(image.to_rgb8());
        tracing::debug!(
            width = rgb_image.width(),
            height = rgb_image.height(),
            "Image decoded"
        );
        let fragments = self.ocr.image_to_text(rgb_image)?;
        for fragment in &fragments {
            tracing::debug!(
                x1 = fragment.coords.x1,
                y1 = fragment.coords.y1,
                x2 = fragment.coords.x2,
                y2 = fragment.coords.y2,
                "OCR fragment: {}",
                fragment.text
            );
        }
        Ok(fragments)
    }
}
