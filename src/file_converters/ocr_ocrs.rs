use crate::common_types::{OcrTextFragment, TextImageCoords};
use crate::errors::AppError;
use crate::file_converters::ocr::Ocr;
use crate::AppResult;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, OcrInput, TextItem};
use std::path::PathBuf;

pub struct Ocrs {
    ocr_engine: OcrEngine,
}

impl Ocrs {
    const DETECTION_MODEL_FILE: &'static str = "text-detection.rten";
    const RECOGNITION_MODEL_FILE: &'static str = "text-recognition.rten";

    pub fn new(models_dir: Option<PathBuf>) -> AppResult<Self> {
        if models_dir.is_none() {
            tracing::warn!(
                "No OCR models directory configured. The stock ocrs recognition model only \
                 reads Latin script; set OCR_MODELS_DIR to a directory with a Chinese \
                 recognition model to read 姓名 and 职位."
            );
        }
        let models_dir = Self::find_models_dir(models_dir)?;
        tracing::info!(
            "Loading OCR models from {}",
            models_dir.to_string_lossy()
        );
        let detection_model = rten::Model::load_file(models_dir.join(Self::DETECTION_MODEL_FILE))
            .map_err(|e| AppError::OcrError(e.into()))?;
        let recognition_model =
            rten::Model::load_file(models_dir.join(Self::RECOGNITION_MODEL_FILE))
                .map_err(|e| AppError::OcrError(e.into()))?;
        let ocr_engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;
        Ok(Self { ocr_engine })
    }

    fn find_models_dir(configured: Option<PathBuf>) -> AppResult<PathBuf> {
        if let Some(models_dir) = configured {
            return if models_dir.exists() {
                Ok(models_dir)
            } else {
                Err(AppError::ExtractorConfigError {
                    message: format!(
                        "OCR models directory does not exist: {}",
                        models_dir.to_string_lossy()
                    ),
                })
            };
        }

        let executable = std::env::current_exe()?;
        let current_dir = executable.parent().map(|p| p.to_path_buf());

        [
            current_dir.clone().map(|p| p.join("models").join("ocrs")),
            current_dir
                .clone()
                .and_then(|p| p.parent().map(|p| p.join("share").join("ocrs"))),
            dirs::home_dir().map(|p| p.join(".cache").join("ocrs")),
        ]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
        .ok_or_else(|| AppError::SystemError {
            message: "Could not find models directory".to_string(),
        })
    }
}

impl Ocr for Ocrs {
    fn image_to_text(&self, image: image::DynamicImage) -> AppResult<Vec<OcrTextFragment>> {
        let rgb_image = image.to_rgb8();
        let image_source = ImageSource::from_bytes(rgb_image.as_raw(), rgb_image.dimensions())
            .map_err(|e| AppError::OcrError(e.into()))?;
        let input: OcrInput = self.ocr_engine.prepare_input(image_source)?;
        let word_rects = self.ocr_engine.detect_words(&input)?;
        let line_rects = self.ocr_engine.find_text_lines(&input, &word_rects);

        // Lines come back top-to-bottom, characters left-to-right.
        let mut fragments = vec![];
        for text_line in self
            .ocr_engine
            .recognize_text(&input, &line_rects)?
            .into_iter()
            .flatten()
        {
            let mut line_text = String::new();
            let mut line_rect = None;
            for char in text_line.chars() {
                line_text.push(char.char);
                line_rect = Some(match line_rect {
                    None => char.rect,
                    Some(rect) => char.rect.union(rect),
                });
            }
            let line_text = line_text.trim();
            if let (Some(rect), false) = (line_rect, line_text.is_empty()) {
                fragments.push(OcrTextFragment::new(
                    line_text.to_string(),
                    TextImageCoords {
                        x1: rect.left() as f32,
                        y1: rect.top() as f32,
                        x2: rect.right() as f32,
                        y2: rect.bottom() as f32,
                    },
                ));
            }
        }
        Ok(fragments)
    }
}
