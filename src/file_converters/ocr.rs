use crate::common_types::OcrTextFragment;
use crate::AppResult;

pub trait Ocr: Send + Sync {
    fn image_to_text(&self, image: image::DynamicImage) -> AppResult<Vec<OcrTextFragment>>;
}
