use rvstruct::ValueStruct;

#[derive(Debug, Clone, ValueStruct)]
pub struct OllamaModelName(String);

#[derive(Debug, Clone, PartialEq)]
pub struct TextImageCoords {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A single line of recognised text, in the reading order of the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrTextFragment {
    pub text: String,
    pub coords: TextImageCoords,
}

impl OcrTextFragment {
    pub fn new(text: String, coords: TextImageCoords) -> Self {
        Self { text, coords }
    }
}
