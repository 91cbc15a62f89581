use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Uploaded content type is not an image: {content_type:?}")]
    InvalidContentType { content_type: Option<String> },
    #[error("Invalid multipart upload:\n{0}")]
    InvalidUpload(#[from] axum::extract::multipart::MultipartError),
    #[error("No file field '{field_name}' in the upload")]
    MissingUploadFile { field_name: String },
    #[error("LLM call failed. HTTP status: {status}. Response: {response_text}")]
    LlmCallFailed {
        status: reqwest::StatusCode,
        response_text: String,
    },
    #[error("LLM response is not a JSON object: {response}")]
    LlmResponseMalformed {
        response: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Input/output error")]
    InputOutputError(#[from] std::io::Error),
    #[error("HTTP client error:\n{0}")]
    HttpClientError(#[from] reqwest::Error),
    #[error("Image conversion error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("OCR error: {0}")]
    OcrError(#[from] anyhow::Error),
    #[error("Blocking task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Extractor config error: {message}")]
    ExtractorConfigError { message: String },
    #[error("System error: {message}")]
    SystemError { message: String },
}
