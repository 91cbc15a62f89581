use crate::errors::AppError;
use crate::file_converters::FileConverters;
use crate::AppResult;
use bytes::Bytes;
use mime::Mime;

mod ollama_llm;
pub use ollama_llm::*;

mod prompt;
pub use prompt::*;

mod response_parser;
pub use response_parser::*;

/// Fields requested from the model, in prompt order.
pub const EXTRACTION_FIELDS: [&str; 2] = ["姓名", "职位"];

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct FieldsExtractorOptions {
    pub ollama_llm_options: OllamaLlmOptions,
}

/// Runs one upload through OCR, prompt building, the LLM and response parsing.
#[derive(Clone)]
pub struct FieldsExtractor {
    file_converters: FileConverters,
    llm_client: OllamaLlmClient,
}

impl FieldsExtractor {
    pub fn new(options: FieldsExtractorOptions, file_converters: FileConverters) -> Self {
        Self {
            file_converters,
            llm_client: OllamaLlmClient::new(options.ollama_llm_options),
        }
    }

    pub fn llm_options(&self) -> &OllamaLlmOptions {
        self.llm_client.options()
    }

    pub fn is_mime_image(mime: &Mime) -> bool {
        mime.type_() == mime::IMAGE
    }

    pub fn check_image_content_type(content_type: Option<&str>) -> AppResult<Mime> {
        content_type
            .and_then(|content_type| content_type.parse::<Mime>().ok())
            .filter(Self::is_mime_image)
            .ok_or_else(|| AppError::InvalidContentType {
                content_type: content_type.map(|s| s.to_string()),
            })
    }

    pub async fn extract(&self, upload: UploadedImage) -> AppResult<ExtractionRecord> {
        let media_type = Self::check_image_content_type(upload.content_type.as_deref())?;
        tracing::debug!(
            "Processing uploaded image: {} ({} bytes)",
            media_type,
            upload.data.len()
        );

        let file_converters = self.file_converters.clone();
        let fragments = tokio::task::spawn_blocking(move || {
            file_converters.image_bytes_to_text(&upload.data)
        })
        .await??;
        tracing::debug!("OCR recognised {} text fragments", fragments.len());

        let texts: Vec<String> = fragments.into_iter().map(|fragment| fragment.text).collect();
        let prompt = build_extraction_prompt(texts.as_slice(), &EXTRACTION_FIELDS);
        tracing::debug!("Extraction prompt: {}", prompt);

        let completion = self.llm_client.generate(&prompt).await?;
        parse_extraction_record(completion)
    }
}
