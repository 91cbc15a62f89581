use rvstruct::ValueStruct;
use serde::Serialize;
use url::Url;

use crate::common_types::OllamaModelName;
use crate::errors::AppError;
use crate::AppResult;

#[derive(Debug, Clone)]
pub struct OllamaLlmOptions {
    pub api_url: Url,
    pub model: OllamaModelName,
}

impl OllamaLlmOptions {
    pub const DEFAULT_API_URL: &'static str = "http://localhost:11433/api/generate";
    pub const DEFAULT_MODEL: &'static str = "llama3";
}

#[derive(Clone)]
pub struct OllamaLlmClient {
    client: reqwest::Client,
    ollama_llm_options: OllamaLlmOptions,
}

#[derive(Serialize, Clone, Debug)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaLlmClient {
    const RESPONSE_FIELD: &'static str = "response";

    pub fn new(ollama_llm_options: OllamaLlmOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            ollama_llm_options,
        }
    }

    pub fn options(&self) -> &OllamaLlmOptions {
        &self.ollama_llm_options
    }

    /// Sends a single non-streaming completion request.
    ///
    /// Returns `None` only when the `response` key is absent from the body.
    /// A `response` that is present but not a string is an error.
    pub async fn generate(&self, prompt: &str) -> AppResult<Option<String>> {
        let generate_request = OllamaGenerateRequest {
            model: self.ollama_llm_options.model.value().as_str(),
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(self.ollama_llm_options.api_url.clone())
            .json(&generate_request)
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let response_text = response.text().await.unwrap_or_default();
            return Err(AppError::LlmCallFailed {
                status,
                response_text,
            });
        }
        let mut generate_response: serde_json::Map<String, serde_json::Value> =
            response.json().await?;
        match generate_response.remove(Self::RESPONSE_FIELD) {
            None => Ok(None),
            Some(serde_json::Value::String(text)) => Ok(Some(text)),
            Some(other) => Err(AppError::SystemError {
                message: format!(
                    "Ollama '{}' field is not a string: {}",
                    Self::RESPONSE_FIELD,
                    other
                ),
            }),
        }
    }
}
