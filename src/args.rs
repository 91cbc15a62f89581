use crate::errors::AppError;
use crate::extractors::{FieldsExtractorOptions, OllamaLlmOptions};
use clap::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    #[command(about = "Start the HTTP extraction service")]
    Serve {
        #[arg(
            short = 'l',
            long,
            env = "LISTEN_ADDR",
            default_value = "0.0.0.0:8000",
            help = "Address to listen on"
        )]
        listen: SocketAddr,
        #[arg(
            short = 'm',
            long,
            env = "MAX_UPLOAD_SIZE",
            default_value_t = 10 * 1024 * 1024,
            help = "Maximum size of uploaded requests in bytes"
        )]
        max_upload_size: usize,

        #[command(flatten)]
        extractor_args: ExtractorArgs,
    },
    #[command(about = "Extract fields from a local image file and print them as JSON")]
    Extract {
        #[arg(help = "Image file such as /tmp/business-card.png")]
        file: PathBuf,

        #[command(flatten)]
        extractor_args: ExtractorArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ExtractorArgs {
    #[arg(
        long,
        env = "OLLAMA_API_URL",
        default_value = OllamaLlmOptions::DEFAULT_API_URL,
        help = "Ollama generate API endpoint"
    )]
    pub ollama_api_url: Url,

    #[arg(
        long,
        env = "OLLAMA_MODEL_NAME",
        default_value = OllamaLlmOptions::DEFAULT_MODEL,
        help = "Ollama model used for extraction"
    )]
    pub ollama_model: String,

    #[arg(
        long,
        env = "OCR_MODELS_DIR",
        help = "Directory with text-detection.rten and text-recognition.rten models. Searched next to the executable and in ~/.cache/ocrs when not set"
    )]
    pub ocr_models_dir: Option<PathBuf>,
}

impl TryInto<FieldsExtractorOptions> for ExtractorArgs {
    type Error = AppError;

    fn try_into(self) -> Result<FieldsExtractorOptions, Self::Error> {
        if !matches!(self.ollama_api_url.scheme(), "http" | "https") {
            return Err(AppError::ExtractorConfigError {
                message: format!(
                    "Ollama API URL must be http or https: {}",
                    self.ollama_api_url
                ),
            });
        }
        let model = self.ollama_model.trim();
        if model.is_empty() {
            return Err(AppError::ExtractorConfigError {
                message: "Ollama model name is required".to_string(),
            });
        }
        Ok(FieldsExtractorOptions {
            ollama_llm_options: OllamaLlmOptions {
                api_url: self.ollama_api_url,
                model: model.to_string().into(),
            },
        })
    }
}
