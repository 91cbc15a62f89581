use crate::extractors::{FieldsExtractor, FieldsExtractorOptions};
use crate::file_converters::FileConverters;
use crate::server::{router, AppState};
use crate::AppResult;
use console::{Style, Term};
use rvstruct::ValueStruct;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;

#[derive(Debug, Clone)]
pub struct ServeCommandOptions {
    pub listen: SocketAddr,
    pub max_upload_size: usize,
    pub ocr_models_dir: Option<PathBuf>,
}

pub async fn command_serve(
    term: &Term,
    options: ServeCommandOptions,
    extractor_options: FieldsExtractorOptions,
) -> AppResult<()> {
    let bold_style = Style::new().bold();

    // OCR models are loaded once here and shared by every request.
    let file_converters =
        tokio::task::spawn_blocking(move || FileConverters::init(options.ocr_models_dir))
            .await??;
    let extractor = FieldsExtractor::new(extractor_options, file_converters);

    term.write_line(
        format!(
            "Listening on {}.\nLLM: {} ({}).",
            bold_style.clone().green().apply_to(options.listen),
            bold_style
                .clone()
                .yellow()
                .apply_to(extractor.llm_options().model.value()),
            extractor.llm_options().api_url
        )
        .as_str(),
    )?;

    let app = router(AppState::new(extractor), options.max_upload_size);
    let listener = tokio::net::TcpListener::bind(options.listen).await?;
    tracing::info!("Extraction service listening on {}", options.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
