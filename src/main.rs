use clap::Parser;
use console::{Style, Term};

use std::error::Error;

mod args;
use crate::commands::*;
use crate::errors::AppError;
use args::*;

mod errors;

mod commands;

mod extractors;

mod file_converters;

mod server;

pub type AppResult<T> = Result<T, AppError>;

mod common_types;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_extractor=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let term = Term::stdout();
    let bold_style = Style::new().bold();

    term.write_line(
        format!(
            "{} v{}",
            bold_style.clone().green().apply_to("OCR Extractor"),
            bold_style.apply_to(env!("CARGO_PKG_VERSION"))
        )
        .as_str(),
    )?;

    let cli = CliArgs::parse();
    if let Err(err) = handle_args(cli, &term).await {
        term.write_line(
            format!(
                "{}: {}\nDetails: {:?}",
                bold_style.clone().red().apply_to("Error"),
                err,
                err.source()
            )
            .as_str(),
        )?;
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_args(cli: CliArgs, term: &Term) -> AppResult<()> {
    match cli.command {
        CliCommand::Serve {
            listen,
            max_upload_size,
            extractor_args,
        } => {
            let options = ServeCommandOptions {
                listen,
                max_upload_size,
                ocr_models_dir: extractor_args.ocr_models_dir.clone(),
            };
            command_serve(term, options, extractor_args.try_into()?).await?;
        }
        CliCommand::Extract {
            file,
            extractor_args,
        } => {
            let ocr_models_dir = extractor_args.ocr_models_dir.clone();
            let record =
                command_extract(term, &file, ocr_models_dir, extractor_args.try_into()?).await?;
            term.write_line(serde_json::to_string_pretty(&record)?.as_str())?;
        }
    }

    Ok(())
}
