use crate::extractors::{ExtractionRecord, FieldsExtractor, FieldsExtractorOptions, UploadedImage};
use crate::file_converters::FileConverters;
use crate::AppResult;
use console::{Style, Term};
use std::path::{Path, PathBuf};

pub async fn command_extract(
    term: &Term,
    file: &Path,
    ocr_models_dir: Option<PathBuf>,
    extractor_options: FieldsExtractorOptions,
) -> AppResult<ExtractionRecord> {
    let bold_style = Style::new().bold();
    term.write_line(
        format!(
            "Extracting fields from {}.",
            bold_style.clone().white().apply_to(file.display())
        )
        .as_str(),
    )?;

    let upload = read_local_image(file).await?;
    let file_converters =
        tokio::task::spawn_blocking(move || FileConverters::init(ocr_models_dir)).await??;
    let extractor = FieldsExtractor::new(extractor_options, file_converters);
    extractor.extract(upload).await
}

async fn read_local_image(file: &Path) -> AppResult<UploadedImage> {
    let content_type = mime_guess::from_path(file)
        .first()
        .map(|mime| mime.essence_str().to_string());
    // Validate before touching the file so non-images fail the same way as over HTTP.
    FieldsExtractor::check_image_content_type(content_type.as_deref())?;
    let data = tokio::fs::read(file).await?;
    Ok(UploadedImage {
        content_type,
        data: data.into(),
    })
}
