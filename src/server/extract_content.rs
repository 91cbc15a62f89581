use axum::extract::{Multipart, State};
use axum::Json;

use crate::errors::AppError;
use crate::extractors::{ExtractionRecord, FieldsExtractor, UploadedImage};
use crate::server::AppState;
use crate::AppResult;

/// Multipart field carrying the image.
pub const UPLOAD_FIELD_NAME: &str = "file";

pub async fn extract_content(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ExtractionRecord>> {
    let upload = read_upload(&mut multipart).await?;
    let record = state.extractor().extract(upload).await?;
    Ok(Json(record))
}

async fn read_upload(multipart: &mut Multipart) -> AppResult<UploadedImage> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }
        let content_type = field.content_type().map(|s| s.to_string());
        // Rejected before the body is buffered.
        FieldsExtractor::check_image_content_type(content_type.as_deref())?;
        let data = field.bytes().await?;
        return Ok(UploadedImage { content_type, data });
    }
    Err(AppError::MissingUploadFile {
        field_name: UPLOAD_FIELD_NAME.to_string(),
    })
}
