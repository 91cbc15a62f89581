use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;

pub const INVALID_CONTENT_TYPE_DETAIL: &str = "上传的文件必须是图片格式";
pub const INVALID_UPLOAD_DETAIL: &str = "上传请求格式错误";
pub const MISSING_UPLOAD_FILE_DETAIL: &str = "未找到上传的文件";
pub const LLM_CALL_FAILED_DETAIL: &str = "调用大模型失败";
pub const LLM_RESPONSE_MALFORMED_DETAIL: &str = "模型响应格式错误";
pub const INTERNAL_ERROR_DETAIL: &str = "内部服务器错误";

#[derive(Serialize)]
struct ErrorResponse {
    detail: &'static str,
}

/// The only place where pipeline failures become HTTP responses.
/// Diagnostic details are logged here and never sent back to the caller.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::InvalidContentType { content_type } => {
                tracing::warn!("Rejected upload with content type {:?}", content_type);
                (StatusCode::BAD_REQUEST, INVALID_CONTENT_TYPE_DETAIL)
            }
            AppError::MissingUploadFile { field_name } => {
                tracing::warn!("Upload has no '{}' field", field_name);
                (StatusCode::BAD_REQUEST, MISSING_UPLOAD_FILE_DETAIL)
            }
            AppError::InvalidUpload(e) => {
                tracing::warn!("Invalid multipart upload ({}): {}", e.status(), e);
                (StatusCode::BAD_REQUEST, INVALID_UPLOAD_DETAIL)
            }
            AppError::LlmCallFailed {
                status,
                response_text,
            } => {
                tracing::error!(
                    "LLM call failed with HTTP status {}: {}",
                    status,
                    response_text
                );
                (StatusCode::INTERNAL_SERVER_ERROR, LLM_CALL_FAILED_DETAIL)
            }
            AppError::LlmResponseMalformed { response, source } => {
                tracing::error!(
                    "Failed to parse LLM response as JSON ({}): {}",
                    source,
                    response
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    LLM_RESPONSE_MALFORMED_DETAIL,
                )
            }
            _ => {
                tracing::error!("Internal error: {}\nDetails: {:?}", self, self);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_DETAIL)
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
