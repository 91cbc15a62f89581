use crate::errors::AppError;
use crate::AppResult;

/// Field name to extracted value, in the order the model produced them.
pub type ExtractionRecord = serde_json::Map<String, serde_json::Value>;

pub const MISSING_RESPONSE_MESSAGE: &str = "模型未返回有效数据";

/// Interprets a model completion as an extraction record.
///
/// Any JSON object is accepted as-is; keys and value types are not checked.
/// Text around the object is not stripped, so a chatty completion is reported as malformed.
pub fn parse_extraction_record(completion: Option<String>) -> AppResult<ExtractionRecord> {
    match completion {
        Some(response) => serde_json::from_str::<ExtractionRecord>(&response)
            .map_err(|source| AppError::LlmResponseMalformed { response, source }),
        None => {
            let mut record = ExtractionRecord::new();
            record.insert(
                "error".to_string(),
                serde_json::Value::String(MISSING_RESPONSE_MESSAGE.to_string()),
            );
            Ok(record)
        }
    }
}
