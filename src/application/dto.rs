use serde::{Deserialize, Serialize};

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: String, message: String) -> Self {
        Self { error, message }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND".to_string(), message.into())
    }

    /// 不透出内部错误细节
    pub fn internal() -> Self {
        Self::new(
            "INTERNAL_ERROR".to_string(),
            "internal server error".to_string(),
        )
    }
}
