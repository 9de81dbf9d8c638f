use demo_core::error::DemoError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub result: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse<E = DemoError> {
    pub error: ErrorResponseInner<E>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseInner<E = DemoError> {
    pub message: String,
    /// Follow-up advice, when the error has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub details: E,
}
