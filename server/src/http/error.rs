use axum::{Json, http::StatusCode, response::IntoResponse};
use demo_core::error::{DemoError, RpcErrorKind};

use super::types::{ErrorResponse, ErrorResponseInner};

/// HTTP rendering of a `DemoError`
pub struct ApiDemoError(pub DemoError);

impl From<DemoError> for ApiDemoError {
    fn from(error: DemoError) -> Self {
        ApiDemoError(error)
    }
}

impl IntoResponse for ApiDemoError {
    fn into_response(self) -> axum::response::Response {
        let code = self.status_code();

        self.with_status(code)
    }
}

impl ApiDemoError {
    fn with_status(self, status: StatusCode) -> axum::response::Response {
        let body = ErrorResponse {
            error: ErrorResponseInner {
                message: self.0.to_string(),
                hint: self.0.hint().map(str::to_string),
                details: self.0,
            },
        };

        (status, Json(body)).into_response()
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DemoError::RpcError { kind, .. } | DemoError::WalletError { kind, .. } => match kind {
                RpcErrorKind::NullResp => StatusCode::BAD_GATEWAY,
                RpcErrorKind::ErrorResp(_) => StatusCode::BAD_GATEWAY,
                RpcErrorKind::UnsupportedFeature { .. } => StatusCode::NOT_IMPLEMENTED,
                RpcErrorKind::TransportHttpError { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            DemoError::RpcConfigError { .. } => StatusCode::BAD_REQUEST,
            DemoError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            DemoError::SigningError { .. } => StatusCode::BAD_REQUEST,
            DemoError::TransactionBuildError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DemoError::SimulationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DemoError::TransactionReverted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DemoError::NotDelegated { .. } => StatusCode::CONFLICT,
            DemoError::PanelBusy { .. } => StatusCode::CONFLICT,
            DemoError::WalletNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            DemoError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub trait DemoResult<T, E> {
    fn api_error(self) -> Result<T, ApiDemoError>;
}

impl<T, E: Into<DemoError>> DemoResult<T, E> for Result<T, E> {
    fn api_error(self) -> Result<T, ApiDemoError> {
        self.map_err(|e| ApiDemoError(e.into()))
    }
}
