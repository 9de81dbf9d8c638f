use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use demo_core::error::DemoError;

use crate::http::error::ApiDemoError;

/// Custom JSON extractor that converts serde errors to ApiDemoError
pub struct DemoJson<T>(pub T);

impl<T, S> FromRequest<S> for DemoJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiDemoError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(data)) => Ok(DemoJson(data)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {err}"),
                    JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {err}"),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected application/json"
                            .to_string()
                    }
                    JsonRejection::BytesRejection(err) => {
                        format!("Failed to read request body: {err}")
                    }
                    _ => "Invalid JSON request".to_string(),
                };

                Err(ApiDemoError(DemoError::ValidationError { message }))
            }
        }
    }
}
