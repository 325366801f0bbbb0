use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::ClassifierError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ClassifierError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::ResourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InferenceFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ClassifierError {
    fn into_response(self) -> Response {
        let field = match &self {
            Self::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let body = ErrorBody {
            detail: self.to_string(),
            error: self.kind(),
            field,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Classifier(ClassifierError),
    /// The body was not valid JSON for the endpoint, or had the wrong content type.
    Body(JsonRejection),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        Self::Classifier(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Classifier(err) => err.into_response(),
            // axum picks 400, 415 or 422 depending on what went wrong.
            Self::Body(rejection) => {
                let body = ErrorBody {
                    detail: rejection.body_text(),
                    error: "validation_error",
                    field: None,
                };
                (rejection.status(), Json(body)).into_response()
            }
        }
    }
}
