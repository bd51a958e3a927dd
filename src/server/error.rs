use crate::server::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("Server misconfigured: {0} is not set")]
    ServerMisconfigured(&'static str),

    #[error("Model did not return a valid SVG")]
    InvalidModelOutput { raw: String },

    #[error("Failed to generate SVG: {0}")]
    UpstreamFailure(String),
}

impl RelayError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        RelayError::BadRequest(format!("Missing required fields: {}", fields.join(", ")))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::ServerMisconfigured(_)
            | RelayError::InvalidModelOutput { .. }
            | RelayError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.to_string();
        let raw = match self {
            RelayError::InvalidModelOutput { raw } => Some(raw),
            _ => None,
        };
        (status, Json(ErrorResponse { error, raw })).into_response()
    }
}
