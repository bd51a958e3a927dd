use crate::config::API_KEY_VAR;
use crate::core::prompt::{SYSTEM_PROMPT, USER_PROMPT};
use crate::core::provider::CompletionRequest;
use crate::core::svg::{ShapedReply, shape_reply};
use crate::server::error::RelayError;
use crate::server::types::{AppState, ProcessRequest, ProcessResponse, StatusResponse};
use axum::Json;
use axum::extract::State;
use axum::http::Method;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Liveness plus the configured model name.
pub async fn server_status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        model: state.model.model_name().to_string(),
    })
}

/// Relays one image to the model and returns the validated SVG.
///
/// Mounted for every method so that non-POST requests get a JSON 405
/// instead of axum's empty one.
pub async fn process_image_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Json<ProcessResponse>, RelayError> {
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let request: ProcessRequest = serde_json::from_slice(&body)
        .map_err(|e| RelayError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let (image_data, mime_type) = required_fields(&request)?;

    let api_key = state
        .config
        .api_key
        .as_deref()
        .ok_or(RelayError::ServerMisconfigured(API_KEY_VAR))?;

    info!(
        "Processing {} image ({} base64 bytes) with {}",
        mime_type,
        image_data.len(),
        state.model.model_name()
    );
    let start_time = std::time::Instant::now();

    let completion = state.model.complete(
        api_key,
        CompletionRequest {
            system_prompt: SYSTEM_PROMPT,
            user_prompt: USER_PROMPT,
            image_data,
            mime_type,
        },
    );
    let model_timeout = state.config.model_timeout;
    let raw = match tokio::time::timeout(model_timeout, completion).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            error!("Model call failed after {:?}: {:#}", start_time.elapsed(), e);
            return Err(RelayError::UpstreamFailure(format!("{:#}", e)));
        }
        Err(_) => {
            error!("Model call timed out after {:?}", model_timeout);
            return Err(RelayError::UpstreamFailure(format!(
                "Model did not respond within {:?}",
                model_timeout
            )));
        }
    };

    match shape_reply(&raw) {
        ShapedReply::Svg { markup, animated } => {
            if !animated {
                warn!("Model returned SVG without animation markers");
            }
            info!(
                "Returned {} bytes of SVG in {:?}",
                markup.len(),
                start_time.elapsed()
            );
            Ok(Json(ProcessResponse {
                svg: markup,
                animated: Some(animated),
            }))
        }
        ShapedReply::Invalid { raw_prefix } => {
            warn!("Model reply is not SVG: {:?}", raw_prefix);
            Err(RelayError::InvalidModelOutput { raw: raw_prefix })
        }
    }
}

fn required_fields(request: &ProcessRequest) -> Result<(&str, &str), RelayError> {
    let image_data = request.image_data.as_deref().filter(|v| !v.is_empty());
    let mime_type = request.mime_type.as_deref().filter(|v| !v.trim().is_empty());

    match (image_data, mime_type) {
        (Some(image_data), Some(mime_type)) => Ok((image_data, mime_type)),
        (image_data, mime_type) => {
            let mut missing = Vec::new();
            if image_data.is_none() {
                missing.push("imageData");
            }
            if mime_type.is_none() {
                missing.push("mimeType");
            }
            Err(RelayError::missing_fields(&missing))
        }
    }
}
