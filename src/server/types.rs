use crate::config::RelayConfig;
use crate::core::provider::ModelProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub model: Arc<dyn ModelProvider>,
}

/// Body of `POST /api/process`. Fields are optional so that absence can be
/// reported by name instead of as a generic JSON error.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub image_data: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProcessResponse {
    pub svg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatusResponse {
    pub status: &'static str,
    pub model: String,
}
