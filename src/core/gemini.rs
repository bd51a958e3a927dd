//! Gemini `generateContent` client.
//!
//! One request per call: the instruction prompt goes into `system_instruction`,
//! the image travels as `inline_data` next to a short text part. No streaming,
//! no retries.

use crate::core::provider::{CompletionRequest, ModelProvider};
use crate::utils::urls::join_endpoint;
use anyhow::{Context, Error, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_base: String,
    model: String,
}

#[derive(Serialize, Debug)]
pub struct GenerateContentRequest<'a> {
    pub system_instruction: Content<'a>,
    pub contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
pub struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize, Debug)]
pub struct InlineData<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

#[derive(Serialize, Debug)]
pub struct GenerationConfig {
    #[serde(rename = "candidateCount")]
    pub candidate_count: u32,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ProviderErrorEnvelope {
    error: ProviderError,
}

#[derive(Deserialize, Debug)]
struct ProviderError {
    message: String,
}

impl GeminiClient {
    pub fn new(http_client: Client, api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
            model: model.into(),
        }
    }

    pub fn build_request<'a>(request: &CompletionRequest<'a>) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.system_prompt,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text {
                        text: request.user_prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type,
                            data: request.image_data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { candidate_count: 1 },
        }
    }
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(response: GenerateContentResponse) -> Result<String, Error> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(anyhow!("Request blocked by provider: {}", reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Provider returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(anyhow!(
            "Provider returned an empty completion (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    Ok(text)
}

#[async_trait]
impl ModelProvider for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        api_key: &str,
        request: CompletionRequest<'_>,
    ) -> Result<String, Error> {
        let url = join_endpoint(
            &self.api_base,
            &format!("models/{}:generateContent", self.model),
        )
        .context("Invalid provider base URL")?;

        let payload = Self::build_request(&request);
        debug!("Sending {} request to {}", request.mime_type, url);

        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach model provider")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read provider response")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            error!("Provider error {}: {}", status, message);
            return Err(anyhow!("Provider returned {}: {}", status, message));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).context("Malformed provider response")?;
        extract_text(parsed)
    }
}
