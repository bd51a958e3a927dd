use anyhow::Error;
use async_trait::async_trait;

/// One single-turn completion request: fixed instructions plus an inline image.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    /// Base64 payload, without a data-URL prefix.
    pub image_data: &'a str,
    pub mime_type: &'a str,
}

/// A hosted multimodal model returning one text completion.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, api_key: &str, request: CompletionRequest<'_>)
    -> Result<String, Error>;
}
