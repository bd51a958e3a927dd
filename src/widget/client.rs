use crate::server::types::{ErrorResponse, ProcessResponse};
use crate::utils::constants::PROCESS_ROUTE;
use crate::utils::urls::join_endpoint;
use anyhow::{Context, Error, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// Outbound body of one process call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayload {
    /// Base64 of the file bytes, no data-URL prefix.
    pub image_data: String,
    pub mime_type: String,
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Sends one image and resolves to the returned markup. Errors carry a
    /// message fit for showing to the user.
    async fn process(&self, payload: &ProcessPayload) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct HttpRelayClient {
    http_client: Client,
    endpoint: Url,
}

impl HttpRelayClient {
    pub fn new(http_client: Client, server_url: &str) -> Result<Self, Error> {
        let endpoint = join_endpoint(server_url, PROCESS_ROUTE)
            .with_context(|| format!("Invalid server URL: {}", server_url))?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn process(&self, payload: &ProcessPayload) -> Result<String, Error> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("Could not reach the server: {}", e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| anyhow!("Failed to read the server response: {}", e))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(error) => anyhow!("{} (HTTP {})", error.error, status.as_u16()),
                Err(_) => anyhow!("Request failed with HTTP {}", status.as_u16()),
            });
        }

        serde_json::from_slice::<ProcessResponse>(&body)
            .map(|response| response.svg)
            .map_err(|_| anyhow!("The server sent an unexpected response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::core::provider::{CompletionRequest, ModelProvider};
    use crate::server::router;
    use crate::server::types::AppState;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use std::sync::Arc;

    struct EchoModel;

    #[async_trait]
    impl ModelProvider for EchoModel {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            _api_key: &str,
            request: CompletionRequest<'_>,
        ) -> Result<String, Error> {
            match request.mime_type {
                "image/gif" => Ok("I only draw still images".to_string()),
                _ => Ok(format!("<svg><desc>{}</desc></svg>", request.image_data)),
            }
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn payload(mime_type: &str) -> ProcessPayload {
        ProcessPayload {
            image_data: "aGk=".to_string(),
            mime_type: mime_type.to_string(),
        }
    }

    #[test]
    fn payload_uses_wire_names() {
        let value = serde_json::to_value(payload("image/png")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "imageData": "aGk=", "mimeType": "image/png" })
        );
    }

    #[tokio::test]
    async fn round_trips_through_relay() {
        let state = Arc::new(AppState {
            config: RelayConfig::default().with_api_key("key"),
            model: Arc::new(EchoModel),
        });
        let base = spawn(router(state)).await;
        let client = HttpRelayClient::new(Client::new(), &base).unwrap();
        assert!(client.endpoint().as_str().ends_with("/api/process"));

        let svg = client.process(&payload("image/png")).await.unwrap();
        assert_eq!(svg, "<svg><desc>aGk=</desc></svg>");

        let err = client.process(&payload("image/gif")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Model did not return a valid SVG (HTTP 500)"
        );
    }

    #[tokio::test]
    async fn non_json_failures_and_bodies_become_messages() {
        let failing = Router::new().route(
            "/api/process",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = HttpRelayClient::new(Client::new(), &spawn(failing).await).unwrap();
        let err = client.process(&payload("image/png")).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with HTTP 502");

        let garbled = Router::new().route("/api/process", post(|| async { "<svg/>" }));
        let client = HttpRelayClient::new(Client::new(), &spawn(garbled).await).unwrap();
        let err = client.process(&payload("image/png")).await.unwrap_err();
        assert_eq!(err.to_string(), "The server sent an unexpected response");
    }

    #[tokio::test]
    async fn unreachable_server_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpRelayClient::new(Client::new(), &format!("http://{}", addr)).unwrap();
        let err = client.process(&payload("image/png")).await.unwrap_err();
        assert!(err.to_string().starts_with("Could not reach the server"));
    }
}
