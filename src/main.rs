use anyhow::{Error, anyhow, bail};
use clap::Parser;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::booter::Booter;
use crate::cli::{Cli, Command};
use crate::config::RelayConfig;
use crate::core::gemini::GeminiClient;
use crate::server::types::AppState;
use crate::widget::client::HttpRelayClient;
use crate::widget::file::ImageFile;
use crate::widget::preview::InMemoryPreviewStore;
use crate::widget::state::UploadWidget;

pub mod booter;
pub mod cli;
pub mod config;
pub mod core;
pub mod governor_conf;
pub mod server;
pub mod utils;
pub mod widget;

/// Shared state around a Gemini client built from `config`.
fn init_app_state(config: RelayConfig) -> AppState {
    let http_client = Client::new();
    let model = GeminiClient::new(http_client, config.api_base.clone(), config.model.clone());

    AppState {
        config,
        model: Arc::new(model),
    }
}

async fn serve() -> Result<(), Error> {
    let config = RelayConfig::from_env();
    for missing in config.missing_required() {
        error!("{} is not set; process requests will fail until it is", missing);
    }
    let port = config.port;
    let rate_limit_burst = config.rate_limit_burst;
    let trusted_proxy_hops = config.trusted_proxy_hops;

    let state = Arc::new(init_app_state(config));
    let mut router = server::router(state);

    if let Some(burst) = rate_limit_burst {
        router = server::with_rate_limit(router, burst, trusted_proxy_hops)?;
        info!(
            "Rate limiting to {} requests per minute per client ({} trusted proxy hops)",
            burst, trusted_proxy_hops
        );
    }

    let booter = Booter::new(port).await?;
    info!("Listening on 0.0.0.0:{}", booter.port);
    booter.start(router).await
}

async fn convert(image: &Path, server_url: &str, output: Option<&Path>) -> Result<(), Error> {
    let file = ImageFile::from_path(image).await?;
    let content_type = file.content_type.clone();

    let mut widget = UploadWidget::new(InMemoryPreviewStore::new());
    if !widget.accept_file(file) {
        bail!("{} is not an image ({})", image.display(), content_type);
    }

    let client = HttpRelayClient::new(Client::new(), server_url)?;
    info!("Converting {} via {}", image.display(), client.endpoint());
    widget.process(&client).await;

    let view = widget.render();
    if let Some(message) = view.error {
        bail!(message);
    }
    let svg = view
        .svg
        .ok_or_else(|| anyhow!("The server returned no SVG"))?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &svg).await?;
            info!("Wrote {} bytes to {}", svg.len(), path.display());
        }
        None => println!("{}", svg),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // stdout is reserved for `convert` output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Convert {
            image,
            server,
            output,
        } => convert(&image, &server, output.as_deref()).await,
    }
}
