use anyhow::{Context, Error};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct Booter {
    pub port: u16,
    tcp_listener: TcpListener,
}

impl Booter {
    pub async fn new(port: u16) -> Result<Self, Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Self {
            port,
            tcp_listener: listener,
        })
    }

    // connect info feeds the rate limiter's peer-address fallback
    pub async fn start(self, router: Router) -> Result<(), Error> {
        axum::serve(
            self.tcp_listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("Server stopped unexpectedly")
    }
}
