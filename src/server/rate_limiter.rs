use axum::extract::ConnectInfo;
use axum::http::Request;
use std::net::SocketAddr;
use tower_governor::GovernorError;
use tower_governor::key_extractor::KeyExtractor;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Keys requests by client address.
///
/// With no trusted proxies the peer IP is the key and `X-Forwarded-For` is
/// ignored, since clients can write it freely. Behind `n` trusted proxies the
/// key is the hop the outermost of them appended: the `n`th entry from the
/// right.
#[derive(Clone, Debug, Default)]
pub struct ClientIpExtractor {
    pub trusted_proxy_hops: usize,
}

impl ClientIpExtractor {
    pub fn new(trusted_proxy_hops: usize) -> Self {
        Self { trusted_proxy_hops }
    }
}

impl KeyExtractor for ClientIpExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trusted_proxy_hops > 0 {
            let forwarded = req
                .headers()
                .get(FORWARDED_FOR_HEADER)
                .and_then(|h| h.to_str().ok())
                .and_then(|header| trusted_forwarded_hop(header, self.trusted_proxy_hops));
            if let Some(client) = forwarded {
                return Ok(client);
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// The `hops`th address from the right, or `None` when the header is shorter.
pub fn trusted_forwarded_hop(header: &str, hops: usize) -> Option<String> {
    let entries: Vec<&str> = header
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();
    if hops == 0 || entries.len() < hops {
        return None;
    }
    entries.get(entries.len() - hops).map(|hop| hop.to_string())
}
