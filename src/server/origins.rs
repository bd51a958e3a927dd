use crate::utils::urls::normalize_origin;
use axum::http::request::Parts as RequestParts;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Normalized `scheme://host[:port]` origins; unparsable entries are skipped.
pub fn allowed_origins(configured: &[String]) -> Vec<String> {
    configured
        .iter()
        .filter_map(|raw| {
            let origin = normalize_origin(raw);
            if origin.is_none() {
                warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {}", raw);
            }
            origin
        })
        .collect()
}

pub fn is_allowed_origin(origin: Option<&str>, allowed: &[String]) -> bool {
    match origin.and_then(normalize_origin) {
        None => false,
        Some(origin) => allowed.contains(&origin),
    }
}

/// Any origin when nothing is configured, the allow-list otherwise.
pub fn cors_layer(configured: &[String]) -> CorsLayer {
    let allowed = allowed_origins(configured);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed.is_empty() {
        return cors.allow_origin(Any);
    }
    cors.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _request_parts: &RequestParts| {
            is_allowed_origin(origin.to_str().ok(), &allowed)
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        let allowed = allowed_origins(&[
            "https://svgify.dev".to_string(),
            "http://localhost:5173/".to_string(),
            "nonsense".to_string(),
        ]);
        assert_eq!(allowed.len(), 2);

        assert!(is_allowed_origin(Some("https://svgify.dev"), &allowed));
        assert!(is_allowed_origin(Some("http://localhost:5173"), &allowed));
        assert!(!is_allowed_origin(Some("http://svgify.dev"), &allowed));
        assert!(!is_allowed_origin(Some("http://localhost:3000"), &allowed));
        assert!(!is_allowed_origin(Some("https://facebook.com"), &allowed));
        assert!(!is_allowed_origin(None, &allowed));
    }
}
