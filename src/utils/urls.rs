use url::{ParseError, Url};

pub fn to_url(host: &str) -> Result<Url, ParseError> {
    Url::parse(host)
}

/// Joins `path` onto `base` without dropping the base's last path segment.
pub fn join_endpoint(base: &str, path: &str) -> Result<Url, ParseError> {
    let mut base = base.trim_end_matches('/').to_string();
    base.push('/');
    to_url(&base)?.join(path.trim_start_matches('/'))
}

/// Reduces an origin-ish string to `scheme://host[:port]`.
pub fn normalize_origin(raw: &str) -> Option<String> {
    let url = to_url(raw).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
