use crate::server::rate_limiter::ClientIpExtractor;
use anyhow::{Error, anyhow};
use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};

/// One token every `60 / burst_per_minute` seconds, up to `burst_per_minute` at once.
pub fn get_governor_conf(
    burst_per_minute: u32,
    trusted_proxy_hops: usize,
) -> Result<GovernorConfig<ClientIpExtractor, NoOpMiddleware>, Error> {
    let burst = burst_per_minute.max(1);
    let replenish_ms = (60_000 / u64::from(burst)).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(burst)
        .key_extractor(ClientIpExtractor::new(trusted_proxy_hops))
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit configuration: burst {}", burst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_for_any_positive_burst() {
        assert!(get_governor_conf(1, 0).is_ok());
        assert!(get_governor_conf(30, 1).is_ok());
        assert!(get_governor_conf(100_000, 0).is_ok());
    }
}
