use reqwest::Client;
use std::time::Duration;

use crate::config::SynthConfig;
use crate::errors::ConfigError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Build the shared HTTP client used by every provider adapter and token
/// exchange.
///
/// `proxy`, when set, routes all outbound traffic (HTTP and HTTPS) through the
/// given URL.
pub fn create_http_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(16)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .user_agent(concat!("voxcache/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|_| ConfigError::invalid_value("http proxy", proxy))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))
}

/// Client configured from the loaded settings.
pub fn client_from_config(config: &SynthConfig) -> Result<Client, ConfigError> {
    create_http_client(
        Duration::from_secs(config.http_timeout_secs),
        config.http_proxy.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_without_proxy() {
        assert!(create_http_client(Duration::from_secs(5), None).is_ok());
    }

    #[test]
    fn test_client_with_proxy() {
        assert!(create_http_client(Duration::from_secs(5), Some("http://127.0.0.1:3128")).is_ok());
    }

    #[test]
    fn test_client_from_config() {
        let config = SynthConfig {
            http_timeout_secs: 3,
            ..Default::default()
        };
        assert!(client_from_config(&config).is_ok());
    }
}
