// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction for the lake client.
//!
//! The client carries the per-request timeout from the configuration and an
//! optional HTTPS proxy (`LAKE_FORWARD_PROXY_HTTPS` or `HTTPS_PROXY`). A proxy
//! that fails to parse is logged and ignored rather than preventing startup.

use crate::config::Config;
use core::time::Duration;
use std::error::Error;
use tracing::error;

/// Creates the HTTP client used for loads.
///
/// Falls back to a direct connection if the proxy configuration is invalid,
/// and to reqwest defaults if even that fails.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    match build_client(config, true) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client(config, false) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &Config, allow_proxy: bool) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            let proxy = reqwest::Proxy::https(https_uri.clone())?;
            client = client.proxy(proxy);
        }
    }

    Ok(client.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_default_config() {
        let config = Config::default();
        assert!(build_client(&config, true).is_ok());
    }

    #[test]
    fn test_build_client_with_proxy() {
        let config = Config {
            https_proxy: Some("http://proxy.local:3128".to_string()),
            ..Config::default()
        };
        assert!(build_client(&config, true).is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_rejected_but_client_still_built() {
        let config = Config {
            https_proxy: Some("http://bad host:3128".to_string()),
            ..Config::default()
        };
        assert!(build_client(&config, true).is_err());
        // get_client falls back to a direct connection
        let _client = get_client(&config);
    }
}
