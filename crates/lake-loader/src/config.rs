// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::client::RetryStrategy;
use crate::constants;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub lake_url: Url,
    pub lake_auth_token: Option<String>,
    pub branch: String,
    pub commit_author: String,
    pub batch_size: usize,
    /// flush a non-empty batch after this long without input
    pub idle_flush_timeout: Duration,
    /// timeout for each load request
    pub request_timeout: Duration,
    pub retry_strategy: RetryStrategy,
    /// echo every forwarded line to stdout
    pub echo: bool,
    pub https_proxy: Option<String>,
}

impl Default for Config {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Config {
            lake_url: Url::parse(constants::DEFAULT_LAKE_URL).expect("default lake URL is valid"),
            lake_auth_token: None,
            branch: constants::DEFAULT_BRANCH.to_string(),
            commit_author: constants::DEFAULT_COMMIT_AUTHOR.to_string(),
            batch_size: constants::MAX_BATCH_LINES,
            idle_flush_timeout: constants::IDLE_FLUSH_TIMEOUT,
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
            retry_strategy: RetryStrategy::LinearBackoff(
                constants::DEFAULT_RETRY_ATTEMPTS,
                constants::DEFAULT_RETRY_BACKOFF_MS,
            ),
            echo: false,
            https_proxy: None,
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn new() -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let lake_url = match non_empty_var("ZED_LAKE") {
            Some(raw) => {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("{raw}: {e}")))?
            }
            None => defaults.lake_url,
        };
        if lake_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(lake_url.to_string()));
        }

        let batch_size: usize =
            parse_var("LAKE_FORWARD_BATCH_SIZE")?.unwrap_or(defaults.batch_size);
        if batch_size == 0 {
            return Err(invalid("LAKE_FORWARD_BATCH_SIZE", "0", "must be at least 1"));
        }

        let idle_flush_timeout = match parse_var::<u64>("LAKE_FORWARD_IDLE_FLUSH_MS")? {
            Some(0) => {
                return Err(invalid("LAKE_FORWARD_IDLE_FLUSH_MS", "0", "must be at least 1"));
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.idle_flush_timeout,
        };
        let request_timeout = parse_var::<u64>("LAKE_FORWARD_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let attempts: u64 =
            parse_var("LAKE_FORWARD_RETRY_ATTEMPTS")?.unwrap_or(constants::DEFAULT_RETRY_ATTEMPTS);
        if attempts == 0 {
            return Err(invalid("LAKE_FORWARD_RETRY_ATTEMPTS", "0", "must be at least 1"));
        }
        let backoff_ms: u64 = parse_var("LAKE_FORWARD_RETRY_BACKOFF_MS")?
            .unwrap_or(constants::DEFAULT_RETRY_BACKOFF_MS);
        let retry_strategy = if backoff_ms == 0 {
            RetryStrategy::Immediate(attempts)
        } else {
            RetryStrategy::LinearBackoff(attempts, backoff_ms)
        };

        let echo = env::var("LAKE_FORWARD_ECHO")
            .map(|val| matches!(val.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(defaults.echo);

        Ok(Config {
            lake_url,
            lake_auth_token: non_empty_var("ZED_LAKE_TOKEN"),
            branch: non_empty_var("LAKE_FORWARD_BRANCH").unwrap_or(defaults.branch),
            commit_author: non_empty_var("LAKE_FORWARD_COMMIT_AUTHOR")
                .unwrap_or(defaults.commit_author),
            batch_size,
            idle_flush_timeout,
            request_timeout,
            retry_strategy,
            echo,
            https_proxy: non_empty_var("LAKE_FORWARD_PROXY_HTTPS")
                .or_else(|| non_empty_var("HTTPS_PROXY")),
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|val| !val.trim().is_empty())
}

fn parse_var<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(var, &raw, &e.to_string())),
        None => Ok(None),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use std::env;
    use std::time::Duration;

    use crate::client::RetryStrategy;
    use crate::config::Config;
    use crate::constants;
    use crate::error::ConfigError;

    const VARS: [&str; 12] = [
        "ZED_LAKE",
        "ZED_LAKE_TOKEN",
        "LAKE_FORWARD_BRANCH",
        "LAKE_FORWARD_COMMIT_AUTHOR",
        "LAKE_FORWARD_BATCH_SIZE",
        "LAKE_FORWARD_IDLE_FLUSH_MS",
        "LAKE_FORWARD_REQUEST_TIMEOUT_SECS",
        "LAKE_FORWARD_RETRY_ATTEMPTS",
        "LAKE_FORWARD_RETRY_BACKOFF_MS",
        "LAKE_FORWARD_ECHO",
        "LAKE_FORWARD_PROXY_HTTPS",
        "HTTPS_PROXY",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::new().expect("failed to create config");
        assert_eq!(config.lake_url.as_str(), "http://127.0.0.1:9867/");
        assert_eq!(config.branch, "main");
        assert_eq!(config.batch_size, constants::MAX_BATCH_LINES);
        assert_eq!(config.idle_flush_timeout, Duration::from_secs(1));
        assert_eq!(config.retry_strategy, RetryStrategy::LinearBackoff(3, 100));
        assert!(!config.echo);
        assert!(config.lake_auth_token.is_none());
        assert!(config.https_proxy.is_none());
    }

    #[test]
    #[serial]
    fn test_reads_overrides_from_env() {
        clear_env();
        env::set_var("ZED_LAKE", "http://lake.internal:9999");
        env::set_var("ZED_LAKE_TOKEN", "secret");
        env::set_var("LAKE_FORWARD_BRANCH", "staging");
        env::set_var("LAKE_FORWARD_BATCH_SIZE", "25");
        env::set_var("LAKE_FORWARD_IDLE_FLUSH_MS", "250");
        env::set_var("LAKE_FORWARD_RETRY_BACKOFF_MS", "0");
        env::set_var("LAKE_FORWARD_RETRY_ATTEMPTS", "5");
        env::set_var("LAKE_FORWARD_ECHO", "TRUE");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");

        let config = Config::new().expect("failed to create config");
        assert_eq!(config.lake_url.as_str(), "http://lake.internal:9999/");
        assert_eq!(config.lake_auth_token.as_deref(), Some("secret"));
        assert_eq!(config.branch, "staging");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.idle_flush_timeout, Duration::from_millis(250));
        assert_eq!(config.retry_strategy, RetryStrategy::Immediate(5));
        assert!(config.echo);
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_dedicated_proxy_wins_over_https_proxy() {
        clear_env();
        env::set_var("HTTPS_PROXY", "http://generic:3128");
        env::set_var("LAKE_FORWARD_PROXY_HTTPS", "http://dedicated:3128");
        let config = Config::new().expect("failed to create config");
        assert_eq!(config.https_proxy.as_deref(), Some("http://dedicated:3128"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_on_zero_batch_size() {
        clear_env();
        env::set_var("LAKE_FORWARD_BATCH_SIZE", "0");
        let result = Config::new();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "LAKE_FORWARD_BATCH_SIZE",
                ..
            })
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_on_zero_idle_flush_timeout() {
        clear_env();
        env::set_var("LAKE_FORWARD_IDLE_FLUSH_MS", "0");
        let result = Config::new();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "LAKE_FORWARD_IDLE_FLUSH_MS",
                ..
            })
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_on_unparseable_number() {
        clear_env();
        env::set_var("LAKE_FORWARD_IDLE_FLUSH_MS", "soon");
        let error = Config::new().expect_err("should reject non-numeric timeout");
        assert!(error.to_string().contains("LAKE_FORWARD_IDLE_FLUSH_MS"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_on_invalid_lake_url() {
        clear_env();
        env::set_var("ZED_LAKE", "not a url");
        assert!(matches!(Config::new(), Err(ConfigError::InvalidUrl(_))));
        clear_env();
    }
}
