// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the lake service's load endpoint.
//!
//! A load appends a blob of text to a branch of a pool:
//!
//! ```text
//! POST {lake}/pool/{pool}/branch/{branch}
//! Zed-Commit: {"author":"...","body":"","meta":""}
//!
//! line 1
//! line 2
//! ```
//!
//! No content type is sent, so the service detects the input format itself.
//! Non-2xx responses carry a JSON body whose `error` field describes the
//! failure.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{ConfigError, LoadError};
use crate::http::get_client;

const COMMIT_HEADER: &str = "zed-commit";

/// How many times a load is attempted, and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Number of attempts, no delay
    Immediate(u64),
    /// Number of attempts, delay step in milliseconds (grows with each attempt)
    LinearBackoff(u64, u64),
}

impl RetryStrategy {
    #[must_use]
    pub fn attempts(&self) -> u64 {
        match self {
            RetryStrategy::Immediate(attempts) | RetryStrategy::LinearBackoff(attempts, _) => {
                (*attempts).max(1)
            }
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u64) -> Duration {
        match self {
            RetryStrategy::Immediate(_) => Duration::ZERO,
            RetryStrategy::LinearBackoff(_, step_ms) => {
                Duration::from_millis(step_ms.saturating_mul(attempt))
            }
        }
    }
}

/// Appends a batch of text to a named pool.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, pool: &str, data: String) -> Result<(), LoadError>;
}

#[derive(Serialize)]
struct CommitMessage<'a> {
    author: &'a str,
    body: &'a str,
    meta: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct LakeClient {
    client: reqwest::Client,
    base_url: Url,
    branch: String,
    headers: HeaderMap,
    retry_strategy: RetryStrategy,
}

impl LakeClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(LakeClient {
            client: get_client(config),
            base_url: config.lake_url.clone(),
            branch: config.branch.clone(),
            headers: build_headers(config)?,
            retry_strategy: config.retry_strategy.clone(),
        })
    }

    /// URL of the load endpoint for `pool` on the configured branch.
    pub fn load_url(&self, pool: &str) -> Result<Url, LoadError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| LoadError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["pool", pool, "branch", self.branch.as_str()]);
        Ok(url)
    }

    async fn send(&self, url: Url, body: Bytes) -> Result<(), LoadError> {
        let resp = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(LoadError::Status {
            status,
            message: error_message(&text, status),
        })
    }
}

#[async_trait]
impl Loader for LakeClient {
    async fn load(&self, pool: &str, data: String) -> Result<(), LoadError> {
        let url = self.load_url(pool)?;
        let body = Bytes::from(data);
        let attempts = self.retry_strategy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let time = Instant::now();
            match self.send(url.clone(), body.clone()).await {
                Ok(()) => {
                    debug!(
                        "Loaded {} bytes into pool {pool} in {} ms",
                        body.len(),
                        time.elapsed().as_millis()
                    );
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!("Load into pool {pool} failed (attempt {attempt}/{attempts}): {e}");
                    let delay = self.retry_strategy.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    error!("Load into pool {pool} failed after {attempt} attempts: {e}");
                    return Err(e);
                }
            }
        }
    }
}

fn build_headers(config: &Config) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let commit = CommitMessage {
        author: &config.commit_author,
        body: "",
        meta: "",
    };
    let commit = serde_json::to_vec(&commit).map_err(|e| ConfigError::Invalid {
        var: "LAKE_FORWARD_COMMIT_AUTHOR",
        value: config.commit_author.clone(),
        reason: e.to_string(),
    })?;
    let commit = HeaderValue::from_bytes(&commit).map_err(|e| ConfigError::Invalid {
        var: "LAKE_FORWARD_COMMIT_AUTHOR",
        value: config.commit_author.clone(),
        reason: e.to_string(),
    })?;
    headers.insert(COMMIT_HEADER, commit);

    if let Some(token) = &config.lake_auth_token {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| ConfigError::Invalid {
                var: "ZED_LAKE_TOKEN",
                value: "<redacted>".to_string(),
                reason: e.to_string(),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(resp) = serde_json::from_str::<ErrorResponse>(body) {
        return resp.error;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
