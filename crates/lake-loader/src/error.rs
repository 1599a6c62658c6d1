// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid lake URL: {0}")]
    InvalidUrl(String),
}

/// Errors returned by a single load into a pool
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Request to lake failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Lake responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Invalid load URL: {0}")]
    InvalidUrl(String),
}

impl LoadError {
    /// Transport failures and 5xx responses may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            LoadError::Request(_) => true,
            LoadError::Status { status, .. } => status.is_server_error(),
            LoadError::InvalidUrl(_) => false,
        }
    }
}

/// Errors that stop the forwarding loop
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("Failed to echo line: {0}")]
    Echo(#[source] std::io::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}
