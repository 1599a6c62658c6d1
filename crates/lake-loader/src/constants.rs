// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Destination pool for every load. Not configurable.
pub const POOL: &str = "bpf";

/// A batch is flushed as soon as it holds this many lines.
pub const MAX_BATCH_LINES: usize = 500;

/// A non-empty batch is flushed when no line arrives within this long.
pub const IDLE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Default listen address of the lake service.
pub const DEFAULT_LAKE_URL: &str = "http://127.0.0.1:9867";

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_AUTHOR: &str = "lake-forward";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_ATTEMPTS: u64 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
