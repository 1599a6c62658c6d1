// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The forwarding loop.
//!
//! ```text
//!   Input ──line──> skip blank ──> echo? ──> Batch ──full/idle──> Loader::load(POOL)
//! ```
//!
//! A batch is flushed as soon as it is full, or when no line has arrived within
//! the idle timeout. Whatever is left is flushed when the input ends or the
//! cancellation token fires. Loads are awaited inline, so batches reach the
//! lake in input order.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batch::Batch;
use crate::client::Loader;
use crate::config::Config;
use crate::constants;
use crate::error::{ForwardError, LoadError};
use crate::input::Input;

type EchoWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    /// lines accepted into batches
    pub lines: usize,
    /// successful loads
    pub batches: usize,
    /// blank lines dropped
    pub skipped: usize,
}

pub struct Forwarder<L> {
    loader: L,
    batch: Batch,
    idle_flush_timeout: Duration,
    echo: Option<EchoWriter>,
    stats: ForwardStats,
}

impl<L: Loader> Forwarder<L> {
    pub fn new(loader: L, batch_size: usize, idle_flush_timeout: Duration) -> Self {
        Forwarder {
            loader,
            batch: Batch::new(batch_size),
            idle_flush_timeout,
            echo: None,
            stats: ForwardStats::default(),
        }
    }

    /// Builds a forwarder from the configuration, echoing to stdout when enabled.
    pub fn from_config(loader: L, config: &Config) -> Self {
        let forwarder = Forwarder::new(loader, config.batch_size, config.idle_flush_timeout);
        if config.echo {
            forwarder.with_echo(tokio::io::stdout())
        } else {
            forwarder
        }
    }

    /// Writes every forwarded line, followed by `\n`, to `writer`.
    #[must_use]
    pub fn with_echo<W>(mut self, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.echo = Some(Box::new(writer));
        self
    }

    #[must_use]
    pub fn stats(&self) -> ForwardStats {
        self.stats
    }

    /// Forwards `input` until it is exhausted or `cancel` fires, then flushes
    /// what remains.
    pub async fn run(
        &mut self,
        input: &mut Input,
        cancel: CancellationToken,
    ) -> Result<ForwardStats, ForwardError> {
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Forwarding cancelled, draining {} buffered lines", self.batch.len());
                    break;
                }
                next = timeout(self.idle_flush_timeout, input.next_line()) => next,
            };

            match next {
                Ok(Ok(Some(line))) => self.accept(line).await?,
                Ok(Ok(None)) => {
                    debug!("End of input");
                    break;
                }
                Ok(Err(e)) => {
                    self.flush().await?;
                    return Err(ForwardError::Input(e));
                }
                Err(_elapsed) => {
                    self.flush().await?;
                    self.flush_echo().await.map_err(ForwardError::Echo)?;
                }
            }
        }

        self.flush().await?;
        self.flush_echo().await.map_err(ForwardError::Echo)?;
        Ok(self.stats)
    }

    async fn accept(&mut self, line: String) -> Result<(), ForwardError> {
        if line.trim().is_empty() {
            self.stats.skipped += 1;
            return Ok(());
        }

        let echoed = self.echo_line(&line).await;

        self.stats.lines += 1;
        let full = self.batch.push(line);
        if let Err(e) = echoed {
            // the line was read, so it is still loaded
            self.flush().await?;
            return Err(ForwardError::Echo(e));
        }
        if full {
            self.flush().await?;
        }
        Ok(())
    }

    async fn echo_line(&mut self, line: &str) -> std::io::Result<()> {
        match self.echo.as_mut() {
            Some(echo) => {
                echo.write_all(line.as_bytes()).await?;
                echo.write_all(b"\n").await
            }
            None => Ok(()),
        }
    }

    /// Loads the buffered lines into the pool, if there are any.
    pub async fn flush(&mut self) -> Result<(), LoadError> {
        let count = self.batch.len();
        let Some(data) = self.batch.take() else {
            return Ok(());
        };

        self.loader.load(constants::POOL, data).await?;
        self.stats.batches += 1;
        info!("Loaded {count} lines into pool {}", constants::POOL);
        Ok(())
    }

    async fn flush_echo(&mut self) -> std::io::Result<()> {
        match self.echo.as_mut() {
            Some(echo) => echo.flush().await,
            None => Ok(()),
        }
    }
}
