// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, path::PathBuf, process::ExitCode};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use lake_loader::{
    client::LakeClient, config::Config, constants::POOL, forwarder::Forwarder, input::Input,
    logger::Formatter,
};

/// Forward lines from standard input or files into a lake pool.
#[derive(Debug, Parser)]
#[command(name = "lake-forward", version)]
struct Args {
    /// Echo every forwarded line to stdout
    #[arg(long)]
    echo: bool,

    /// Files to read in order; `-` or no files reads stdin
    files: Vec<PathBuf>,
}

/// Exit status after a second interrupt abandons the drain.
const INTERRUPTED: i32 = 130;

pub fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = env::var("LAKE_FORWARD_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .event_format(Formatter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    debug!("Logging subsystem enabled");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Error starting runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(forward(args));

    // a stdin read parked on the blocking pool cannot be interrupted, so
    // shutdown must not wait for it
    runtime.shutdown_background();
    code
}

async fn forward(args: Args) -> ExitCode {
    let mut config = match Config::new() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.echo |= args.echo;

    let client = match LakeClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Error creating lake client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupted, flushing buffered lines");
        interrupt.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, exiting without flushing");
            std::process::exit(INTERRUPTED);
        }
    });

    info!("Forwarding lines to pool {POOL} at {}", config.lake_url);

    let mut input = Input::from_paths(&args.files);
    let mut forwarder = Forwarder::from_config(client, &config);
    match forwarder.run(&mut input, cancel).await {
        Ok(stats) => {
            info!(
                "Forwarded {} lines in {} batches, skipped {} blank lines",
                stats.lines, stats.batches, stats.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Forwarding stopped: {e}");
            ExitCode::FAILURE
        }
    }
}
