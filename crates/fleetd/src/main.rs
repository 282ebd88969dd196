// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;

use fleetd::config::Config;
use fleetd::run;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    run::init_tracing(&config);

    let shutdown = CancellationToken::new();
    run::spawn_signal_handler(shutdown.clone());

    if let Err(e) = run::run(config, shutdown).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
