// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use acp_daemon::{config, lifecycle, logging, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _guard = logging::init(&config::log_filter(), config.log_dir.as_deref());

    if let Err(err) = lifecycle::run(config).await {
        tracing::error!(%err, "acp-daemon exited with an error");
        return Err(err.into());
    }
    Ok(())
}
