// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven daemon configuration, matching the teacher's
//! `oj-daemon::env` centralized-env-access shape: every variable the
//! daemon reads is named and defaulted in one place.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("INFERABLE_API_SECRET must be set")]
    MissingApiSecret,
    #[error("invalid INFERABLE_BIND_ADDR {0:?}")]
    InvalidBindAddr(String),
    #[error("could not resolve a state directory: set INFERABLE_STATE_DIR or HOME")]
    NoStateDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub api_secret: String,
    pub api_endpoint: Option<String>,
    pub state_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub reaper_cadence: Duration,
    pub dispatch_cadence: Duration,
    pub drain_timeout: Duration,
    pub model_endpoint: Option<String>,
    pub model_context_window: usize,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment, matching the defaults documented
    /// alongside each `env::var` read below.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_var("INFERABLE_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(env_var("INFERABLE_BIND_ADDR").unwrap_or_default()))?;

        let api_secret = env_var("INFERABLE_API_SECRET").ok_or(ConfigError::MissingApiSecret)?;
        let api_endpoint = env_var("INFERABLE_API_ENDPOINT");

        let state_dir = match env_var("INFERABLE_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::home_dir)
                .map(|d| d.join("acp"))
                .ok_or(ConfigError::NoStateDir)?,
        };

        let allowed_origins = env_var("INFERABLE_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let reaper_cadence = env_duration_ms("INFERABLE_REAPER_CADENCE_MS", 5_000);
        let dispatch_cadence = env_duration_ms("INFERABLE_DISPATCH_CADENCE_MS", 2_000);
        let drain_timeout = env_duration_ms("INFERABLE_DRAIN_TIMEOUT_MS", 5_000);

        let model_endpoint = env_var("INFERABLE_MODEL_ENDPOINT");
        let model_context_window = env_var("INFERABLE_MODEL_CONTEXT_WINDOW")
            .and_then(|s| s.parse().ok())
            .unwrap_or(200_000);

        let log_dir = env_var("INFERABLE_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            bind_addr,
            api_secret,
            api_endpoint,
            state_dir,
            allowed_origins,
            reaper_cadence,
            dispatch_cadence,
            drain_timeout,
            model_endpoint,
            model_context_window,
            log_dir,
        })
    }
}

/// Log filter directive (`INFERABLE_LOG` then `RUST_LOG`, default `"info"`),
/// read separately since it's consumed before `tracing` (and thus before
/// most of `Config`) is wired up.
pub fn log_filter() -> String {
    env_var("INFERABLE_LOG").or_else(|| env_var("RUST_LOG")).unwrap_or_else(|| "info".to_string())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_var(name).and_then(|s| s.parse().ok()).unwrap_or(default_ms))
}
