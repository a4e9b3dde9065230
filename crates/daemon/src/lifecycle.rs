// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup/serve/drain, matching the teacher's
//! `lifecycle::{startup, shutdown}` split but against a TCP+HTTP listener
//! instead of a Unix socket: build the store and engines, spawn the
//! background reaper and dispatcher, serve the API, then cooperatively
//! drain both background tasks on shutdown signal.

use crate::config::Config;
use crate::model::{NullModel, RemoteModel};
use acp_agent::Engine as AgentEngine;
use acp_api::{ApiConfig, ApiState};
use acp_core::UuidIdGen;
use acp_dispatch::{spawn_dispatch_worker, Dispatcher, RetryPolicy};
use acp_queue::{spawn_stall_reaper, Queue};
use acp_store::Store;
use acp_workflow::WorkflowEngine;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to open store at {0:?}: {1}")]
    Store(std::path::PathBuf, acp_store::StoreError),
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Build every engine, spawn the background workers, and serve the API
/// until a shutdown signal arrives. Returns once the listener, the reaper,
/// and the dispatcher have all stopped.
pub async fn run(config: Config) -> Result<(), LifecycleError> {
    let store =
        Store::open(&config.state_dir).map_err(|e| LifecycleError::Store(config.state_dir.clone(), e))?;

    let queue = Arc::new(Queue::new(store.clone()));

    let model: Arc<dyn acp_agent::Model> = match &config.model_endpoint {
        Some(endpoint) => {
            info!(endpoint, "wiring remote model adapter");
            Arc::new(RemoteModel::new(endpoint.clone(), RetryPolicy::default()))
        }
        None => {
            warn!("INFERABLE_MODEL_ENDPOINT unset; multi-step runs will fail fast");
            Arc::new(NullModel)
        }
    };

    let agent_engine =
        Arc::new(AgentEngine::new(store.clone(), queue.clone(), model, config.model_context_window));
    let workflow_engine = Arc::new(WorkflowEngine::new(store.clone(), agent_engine.clone()));

    let id_gen = UuidIdGen;
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), queue.clone(), workflow_engine.clone(), id_gen));

    let cancel = CancellationToken::new();
    let reaper = spawn_stall_reaper(queue.clone(), config.reaper_cadence, cancel.clone());
    let dispatch_worker = spawn_dispatch_worker(dispatcher, config.dispatch_cadence, cancel.clone());

    let allowed_origins = if config.allowed_origins.is_empty() {
        config.api_endpoint.clone().into_iter().collect()
    } else {
        config.allowed_origins.clone()
    };
    let api_config = ApiConfig { api_secret: config.api_secret.clone(), allowed_origins };
    let api_state = ApiState::new(store, queue, agent_engine, workflow_engine, api_config);
    let app = acp_api::router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| LifecycleError::Bind(config.bind_addr, e))?;
    info!(addr = %config.bind_addr, "acp-daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(LifecycleError::Serve)?;

    info!("drain: stopping background workers");
    cancel.cancel();
    let drained = tokio::time::timeout(config.drain_timeout, async {
        let _ = reaper.await;
        let _ = dispatch_worker.await;
    })
    .await;
    if drained.is_err() {
        warn!("background workers did not stop within the drain timeout");
    }
    info!("acp-daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
