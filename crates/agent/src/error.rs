// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Agent-fatal failures (spec §4.4, §7 `ErrorKind::AgentFatal`). Every
/// variant here transitions the owning run to `failed` with
/// `failure_reason` set to its `Display` text.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("cycle detected: model made no progress")]
    Cycle,
    #[error("run not found: {0}")]
    RunNotFound(String),
    #[error("system prompt can not exceed {limit} tokens (got {actual})")]
    SystemPromptTooLarge { limit: usize, actual: usize },
    #[error("model provider call failed after retry: {0}")]
    ProviderFailure(String),
    #[error(transparent)]
    Store(#[from] acp_store::StoreError),
    #[error(transparent)]
    Queue(#[from] acp_queue::QueueError),
}

impl AgentError {
    pub fn kind(&self) -> acp_core::ErrorKind {
        acp_core::ErrorKind::AgentFatal
    }
}
