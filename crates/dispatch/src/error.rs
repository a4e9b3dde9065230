// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook delivery to {url} failed after {attempts} attempts: {source}")]
    WebhookExhausted { url: String, attempts: usize, #[source] source: reqwest::Error },
    #[error("workflow execution not found for dispatch: {0}")]
    WorkflowExecutionNotFound(String),
    #[error(transparent)]
    Store(#[from] acp_store::StoreError),
    #[error(transparent)]
    Queue(#[from] acp_queue::QueueError),
    #[error(transparent)]
    Workflow(#[from] acp_workflow::WorkflowError),
}
