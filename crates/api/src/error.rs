// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps every crate's error type to `ErrorKind` (spec §7) and then to an
//! HTTP status code, the way the doc comment on `acp_core::ErrorKind`
//! says the HTTP layer should.

use acp_agent::AgentError;
use acp_core::ErrorKind;
use acp_queue::QueueError;
use acp_registry::RegistryError;
use acp_store::StoreError;
use acp_workflow::WorkflowError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Unauthorized => ErrorKind::Authorization,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::Queue(e) => match e {
                QueueError::JobNotFound(_) => ErrorKind::NotFound,
                QueueError::NotLeaseholder(_) => ErrorKind::Conflict,
                QueueError::Store(_) => ErrorKind::Transient,
            },
            ApiError::Registry(e) => match e {
                RegistryError::InvalidToolName(_) => ErrorKind::Validation,
                RegistryError::Store(_) => ErrorKind::Transient,
            },
            ApiError::Agent(e) => e.kind(),
            // `Pausable`/`Terminable` are internal control-flow signals the
            // engine already resolves into a stored run/execution status;
            // only infra failures reach the API layer as `Err`.
            ApiError::Workflow(_) => ErrorKind::AgentFatal,
            ApiError::Store(_) => ErrorKind::Transient,
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::AgentFatal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({"error": self.kind().to_string(), "message": self.to_string()}));
        (status, body).into_response()
    }
}
