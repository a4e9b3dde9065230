// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] acp_store::StoreError),
    #[error("tool name {0:?} is invalid: must be 1-30 alphanumeric characters")]
    InvalidToolName(String),
}
