// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] acp_store::StoreError),
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("job {0} is not running or caller does not hold its lease")]
    NotLeaseholder(String),
}
