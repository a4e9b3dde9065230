// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob metadata handler. Content bytes themselves live on disk under the
//! store's blob directory, addressed by [`acp_core::BlobId`]; this only
//! tracks the durable record.

use super::MaterializedState;
use crate::op::Op;

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    let Op::BlobRegistered(blob) = op else { return };
    state.blobs.entry(blob.id.clone()).or_insert_with(|| (**blob).clone());
}
