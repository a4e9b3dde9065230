// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message transcript handler. Messages are append-only and already sort
//! lexicographically by [`acp_core::MessageId`], so insertion keeps the
//! per-run vector in order as long as ids are minted monotonically.

use super::MaterializedState;
use crate::op::Op;

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    let Op::MessageAppended(message) = op else { return };
    let transcript = state.messages.entry(message.run_id.clone()).or_default();
    if transcript.iter().any(|m| m.id == message.id) {
        return;
    }
    transcript.push((**message).clone());
}
