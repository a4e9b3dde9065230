// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (spec §7), independent of transport.
//!
//! Every fallible operation in the control plane ultimately maps to one of
//! these kinds. The HTTP layer (`acp-api`) maps each to a status code; the
//! taxonomy itself stays transport-agnostic so the queue, registry, agent,
//! and workflow crates can classify errors without depending on `acp-api`.

use serde::{Deserialize, Serialize};

/// Coarse error classification shared across the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, bad schema, name/id regex violation. Never mutates state.
    Validation,
    /// Missing/invalid bearer, wrong cluster, lease loss.
    Authorization,
    /// Unknown cluster/run/job/execution.
    NotFound,
    /// Idempotency collision, lease loss on result submission, unapproved execution.
    Conflict,
    /// Cycle detected, invalid structured result, provider failure after retry.
    AgentFatal,
    /// DB contention, notifier miss, webhook 5xx — retried by the caller.
    Transient,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        Authorization => "authorization",
        NotFound => "not_found",
        Conflict => "conflict",
        AgentFatal => "agent_fatal",
        Transient => "transient",
    }
}
