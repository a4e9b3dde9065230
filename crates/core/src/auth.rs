// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque auth context propagated from a run/job creator through to the
//! worker that executes the tool invocation.
//!
//! The control plane never interprets this payload; it is resolved by the
//! API layer from the bearer/custom-auth header and threaded through
//! unchanged so a tool implementation can make its own authorization
//! decisions (e.g. "this invocation is on behalf of user X").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller identity/context attached to a run or job at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthContext(pub Value);

impl AuthContext {
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for AuthContext {
    fn from(v: Value) -> Self {
        Self(v)
    }
}
