// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Model` capability: one structured-call method injected into the
//! engine at construction time, matching the teacher's adapter-trait style
//! (`AgentAdapter` in `crates/daemon/src/adapters/agent/mod.rs`).

use acp_core::{Message, SchemaIr};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider call failed: {0}")]
    Provider(String),
    #[error("provider returned a response that could not be parsed as JSON: {0}")]
    Malformed(String),
}

/// One raw tool-use block the underlying model SDK emitted through its
/// native tool-calling mechanism rather than inside the structured
/// `invocations[]` field (spec §4.4 step 6: "merge ... into
/// `data.invocations[]`").
#[derive(Debug, Clone)]
pub struct RawToolCall {
    pub tool_name: String,
    pub input: Value,
}

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub system: String,
    pub schema: SchemaIr,
}

#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// The structured object, already validated shape-wise against
    /// `ModelRequest::schema` by the provider adapter where possible; the
    /// engine re-validates regardless (spec §4.4 step 5).
    pub data: Value,
    /// Tool-use blocks the provider emitted through its native mechanism,
    /// outside `data.invocations`.
    pub raw_tool_calls: Vec<RawToolCall>,
}

/// A model capable of producing one structured response per call. Injected
/// into [`crate::engine::Engine`] at construction so the engine itself has
/// no knowledge of any particular provider's wire format (spec §9 Design
/// Notes: "LLM provider wire formats" is a non-goal).
#[async_trait]
pub trait Model: Send + Sync {
    async fn structured(&self, req: ModelRequest) -> Result<ModelResponse, ModelError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted [`Model`] double: each call pops the next queued response
    /// (or error) in order. Panics if called more times than scripted,
    /// mirroring the teacher's `test_support` fakes elsewhere in the pack.
    pub struct FakeModel {
        responses: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    }

    impl FakeModel {
        pub fn new(responses: Vec<Result<ModelResponse, ModelError>>) -> Self {
            Self { responses: Mutex::new(responses.into()) }
        }
    }

    #[async_trait]
    impl Model for FakeModel {
        async fn structured(&self, _req: ModelRequest) -> Result<ModelResponse, ModelError> {
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("FakeModel called more times than scripted"))
        }
    }
}
