// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message: one entry in a run's transcript (spec §3, §4.4).
//!
//! Messages form the graph the agent state machine walks: `human` and
//! `invocation_result` messages are edges into `MODEL`; `agent` messages
//! with invocations are edges into `TOOL`.

use crate::run::RunId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_string_id! {
    /// Lexicographically orderable by creation time: callers should mint
    /// these as `{millis_since_epoch:013}-{random suffix}` so a plain string
    /// sort reconstructs transcript order without a secondary index.
    pub struct MessageId;
}

impl MessageId {
    pub fn generate(now_ms: u64, id_gen: &impl crate::id::IdGen) -> Self {
        Self(format!("{now_ms:013}-{}", crate::id::short(&id_gen.next(), 8)))
    }
}

crate::define_string_id! {
    pub struct InvocationId;
}

/// A single tool call emitted by the model within one `agent` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub id: InvocationId,
    pub tool_name: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Body of an `agent` message: the model's structured response for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessageBody {
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    /// Unknown fields a newer SDK/model schema produced, preserved so a
    /// round-trip through storage never silently drops data (spec §9).
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, Value>,
}

/// Body of an `invocation_result` message: the outcome of one tool call
/// reported back into the transcript that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResultBody {
    pub invocation_id: InvocationId,
    pub tool_name: String,
    pub result_type: crate::job::ResultType,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageKind {
    /// A human- or caller-submitted message; always re-enters `MODEL`.
    Human { content: String },
    /// The model's own structured response for a turn.
    Agent(AgentMessageBody),
    /// The result of a tool invocation the agent requested.
    InvocationResult(InvocationResultBody),
    /// A system-injected template message (e.g. context-window trim notice,
    /// cycle-guard warning) that is never itself shown to the model as a
    /// human turn but does count toward the transcript.
    Template { content: String },
    /// Operator-injected guidance that re-enters `MODEL` like a human
    /// message but is tagged distinctly for UI rendering.
    Supervisor { content: String },
    /// A malformed model response that failed schema validation; recorded
    /// so the transcript explains why the agent re-prompted itself.
    AgentInvalid { raw: Value, validation_error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub run_id: RunId,
    pub created_at_ms: u64,
    #[serde(flatten)]
    pub kind: MessageKind,
}

impl Message {
    pub fn new(id: MessageId, run_id: RunId, now_ms: u64, kind: MessageKind) -> Self {
        Self { id, run_id, created_at_ms: now_ms, kind }
    }

    /// True for message kinds that hand control back to `MODEL` (spec §4.4
    /// edge list: human, invocation_result, supervisor).
    pub fn drives_model_turn(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::Human { .. }
                | MessageKind::InvocationResult(_)
                | MessageKind::Supervisor { .. }
        )
    }

    /// True if this is a human-originated message, for the cycle-guard rule
    /// (spec §4.4: "last 10 messages contain no human or invocation-result
    /// message").
    pub fn is_human_or_invocation_result(&self) -> bool {
        matches!(self.kind, MessageKind::Human { .. } | MessageKind::InvocationResult(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_sorts_lexicographically_by_time() {
        let gen = crate::id::UuidIdGen;
        let a = MessageId::generate(1_000, &gen);
        let b = MessageId::generate(2_000, &gen);
        assert!(a.as_str() < b.as_str());
    }

    #[test]
    fn human_and_invocation_result_drive_model_turn() {
        let run_id = RunId::new("run_1");
        let human = Message::new(
            MessageId::new("m1"),
            run_id.clone(),
            0,
            MessageKind::Human { content: "hi".into() },
        );
        assert!(human.drives_model_turn());
        assert!(human.is_human_or_invocation_result());

        let agent = Message::new(
            MessageId::new("m2"),
            run_id,
            0,
            MessageKind::Agent(AgentMessageBody {
                done: false,
                message: None,
                invocations: vec![],
                result: None,
                issue: None,
                extra: Default::default(),
            }),
        );
        assert!(!agent.drives_model_turn());
        assert!(!agent.is_human_or_invocation_result());
    }
}
