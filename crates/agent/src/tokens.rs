// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token counting for the context-window rules (spec §4.4). A real
//! tokenizer is deliberately not wired in here — see the Open Question
//! decision in `DESIGN.md`: counting is a `chars/4` approximation behind a
//! trait, so a real tokenizer can replace [`ApproximateTokenCounter`]
//! without touching the engine's call sites.

use acp_core::Message;

/// Counts tokens for a system prompt string or a message transcript.
pub trait TokenCounter: Send + Sync {
    fn count_str(&self, text: &str) -> usize;

    fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count_message(m)).sum()
    }

    fn count_message(&self, message: &Message) -> usize {
        self.count_str(&message_text(message))
    }
}

/// `chars/4` approximation, the same order-of-magnitude heuristic widely
/// used as a placeholder ahead of wiring in a provider-specific tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateTokenCounter;

impl TokenCounter for ApproximateTokenCounter {
    fn count_str(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

/// Flatten a message to the text a token counter should measure. Not a
/// wire format — just enough surface area to approximate size.
fn message_text(message: &Message) -> String {
    match &message.kind {
        acp_core::MessageKind::Human { content } => content.clone(),
        acp_core::MessageKind::Template { content } => content.clone(),
        acp_core::MessageKind::Supervisor { content } => content.clone(),
        acp_core::MessageKind::Agent(body) => serde_json::to_string(body).unwrap_or_default(),
        acp_core::MessageKind::InvocationResult(body) => {
            serde_json::to_string(body).unwrap_or_default()
        }
        acp_core::MessageKind::AgentInvalid { raw, validation_error } => {
            format!("{raw}{validation_error}")
        }
    }
}
