// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context-window enforcement (spec §4.4 "Context-window overflow", §8
//! property 8): bound the system prompt to 0.7·window, then drop the
//! oldest messages until `system + messages <= 0.95·window`, never below
//! one message, and never leaving a non-`human` head.

use crate::error::AgentError;
use crate::tokens::TokenCounter;
use acp_core::Message;

const SYSTEM_PROMPT_FRACTION: f64 = 0.7;
const TOTAL_FRACTION: f64 = 0.95;

/// Reject the system prompt outright if it alone exceeds the window's
/// reserved share. Returns the system prompt's token count on success.
pub fn check_system_prompt(
    system: &str,
    window: usize,
    counter: &dyn TokenCounter,
) -> Result<usize, AgentError> {
    let tokens = counter.count_str(system);
    let limit = (window as f64 * SYSTEM_PROMPT_FRACTION) as usize;
    if tokens > limit {
        return Err(AgentError::SystemPromptTooLarge { limit, actual: tokens });
    }
    Ok(tokens)
}

/// Drop the oldest messages until the transcript fits, preserving the
/// invariant that the retained head is a `human` message and at least one
/// message is always retained.
pub fn trim_messages(
    messages: &[Message],
    system_tokens: usize,
    window: usize,
    counter: &dyn TokenCounter,
) -> Vec<Message> {
    let budget = (window as f64 * TOTAL_FRACTION) as usize;
    let mut start = 0;
    loop {
        let remaining = &messages[start..];
        if remaining.len() <= 1 {
            return remaining.to_vec();
        }
        let used = system_tokens + counter.count_messages(remaining);
        if used <= budget {
            return remaining.to_vec();
        }
        start += 1;
        while start < messages.len() && !matches!(messages[start].kind, acp_core::MessageKind::Human { .. })
        {
            start += 1;
        }
        if start >= messages.len() {
            return vec![messages[messages.len() - 1].clone()];
        }
    }
}
