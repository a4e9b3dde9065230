// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System prompt assembly (spec §6 "Agent system prompt"): a fixed ordered
//! list of behavioral rules, optional caller-supplied context, then the
//! relevant-tool and other-tool blocks.

use acp_core::Tool;
use serde_json::Value;

/// The fixed, ordered behavioral rule set. Order is part of the contract —
/// never reorder or these prompts silently change meaning for every run.
const BASE_RULES: &[&str] = &[
    "You are a helpful assistant.",
    "You do not respond to greetings or small talk; you only act on concrete tasks.",
    "Use the tools at your disposal to accomplish the task.",
    "If you cannot complete a task, explain why in the `issue` field rather than guessing.",
    "If there is nothing left to do, set `done` to true and provide a `result` or `message`.",
    "If you encounter invocation errors, inspect the `invocation-result` and decide whether to retry or report the issue.",
    "When possible, return multiple invocations in a single turn rather than one at a time.",
];

const RESULT_GROUNDING_RULE: &str =
    "When referring to tool results, reference json object path as `{{id}}` rather than quoting the value directly.";

/// Build the ordered system prompt for one `MODEL` node invocation.
pub fn build_system_prompt(
    additional_context: Option<&Value>,
    relevant_tools: &[Tool],
    other_callable_tools: &[Tool],
    enable_result_grounding: bool,
) -> String {
    let mut sections = Vec::with_capacity(BASE_RULES.len() + 4);
    sections.extend(BASE_RULES.iter().map(|s| s.to_string()));
    if enable_result_grounding {
        sections.push(RESULT_GROUNDING_RULE.to_string());
    }

    if let Some(ctx) = additional_context {
        sections.push(ctx.to_string());
    }

    sections.push(format!("<TOOLS_SCHEMAS>{}</TOOLS_SCHEMAS>", tools_schemas_block(relevant_tools)));

    let other_names: Vec<&str> = other_callable_tools
        .iter()
        .filter(|t| !relevant_tools.iter().any(|r| r.name == t.name))
        .map(|t| t.name.as_str())
        .collect();
    sections.push(format!(
        "<OTHER_AVAILABLE_TOOLS>{}</OTHER_AVAILABLE_TOOLS>",
        other_names.join(", ")
    ));

    sections.join("\n\n")
}

fn tools_schemas_block(tools: &[Tool]) -> String {
    let entries: Vec<Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name.as_str(),
                "description": t.description,
                "schema": t.schema.as_ref().map(|s| &s.0),
            })
        })
        .collect();
    serde_json::to_string(&entries).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_core::{ClusterId, ToolName};

    fn tool(name: &str) -> Tool {
        Tool::new(ClusterId::new("cls"), ToolName::new(name), 0)
    }

    #[test]
    fn includes_ordered_rules_and_tool_blocks() {
        let prompt = build_system_prompt(None, &[tool("echo")], &[tool("echo"), tool("notify")], false);
        assert!(prompt.starts_with("You are a helpful assistant."));
        assert!(prompt.contains("<TOOLS_SCHEMAS>"));
        assert!(prompt.contains("echo"));
        assert!(prompt.contains("<OTHER_AVAILABLE_TOOLS>notify</OTHER_AVAILABLE_TOOLS>"));
        assert!(!prompt.contains("{{id}}"));
    }

    #[test]
    fn result_grounding_rule_included_when_enabled() {
        let prompt = build_system_prompt(None, &[], &[], true);
        assert!(prompt.contains("{{id}}"));
    }
}
