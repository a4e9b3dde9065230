// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool: a named function a machine can execute, with an input schema and
//! dispatch configuration.

use crate::schema::SchemaIr;
use serde::{Deserialize, Serialize};

/// Tool name: letters and digits only, max 30 chars (spec §6).
crate::define_string_id! {
    pub struct ToolName;
}

/// Regex for valid tool/function names: `^[A-Za-z0-9]{1,30}$`.
pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 30
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Caching configuration: dedupe job creation by a value extracted from the
/// input at `key_path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    pub key_path: String,
    pub ttl_seconds: u64,
}

/// Per-tool dispatch configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count_on_stall: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub private: bool,
}

impl ToolConfig {
    pub fn max_attempts(&self) -> u32 {
        1 + self.retry_count_on_stall.unwrap_or(0)
    }
}

/// A registered tool within a cluster. Tool names are unique per cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub cluster_id: crate::ClusterId,
    pub name: ToolName,
    pub description: Option<String>,
    pub schema: Option<SchemaIr>,
    #[serde(default)]
    pub config: ToolConfig,
    /// True for machine-registered tools (liveness tied to polling); false
    /// for persistent declarations (e.g. workflow tools).
    pub should_expire: bool,
    pub created_at_ms: u64,
    pub last_ping_at_ms: Option<u64>,
    /// The machine identity that registered this tool, used to scope
    /// dispatch of `config.private` tools to that machine alone.
    pub registered_by_machine_id: Option<crate::MachineId>,
}

impl Tool {
    pub fn new(cluster_id: crate::ClusterId, name: ToolName, now_ms: u64) -> Self {
        Self {
            cluster_id,
            name,
            description: None,
            schema: None,
            config: ToolConfig::default(),
            should_expire: true,
            created_at_ms: now_ms,
            last_ping_at_ms: Some(now_ms),
            registered_by_machine_id: None,
        }
    }

    /// Liveness per spec §4.3: non-expiring tools are always callable;
    /// expiring ones need a recent ping.
    pub fn is_live(&self, now_ms: u64) -> bool {
        if !self.should_expire {
            return true;
        }
        match self.last_ping_at_ms {
            Some(t) => now_ms.saturating_sub(t) < crate::machine::MACHINE_LIVENESS_SECS * 1000,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_validation() {
        assert!(is_valid_tool_name("consoleEcho"));
        assert!(is_valid_tool_name("a"));
        assert!(!is_valid_tool_name(""));
        assert!(!is_valid_tool_name("has_underscore"));
        assert!(!is_valid_tool_name(&"a".repeat(31)));
    }

    #[test]
    fn non_expiring_tool_always_live() {
        let mut t = Tool::new("cls".into(), ToolName::new("foo"), 0);
        t.should_expire = false;
        t.last_ping_at_ms = None;
        assert!(t.is_live(1_000_000));
    }

    #[test]
    fn expiring_tool_goes_stale() {
        let t = Tool::new("cls".into(), ToolName::new("foo"), 1_000);
        assert!(t.is_live(1_000 + 10_000));
        assert!(!t.is_live(1_000 + 70_000));
    }

    #[test]
    fn max_attempts_defaults_to_one() {
        let cfg = ToolConfig::default();
        assert_eq!(cfg.max_attempts(), 1);
        let cfg = ToolConfig { retry_count_on_stall: Some(2), ..Default::default() };
        assert_eq!(cfg.max_attempts(), 3);
    }
}
