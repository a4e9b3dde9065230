// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interrupt sentinel (spec §6): a tool result is an interrupt iff it is an
//! object containing the key `__inferable_interrupt` whose value validates
//! as `{type: "approval"|"general", notification?: {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INTERRUPT_SENTINEL_KEY: &str = "__inferable_interrupt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptType {
    Approval,
    General,
}

crate::simple_display! {
    InterruptType {
        Approval => "approval",
        General => "general",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptPayload {
    #[serde(rename = "type")]
    pub kind: InterruptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Value>,
}

impl InterruptPayload {
    /// Inspect a job result value for the interrupt sentinel, returning the
    /// parsed payload if present and well-formed.
    pub fn from_result(result: &Value) -> Option<Self> {
        let obj = result.as_object()?;
        let sentinel = obj.get(INTERRUPT_SENTINEL_KEY)?;
        serde_json::from_value(sentinel.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_approval_sentinel() {
        let result = json!({"__inferable_interrupt": {"type": "approval"}});
        let payload = InterruptPayload::from_result(&result).expect("approval payload");
        assert_eq!(payload.kind, InterruptType::Approval);
    }

    #[test]
    fn parses_general_sentinel_with_notification() {
        let result = json!({
            "__inferable_interrupt": {"type": "general", "notification": {"msg": "waiting"}}
        });
        let payload = InterruptPayload::from_result(&result).expect("general payload");
        assert_eq!(payload.kind, InterruptType::General);
        assert!(payload.notification.is_some());
    }

    #[test]
    fn non_interrupt_result_is_none() {
        let result = json!({"output": "hi"});
        assert!(InterruptPayload::from_result(&result).is_none());
    }

    #[test]
    fn malformed_sentinel_is_none() {
        let result = json!({"__inferable_interrupt": {"type": "not-a-type"}});
        assert!(InterruptPayload::from_result(&result).is_none());
    }
}
