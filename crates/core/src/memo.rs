// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memoized workflow step results (spec §5 `memo`).
//!
//! Wrapped in `{value: ...}` so a memoized `null` is distinguishable from
//! "no memo recorded yet" when read back out of storage as a bare `Option`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoValue {
    pub value: Value,
}

impl MemoValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// What to do when a `memo` call is made again with a different key under
/// the same workflow execution (spec §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoConflictPolicy {
    /// Overwrite the stored value with the new one.
    Replace,
    /// Keep the existing stored value, ignore the new one.
    DoNothing,
}

impl Default for MemoConflictPolicy {
    fn default() -> Self {
        Self::Replace
    }
}

crate::simple_display! {
    MemoConflictPolicy {
        Replace => "replace",
        DoNothing => "do_nothing",
    }
}

impl MemoConflictPolicy {
    /// Resolve `existing` against a newly-proposed value per this policy.
    pub fn resolve(self, existing: Option<MemoValue>, proposed: MemoValue) -> MemoValue {
        match (self, existing) {
            (MemoConflictPolicy::DoNothing, Some(existing)) => existing,
            _ => proposed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replace_policy_overwrites() {
        let existing = MemoValue::new(json!(1));
        let proposed = MemoValue::new(json!(2));
        let resolved = MemoConflictPolicy::Replace.resolve(Some(existing), proposed.clone());
        assert_eq!(resolved, proposed);
    }

    #[test]
    fn do_nothing_policy_keeps_existing() {
        let existing = MemoValue::new(json!(1));
        let proposed = MemoValue::new(json!(2));
        let resolved = MemoConflictPolicy::DoNothing.resolve(Some(existing.clone()), proposed);
        assert_eq!(resolved, existing);
    }

    #[test]
    fn no_existing_value_always_takes_proposed() {
        let proposed = MemoValue::new(json!(null));
        let resolved = MemoConflictPolicy::DoNothing.resolve(None, proposed.clone());
        assert_eq!(resolved, proposed);
    }
}
