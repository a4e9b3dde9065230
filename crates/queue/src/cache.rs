// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache-key derivation for idempotent `createJob` (spec §4.2, §4.3
//! `cache={keyPath, ttlSeconds}`).

use acp_core::CacheConfig;
use serde_json::Value;

/// Extract the value at `key_path` (dot-separated) from `input` and render
/// it as the job's cache key. Returns `None` if the path doesn't resolve —
/// callers then fall back to uncached (always-fresh) dispatch.
pub fn derive_cache_key(cache: &CacheConfig, input: &Value) -> Option<String> {
    let mut cursor = input;
    for segment in cache.key_path.split('.') {
        cursor = cursor.get(segment)?;
    }
    Some(match cursor {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
