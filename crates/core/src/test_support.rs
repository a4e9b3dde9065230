// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for downstream crates. Gated behind `test-support` so
//! integration tests in `acp-store`, `acp-queue`, etc. can depend on this
//! crate with `features = ["test-support"]` instead of duplicating fixtures.

use crate::id::IdGen;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Deterministic id generator: returns `{prefix}{counter}` on each call.
/// Useful where `UuidIdGen`'s non-determinism would make a test's expected
/// output unwieldy to assert against.
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: Arc<str>,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<Arc<str>>) -> Self {
        Self { prefix: prefix.into(), counter: Arc::new(AtomicU64::new(0)) }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}
