// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `findRelevantTools` (spec §4.4 step 2): "implementations may use
//! embeddings or simply return all; the contract is only that the result
//! is a finite subset of currently-callable tools."

use acp_core::{Message, Tool};

pub trait RelevantToolsResolver: Send + Sync {
    fn resolve(&self, messages: &[Message], callable: &[Tool]) -> Vec<Tool>;
}

/// The simplest conforming resolver: every callable tool is relevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllToolsResolver;

impl RelevantToolsResolver for AllToolsResolver {
    fn resolve(&self, _messages: &[Message], callable: &[Tool]) -> Vec<Tool> {
        callable.to_vec()
    }
}
