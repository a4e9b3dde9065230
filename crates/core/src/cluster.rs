// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster: the top-level tenant boundary. No entity references another
//! cluster.

use serde::{Deserialize, Serialize};

crate::define_string_id! {
    /// Tenant boundary identifier.
    pub struct ClusterId;
}

/// A tenant's isolated control-plane namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub enable_custom_auth: bool,
    #[serde(default)]
    pub handle_custom_auth_function: Option<String>,
    #[serde(default)]
    pub is_demo: bool,
}

impl Cluster {
    pub fn new(id: impl Into<ClusterId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            additional_context: None,
            debug: false,
            enable_custom_auth: false,
            handle_custom_auth_function: None,
            is_demo: false,
        }
    }
}
