// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob: content-addressed storage for large job inputs/results that don't
//! belong inline in the event log (spec §3).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Internally generated; addresses content in `acp_store`'s blob store.
    pub struct BlobId("blb-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobContentType {
    #[serde(rename = "application/json")]
    ApplicationJson,
    #[serde(rename = "image/png")]
    ImagePng,
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
}

crate::simple_display! {
    BlobContentType {
        ApplicationJson => "application/json",
        ImagePng => "image/png",
        ImageJpeg => "image/jpeg",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub id: BlobId,
    pub cluster_id: crate::ClusterId,
    pub content_type: BlobContentType,
    pub size_bytes: u64,
    pub created_at_ms: u64,
}

impl Blob {
    pub fn new(
        cluster_id: crate::ClusterId,
        content_type: BlobContentType,
        size_bytes: u64,
        now_ms: u64,
    ) -> Self {
        Self { id: BlobId::new(), cluster_id, content_type, size_bytes, created_at_ms: now_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_displays_mime_string() {
        assert_eq!(BlobContentType::ImagePng.to_string(), "image/png");
    }

    #[test]
    fn new_blob_gets_a_unique_id() {
        let a = Blob::new("cls".into(), BlobContentType::ApplicationJson, 10, 0);
        let b = Blob::new("cls".into(), BlobContentType::ApplicationJson, 10, 0);
        assert_ne!(a.id, b.id);
    }
}
