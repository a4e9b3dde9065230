// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical schema IR (spec §9 Design Notes: "specify a single canonical
//! schema IR used by validators, model-output builders, and UI renderers").
//!
//! A [`SchemaIr`] is just a JSON Schema document (`serde_json::Value`)
//! normalized at the boundary from whatever a caller submitted (native JSON
//! Schema today; future input shapes normalize here too). Validation is
//! delegated to the `jsonschema` crate, compiled once and cached by callers
//! that validate repeatedly (see `acp_registry::Registry`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A JSON Schema document, opaque to this crate beyond "is valid JSON".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SchemaIr(pub Value);

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is not a valid JSON Schema document: {0}")]
    InvalidSchema(String),
    #[error("value does not conform to schema: {0}")]
    ValidationFailed(String),
}

impl SchemaIr {
    pub fn new(doc: Value) -> Self {
        Self(doc)
    }

    /// Compile and validate `instance` against this schema.
    ///
    /// Compilation happens per call; hot paths (tool-input validation
    /// inside the queue, structured-output validation inside the agent
    /// engine) should cache a compiled validator instead of calling this
    /// repeatedly — see `acp_registry::CompiledSchema`.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let compiled = jsonschema::validator_for(&self.0)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        let errors: Vec<String> =
            compiled.iter_errors(instance).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed(errors.join("; ")))
        }
    }

    /// Property names restricted to `[A-Za-z0-9_]` per spec §6. Checked
    /// shallowly over the top-level `properties` map; nested objects are
    /// the caller's responsibility to have normalized already.
    pub fn has_valid_property_names(&self) -> bool {
        let Some(props) = self.0.get("properties").and_then(|p| p.as_object()) else {
            return true;
        };
        props
            .keys()
            .all(|k| !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    /// Build a JSON Schema object `{type: object, properties: {invocations:
    /// {type: array, items: {oneOf: [...]}}}, ...}` from the union of an
    /// optional result schema and a set of per-tool invocation shapes. Used
    /// by the agent engine to construct the structured-output contract for
    /// a model call (spec §4.4 step 4).
    pub fn build_agent_response_schema(
        result_schema: Option<&SchemaIr>,
        tool_invocation_schemas: &[(String, SchemaIr)],
    ) -> SchemaIr {
        let invocation_variants: Vec<Value> = tool_invocation_schemas
            .iter()
            .map(|(name, input_schema)| {
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "toolName": {"const": name},
                        "input": input_schema.0,
                        "reasoning": {"type": "string"}
                    },
                    "required": ["toolName", "input"]
                })
            })
            .collect();

        let mut properties = serde_json::json!({
            "done": {"type": "boolean"},
            "message": {"type": "string"},
            "invocations": {
                "type": "array",
                "items": { "oneOf": invocation_variants }
            },
            "issue": {"type": "string"}
        });

        if let Some(schema) = result_schema {
            properties
                .as_object_mut()
                .expect("object literal")
                .insert("result".to_string(), schema.0.clone());
        }

        SchemaIr(serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": ["done"]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_simple_object_schema() {
        let schema = SchemaIr::new(json!({
            "type": "object",
            "properties": {"input": {"type": "string"}},
            "required": ["input"]
        }));
        assert!(schema.validate(&json!({"input": "hi"})).is_ok());
        assert!(schema.validate(&json!({"input": 1})).is_err());
        assert!(schema.validate(&json!({})).is_err());
    }

    #[test]
    fn property_name_validation() {
        let ok = SchemaIr::new(json!({"properties": {"foo_bar": {}}}));
        assert!(ok.has_valid_property_names());
        let bad = SchemaIr::new(json!({"properties": {"foo-bar": {}}}));
        assert!(!bad.has_valid_property_names());
    }

    #[test]
    fn builds_agent_response_schema_with_invocations() {
        let tool_schema = SchemaIr::new(json!({"type": "object"}));
        let schema = SchemaIr::build_agent_response_schema(
            None,
            &[("notify".to_string(), tool_schema)],
        );
        assert_eq!(schema.0["type"], "object");
        assert!(schema.0["properties"]["invocations"].is_object());
    }
}
