// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`Model`] adapters. The engine is intentionally provider-
//! agnostic (spec §9: "LLM provider wire formats" is a non-goal), so rather
//! than speaking any particular vendor's API, [`RemoteModel`] relays a
//! generic structured-call envelope to a configured HTTP endpoint — the
//! actual model integration lives outside this workspace. This mirrors the
//! teacher's adapter-trait style (`AgentAdapter`) of delegating the real
//! work to an external process/service behind a thin Rust trait.

use acp_agent::model::{Model, ModelError, ModelRequest, ModelResponse, RawToolCall};
use acp_dispatch::RetryPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    messages: &'a [acp_core::Message],
    system: &'a str,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(rename = "toolName")]
    tool_name: String,
    input: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    data: Value,
    #[serde(rename = "rawToolCalls", default)]
    raw_tool_calls: Vec<WireToolCall>,
}

/// Calls out to an external model service over HTTP, with the same bounded
/// exponential backoff used for webhook delivery (`acp_dispatch::RetryPolicy`).
pub struct RemoteModel {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl RemoteModel {
    pub fn new(endpoint: String, retry: RetryPolicy) -> Self {
        Self { client: reqwest::Client::new(), endpoint, retry }
    }
}

#[async_trait]
impl Model for RemoteModel {
    async fn structured(&self, req: ModelRequest) -> Result<ModelResponse, ModelError> {
        let wire = WireRequest { messages: &req.messages, system: &req.system, schema: &req.schema.0 };

        let mut attempt = 0;
        loop {
            let sent = self.client.post(&self.endpoint).json(&wire).send().await;
            match sent.and_then(|r| r.error_for_status()) {
                Ok(resp) => {
                    let body: WireResponse = resp
                        .json()
                        .await
                        .map_err(|err| ModelError::Malformed(err.to_string()))?;
                    return Ok(ModelResponse {
                        data: body.data,
                        raw_tool_calls: body
                            .raw_tool_calls
                            .into_iter()
                            .map(|c| RawToolCall { tool_name: c.tool_name, input: c.input })
                            .collect(),
                    });
                }
                Err(err) if self.retry.should_retry(attempt) => {
                    tracing::warn!(%err, attempt, "model call failed, retrying");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(ModelError::Provider(err.to_string())),
            }
        }
    }
}

/// Used when no model endpoint is configured — any `MultiStep` run fails
/// fast with a clear error rather than hanging, while `SingleStep` runs
/// that never invoke the model are unaffected.
pub struct NullModel;

#[async_trait]
impl Model for NullModel {
    async fn structured(&self, _req: ModelRequest) -> Result<ModelResponse, ModelError> {
        Err(ModelError::Provider("no model endpoint configured (INFERABLE_MODEL_ENDPOINT unset)".to_string()))
    }
}
