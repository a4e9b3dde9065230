// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POST delivery with bounded exponential backoff (spec §4.6 `webhook`).

use crate::error::DispatchError;
use crate::retry::RetryPolicy;
use serde_json::Value;

pub async fn deliver(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
    policy: &RetryPolicy,
) -> Result<(), DispatchError> {
    let mut attempt = 0;
    loop {
        match client.post(url).json(payload).send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => return Ok(()),
            Err(err) => {
                if !policy.should_retry(attempt) {
                    return Err(DispatchError::WebhookExhausted {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        source: err,
                    });
                }
                tracing::warn!(%url, attempt, %err, "webhook delivery attempt failed, retrying");
                tokio::time::sleep(policy.delay(attempt)).await;
                attempt += 1;
            }
        }
    }
}
