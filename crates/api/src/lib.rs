// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-api: the external HTTP surface (spec §6) — job dispatch, run/message
//! endpoints, machine heartbeats, workflow executions, and the cluster
//! MemoKV, fronted by bearer/custom-auth middleware and a CORS layer.

pub mod auth;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use state::{ApiConfig, ApiState};

#[cfg(test)]
mod tests {
    use super::*;
    use acp_agent::model::test_support::FakeModel;
    use acp_agent::Engine as AgentEngine;
    use acp_queue::Queue;
    use acp_store::Store;
    use acp_workflow::WorkflowEngine;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir) -> ApiState {
        let store = Store::open(dir.path()).unwrap();
        let queue = Arc::new(Queue::new(store.clone()));
        let model = Arc::new(FakeModel::new(vec![]));
        let agent_engine = Arc::new(AgentEngine::new(store.clone(), queue.clone(), model, 10_000));
        let workflow_engine = Arc::new(WorkflowEngine::new(store.clone(), agent_engine.clone()));
        let config = ApiConfig { api_secret: "sk_test_secret".to_string(), allowed_origins: vec![] };
        ApiState::new(store, queue, agent_engine, workflow_engine, config)
    }

    #[tokio::test]
    async fn health_requires_no_auth() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_route_rejects_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        let resp = app
            .oneshot(Request::builder().uri("/clusters/cls_1/jobs/job_1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_route_rejects_wrong_bearer_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/clusters/cls_1/jobs/job_1")
                    .header("authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn creates_a_job_with_valid_bearer_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        let body = json!({"targetFn": "echo", "targetArgs": {"x": 1}}).to_string();
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/clusters/cls_1/jobs")
                    .header("authorization", "Bearer sk_test_secret")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn custom_auth_is_rejected_when_cluster_has_not_opted_in() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/clusters/cls_1/jobs/job_1")
                    .header("authorization", "Custom anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
