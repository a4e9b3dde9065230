// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router assembly: authenticated routes behind one `route_layer`, then
//! unauthenticated health routes layered on after (so they bypass it) —
//! the shape of the teacher's `OrchestratorApi::router`.

use crate::auth::auth_middleware;
use crate::routes;
use crate::state::ApiState;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: ApiState) -> Router {
    let cors = cors_layer(state.config.allowed_origins.clone());

    let authenticated = Router::new()
        .route("/clusters/:cluster_id/jobs", post(routes::jobs::create_job).get(routes::jobs::list_jobs))
        .route("/clusters/:cluster_id/jobs/:job_id", get(routes::jobs::get_job))
        .route("/clusters/:cluster_id/jobs/:job_id/result", post(routes::jobs::submit_result))
        .route("/clusters/:cluster_id/jobs/:job_id/approval", post(routes::jobs::approval))
        .route("/machines", post(routes::machines::upsert_machine))
        .route("/clusters/:cluster_id/runs", post(routes::runs::create_run))
        .route("/clusters/:cluster_id/runs/:run_id", get(routes::runs::get_run))
        .route(
            "/clusters/:cluster_id/runs/:run_id/messages",
            get(routes::runs::list_messages).post(routes::runs::append_message),
        )
        .route("/clusters/:cluster_id/workflows/:name/executions", post(routes::workflows::create_execution))
        .route("/clusters/:cluster_id/keys/:key", put(routes::keys::put_key).get(routes::keys::get_key))
        .route("/clusters/:cluster_id/events", get(routes::events::list_events))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(authenticated)
        .route("/live", get(routes::health::live))
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new().allow_methods(Any).allow_headers(Any).allow_origin(AllowOrigin::predicate(
        move |origin, parts| {
            if runs_path_exception(parts.uri.path()) {
                return true;
            }
            allowed_origins.iter().any(|o| o.as_bytes() == origin.as_bytes())
        },
    ))
}

/// Spec §6's documented CORS exception: `/clusters/*/runs*` is reachable
/// from any origin (browser-hosted run UIs don't know their own origin
/// ahead of time), everything else is restricted to `allowed_origins`.
fn runs_path_exception(path: &str) -> bool {
    let mut segments = path.trim_start_matches('/').splitn(3, '/');
    matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some("clusters"), Some(_), Some(rest)) if rest.starts_with("runs")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_paths_are_exempt_but_jobs_are_not() {
        assert!(runs_path_exception("/clusters/cls_1/runs/run_1/messages"));
        assert!(runs_path_exception("/clusters/cls_1/runs"));
        assert!(!runs_path_exception("/clusters/cls_1/jobs"));
        assert!(!runs_path_exception("/machines"));
    }
}
