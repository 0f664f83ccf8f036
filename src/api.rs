//! REST API server for the insight pipeline
//!
//! Exposes the query-to-answer pipeline via HTTP endpoints

use axum::{
    extract::{Query as QueryParams, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::service::{InsightParams, QueryService};

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<QueryService>,
}

/// =============================
/// Error Mapping
/// =============================

/// Map pipeline errors to HTTP status codes. Parse failures never get
/// here (the extractor absorbs them); only intake validation and
/// upstream failures do.
fn status_for(error: &AgentError) -> StatusCode {
    match error {
        AgentError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        AgentError::ModelUnavailable(_) | AgentError::ToolLimitExceeded(_) => {
            StatusCode::BAD_GATEWAY
        }
        AgentError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// =============================
/// Insight Endpoint
/// =============================

async fn get_insight(
    State(state): State<ApiState>,
    QueryParams(params): QueryParams<InsightParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.service.handle(params).await {
        Ok(result) => {
            let body = serde_json::to_value(&result)
                .unwrap_or_else(|_| serde_json::json!(result.as_text()));
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            warn!(error = %e, "Insight request failed");
            (
                status_for(&e),
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(service: Arc<QueryService>) -> Router {
    let state = ApiState { service };

    Router::new()
        .route("/health", get(health))
        .route("/insight", get(get_insight))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    service: Arc<QueryService>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_taxonomy_maps_to_expected_status_codes() {
        assert_eq!(
            status_for(&AgentError::InvalidQuery("no query".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AgentError::ModelUnavailable("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AgentError::ToolLimitExceeded(4)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AgentError::UpstreamUnavailable("bank down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&AgentError::UpstreamTimeout("slow".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&AgentError::ToolNotFound("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }
}
