//! Minimal admin HTTP surface (spec.md §6.1 addition), grounded on the
//! teacher's `interfaces/http/router.rs` and `dto::ApiResponse` envelope,
//! trimmed to the handful of read/command routes that prove the core's
//! session, transaction, and command APIs are callable from outside the
//! crate — not the teacher's full tariff/user/api-key/reservation surface.

mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::services::ChargePointService;

#[derive(Clone)]
pub struct AppState {
    pub charge_points: Arc<ChargePointService>,
    pub metrics: PrometheusHandle,
}

/// Uniform envelope for every admin response: `{"success", "data", "error"}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/charge-points", get(handlers::list_charge_points))
        .route("/api/charge-points/{id}", get(handlers::get_charge_point))
        .route("/api/charge-points/{id}/transactions", get(handlers::transaction_history))
        .route("/api/commands/{charge_point_id}", post(handlers::send_command))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
