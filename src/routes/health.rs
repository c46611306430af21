use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::config::StoreBackend;
use crate::store::bounded;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub store: String,
    pub backend: &'static str,
}

/// Health check endpoint - public
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let store_result = bounded(state.settings.store_timeout, state.health.ping()).await;
    if let Err(e) = &store_result {
        tracing::warn!(error = %e, "Store health check failed");
    }

    let (status, status_code) = if store_result.is_ok() {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    let backend = match state.settings.store {
        StoreBackend::Postgres { .. } => "postgres",
        StoreBackend::Memory => "memory",
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                store: if store_result.is_ok() { "ok" } else { "error" }.to_string(),
                backend,
            },
        }),
    )
}
