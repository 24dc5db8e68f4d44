/// Health check endpoint
///
/// Verifies that the server is running and that the backend answers.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "backend": "connected",
///   "store": "postgrest"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("healthy" or "degraded")
    pub status: String,

    /// Application version
    pub version: String,

    /// Backend status ("connected" or "unreachable")
    pub backend: String,

    /// Table transport in use
    pub store: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let backend_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!("Backend health check failed: {}", err);
            "unreachable"
        }
    };

    Ok(Json(HealthResponse {
        status: if backend_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend_status.to_string(),
        store: state.store.name().to_string(),
    }))
}
