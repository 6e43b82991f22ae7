// Health handler
// Liveness probe for load balancers and the frontend

use axum::Json;
use tracing::debug;

use crate::contract::HealthResponse;

/// Health check
///
/// Reports that the service is up together with the server time.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    let response = HealthResponse::now();
    debug!("Health check at {}", response.timestamp);
    Json(response)
}
