//! Health check endpoints for load balancers and container orchestration.
//!
//! `/health` is a liveness probe: it answers as long as the process can serve
//! HTTP and never touches a dependency. `/health/details` runs the dependency
//! probes and answers 503 when the service is DOWN.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::{HealthReport, Status};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Liveness {
    status: Status,
}

/// Liveness handler. Always `200 {"status":"UP"}`.
pub async fn health() -> Json<Liveness> {
    Json(Liveness { status: Status::Up })
}

/// Detailed handler. Status code follows the aggregate status.
pub async fn details(State(state): State<AppState>) -> HealthReport {
    state.checker.check().await
}
