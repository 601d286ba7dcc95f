//! Health check endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use dispenser_types::LifecycleState;
use serde::{Deserialize, Serialize};

use crate::{state::AppState, ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub lifecycle: LifecycleState,
    pub round_active: bool,
    pub timestamp: chrono::DateTime<Utc>,
    pub version: String,
}

/// GET /health - Liveness plus the dispenser's lifecycle state
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (lifecycle, round_active) = match &state.dispenser {
        Some(dispenser) => (
            dispenser.lifecycle_state().await,
            dispenser.is_round_active().await,
        ),
        None => (LifecycleState::Unknown, false),
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        lifecycle,
        round_active,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
