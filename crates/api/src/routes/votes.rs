use axum::{extract::State, Json};
use dispenser_core::VoteCount;

use crate::{state::AppState, ApiResult};

/// GET /votes - Ballot transfers tallied per address
pub async fn list_votes(State(state): State<AppState>) -> ApiResult<Json<Vec<VoteCount>>> {
    let votes = match &state.dispenser {
        Some(dispenser) => dispenser.votes().await,
        None => Vec::new(),
    };
    Ok(Json(votes))
}
