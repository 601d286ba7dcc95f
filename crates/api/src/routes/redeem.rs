//! Redemption endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{require_payload, PayloadRequest};
use crate::{error::ApiError, state::AppState, ApiResult};

/// POST /redeem - Redeem a signed token for a ballot
///
/// 400 without a payload, 404 when no redemption handler is registered, 403
/// when the handler rejects the payload and 500 when it fails.
pub async fn redeem(
    State(state): State<AppState>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    info!("Received redeem");
    let payload = require_payload(body)?;

    let Some(redeemer) = state.redeemer.as_ref() else {
        info!("No redemption handler registered, ignoring request");
        return Err(ApiError::NotFound("redemption handler".to_string()));
    };

    let redeemed = redeemer
        .redeem(payload.as_bytes())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if redeemed {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::Forbidden("redemption rejected".to_string()))
    }
}
