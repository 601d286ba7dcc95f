use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use dispenser_types::Address;
use tracing::info;

use super::{require_payload, PayloadRequest};
use crate::{error::ApiError, state::AppState, ApiResult};

/// POST /beg - Development faucet; the payload is the receiving address
///
/// Responds once the pass and the transfer are handed off, without waiting
/// for either to be submitted.
pub async fn beg(
    State(state): State<AppState>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Some(faucet) = state.faucet.as_ref() else {
        return Err(ApiError::NotFound("faucet disabled".to_string()));
    };
    let address = require_payload(body)?;

    info!("Faucet request from {}", address);
    faucet.give(Address::from(address));
    Ok(StatusCode::OK)
}
