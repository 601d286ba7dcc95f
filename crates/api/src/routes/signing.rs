//! Operator signing utilities

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use dispenser_core::RedemptionPayload;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{require_payload, PayloadRequest};
use crate::{error::ApiError, state::AppState, ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct SignResponse {
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub result: bool,
}

/// POST /sign - Sign a hex-encoded message with the service key
pub async fn sign(
    State(state): State<AppState>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> ApiResult<Json<SignResponse>> {
    let payload = require_payload(body)?;
    let signature = state
        .cipher
        .sign(&payload)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(SignResponse { signature }))
}

/// POST /verify - Check a `<part1>-<part2>-<signature>` payload
pub async fn verify(
    State(state): State<AppState>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyResponse>> {
    let payload = require_payload(body)?;
    let parsed = match RedemptionPayload::parse(&payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            info!("Verification of malformed payload: {}", e);
            return Ok(Json(VerifyResponse { result: false }));
        }
    };

    let message = parsed.signed_message();
    let result = state.cipher.verify(&message, &parsed.signature);
    info!("Verification of {}: {}", message, result);

    Ok(Json(VerifyResponse { result }))
}
