pub mod faucet;
pub mod health;
pub mod redeem;
pub mod signing;
pub mod votes;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Body shared by the POST routes: `{"payload": "..."}`.
#[derive(Debug, Deserialize)]
pub struct PayloadRequest {
    pub payload: Option<String>,
}

/// The non-empty `payload` field of a JSON body. Anything else is a bad request.
pub(crate) fn require_payload(body: Result<Json<PayloadRequest>, JsonRejection>) -> ApiResult<String> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    match request.payload {
        Some(payload) if !payload.is_empty() => Ok(payload),
        _ => Err(ApiError::BadRequest("missing payload".to_string())),
    }
}
