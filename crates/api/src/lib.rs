//! HTTP API of the ballot dispenser
//!
//! - `POST /redeem`: redeem a signed token for a ballot
//! - `POST /sign`, `POST /verify`: operator signing utilities
//! - `GET /votes`: tallied ballot transfers
//! - `POST /beg`: development faucet, when enabled
//! - `GET /health`: liveness and lifecycle state

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Faucet, RedemptionHandler};

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/redeem", post(routes::redeem::redeem))
        .route("/sign", post(routes::signing::sign))
        .route("/verify", post(routes::signing::verify))
        .route("/votes", get(routes::votes::list_votes))
        .route("/beg", post(routes::faucet::beg))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Serve the API on `addr` until the server fails
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use dispenser_crypto::Cipher;
    use dispenser_types::{DispenserError, Result};
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedRedeemer(std::result::Result<bool, ()>);

    #[async_trait]
    impl RedemptionHandler for FixedRedeemer {
        async fn redeem(&self, _payload: &[u8]) -> Result<bool> {
            self.0
                .map_err(|_| DispenserError::ChainQuery("ledger unreachable".to_string()))
        }
    }

    fn cipher() -> Arc<Cipher> {
        let key = RsaPrivateKey::new(&mut OsRng, 512).expect("key generation");
        Arc::new(Cipher::from_private_key(&key))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn with_redeemer(outcome: std::result::Result<bool, ()>) -> AppState {
        AppState::new(cipher()).with_redeemer(Arc::new(FixedRedeemer(outcome)))
    }

    #[tokio::test]
    async fn test_redeem_without_handler_is_not_found() {
        let (status, _) = send(AppState::new(cipher()), post("/redeem", json!({"payload": "abc-1-ff"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redeem_status_codes() {
        let request = || post("/redeem", json!({"payload": "abc-1-ff"}));

        assert_eq!(send(with_redeemer(Ok(true)), request()).await.0, StatusCode::OK);
        assert_eq!(send(with_redeemer(Ok(false)), request()).await.0, StatusCode::FORBIDDEN);

        let (status, body) = send(with_redeemer(Err(())), request()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_redeem_missing_payload_is_bad_request() {
        for body in [json!({}), json!({"payload": ""}), json!({"other": "x"})] {
            let (status, _) = send(with_redeemer(Ok(true)), post("/redeem", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/redeem")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(with_redeemer(Ok(true)), request).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sign_and_verify_round_trip() {
        let state = AppState::new(cipher());

        let (status, body) = send(
            state.clone(),
            post("/sign", json!({"payload": hex::encode("abc-1")})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let signature = serde_json::from_slice::<Value>(&body).unwrap()["signature"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, body) = send(
            state.clone(),
            post("/verify", json!({"payload": format!("abc-1-{}", signature)})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"result": true}));

        let (_, body) = send(
            state,
            post("/verify", json!({"payload": format!("abc-2-{}", signature)})),
        )
        .await;
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"result": false}));
    }

    #[tokio::test]
    async fn test_sign_rejects_bad_input() {
        let state = AppState::new(cipher());
        let (status, _) = send(state.clone(), post("/sign", json!({"payload": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(state, post("/sign", json!({"payload": "not hex"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_malformed_payload_is_false() {
        for payload in ["abc-1", "abc-1-ff-00", "abc--ff"] {
            let (status, body) = send(AppState::new(cipher()), post("/verify", json!({"payload": payload}))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"result": false}));
        }
    }

    #[tokio::test]
    async fn test_faucet_disabled_is_not_found() {
        let (status, _) = send(AppState::new(cipher()), post("/beg", json!({"payload": "0xabc"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_without_dispenser() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(AppState::new(cipher()), request).await;
        assert_eq!(status, StatusCode::OK);

        let health: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["lifecycle"], "unknown");
        assert_eq!(health["round_active"], false);
    }
}
