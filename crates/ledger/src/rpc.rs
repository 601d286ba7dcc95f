//! JSON-RPC client for a ledger gateway.
//!
//! Standard Ethereum methods are used for value transfers, receipts and block
//! height. Contract calls, the round descriptor and decoded events go through
//! the gateway's `dispenser_*` namespace, which owns ABI encoding and the
//! contract addresses.

use std::time::Duration;

use async_trait::async_trait;
use dispenser_types::{ChainEvent, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::transaction::{TransactionReceipt, TransactionRequest, TxPayload};

/// Gateway connection settings.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub request_timeout: Duration,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct RpcLedger {
    config: RpcConfig,
    client: reqwest::Client,
}

impl RpcLedger {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<Option<T>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!("RPC {} -> {}", method, self.config.url);

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{} returned HTTP {}: {}",
                method, status, body
            )));
        }

        let result: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("{}: {}", method, e)))?;

        if let Some(error) = result.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(result.result)
    }

    async fn call_required<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        self.call(method, params)
            .await?
            .ok_or_else(|| LedgerError::Decode(format!("{} returned null", method)))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash> {
        let result: Result<String> = match &request.payload {
            TxPayload::Transfer { to } => {
                let mut tx = json!({
                    "from": request.from,
                    "to": to,
                });
                if let Some(gas) = request.gas {
                    tx["gas"] = json!(to_quantity(u128::from(gas)));
                }
                if let Some(value) = request.value {
                    tx["value"] = json!(to_quantity(value));
                }
                self.call_required("eth_sendTransaction", vec![tx]).await
            }
            TxPayload::Call { .. } => {
                let tx = serde_json::to_value(&request)
                    .map_err(|e| LedgerError::Decode(format!("encoding request: {}", e)))?;
                self.call_required("dispenser_sendContractCall", vec![tx]).await
            }
        };

        result
            .map(TxHash::from)
            .map_err(|e| LedgerError::SubmissionFailed(e.to_string()))
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>> {
        let raw: Option<RawReceipt> = self
            .call("eth_getTransactionReceipt", vec![json!(hash)])
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        // Pending transactions can come back with a null block number.
        let Some(block) = raw.block_number else {
            return Ok(None);
        };

        Ok(Some(TransactionReceipt {
            transaction_hash: TxHash::from(raw.transaction_hash),
            block_number: parse_quantity(&block)?,
            success: match raw.status {
                Some(status) => Some(parse_quantity(&status)? == 1),
                None => None,
            },
        }))
    }

    async fn current_mix(&self) -> Result<Vec<Value>> {
        self.call_required("dispenser_currentMix", vec![]).await
    }

    async fn block_number(&self) -> Result<u64> {
        let height: String = self.call_required("eth_blockNumber", vec![]).await?;
        parse_quantity(&height)
    }

    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<ChainEvent>> {
        let raw: Vec<Value> = self
            .call_required(
                "dispenser_getEvents",
                vec![
                    json!(to_quantity(u128::from(from_block))),
                    json!(to_quantity(u128::from(to_block))),
                ],
            )
            .await?;
        Ok(decode_events(raw))
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

/// Decode events one by one; an event this service cannot read is logged and
/// skipped so the rest of the range is still delivered.
fn decode_events(raw: Vec<Value>) -> Vec<ChainEvent> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<ChainEvent>(value.clone()) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping undecodable event {}: {}", value, e);
                None
            }
        })
        .collect()
}

fn to_quantity(value: u128) -> String {
    format!("{:#x}", value)
}

fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("quantity without 0x prefix: '{}'", raw)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("bad quantity '{}': {}", raw, e)))
}
