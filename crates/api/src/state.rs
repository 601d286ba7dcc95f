//! Shared application state for the API server

use std::sync::Arc;

use async_trait::async_trait;
use dispenser_core::Dispenser;
use dispenser_crypto::Cipher;
use dispenser_ledger::{ContractCall, TransactionSubmitter, TxOptions};
use dispenser_types::{Address, Result};
use tracing::{error, info};

/// Redeems a raw `<address>-<nonce>-<signature>` payload.
///
/// `Ok(false)` means the payload was rejected; `Err` means the handler itself
/// failed.
#[async_trait]
pub trait RedemptionHandler: Send + Sync {
    async fn redeem(&self, payload: &[u8]) -> Result<bool>;
}

#[async_trait]
impl RedemptionHandler for Dispenser {
    async fn redeem(&self, payload: &[u8]) -> Result<bool> {
        Dispenser::redeem(self, payload).await
    }
}

/// Development faucet: hands out a voting pass and some ether.
pub struct Faucet {
    submitter: TransactionSubmitter,
    ether_amount: u128,
    gas: u64,
}

impl Faucet {
    pub fn new(submitter: TransactionSubmitter, ether_amount: u128, gas: u64) -> Self {
        Self {
            submitter,
            ether_amount,
            gas,
        }
    }

    /// Submit the pass and the transfer in the background.
    pub fn give(&self, address: Address) {
        let submitter = self.submitter.clone();
        let ether_amount = self.ether_amount;
        let gas = self.gas;

        tokio::spawn(async move {
            let pass = ContractCall::GivePass {
                address: address.clone(),
            };
            if let Err(e) = submitter.submit(pass, TxOptions::gas(gas)).await {
                error!("Faucet could not give a pass to {}: {}", address, e);
            }
            match submitter.transfer(address.clone(), ether_amount, Some(gas)).await {
                Ok(hash) => info!("Faucet sent {} wei to {} ({})", ether_amount, address, hash),
                Err(e) => error!("Faucet could not fund {}: {}", address, e),
            }
        });
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub cipher: Arc<Cipher>,
    /// `None` until a redemption handler is registered.
    pub redeemer: Option<Arc<dyn RedemptionHandler>>,
    pub dispenser: Option<Arc<Dispenser>>,
    /// `None` when the faucet is disabled.
    pub faucet: Option<Arc<Faucet>>,
}

impl AppState {
    pub fn new(cipher: Arc<Cipher>) -> Self {
        Self {
            cipher,
            redeemer: None,
            dispenser: None,
            faucet: None,
        }
    }

    /// Serve redemptions, votes and health from `dispenser`.
    pub fn with_dispenser(mut self, dispenser: Arc<Dispenser>) -> Self {
        self.redeemer = Some(dispenser.clone());
        self.dispenser = Some(dispenser);
        self
    }

    pub fn with_redeemer(mut self, redeemer: Arc<dyn RedemptionHandler>) -> Self {
        self.redeemer = Some(redeemer);
        self
    }

    pub fn with_faucet(mut self, faucet: Faucet) -> Self {
        self.faucet = Some(Arc::new(faucet));
        self
    }
}
