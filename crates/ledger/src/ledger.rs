use async_trait::async_trait;
use dispenser_types::{ChainEvent, TxHash};
use serde_json::Value;

use crate::error::Result;
use crate::transaction::{TransactionReceipt, TransactionRequest};

/// The chain as seen by the dispenser.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Hand a transaction to the backend; resolves once it is accepted for
    /// broadcast, not once it is mined.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash>;

    /// `None` while the transaction is not yet included.
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>>;

    /// Positional descriptor of the current round, as stored by the contract.
    async fn current_mix(&self) -> Result<Vec<Value>>;

    async fn block_number(&self) -> Result<u64>;

    /// Decoded dispenser and ballot events in the inclusive block range.
    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<ChainEvent>>;

    /// Whether a round started earlier is still running. No backend derives
    /// this from history yet, so the default always reports a fresh start.
    async fn is_round_ongoing(&self) -> Result<bool> {
        Ok(false)
    }
}
