//! In-memory ledger for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use dispenser_types::{ChainEvent, TxHash};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::transaction::{ContractCall, TransactionReceipt, TransactionRequest};

#[derive(Default)]
struct MockState {
    submitted: Vec<(TxHash, TransactionRequest)>,
    next_hash: u64,
    receipt_polls: HashMap<TxHash, u32>,
    mined_in: HashMap<TxHash, u64>,
    receipt_delay: u32,
    never_mine: bool,
    reject_submissions: bool,
    fail_queries: bool,
    mix: Vec<Value>,
    block: u64,
    events: Vec<(u64, ChainEvent)>,
}

/// Records every submitted transaction and answers queries from settable state.
///
/// A submitted `startMix` call replaces the round descriptor, mirroring what
/// the contract does.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receipts for new transactions appear after this many empty polls.
    pub async fn set_receipt_delay(&self, polls: u32) {
        self.state.lock().await.receipt_delay = polls;
    }

    pub async fn set_never_mine(&self, never: bool) {
        self.state.lock().await.never_mine = never;
    }

    pub async fn set_reject_submissions(&self, reject: bool) {
        self.state.lock().await.reject_submissions = reject;
    }

    pub async fn set_fail_queries(&self, fail: bool) {
        self.state.lock().await.fail_queries = fail;
    }

    pub async fn set_current_mix(&self, mix: Vec<Value>) {
        self.state.lock().await.mix = mix;
    }

    pub async fn set_block_number(&self, block: u64) {
        self.state.lock().await.block = block;
    }

    pub async fn advance_blocks(&self, count: u64) -> u64 {
        let mut state = self.state.lock().await;
        state.block += count;
        state.block
    }

    /// Record an event as emitted in `block`.
    pub async fn emit_at(&self, block: u64, event: ChainEvent) {
        self.state.lock().await.events.push((block, event));
    }

    pub async fn submitted(&self) -> Vec<TransactionRequest> {
        self.state
            .lock()
            .await
            .submitted
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub async fn submitted_calls(&self) -> Vec<ContractCall> {
        self.state
            .lock()
            .await
            .submitted
            .iter()
            .filter_map(|(_, request)| request.call().cloned())
            .collect()
    }

    pub async fn receipt_polls(&self, hash: &TxHash) -> u32 {
        self.state
            .lock()
            .await
            .receipt_polls
            .get(hash)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state.lock().await;
        if state.reject_submissions {
            return Err(LedgerError::SubmissionFailed(
                "mock ledger rejects submissions".to_string(),
            ));
        }

        state.next_hash += 1;
        let hash = TxHash(format!("0x{:064x}", state.next_hash));

        if let Some(ContractCall::StartMix {
            deposit,
            deadline_join,
            deadline_warranty,
            deadline_unblind,
            deadline_distribute,
            ..
        }) = request.call()
        {
            state.mix = vec![
                json!(deposit.to_string()),
                json!(deadline_join),
                json!(deadline_warranty),
                json!(deadline_unblind),
                json!(deadline_distribute),
                json!(0),
                json!(0),
                json!(true),
            ];
        }

        let block = state.block;
        state.mined_in.insert(hash.clone(), block);
        state.submitted.push((hash.clone(), request));
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>> {
        let mut state = self.state.lock().await;
        let polls = {
            let polls = state.receipt_polls.entry(hash.clone()).or_insert(0);
            *polls += 1;
            *polls
        };

        if state.fail_queries {
            return Err(LedgerError::QueryFailed("mock ledger query failure".to_string()));
        }
        if state.never_mine || polls <= state.receipt_delay {
            return Ok(None);
        }

        Ok(state.mined_in.get(hash).map(|block| TransactionReceipt {
            transaction_hash: hash.clone(),
            block_number: *block,
            success: Some(true),
        }))
    }

    async fn current_mix(&self) -> Result<Vec<Value>> {
        let state = self.state.lock().await;
        if state.fail_queries {
            return Err(LedgerError::QueryFailed("mock ledger query failure".to_string()));
        }
        Ok(state.mix.clone())
    }

    async fn block_number(&self) -> Result<u64> {
        let state = self.state.lock().await;
        if state.fail_queries {
            return Err(LedgerError::QueryFailed("mock ledger query failure".to_string()));
        }
        Ok(state.block)
    }

    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<ChainEvent>> {
        let state = self.state.lock().await;
        if state.fail_queries {
            return Err(LedgerError::QueryFailed("mock ledger query failure".to_string()));
        }
        Ok(state
            .events
            .iter()
            .filter(|(block, _)| (from_block..=to_block).contains(block))
            .map(|(_, event)| event.clone())
            .collect())
    }
}
