//! Transaction submission and confirmation.
//!
//! Submission resolves once the backend accepts a transaction for broadcast.
//! Confirmation polls for a receipt at a fixed interval with a hard attempt
//! ceiling. Running out of attempts yields [`Confirmation::Pending`]: the
//! transaction may or may not end up on the ledger.

use std::sync::Arc;
use std::time::Duration;

use dispenser_types::{Address, TxHash};
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::transaction::{ContractCall, TransactionReceipt, TransactionRequest, TxOptions, TxPayload};

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of receipt polls before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Outcome of waiting for a transaction to be mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed(TransactionReceipt),
    /// Gave up polling; inclusion is unknown.
    Pending { attempts: u32 },
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed(_))
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            Confirmation::Confirmed(receipt) => Some(receipt),
            Confirmation::Pending { .. } => None,
        }
    }
}

/// Sends transactions from the operator's address and waits for them.
#[derive(Clone)]
pub struct TransactionSubmitter {
    ledger: Arc<dyn Ledger>,
    operator: Address,
    policy: ConfirmationPolicy,
}

impl TransactionSubmitter {
    pub fn new(ledger: Arc<dyn Ledger>, operator: Address) -> Self {
        Self::with_policy(ledger, operator, ConfirmationPolicy::default())
    }

    pub fn with_policy(ledger: Arc<dyn Ledger>, operator: Address, policy: ConfirmationPolicy) -> Self {
        Self {
            ledger,
            operator,
            policy,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Submit a contract call as the operator.
    pub async fn submit(&self, call: ContractCall, options: TxOptions) -> Result<TxHash> {
        let name = call.name();
        let request = TransactionRequest {
            from: self.operator.clone(),
            payload: TxPayload::Call { call },
            gas: options.gas,
            value: options.value,
        };
        let hash = self.send(request).await?;
        debug!("Submitted {} as {}", name, hash);
        Ok(hash)
    }

    /// Submit a plain value transfer as the operator.
    pub async fn transfer(&self, to: Address, value: u128, gas: Option<u64>) -> Result<TxHash> {
        let request = TransactionRequest {
            from: self.operator.clone(),
            payload: TxPayload::Transfer { to: to.clone() },
            gas,
            value: Some(value),
        };
        let hash = self.send(request).await?;
        debug!("Submitted transfer of {} wei to {} as {}", value, to, hash);
        Ok(hash)
    }

    async fn send(&self, request: TransactionRequest) -> Result<TxHash> {
        self.ledger.send_transaction(request).await.map_err(|e| {
            error!("Ledger rejected transaction: {}", e);
            match e {
                LedgerError::SubmissionFailed(msg) => LedgerError::SubmissionFailed(msg),
                other => LedgerError::SubmissionFailed(other.to_string()),
            }
        })
    }

    /// Poll for the receipt of `hash` with the configured policy.
    pub async fn confirm(&self, hash: &TxHash) -> Result<Confirmation> {
        self.confirm_with(hash, self.policy).await
    }

    pub async fn confirm_with(&self, hash: &TxHash, policy: ConfirmationPolicy) -> Result<Confirmation> {
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let receipt = self
                .ledger
                .transaction_receipt(hash)
                .await
                .map_err(|e| LedgerError::QueryFailed(format!("receipt for {}: {}", hash, e)))?;

            if let Some(receipt) = receipt {
                if receipt.success == Some(false) {
                    warn!("Transaction {} was mined but reverted", hash);
                }
                debug!(
                    "Transaction {} mined in block {} after {} polls",
                    hash, receipt.block_number, attempt
                );
                return Ok(Confirmation::Confirmed(receipt));
            }

            if attempt < max_attempts {
                tokio::time::sleep(policy.poll_interval).await;
            }
        }

        error!("Timed out looking for receipt for transaction {}", hash);
        Ok(Confirmation::Pending {
            attempts: max_attempts,
        })
    }

    /// Submit a call and wait for it to be mined.
    pub async fn submit_and_confirm(
        &self,
        call: ContractCall,
        options: TxOptions,
    ) -> Result<(TxHash, Confirmation)> {
        let name = call.name();
        let hash = self.submit(call, options).await?;
        let confirmation = self.confirm(&hash).await?;
        match &confirmation {
            Confirmation::Confirmed(receipt) => {
                info!("{} ({}) mined in block {}", name, hash, receipt.block_number)
            }
            Confirmation::Pending { attempts } => {
                warn!("{} ({}) still unconfirmed after {} polls", name, hash, attempts)
            }
        }
        Ok((hash, confirmation))
    }
}
