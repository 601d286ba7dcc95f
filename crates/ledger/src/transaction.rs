//! Transaction requests and receipts.

use dispenser_types::{Address, TxHash};
use serde::{Deserialize, Serialize};

/// Calls on the dispenser and voting-pass contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum ContractCall {
    #[serde(rename_all = "camelCase")]
    StartMix {
        deposit: u128,
        deadline_join: u64,
        deadline_warranty: u64,
        deadline_unblind: u64,
        deadline_distribute: u64,
        confirmations: u64,
    },
    AcceptJoin {
        client: Address,
        signature: String,
        accepted: bool,
    },
    RejectJoin {
        client: Address,
    },
    ProvideWarranty {
        client: Address,
        warranty: String,
    },
    #[serde(rename_all = "camelCase")]
    GiveSeededBallot {
        anonymous_address: String,
        nonce: String,
    },
    /// Voting-pass contract: hand a pass to `address`.
    GivePass {
        address: Address,
    },
}

impl ContractCall {
    pub fn name(&self) -> &'static str {
        match self {
            ContractCall::StartMix { .. } => "startMix",
            ContractCall::AcceptJoin { .. } => "acceptJoin",
            ContractCall::RejectJoin { .. } => "rejectJoin",
            ContractCall::ProvideWarranty { .. } => "provideWarranty",
            ContractCall::GiveSeededBallot { .. } => "giveSeededBallot",
            ContractCall::GivePass { .. } => "give",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxPayload {
    Call { call: ContractCall },
    Transfer { to: Address },
}

/// Optional transaction parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub gas: Option<u64>,
    /// Value attached to the transaction, in wei.
    pub value: Option<u128>,
}

impl TxOptions {
    pub fn gas(gas: u64) -> Self {
        Self {
            gas: Some(gas),
            value: None,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = Some(value);
        self
    }
}

/// A fully specified transaction, sent from the operator's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub payload: TxPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u128>,
}

impl TransactionRequest {
    pub fn call(&self) -> Option<&ContractCall> {
        match &self.payload {
            TxPayload::Call { call } => Some(call),
            TxPayload::Transfer { .. } => None,
        }
    }
}

/// Backend confirmation that a transaction was included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `Some(false)` when the transaction was included but reverted.
    pub success: Option<bool>,
}
