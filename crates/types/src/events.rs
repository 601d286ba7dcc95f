//! Decoded contract events delivered by the chain event feed.

use serde::{Deserialize, Serialize};

use crate::{uint, Address};

/// A client asked to join the current round with a blind token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub client: Address,
    pub mix_token: String,
}

/// Funds transferred by a client to the dispenser contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub client: Address,
    /// Amount in wei.
    #[serde(deserialize_with = "uint::deserialize_u128")]
    pub value: u128,
}

/// Transfer of voting ballots, counted as votes for `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotTransfer {
    pub to: Address,
    #[serde(deserialize_with = "uint::deserialize_u64")]
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "args", rename_all = "snake_case")]
pub enum ChainEvent {
    JoinRequested(JoinRequest),
    FundsTransferred(Payment),
    BallotTransfer(BallotTransfer),
}
