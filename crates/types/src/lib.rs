//! Shared types for the ballot dispenser.
//!
//! Addresses, transaction handles, the lifecycle states, the validated mix
//! round descriptor, the decoded contract events and the error taxonomy used
//! across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod events;
pub mod lifecycle;
pub mod mix_round;
mod uint;

pub use error::{DispenserError, Result};
pub use events::{BallotTransfer, ChainEvent, JoinRequest, Payment};
pub use lifecycle::LifecycleState;
pub use mix_round::{Deadline, MixRound};

/// Delimiter between the components of a redemption payload and of the
/// message that is signed for it (`<address>-<nonce>`).
pub const PAYLOAD_DELIMITER: char = '-';

/// A ledger account address, kept in the textual form the chain reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

/// Handle of a transaction accepted for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        TxHash(s)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        TxHash(s.to_string())
    }
}
