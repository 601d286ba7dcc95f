use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the dispenser within one mixing round.
///
/// The declaration order is the forward order of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing is known yet; only used at boot.
    Unknown,
    NoActiveRound,
    AwaitingTransfers,
    ProvidingWarranties,
    AwaitingUnblinding,
    DistributingFunds,
    Done,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 7] = [
        LifecycleState::Unknown,
        LifecycleState::NoActiveRound,
        LifecycleState::AwaitingTransfers,
        LifecycleState::ProvidingWarranties,
        LifecycleState::AwaitingUnblinding,
        LifecycleState::DistributingFunds,
        LifecycleState::Done,
    ];

    /// The single forward successor, if any.
    pub fn successor(self) -> Option<LifecycleState> {
        match self {
            LifecycleState::NoActiveRound => Some(LifecycleState::AwaitingTransfers),
            LifecycleState::AwaitingTransfers => Some(LifecycleState::ProvidingWarranties),
            LifecycleState::ProvidingWarranties => Some(LifecycleState::AwaitingUnblinding),
            LifecycleState::AwaitingUnblinding => Some(LifecycleState::DistributingFunds),
            LifecycleState::DistributingFunds => Some(LifecycleState::Done),
            LifecycleState::Unknown | LifecycleState::Done => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unknown => "unknown",
            LifecycleState::NoActiveRound => "no_active_round",
            LifecycleState::AwaitingTransfers => "awaiting_transfers",
            LifecycleState::ProvidingWarranties => "providing_warranties",
            LifecycleState::AwaitingUnblinding => "awaiting_unblinding",
            LifecycleState::DistributingFunds => "distributing_funds",
            LifecycleState::Done => "done",
        };
        write!(f, "{}", s)
    }
}
