use std::collections::BTreeMap;

use dispenser_types::{Address, BallotTransfer};
use serde::Serialize;

/// Accumulated ballot transfers per receiving address.
#[derive(Debug, Default)]
pub struct VoteTally {
    votes: BTreeMap<Address, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteCount {
    pub address: Address,
    pub amount: u64,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, transfer: &BallotTransfer) {
        let total = self.votes.entry(transfer.to.clone()).or_insert(0);
        *total = total.saturating_add(transfer.value);
    }

    pub fn get(&self, address: &Address) -> u64 {
        self.votes.get(address).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Counts ordered by address.
    pub fn counts(&self) -> Vec<VoteCount> {
        self.votes
            .iter()
            .map(|(address, amount)| VoteCount {
                address: address.clone(),
                amount: *amount,
            })
            .collect()
    }
}
