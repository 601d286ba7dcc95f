//! Per-round client bookkeeping.

use std::collections::{HashMap, HashSet};

use dispenser_types::Address;

/// Clients accepted into the current round that have not paid yet, with the
/// blind token each one submitted.
///
/// A slot is reserved before the acceptance is sent to the ledger and
/// committed once it went through, so concurrent joins cannot overrun the
/// capacity. Reserved clients are not accepted yet.
#[derive(Debug)]
pub struct AcceptedClients {
    tokens: HashMap<Address, String>,
    reserved: HashSet<Address>,
    capacity: usize,
}

impl AcceptedClients {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: HashMap::new(),
            reserved: HashSet::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn occupied(&self) -> usize {
        self.tokens.len()
            + self
                .reserved
                .iter()
                .filter(|client| !self.tokens.contains_key(*client))
                .count()
    }

    /// Hold a slot for `client`. Returns `false` when the map is full. A
    /// client that already holds a slot keeps it.
    pub fn reserve(&mut self, client: &Address) -> bool {
        let known = self.tokens.contains_key(client) || self.reserved.contains(client);
        if !known && self.occupied() >= self.capacity {
            return false;
        }
        self.reserved.insert(client.clone());
        true
    }

    /// Turn a reservation into an acceptance. Returns `false` when the
    /// reservation is gone, e.g. because the map was cleared for a new round.
    /// A repeated join replaces the earlier token.
    pub fn commit(&mut self, client: Address, token: String) -> bool {
        if !self.reserved.remove(&client) {
            return false;
        }
        self.tokens.insert(client, token);
        true
    }

    /// Give back a reservation whose acceptance never reached the ledger.
    pub fn release(&mut self, client: &Address) {
        self.reserved.remove(client);
    }

    pub fn token(&self, client: &Address) -> Option<&str> {
        self.tokens.get(client).map(String::as_str)
    }

    pub fn remove(&mut self, client: &Address) -> Option<String> {
        self.tokens.remove(client)
    }

    /// Forget every acceptance and reservation, for a new round.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.reserved.clear();
    }
}
