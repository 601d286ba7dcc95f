//! Validated descriptor of one mixing round.
//!
//! The ledger reports the current round as a positional tuple:
//!
//! | index | field |
//! |---|---|
//! | 0 | deposit (wei) |
//! | 1 | join deadline offset (blocks) |
//! | 2 | warranty deadline offset |
//! | 3 | unblinding deadline offset |
//! | 4 | distribution deadline offset |
//! | 5 | minimum block amount |
//! | 6 | participant count |
//! | 7 | is valid |
//!
//! Integers may arrive as JSON numbers, decimal strings or `0x` hex strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{uint, DispenserError, LifecycleState, Result};

const FIELD_NAMES: [&str; 8] = [
    "deposit",
    "deadlineJoin",
    "deadlineWarranty",
    "deadlineUnblind",
    "deadlineDistribute",
    "minBlockAmount",
    "participantCount",
    "isValid",
];

/// One of the four sequential round deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deadline {
    Join,
    Warranty,
    Unblind,
    Distribute,
}

impl Deadline {
    pub const ALL: [Deadline; 4] = [
        Deadline::Join,
        Deadline::Warranty,
        Deadline::Unblind,
        Deadline::Distribute,
    ];

    /// Lifecycle state entered once this deadline has passed.
    pub fn next_state(self) -> LifecycleState {
        match self {
            Deadline::Join => LifecycleState::ProvidingWarranties,
            Deadline::Warranty => LifecycleState::AwaitingUnblinding,
            Deadline::Unblind => LifecycleState::DistributingFunds,
            Deadline::Distribute => LifecycleState::Done,
        }
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deadline::Join => write!(f, "join"),
            Deadline::Warranty => write!(f, "warranty"),
            Deadline::Unblind => write!(f, "unblind"),
            Deadline::Distribute => write!(f, "distribute"),
        }
    }
}

/// Immutable parameters of a mixing round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixRound {
    /// Required deposit in wei.
    pub deposit: u128,
    pub deadline_join: u64,
    pub deadline_warranty: u64,
    pub deadline_unblind: u64,
    pub deadline_distribute: u64,
    pub min_block_amount: u64,
    pub participant_count: u64,
    pub is_valid: bool,
}

impl MixRound {
    /// Build a round from the ledger's positional descriptor.
    ///
    /// Missing fields, wrong types and negative numbers are rejected; nothing
    /// is defaulted.
    pub fn from_raw(raw: &[Value]) -> Result<Self> {
        if raw.len() < FIELD_NAMES.len() {
            return Err(DispenserError::Validation(format!(
                "round descriptor has {} fields, expected {}",
                raw.len(),
                FIELD_NAMES.len()
            )));
        }

        Ok(Self {
            deposit: uint_field(raw, 0)?,
            deadline_join: block_field(raw, 1)?,
            deadline_warranty: block_field(raw, 2)?,
            deadline_unblind: block_field(raw, 3)?,
            deadline_distribute: block_field(raw, 4)?,
            min_block_amount: block_field(raw, 5)?,
            participant_count: block_field(raw, 6)?,
            is_valid: raw[7].as_bool().ok_or_else(|| type_error(7, "a boolean"))?,
        })
    }

    /// Offset of a deadline from the round start: the running sum of the
    /// offsets up to and including it.
    pub fn cumulative_offset(&self, deadline: Deadline) -> u64 {
        let offsets = [
            self.deadline_join,
            self.deadline_warranty,
            self.deadline_unblind,
            self.deadline_distribute,
        ];
        let upto = match deadline {
            Deadline::Join => 1,
            Deadline::Warranty => 2,
            Deadline::Unblind => 3,
            Deadline::Distribute => 4,
        };
        offsets[..upto].iter().fold(0u64, |acc, o| acc.saturating_add(*o))
    }
}

fn type_error(index: usize, expected: &str) -> DispenserError {
    DispenserError::Validation(format!(
        "round descriptor field '{}' must be {}",
        FIELD_NAMES[index], expected
    ))
}

fn uint_field(raw: &[Value], index: usize) -> Result<u128> {
    uint::parse(&raw[index]).ok_or_else(|| type_error(index, "a non-negative integer"))
}

fn block_field(raw: &[Value], index: usize) -> Result<u64> {
    let value = uint_field(raw, index)?;
    u64::try_from(value).map_err(|_| type_error(index, "a block count"))
}
