//! Error taxonomy of the dispenser.

use thiserror::Error;

use crate::LifecycleState;

pub type Result<T, E = DispenserError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DispenserError {
    /// Malformed external input: payloads, round descriptors, key material.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("initial state requested while already in state {0}")]
    AlreadyInitialized(LifecycleState),

    #[error("ledger rejected submission: {0}")]
    ChainSubmission(String),

    #[error("ledger query failed: {0}")]
    ChainQuery(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),
}

impl DispenserError {
    /// State errors indicate a programming or operational fault rather than bad input.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            DispenserError::InvalidTransition { .. } | DispenserError::AlreadyInitialized(_)
        )
    }
}
