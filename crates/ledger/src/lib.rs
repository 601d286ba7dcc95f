//! Ledger collaborator boundary.
//!
//! - [`Ledger`]: submission, receipt lookup, round descriptor, block height and
//!   decoded events of the backing chain
//! - [`TransactionSubmitter`]: submit calls and transfers as the operator and
//!   poll for their inclusion with bounded retries
//! - [`RpcLedger`]: JSON-RPC client for a ledger gateway
//! - [`feed`]: background pollers turning the ledger into block and event streams
//! - `MockLedger`: in-memory ledger for tests, behind the `mock` feature

pub mod error;
pub mod feed;
pub mod ledger;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rpc;
pub mod submitter;
pub mod transaction;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLedger;
pub use rpc::{RpcConfig, RpcLedger};
pub use submitter::{Confirmation, ConfirmationPolicy, TransactionSubmitter};
pub use transaction::{ContractCall, TransactionReceipt, TransactionRequest, TxOptions, TxPayload};
