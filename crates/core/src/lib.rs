//! Protocol core of the ballot dispenser.
//!
//! The [`Dispenser`] coordinator answers join requests and payments from the
//! ledger's event feed, redeems signed tokens for ballots and drives the
//! round [`Lifecycle`] from block-height deadlines ([`BlockClock`]).

pub mod clock;
pub mod coordinator;
pub mod lifecycle;
pub mod params;
pub mod redemption;
pub mod state;
pub mod tally;

pub use clock::BlockClock;
pub use coordinator::{Dispenser, JoinOutcome, PaymentOutcome};
pub use lifecycle::Lifecycle;
pub use params::MixParams;
pub use redemption::RedemptionPayload;
pub use state::AcceptedClients;
pub use tally::{VoteCount, VoteTally};
