//! Protocol coordinator.
//!
//! [`Dispenser`] owns the lifecycle, the current round, the accepted-client
//! map and the vote tally. All mutation goes through its methods. Locks are
//! never held across a ledger call, except that the accepted-client check and
//! removal for a payment happen under one write lock so an acceptance is
//! consumed at most once.

use std::sync::Arc;

use dispenser_crypto::Cipher;
use dispenser_ledger::{Confirmation, ContractCall, TransactionSubmitter, TxOptions};
use dispenser_types::{
    Address, BallotTransfer, ChainEvent, Deadline, DispenserError, JoinRequest, LifecycleState, MixRound,
    Payment, Result,
};
use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::BlockClock;
use crate::lifecycle::Lifecycle;
use crate::params::MixParams;
use crate::redemption::RedemptionPayload;
use crate::state::AcceptedClients;
use crate::tally::{VoteCount, VoteTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Accepted,
    Rejected,
}

/// What became of a payment event. Only `Warranted` touches the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Warranted,
    DepositsClosed,
    NoRound,
    NotAccepted,
    Insufficient,
}

pub struct Dispenser {
    cipher: Arc<Cipher>,
    submitter: TransactionSubmitter,
    blocks: broadcast::Sender<u64>,
    params: MixParams,
    lifecycle: RwLock<Lifecycle>,
    round: RwLock<Option<MixRound>>,
    accepted: RwLock<AcceptedClients>,
    tally: RwLock<VoteTally>,
}

impl Dispenser {
    pub fn new(
        cipher: Arc<Cipher>,
        submitter: TransactionSubmitter,
        blocks: broadcast::Sender<u64>,
        params: MixParams,
    ) -> Self {
        let accepted = AcceptedClients::with_capacity(params.max_accepted_clients);
        Self {
            cipher,
            submitter,
            blocks,
            params,
            lifecycle: RwLock::new(Lifecycle::new()),
            round: RwLock::new(None),
            accepted: RwLock::new(accepted),
            tally: RwLock::new(VoteTally::new()),
        }
    }

    pub fn cipher(&self) -> &Arc<Cipher> {
        &self.cipher
    }

    pub fn params(&self) -> &MixParams {
        &self.params
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.read().await.current_state()
    }

    pub async fn is_round_active(&self) -> bool {
        self.lifecycle.read().await.is_round_active()
    }

    pub async fn current_round(&self) -> Option<MixRound> {
        self.round.read().await.clone()
    }

    pub async fn accepted_count(&self) -> usize {
        self.accepted.read().await.len()
    }

    pub async fn is_accepted(&self, client: &Address) -> bool {
        self.accepted.read().await.token(client).is_some()
    }

    pub async fn votes(&self) -> Vec<VoteCount> {
        self.tally.read().await.counts()
    }

    /// Seed the lifecycle and start a round unless the ledger reports one
    /// already running. Returns the deadline driver of the started round.
    pub async fn start(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>> {
        self.lifecycle.write().await.determine_initial_state()?;

        if self.submitter.ledger().is_round_ongoing().await? {
            // No recovery path: state of a running round is not reconstructed.
            warn!("Ledger reports a round in progress; not starting a new one");
            return Ok(None);
        }

        self.start_round().await.map(Some)
    }

    /// Submit `startMix`, load the resulting round descriptor and arm the
    /// four deadlines. Nothing is submitted unless the lifecycle can move to
    /// `AwaitingTransfers`.
    async fn start_round(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        self.lifecycle
            .read()
            .await
            .check(LifecycleState::AwaitingTransfers)?;

        let p = &self.params;
        info!(
            "Starting round: deposit={} wei, deadlines={}/{}/{}/{} blocks",
            p.deposit, p.deadline_join, p.deadline_warranty, p.deadline_unblind, p.deadline_distribute
        );

        let call = ContractCall::StartMix {
            deposit: p.deposit,
            deadline_join: p.deadline_join,
            deadline_warranty: p.deadline_warranty,
            deadline_unblind: p.deadline_unblind,
            deadline_distribute: p.deadline_distribute,
            confirmations: p.confirmations,
        };
        let (hash, confirmation) = self
            .submitter
            .submit_and_confirm(call, TxOptions::gas(p.start_gas))
            .await?;
        if !confirmation.is_confirmed() {
            warn!("Round start {} not confirmed; reading round descriptor anyway", hash);
        }

        let raw = self.submitter.ledger().current_mix().await?;
        let round = MixRound::from_raw(&raw)?;
        if !round.is_valid {
            return Err(DispenserError::Validation(
                "ledger reports the current round as invalid".to_string(),
            ));
        }

        let clock = BlockClock::new(self.blocks.clone());
        let schedule = clock.schedule(&round);

        self.accepted.write().await.clear();
        *self.round.write().await = Some(round);
        self.lifecycle
            .write()
            .await
            .advance(LifecycleState::AwaitingTransfers)?;

        let dispenser = Arc::clone(self);
        Ok(tokio::spawn(async move {
            dispenser.drive_deadlines(schedule).await;
        }))
    }

    async fn drive_deadlines(&self, schedule: Vec<(Deadline, BoxFuture<'static, Result<u64>>)>) {
        for (deadline, fired) in schedule {
            let height = match fired.await {
                Ok(height) => height,
                Err(e) => {
                    error!("The {} deadline will not fire: {}", deadline, e);
                    return;
                }
            };

            info!("The {} deadline passed at block {}", deadline, height);
            if let Err(e) = self.lifecycle.write().await.advance(deadline.next_state()) {
                error!("Failed to advance lifecycle after the {} deadline: {}", deadline, e);
                return;
            }
        }
        info!("Round finished");
    }

    /// Handle each incoming event on its own task until the feed closes.
    pub fn spawn_event_loop(self: &Arc<Self>, mut events: mpsc::Receiver<ChainEvent>) -> JoinHandle<()> {
        let dispenser = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let dispenser = Arc::clone(&dispenser);
                tokio::spawn(async move {
                    if let Err(e) = dispenser.handle_event(event).await {
                        error!("Failed to handle chain event: {}", e);
                    }
                });
            }
            info!("Event feed closed");
        })
    }

    pub async fn handle_event(&self, event: ChainEvent) -> Result<()> {
        match event {
            ChainEvent::JoinRequested(join) => self.handle_join(join).await.map(|_| ()),
            ChainEvent::FundsTransferred(payment) => self.handle_payment(payment).await.map(|_| ()),
            ChainEvent::BallotTransfer(transfer) => {
                self.record_vote(&transfer).await;
                Ok(())
            }
        }
    }

    pub async fn record_vote(&self, transfer: &BallotTransfer) {
        debug!("Ballot transfer of {} to {}", transfer.value, transfer.to);
        self.tally.write().await.record(transfer);
    }

    /// Accept or reject a join request. Exactly one of `acceptJoin` and
    /// `rejectJoin` is submitted and waited for.
    pub async fn handle_join(&self, join: JoinRequest) -> Result<JoinOutcome> {
        info!("Join request from {}", join.client);

        let admitted = self.lifecycle.read().await.can_accept_join_request();
        let reserved = admitted && self.accepted.write().await.reserve(&join.client);

        if !reserved {
            if admitted {
                warn!(
                    "Accepted-client limit of {} reached, rejecting {}",
                    self.params.max_accepted_clients, join.client
                );
            } else {
                info!("Joins are closed, rejecting {}", join.client);
            }
            self.submitter
                .submit_and_confirm(
                    ContractCall::RejectJoin {
                        client: join.client.clone(),
                    },
                    TxOptions::default(),
                )
                .await?;
            return Ok(JoinOutcome::Rejected);
        }

        if let Err(e) = self.submit_acceptance(&join).await {
            self.accepted.write().await.release(&join.client);
            return Err(e);
        }

        if !self
            .accepted
            .write()
            .await
            .commit(join.client.clone(), join.mix_token)
        {
            warn!("Round changed while accepting {}; acceptance not recorded", join.client);
        }
        Ok(JoinOutcome::Accepted)
    }

    async fn submit_acceptance(&self, join: &JoinRequest) -> Result<()> {
        let args = serde_json::to_string(join)
            .map_err(|e| DispenserError::Validation(format!("join arguments: {}", e)))?;
        let signature = self.cipher.sign_utf8(&args)?;

        let call = ContractCall::AcceptJoin {
            client: join.client.clone(),
            signature,
            accepted: true,
        };
        let (hash, confirmation) = self
            .submitter
            .submit_and_confirm(call, TxOptions::default())
            .await?;
        if let Confirmation::Pending { attempts } = confirmation {
            warn!(
                "Acceptance of {} ({}) unknown after {} polls, recording it anyway",
                join.client, hash, attempts
            );
        }
        Ok(())
    }

    /// Warrant the blind token of an accepted client that paid the deposit.
    ///
    /// Payments that fail a check are dropped without a refund and leave
    /// the acceptance in place.
    pub async fn handle_payment(&self, payment: Payment) -> Result<PaymentOutcome> {
        info!("Payment of {} wei from {}", payment.value, payment.client);

        if !self.lifecycle.read().await.can_accept_deposit() {
            info!("Deposits are closed, ignoring payment from {}", payment.client);
            return Ok(PaymentOutcome::DepositsClosed);
        }

        let deposit = match self.round.read().await.as_ref() {
            Some(round) => round.deposit,
            None => {
                warn!("No active round, ignoring payment from {}", payment.client);
                return Ok(PaymentOutcome::NoRound);
            }
        };

        let token = {
            let mut accepted = self.accepted.write().await;
            let token = match accepted.token(&payment.client) {
                None => {
                    warn!("Payment from {} who was never accepted", payment.client);
                    return Ok(PaymentOutcome::NotAccepted);
                }
                Some(_) if payment.value < deposit => {
                    warn!(
                        "Payment of {} wei from {} is below the deposit of {} wei",
                        payment.value, payment.client, deposit
                    );
                    return Ok(PaymentOutcome::Insufficient);
                }
                Some(token) => token.to_string(),
            };
            accepted.remove(&payment.client);
            token
        };

        let warranty = self.cipher.sign(&token)?;
        self.submitter
            .submit_and_confirm(
                ContractCall::ProvideWarranty {
                    client: payment.client.clone(),
                    warranty,
                },
                TxOptions::default(),
            )
            .await?;
        info!("Provided warranty to {}", payment.client);
        Ok(PaymentOutcome::Warranted)
    }

    /// Redeem a signed token for a ballot.
    ///
    /// `Ok(false)` for malformed payloads and bad signatures; ledger failures
    /// are errors. The ballot transaction is confirmed in the background.
    pub async fn redeem(&self, payload: &[u8]) -> Result<bool> {
        let payload = match RedemptionPayload::from_bytes(payload) {
            Ok(payload) => payload,
            Err(e) => {
                info!("Rejected redemption: {}", e);
                return Ok(false);
            }
        };

        if !self
            .cipher
            .verify(&payload.signed_message(), &payload.signature)
        {
            warn!("Invalid redemption signature, ignoring");
            return Ok(false);
        }

        // Read live: the round may have rolled over since startup.
        let round = MixRound::from_raw(&self.submitter.ledger().current_mix().await?)?;

        let call = ContractCall::GiveSeededBallot {
            anonymous_address: payload.anonymous_address.clone(),
            nonce: payload.nonce.clone(),
        };
        let options = TxOptions::gas(self.params.ballot_gas).with_value(round.deposit);
        let hash = self.submitter.submit(call, options).await?;
        info!(
            "Issuing ballot to {} with nonce {} ({})",
            payload.anonymous_address, payload.nonce, hash
        );

        let submitter = self.submitter.clone();
        tokio::spawn(async move {
            match submitter.confirm(&hash).await {
                Ok(Confirmation::Confirmed(receipt)) => {
                    info!("Ballot {} mined in block {}", hash, receipt.block_number)
                }
                Ok(Confirmation::Pending { attempts }) => {
                    warn!("Ballot {} still unconfirmed after {} polls", hash, attempts)
                }
                Err(e) => error!("Could not confirm ballot {}: {}", hash, e),
            }
        });

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispenser_ledger::{ConfirmationPolicy, Ledger, MockLedger};
    use dispenser_types::Address;
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;
    use std::time::Duration;

    struct Harness {
        ledger: Arc<MockLedger>,
        blocks: broadcast::Sender<u64>,
        dispenser: Arc<Dispenser>,
    }

    fn params() -> MixParams {
        MixParams {
            deposit: 100,
            deadline_join: 2,
            deadline_warranty: 2,
            deadline_unblind: 2,
            deadline_distribute: 2,
            max_accepted_clients: 2,
            ..MixParams::default()
        }
    }

    fn harness() -> Harness {
        let key = RsaPrivateKey::new(&mut OsRng, 512).expect("key generation");
        let cipher = Arc::new(Cipher::from_private_key(&key));
        let ledger = Arc::new(MockLedger::new());
        let submitter = TransactionSubmitter::with_policy(
            ledger.clone(),
            Address::from("0xoperator"),
            ConfirmationPolicy {
                poll_interval: Duration::from_millis(1),
                max_attempts: 3,
            },
        );
        let (blocks, _) = broadcast::channel(64);
        let dispenser = Arc::new(Dispenser::new(cipher, submitter, blocks.clone(), params()));
        Harness {
            ledger,
            blocks,
            dispenser,
        }
    }

    fn join(client: &str) -> JoinRequest {
        JoinRequest {
            client: Address::from(client),
            mix_token: "0badc0de".to_string(),
        }
    }

    fn payment(client: &str, value: u128) -> Payment {
        Payment {
            client: Address::from(client),
            value,
        }
    }

    async fn started() -> Harness {
        let h = harness();
        h.dispenser.start().await.unwrap().expect("round started");
        h
    }

    #[tokio::test]
    async fn test_start_submits_round_and_awaits_transfers() {
        let h = started().await;

        let calls = h.ledger.submitted_calls().await;
        assert!(matches!(
            calls.as_slice(),
            [ContractCall::StartMix { deposit: 100, .. }]
        ));
        assert_eq!(h.ledger.submitted().await[0].gas, Some(200_000));
        assert_eq!(
            h.dispenser.lifecycle_state().await,
            LifecycleState::AwaitingTransfers
        );
        assert_eq!(h.dispenser.current_round().await.unwrap().deposit, 100);
    }

    #[tokio::test]
    async fn test_start_twice_is_a_state_error() {
        let h = started().await;
        let err = h.dispenser.start().await.unwrap_err();
        assert!(err.is_state_error());
    }

    #[tokio::test]
    async fn test_start_fails_on_ledger_errors() {
        let h = harness();
        h.ledger.set_reject_submissions(true).await;
        assert!(matches!(
            h.dispenser.start().await,
            Err(DispenserError::ChainSubmission(_))
        ));

        let h = harness();
        h.ledger.set_fail_queries(true).await;
        assert!(h.dispenser.start().await.is_err());
    }

    #[tokio::test]
    async fn test_round_start_in_wrong_state_has_no_side_effects() {
        let h = started().await;
        h.dispenser.handle_join(join("0xclient")).await.unwrap();
        let round = h.dispenser.current_round().await;

        let err = h.dispenser.start_round().await.unwrap_err();
        assert!(matches!(
            err,
            DispenserError::InvalidTransition {
                from: LifecycleState::AwaitingTransfers,
                to: LifecycleState::AwaitingTransfers,
            }
        ));

        let starts = h
            .ledger
            .submitted_calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, ContractCall::StartMix { .. }))
            .count();
        assert_eq!(starts, 1);
        assert!(h.dispenser.is_accepted(&Address::from("0xclient")).await);
        assert_eq!(h.dispenser.current_round().await, round);
    }

    #[tokio::test]
    async fn test_deadlines_drive_lifecycle_to_done() {
        let h = started().await;
        for height in 10..=18 {
            let _ = h.blocks.send(height);
        }

        let mut state = h.dispenser.lifecycle_state().await;
        for _ in 0..100 {
            if state == LifecycleState::Done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            state = h.dispenser.lifecycle_state().await;
        }
        assert_eq!(state, LifecycleState::Done);
    }

    #[tokio::test]
    async fn test_join_is_accepted_and_recorded() {
        let h = started().await;
        let outcome = h.dispenser.handle_join(join("0xclient")).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Accepted);
        assert!(h.dispenser.is_accepted(&Address::from("0xclient")).await);

        let calls = h.ledger.submitted_calls().await;
        match calls.last() {
            Some(ContractCall::AcceptJoin {
                client,
                signature,
                accepted,
            }) => {
                assert_eq!(client, &Address::from("0xclient"));
                assert!(*accepted);
                let args = r#"{"client":"0xclient","mixToken":"0badc0de"}"#;
                assert_eq!(signature, &h.dispenser.cipher().sign_utf8(args).unwrap());
            }
            other => panic!("expected acceptJoin, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_rejected_when_full() {
        let h = started().await;
        h.dispenser.handle_join(join("0xa")).await.unwrap();
        h.dispenser.handle_join(join("0xb")).await.unwrap();

        let outcome = h.dispenser.handle_join(join("0xc")).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Rejected);
        assert!(matches!(
            h.ledger.submitted_calls().await.last(),
            Some(ContractCall::RejectJoin { client }) if client == &Address::from("0xc")
        ));
        assert_eq!(h.dispenser.accepted_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_joins_respect_capacity() {
        let h = started().await;
        h.ledger.set_receipt_delay(3).await;

        let (a, b, c) = tokio::join!(
            h.dispenser.handle_join(join("0xa")),
            h.dispenser.handle_join(join("0xb")),
            h.dispenser.handle_join(join("0xc")),
        );
        let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];
        let accepted = outcomes
            .iter()
            .filter(|o| **o == JoinOutcome::Accepted)
            .count();
        assert_eq!(accepted, 2);
        assert_eq!(h.dispenser.accepted_count().await, 2);

        let calls = h.ledger.submitted_calls().await;
        let accepts = calls
            .iter()
            .filter(|call| matches!(call, ContractCall::AcceptJoin { .. }))
            .count();
        let rejects = calls
            .iter()
            .filter(|call| matches!(call, ContractCall::RejectJoin { .. }))
            .count();
        assert_eq!((accepts, rejects), (2, 1));
    }

    #[tokio::test]
    async fn test_failed_acceptance_frees_its_slot() {
        let h = started().await;
        h.dispenser.handle_join(join("0xa")).await.unwrap();

        h.ledger.set_reject_submissions(true).await;
        assert!(h.dispenser.handle_join(join("0xb")).await.is_err());
        assert!(!h.dispenser.is_accepted(&Address::from("0xb")).await);

        h.ledger.set_reject_submissions(false).await;
        let outcome = h.dispenser.handle_join(join("0xc")).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_join_pending_confirmation_still_recorded() {
        let h = started().await;
        h.ledger.set_never_mine(true).await;
        let outcome = h.dispenser.handle_join(join("0xclient")).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Accepted);
        assert!(h.dispenser.is_accepted(&Address::from("0xclient")).await);
    }

    #[tokio::test]
    async fn test_payment_warrants_token_once() {
        let h = started().await;
        h.dispenser.handle_join(join("0xclient")).await.unwrap();

        let outcome = h.dispenser.handle_payment(payment("0xclient", 100)).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Warranted);
        assert!(!h.dispenser.is_accepted(&Address::from("0xclient")).await);

        let expected = h.dispenser.cipher().sign("0badc0de").unwrap();
        assert!(matches!(
            h.ledger.submitted_calls().await.last(),
            Some(ContractCall::ProvideWarranty { warranty, .. }) if warranty == &expected
        ));

        let again = h.dispenser.handle_payment(payment("0xclient", 100)).await.unwrap();
        assert_eq!(again, PaymentOutcome::NotAccepted);
    }

    #[tokio::test]
    async fn test_insufficient_payment_keeps_acceptance() {
        let h = started().await;
        h.dispenser.handle_join(join("0xclient")).await.unwrap();
        let before = h.ledger.submitted().await.len();

        let outcome = h.dispenser.handle_payment(payment("0xclient", 99)).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Insufficient);
        assert_eq!(h.ledger.submitted().await.len(), before);
        assert!(h.dispenser.is_accepted(&Address::from("0xclient")).await);

        let outcome = h.dispenser.handle_payment(payment("0xclient", 150)).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Warranted);
    }

    #[tokio::test]
    async fn test_payment_without_acceptance_is_dropped() {
        let h = started().await;
        let outcome = h.dispenser.handle_payment(payment("0xstranger", 500)).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::NotAccepted);
        assert_eq!(h.ledger.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_payments_consume_once() {
        let h = started().await;
        h.dispenser.handle_join(join("0xclient")).await.unwrap();

        let a = {
            let d = h.dispenser.clone();
            tokio::spawn(async move { d.handle_payment(payment("0xclient", 100)).await })
        };
        let b = {
            let d = h.dispenser.clone();
            tokio::spawn(async move { d.handle_payment(payment("0xclient", 100)).await })
        };
        let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        let warranted = outcomes
            .iter()
            .filter(|o| **o == PaymentOutcome::Warranted)
            .count();
        assert_eq!(warranted, 1);
    }

    #[tokio::test]
    async fn test_redeem_valid_signature_issues_ballot() {
        let h = started().await;
        let signature = h.dispenser.cipher().sign_utf8("abc-1").unwrap();
        let payload = format!("abc-1-{}", signature);

        assert!(h.dispenser.redeem(payload.as_bytes()).await.unwrap());

        let sent = h.ledger.submitted().await;
        let ballot = sent.last().unwrap();
        assert_eq!(
            ballot.call(),
            Some(&ContractCall::GiveSeededBallot {
                anonymous_address: "abc".to_string(),
                nonce: "1".to_string(),
            })
        );
        assert_eq!(ballot.value, Some(100));
        assert_eq!(ballot.gas, Some(200_000));
    }

    #[tokio::test]
    async fn test_redeem_uses_live_deposit() {
        let h = started().await;
        let mut mix = h.ledger.current_mix().await.unwrap();
        mix[0] = serde_json::json!("250");
        h.ledger.set_current_mix(mix).await;

        let signature = h.dispenser.cipher().sign_utf8("abc-1").unwrap();
        assert!(h
            .dispenser
            .redeem(format!("abc-1-{}", signature).as_bytes())
            .await
            .unwrap());
        assert_eq!(h.ledger.submitted().await.last().unwrap().value, Some(250));
    }

    #[tokio::test]
    async fn test_redeem_rejects_malformed_and_tampered() {
        let h = started().await;
        let before = h.ledger.submitted().await.len();

        assert!(!h.dispenser.redeem(b"abc-1").await.unwrap());

        let signature = h.dispenser.cipher().sign_utf8("abc-1").unwrap();
        let wrong_message = format!("abc-2-{}", signature);
        assert!(!h.dispenser.redeem(wrong_message.as_bytes()).await.unwrap());

        let flipped = if signature.ends_with('0') { '1' } else { '0' };
        let tampered = format!("abc-1-{}{}", &signature[..signature.len() - 1], flipped);
        assert!(!h.dispenser.redeem(tampered.as_bytes()).await.unwrap());

        assert_eq!(h.ledger.submitted().await.len(), before);
    }

    #[tokio::test]
    async fn test_redeem_ledger_failure_is_error() {
        let h = started().await;
        let signature = h.dispenser.cipher().sign_utf8("abc-1").unwrap();
        h.ledger.set_reject_submissions(true).await;
        let result = h.dispenser.redeem(format!("abc-1-{}", signature).as_bytes()).await;
        assert!(matches!(result, Err(DispenserError::ChainSubmission(_))));
    }

    #[tokio::test]
    async fn test_vote_events_are_tallied() {
        let h = harness();
        for (to, value) in [("A", 3), ("B", 2), ("A", 5)] {
            h.dispenser
                .handle_event(ChainEvent::BallotTransfer(BallotTransfer {
                    to: Address::from(to),
                    value,
                }))
                .await
                .unwrap();
        }
        let votes = h.dispenser.votes().await;
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].amount, 8);
        assert_eq!(votes[1].amount, 2);
    }
}
