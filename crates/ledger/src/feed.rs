//! Background pollers that turn the ledger into block and event streams.

use std::sync::Arc;
use std::time::Duration;

use dispenser_types::ChainEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ledger::Ledger;

/// Poll the block height and broadcast every change.
///
/// Runs until aborted. Having no subscribers is not an error; clocks may
/// subscribe later.
pub fn spawn_block_feed(
    ledger: Arc<dyn Ledger>,
    blocks: broadcast::Sender<u64>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    info!("Starting block feed (interval: {:?})", poll_interval);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        let mut last_seen: Option<u64> = None;

        loop {
            interval.tick().await;

            let height = match ledger.block_number().await {
                Ok(height) => height,
                Err(e) => {
                    warn!("Block height query failed: {}", e);
                    continue;
                }
            };

            if last_seen == Some(height) {
                continue;
            }
            last_seen = Some(height);

            if blocks.send(height).is_err() {
                debug!("Block {} observed with no subscribers", height);
            }
        }
    })
}

/// Poll for contract events and forward them in ledger order.
///
/// Only events after the head observed at startup are forwarded, except
/// ballot transfers when `backfill_votes` is set: those are replayed from
/// block zero first so the tally reflects the whole history. Stops when the
/// receiver is dropped.
pub fn spawn_event_feed(
    ledger: Arc<dyn Ledger>,
    events: mpsc::Sender<ChainEvent>,
    poll_interval: Duration,
    backfill_votes: bool,
) -> JoinHandle<()> {
    info!("Starting event feed (interval: {:?})", poll_interval);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);

        let head = loop {
            interval.tick().await;
            match ledger.block_number().await {
                Ok(head) => break head,
                Err(e) => warn!("Event feed waiting for ledger: {}", e),
            }
        };

        if backfill_votes {
            match ledger.events(0, head).await {
                Ok(history) => {
                    let votes: Vec<_> = history
                        .into_iter()
                        .filter(|event| matches!(event, ChainEvent::BallotTransfer(_)))
                        .collect();
                    info!("Replaying {} historical ballot transfers", votes.len());
                    for event in votes {
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!("Ballot transfer backfill failed: {}", e),
            }
        }

        let mut next_block = head + 1;

        loop {
            interval.tick().await;

            let height = match ledger.block_number().await {
                Ok(height) => height,
                Err(e) => {
                    warn!("Block height query failed: {}", e);
                    continue;
                }
            };
            if height < next_block {
                continue;
            }

            match ledger.events(next_block, height).await {
                Ok(batch) => {
                    if !batch.is_empty() {
                        debug!(
                            "{} events in blocks {}..={}",
                            batch.len(),
                            next_block,
                            height
                        );
                    }
                    for event in batch {
                        if events.send(event).await.is_err() {
                            info!("Event receiver dropped, stopping event feed");
                            return;
                        }
                    }
                    next_block = height + 1;
                }
                // Retry the same range on the next tick.
                Err(e) => warn!("Event query for blocks {}..={} failed: {}", next_block, height, e),
            }
        }
    })
}
