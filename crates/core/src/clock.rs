//! Block-height driven deadlines.
//!
//! A [`BlockClock`] records the first block height it observes as the round
//! start. Each deadline is a future that resolves on the first block at least
//! `offset` blocks past that start. Nothing here times out: if the block feed
//! never delivers, deadlines never fire.

use std::future::Future;

use dispenser_types::{Deadline, DispenserError, MixRound, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

pub struct BlockClock {
    blocks: broadcast::Sender<u64>,
    start: watch::Receiver<Option<u64>>,
}

impl BlockClock {
    /// Start observing `blocks`. The next height delivered becomes the round
    /// start height. Must be called from within a tokio runtime.
    pub fn new(blocks: broadcast::Sender<u64>) -> Self {
        let mut first = blocks.subscribe();
        let (start_tx, start) = watch::channel(None);

        tokio::spawn(async move {
            loop {
                match first.recv().await {
                    Ok(height) => {
                        info!("Round start observed at block {}", height);
                        let _ = start_tx.send(Some(height));
                        return;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Block clock lagged by {} notifications", skipped);
                    }
                    Err(RecvError::Closed) => {
                        warn!("Block feed closed before the round start was observed");
                        return;
                    }
                }
            }
        });

        Self { blocks, start }
    }

    /// Round start height, once observed.
    pub fn round_start(&self) -> Option<u64> {
        *self.start.borrow()
    }

    /// Resolves with the first observed height `h` such that
    /// `h - start >= offset`.
    ///
    /// The subscription is taken when this is called, so only notifications
    /// delivered afterwards are considered.
    pub fn deadline(&self, offset: u64) -> impl Future<Output = Result<u64>> + Send + 'static {
        let mut blocks = self.blocks.subscribe();
        let mut start = self.start.clone();

        async move {
            let start_height = loop {
                if let Some(height) = *start.borrow_and_update() {
                    break height;
                }
                start.changed().await.map_err(|_| feed_closed())?;
            };

            loop {
                match blocks.recv().await {
                    Ok(height) if height.saturating_sub(start_height) >= offset => {
                        return Ok(height);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Deadline watcher lagged by {} notifications", skipped);
                    }
                    Err(RecvError::Closed) => return Err(feed_closed()),
                }
            }
        }
    }

    /// The four round deadlines in protocol order, each at its cumulative
    /// offset. All subscriptions are taken immediately.
    pub fn schedule(&self, round: &MixRound) -> Vec<(Deadline, BoxFuture<'static, Result<u64>>)> {
        Deadline::ALL
            .iter()
            .map(|deadline| {
                let offset = round.cumulative_offset(*deadline);
                debug!("Scheduling {} deadline at +{} blocks", deadline, offset);
                (*deadline, self.deadline(offset).boxed())
            })
            .collect()
    }
}

fn feed_closed() -> DispenserError {
    DispenserError::ChainQuery("block feed closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const SHORT: Duration = Duration::from_millis(50);

    fn round(offsets: [u64; 4]) -> MixRound {
        MixRound {
            deposit: 1,
            deadline_join: offsets[0],
            deadline_warranty: offsets[1],
            deadline_unblind: offsets[2],
            deadline_distribute: offsets[3],
            min_block_amount: 0,
            participant_count: 0,
            is_valid: true,
        }
    }

    #[tokio::test]
    async fn test_deadline_fires_at_offset() {
        let (tx, _keep) = broadcast::channel(64);
        let clock = BlockClock::new(tx.clone());
        let mut deadline = Box::pin(clock.deadline(3));

        for height in [100, 101, 102] {
            tx.send(height).unwrap();
        }
        assert!(timeout(SHORT, &mut deadline).await.is_err());
        assert_eq!(clock.round_start(), Some(100));

        tx.send(103).unwrap();
        tx.send(104).unwrap();
        assert_eq!(timeout(SHORT, deadline).await.unwrap().unwrap(), 103);
    }

    #[tokio::test]
    async fn test_deadline_skipped_heights() {
        let (tx, _keep) = broadcast::channel(64);
        let clock = BlockClock::new(tx.clone());
        let deadline = clock.deadline(5);

        tx.send(10).unwrap();
        tx.send(12).unwrap();
        tx.send(20).unwrap();
        assert_eq!(timeout(SHORT, deadline).await.unwrap().unwrap(), 20);
    }

    #[tokio::test]
    async fn test_no_start_never_fires() {
        let (tx, _keep) = broadcast::channel::<u64>(64);
        let clock = BlockClock::new(tx);
        assert!(timeout(SHORT, clock.deadline(0)).await.is_err());
        assert_eq!(clock.round_start(), None);
    }

    #[tokio::test]
    async fn test_schedule_orders_cumulative_deadlines() {
        let (tx, _keep) = broadcast::channel(64);
        let clock = BlockClock::new(tx.clone());
        let schedule = clock.schedule(&round([2, 2, 1, 3]));
        let order: Vec<Deadline> = schedule.iter().map(|(d, _)| *d).collect();
        assert_eq!(order, Deadline::ALL.to_vec());

        for height in 50..=60 {
            tx.send(height).unwrap();
        }

        let mut fired = Vec::new();
        for (_, deadline) in schedule {
            fired.push(timeout(SHORT, deadline).await.unwrap().unwrap());
        }
        assert_eq!(fired, vec![52, 54, 55, 58]);
    }

    #[tokio::test]
    async fn test_closed_feed_is_an_error() {
        let (tx, _) = broadcast::channel(64);
        let clock = BlockClock::new(tx.clone());
        let deadline = clock.deadline(10);
        tx.send(1).unwrap();
        drop(tx);
        drop(clock);

        let result = timeout(SHORT, deadline).await.unwrap();
        assert!(matches!(result, Err(DispenserError::ChainQuery(_))));
    }
}
