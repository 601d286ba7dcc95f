use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dispenser_api::{AppState, Faucet};
use dispenser_core::Dispenser;
use dispenser_crypto::Cipher;
use dispenser_ledger::feed::{spawn_block_feed, spawn_event_feed};
use dispenser_ledger::{Ledger, RpcConfig, RpcLedger, TransactionSubmitter};
use dispenser_types::Address;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Capacity of the block-height broadcast channel.
const BLOCK_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the chain event queue.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct DispenserApp {
    config: AppConfig,
    cipher: Arc<Cipher>,
    ledger: Arc<dyn Ledger>,
}

impl DispenserApp {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate_for_service()?;

        let cipher = load_cipher(&config)?;
        let ledger = RpcLedger::new(RpcConfig::new(config.ledger.rpc_url.clone()))
            .context("Failed to create ledger client")?;
        info!("Ledger gateway: {}", ledger.url());

        Ok(Self {
            config,
            cipher,
            ledger: Arc::new(ledger),
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = &self.config;
        let addr = config.listen_addr()?;

        let submitter = TransactionSubmitter::with_policy(
            self.ledger.clone(),
            Address::from(config.ledger.operator_address.clone()),
            config.confirmation_policy(),
        );

        let (blocks, _) = broadcast::channel(BLOCK_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let dispenser = Arc::new(Dispenser::new(
            self.cipher.clone(),
            submitter.clone(),
            blocks.clone(),
            config.mix_params(),
        ));

        let block_feed = spawn_block_feed(
            self.ledger.clone(),
            blocks,
            Duration::from_millis(config.ledger.block_poll_interval_ms),
        );
        let event_feed = spawn_event_feed(
            self.ledger.clone(),
            events_tx,
            Duration::from_millis(config.ledger.event_poll_interval_ms),
            true,
        );
        let event_loop = dispenser.spawn_event_loop(events_rx);

        // Failing to start the round is fatal.
        let deadlines = dispenser
            .start()
            .await
            .context("Failed to start mixing round")?;
        if deadlines.is_none() {
            warn!("No round started; serving redemptions only");
        }

        let mut state = AppState::new(self.cipher.clone()).with_dispenser(dispenser);
        if config.faucet.enabled {
            warn!("Faucet enabled; do not run this configuration in production");
            state = state.with_faucet(Faucet::new(
                submitter,
                u128::from(config.faucet.ether_amount),
                config.faucet.gas,
            ));
        }

        let result = tokio::select! {
            result = dispenser_api::start_server(state, addr) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        event_loop.abort();
        event_feed.abort();
        block_feed.abort();
        if let Some(deadlines) = deadlines {
            deadlines.abort();
        }

        result
    }
}

pub fn load_cipher(config: &AppConfig) -> anyhow::Result<Arc<Cipher>> {
    let path = &config.keys.private_key_path;
    let cipher = Cipher::load(path)
        .with_context(|| format!("Failed to load private key from {}", path.display()))?;
    info!("Loaded {}-bit signing key", cipher.modulus_bits());
    Ok(Arc::new(cipher))
}
