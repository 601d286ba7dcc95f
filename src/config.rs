use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use dispenser_core::MixParams;
use dispenser_ledger::ConfirmationPolicy;
use serde::{Deserialize, Serialize};

/// Default configuration file, read when present.
const DEFAULT_CONFIG_FILE: &str = "config/dispenser.toml";

/// Prefix of environment overrides, e.g. `DISPENSER__LEDGER__RPC_URL`.
const ENV_PREFIX: &str = "DISPENSER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub mix: MixConfig,
    pub keys: KeysConfig,
    pub faucet: FaucetConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Address every transaction is sent from.
    pub operator_address: String,
    pub ballot_gas: u64,
    pub block_poll_interval_ms: u64,
    pub event_poll_interval_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            operator_address: String::new(),
            ballot_gas: 200_000,
            block_poll_interval_ms: 1000,
            event_poll_interval_ms: 1000,
            confirmation_poll_interval_ms: 500,
            confirmation_max_attempts: 100,
        }
    }
}

/// Amounts are in wei.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub deposit: u64,
    pub deadline_join: u64,
    pub deadline_warranty: u64,
    pub deadline_unblind: u64,
    pub deadline_distribute: u64,
    pub confirmations: u64,
    pub start_gas: u64,
    pub max_accepted_clients: usize,
}

impl Default for MixConfig {
    fn default() -> Self {
        let params = MixParams::default();
        Self {
            deposit: 100_000_000_000_000_000,
            deadline_join: params.deadline_join,
            deadline_warranty: params.deadline_warranty,
            deadline_unblind: params.deadline_unblind,
            deadline_distribute: params.deadline_distribute,
            confirmations: params.confirmations,
            start_gas: params.start_gas,
            max_accepted_clients: params.max_accepted_clients,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// PEM private key, PKCS#1 or PKCS#8.
    pub private_key_path: PathBuf,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from("data/id_rsa_2048"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    pub enabled: bool,
    pub ether_amount: u64,
    pub gas: u64,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ether_amount: 5_000_000_000_000_000_000,
            gas: 200_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `DISPENSER__*` environment
    /// variables. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = ::config::Config::try_from(&AppConfig::default())
            .context("Failed to build default configuration")?;

        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let app_config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_addr()?;

        if self.ledger.rpc_url.is_empty() {
            bail!("ledger.rpc_url cannot be empty");
        }
        if self.ledger.confirmation_max_attempts == 0 {
            bail!("ledger.confirmation_max_attempts must be at least 1");
        }
        if self.ledger.block_poll_interval_ms == 0 || self.ledger.event_poll_interval_ms == 0 {
            bail!("ledger poll intervals must be positive");
        }
        if self.mix.max_accepted_clients == 0 {
            bail!("mix.max_accepted_clients must be at least 1");
        }
        Ok(())
    }

    /// Checks needed only by the running service, not by the offline
    /// signing commands.
    pub fn validate_for_service(&self) -> anyhow::Result<()> {
        if self.ledger.operator_address.is_empty() {
            bail!("ledger.operator_address must be set");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid server.listen_addr '{}'", self.server.listen_addr))
    }

    pub fn mix_params(&self) -> MixParams {
        MixParams {
            deposit: u128::from(self.mix.deposit),
            deadline_join: self.mix.deadline_join,
            deadline_warranty: self.mix.deadline_warranty,
            deadline_unblind: self.mix.deadline_unblind,
            deadline_distribute: self.mix.deadline_distribute,
            confirmations: self.mix.confirmations,
            start_gas: self.mix.start_gas,
            ballot_gas: self.ledger.ballot_gas,
            max_accepted_clients: self.mix.max_accepted_clients,
        }
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.ledger.confirmation_poll_interval_ms),
            max_attempts: self.ledger.confirmation_max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert!(config.validate_for_service().is_err());

        let params = config.mix_params();
        assert_eq!(params.deposit, 100_000_000_000_000_000);
        assert_eq!(params.deadline_distribute, 15);
        assert_eq!(params.ballot_gas, 200_000);
        assert_eq!(
            config.confirmation_policy(),
            ConfirmationPolicy {
                poll_interval: Duration::from_millis(500),
                max_attempts: 100,
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ledger.confirmation_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("does/not/exist.toml"))).is_err());
    }
}
