use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ballot-dispenser")]
#[command(version, about = "Anonymous ballot dispenser backed by RSA blind signatures", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config/dispenser.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dispenser service (default mode)
    Run,

    /// Sign a hex-encoded message with the configured key
    Sign {
        #[arg(short, long, help = "Message to sign, hex-encoded")]
        message_hex: String,
    },

    /// Verify a signature over a UTF-8 message with the configured key
    Verify {
        #[arg(short, long, help = "Signed message, e.g. <address>-<nonce>")]
        message: String,

        #[arg(short, long, help = "Signature, hex-encoded")]
        signature: String,
    },
}
