use dispenser_types::DispenserError;
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = CipherError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported or malformed private key: {0}")]
    KeyFormat(String),
}

impl From<CipherError> for DispenserError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::InvalidInput(msg) => DispenserError::Validation(msg),
            other => DispenserError::KeyMaterial(other.to_string()),
        }
    }
}
