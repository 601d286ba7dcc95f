//! Raw RSA blind-signature primitive used to warrant blind tokens and to
//! verify redemption signatures.

mod cipher;
mod error;

pub use cipher::Cipher;
pub use error::{CipherError, Result};
pub use rsa::BigUint;
