//! Unpadded RSA transform over arbitrary-precision integers.
//!
//! Signing is `m^d mod n` on a hex-encoded integer and verification checks
//! `s^e mod n` against the hex encoding of a UTF-8 message. No padding is
//! applied: the signed values are blinded tokens and any padding would
//! destroy the blinding.

use std::fmt;
use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use tracing::{debug, warn};

use crate::error::{CipherError, Result};

/// The service's RSA key material: private exponent, modulus and public exponent.
#[derive(Clone)]
pub struct Cipher {
    d: BigUint,
    n: BigUint,
    e: BigUint,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("modulus_bits", &self.n.bits())
            .field("e", &self.e)
            .finish()
    }
}

impl Cipher {
    pub fn from_components(d: BigUint, n: BigUint, e: BigUint) -> Result<Self> {
        if n.bits() == 0 {
            return Err(CipherError::KeyFormat("modulus is zero".to_string()));
        }
        Ok(Self { d, n, e })
    }

    pub fn from_private_key(key: &RsaPrivateKey) -> Self {
        Self {
            d: key.d().clone(),
            n: key.n().clone(),
            e: key.e().clone(),
        }
    }

    /// Parse a PEM private key, PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|e| CipherError::KeyFormat(e.to_string()))?;
        Ok(Self::from_private_key(&key))
    }

    /// Load the key material from a PEM file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| CipherError::KeyFile {
            path: path.display().to_string(),
            source,
        })?;
        let cipher = Self::from_pem(&pem)?;
        debug!(
            "Loaded {}-bit RSA key from {}",
            cipher.modulus_bits(),
            path.display()
        );
        Ok(cipher)
    }

    pub fn modulus_bits(&self) -> usize {
        self.n.bits()
    }

    /// Sign a hex-encoded message: `message^d mod n`, as lowercase hex
    /// without leading zeros. An optional `0x` prefix is accepted.
    pub fn sign(&self, message_hex: &str) -> Result<String> {
        let message = parse_hex(message_hex)
            .ok_or_else(|| CipherError::InvalidInput(format!("not a hex string: '{}'", message_hex)))?;
        Ok(self.sign_integer(&message))
    }

    /// Sign the hex encoding of a UTF-8 message, the counterpart of [`Cipher::verify`].
    pub fn sign_utf8(&self, message: &str) -> Result<String> {
        self.sign(&hex::encode(message))
    }

    /// Check that `signature^e mod n` equals the UTF-8 bytes of `message`
    /// read as a big-endian integer. Never fails; malformed signatures are
    /// simply invalid.
    pub fn verify(&self, message: &str, signature_hex: &str) -> bool {
        let expected = BigUint::from_bytes_be(message.as_bytes());

        let valid = match parse_hex(signature_hex) {
            Some(signature) => signature.modpow(&self.e, &self.n) == expected,
            None => false,
        };

        if !valid {
            warn!("Invalid signature for message: {}", message);
            warn!("A valid signature would be {}", self.sign_integer(&expected));
        }

        valid
    }

    fn sign_integer(&self, message: &BigUint) -> String {
        message.modpow(&self.d, &self.n).to_str_radix(16)
    }
}

fn parse_hex(input: &str) -> Option<BigUint> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}
