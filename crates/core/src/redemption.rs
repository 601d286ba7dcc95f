use dispenser_types::{DispenserError, Result, PAYLOAD_DELIMITER};

/// A parsed `<anonymousAddress>-<nonce>-<signature>` redemption payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionPayload {
    pub anonymous_address: String,
    pub nonce: String,
    /// Hex-encoded signature over [`RedemptionPayload::signed_message`].
    pub signature: String,
}

impl RedemptionPayload {
    /// Exactly three non-empty parts are required.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(PAYLOAD_DELIMITER).collect();
        match parts.as_slice() {
            [address, nonce, signature]
                if !address.is_empty() && !nonce.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    anonymous_address: address.to_string(),
                    nonce: nonce.to_string(),
                    signature: signature.to_string(),
                })
            }
            _ => Err(DispenserError::Validation(format!(
                "redemption payload must have three non-empty parts, got {}",
                parts.len()
            ))),
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let raw = std::str::from_utf8(raw)
            .map_err(|e| DispenserError::Validation(format!("payload is not UTF-8: {}", e)))?;
        Self::parse(raw)
    }

    /// The message the signature must cover: `<anonymousAddress>-<nonce>`.
    pub fn signed_message(&self) -> String {
        format!("{}{}{}", self.anonymous_address, PAYLOAD_DELIMITER, self.nonce)
    }
}
