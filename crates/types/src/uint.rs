//! Unsigned integers as the ledger reports them: JSON numbers, decimal
//! strings or `0x` hex strings. Wei amounts routinely exceed what a JSON
//! number can carry, so gateways tend to send them as strings.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn parse(value: &Value) -> Option<u128> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16).ok(),
            None => s.parse::<u128>().ok(),
        },
        _ => None,
    }
}

pub(crate) fn deserialize_u128<'de, D>(deserializer: D) -> std::result::Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse(&value).ok_or_else(|| D::Error::custom(format!("expected an unsigned integer, got {}", value)))
}

pub(crate) fn deserialize_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_u128(deserializer)?;
    u64::try_from(value).map_err(|_| D::Error::custom(format!("{} does not fit in 64 bits", value)))
}
