//! Account addresses.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Size of an account address in bytes
pub const ADDRESS_SIZE: usize = 20;

/// A 20-byte account address, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_SIZE]);

    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a slice that must be exactly [`ADDRESS_SIZE`] long.
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        let array: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_SIZE]
    }

    /// Short form used in prompts and log lines, e.g. `0x7e5f4552...`.
    pub fn abridged(&self) -> String {
        format!("0x{}...", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != ADDRESS_SIZE * 2 {
            return Err(CoreError::InvalidAddress(format!(
                "expected {} hex digits, got {}",
                ADDRESS_SIZE * 2,
                digits.len()
            )));
        }
        let bytes = hex::decode(digits)?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";
        let address: Address = text.parse().unwrap();
        assert_eq!(address.to_string(), text);
        assert_eq!(address.abridged(), "0x7e5f4552...");

        let bare: Address = "7E5F4552091A69125D5DFCB7B8C2659029395BDF".parse().unwrap();
        assert_eq!(bare, address);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz5f4552091a69125d5dfcb7b8c2659029395bdf"
            .parse::<Address>()
            .is_err());
        assert!(Address::from_slice(&[0u8; 19]).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let address = Address::new([0xab; ADDRESS_SIZE]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
        assert!(Address::ZERO.is_zero());
    }
}
