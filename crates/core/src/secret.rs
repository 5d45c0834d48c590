//! Decrypted account secrets.

use crate::address::{Address, ADDRESS_SIZE};
use crate::error::{CoreError, CoreResult};
use rand::{rngs::OsRng, RngCore};
use secp256k1::{PublicKey, SecretKey};
use sha3::{Digest, Keccak256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an account secret in bytes
pub const SECRET_SIZE: usize = 32;

/// A decrypted secp256k1 account secret.
///
/// The bytes are wiped when the value is dropped. The address is derived once
/// at construction, so a `Secret` always holds a valid curve scalar.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    bytes: [u8; SECRET_SIZE],
    #[zeroize(skip)]
    address: Address,
}

impl Secret {
    pub fn from_bytes(mut bytes: [u8; SECRET_SIZE]) -> CoreResult<Self> {
        let result = SecretKey::from_slice(&bytes)
            .map(|key| derive_address(&key))
            .map_err(|e| CoreError::InvalidSecret(e.to_string()));
        match result {
            Ok(address) => Ok(Self { bytes, address }),
            Err(e) => {
                bytes.zeroize();
                Err(e)
            }
        }
    }

    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        let array: [u8; SECRET_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::InvalidSecret(format!(
                "expected {} bytes, got {}",
                SECRET_SIZE,
                bytes.len()
            ))
        })?;
        Self::from_bytes(array)
    }

    /// Generates a fresh secret from the operating system RNG.
    pub fn random() -> Self {
        loop {
            let mut bytes = [0u8; SECRET_SIZE];
            OsRng.fill_bytes(&mut bytes);
            if let Ok(secret) = Self::from_bytes(bytes) {
                return secret;
            }
        }
    }

    /// The account address controlled by this secret.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn expose(&self) -> &[u8; SECRET_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("address", &self.address)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

/// Keccak-256 of the uncompressed public key, last 20 bytes.
fn derive_address(key: &SecretKey) -> Address {
    let public = PublicKey::from_secret_key_global(key);
    let uncompressed = public.serialize_uncompressed();
    let hash = Keccak256::digest(&uncompressed[1..]);
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes.copy_from_slice(&hash[32 - ADDRESS_SIZE..]);
    Address::new(bytes)
}
