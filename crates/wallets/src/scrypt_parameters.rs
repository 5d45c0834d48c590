//! Scrypt parameters for key store encryption.

use crate::{WalletError, WalletResult};
use aleth_config::KeyStoreConfig;
use serde::{Deserialize, Serialize};

/// Length of the key derived from a credential: 32 bytes of whitening, 32 bytes of AES key.
pub const DERIVED_KEY_LENGTH: usize = 64;

/// Scrypt cost parameters, stored alongside every sealed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParameters {
    /// CPU/memory cost parameter (N).
    pub n: u32,

    /// Block size parameter (r).
    pub r: u32,

    /// Parallelization parameter (p).
    pub p: u32,
}

impl ScryptParameters {
    pub fn new(n: u32, r: u32, p: u32) -> WalletResult<Self> {
        let params = Self { n, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn from_config(config: &KeyStoreConfig) -> WalletResult<Self> {
        Self::new(config.scrypt_n, config.scrypt_r, config.scrypt_p)
    }

    /// Very cheap parameters. Only for tests.
    pub fn test() -> Self {
        Self { n: 16, r: 1, p: 1 }
    }

    pub fn validate(&self) -> WalletResult<()> {
        // N must be a power of 2 and greater than 1
        if self.n <= 1 || !self.n.is_power_of_two() {
            return Err(WalletError::InvalidParameters(
                "N must be a power of 2 greater than 1".to_string(),
            ));
        }

        if self.r == 0 || self.p == 0 {
            return Err(WalletError::InvalidParameters(
                "r and p must be greater than 0".to_string(),
            ));
        }

        if self.r > u32::MAX / 128
            || self.p > (u32::MAX - 1) / (128 * self.r)
            || self.n > u32::MAX / (128 * self.r)
        {
            return Err(WalletError::InvalidParameters(
                "parameters overflow scrypt limits".to_string(),
            ));
        }

        Ok(())
    }

    pub fn log_n(&self) -> u8 {
        self.n.trailing_zeros() as u8
    }

    /// Converts to scrypt crate parameters producing [`DERIVED_KEY_LENGTH`] bytes.
    pub fn to_scrypt_params(&self) -> WalletResult<scrypt::Params> {
        self.validate()?;
        scrypt::Params::new(self.log_n(), self.r, self.p, DERIVED_KEY_LENGTH)
            .map_err(|e| WalletError::Scrypt(e.to_string()))
    }
}

impl Default for ScryptParameters {
    fn default() -> Self {
        Self {
            n: 16384, // 2^14
            r: 8,
            p: 8,
        }
    }
}

impl std::fmt::Display for ScryptParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScryptParameters(N={}, r={}, p={})", self.n, self.r, self.p)
    }
}
