//! Credential-sealed account secrets.
//!
//! A secret is whitened with the first half of a scrypt-derived key and then
//! AES-256 encrypted with the second half. Opening checks that the recovered
//! secret controls the stored address, which is how a wrong credential is
//! detected.

use crate::scrypt_parameters::{ScryptParameters, DERIVED_KEY_LENGTH};
use crate::{WalletError, WalletResult};
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use aleth_core::{Address, Secret, SECRET_SIZE};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const SALT_SIZE: usize = 16;
const AES_BLOCK_SIZE: usize = 16;

/// An account secret encrypted under a user credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKey {
    pub address: Address,
    /// Hex-encoded scrypt salt
    pub salt: String,
    /// Hex-encoded encrypted secret
    pub ciphertext: String,
    pub scrypt: ScryptParameters,
}

impl EncryptedKey {
    pub fn seal(secret: &Secret, credential: &str, scrypt: ScryptParameters) -> WalletResult<Self> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let derived = derive_key(credential, &salt, &scrypt)?;
        let mut block = Zeroizing::new([0u8; SECRET_SIZE]);
        for (out, (s, d)) in block
            .iter_mut()
            .zip(secret.expose().iter().zip(derived[..SECRET_SIZE].iter()))
        {
            *out = s ^ d;
        }

        let cipher = Aes256::new_from_slice(&derived[SECRET_SIZE..])
            .map_err(|e| WalletError::InvalidFormat(e.to_string()))?;
        block
            .chunks_mut(AES_BLOCK_SIZE)
            .for_each(|chunk| cipher.encrypt_block(GenericArray::from_mut_slice(chunk)));

        Ok(Self {
            address: secret.address(),
            salt: hex::encode(salt),
            ciphertext: hex::encode(&block[..]),
            scrypt,
        })
    }

    /// Decrypts the secret. Fails with [`WalletError::WrongCredential`] when the
    /// credential does not recover the key for [`EncryptedKey::address`].
    pub fn open(&self, credential: &str) -> WalletResult<Secret> {
        let salt = hex::decode(&self.salt)?;
        let ciphertext = Zeroizing::new(hex::decode(&self.ciphertext)?);
        if ciphertext.len() != SECRET_SIZE {
            return Err(WalletError::InvalidFormat(format!(
                "ciphertext must be {} bytes, got {}",
                SECRET_SIZE,
                ciphertext.len()
            )));
        }

        let derived = derive_key(credential, &salt, &self.scrypt)?;
        let cipher = Aes256::new_from_slice(&derived[SECRET_SIZE..])
            .map_err(|e| WalletError::InvalidFormat(e.to_string()))?;

        let mut block = Zeroizing::new([0u8; SECRET_SIZE]);
        block.copy_from_slice(&ciphertext);
        block
            .chunks_mut(AES_BLOCK_SIZE)
            .for_each(|chunk| cipher.decrypt_block(GenericArray::from_mut_slice(chunk)));
        for (b, d) in block.iter_mut().zip(derived[..SECRET_SIZE].iter()) {
            *b ^= d;
        }

        let secret = Secret::from_bytes(*block).map_err(|_| WalletError::WrongCredential)?;
        if secret.address() != self.address {
            return Err(WalletError::WrongCredential);
        }
        Ok(secret)
    }
}

fn derive_key(
    credential: &str,
    salt: &[u8],
    scrypt: &ScryptParameters,
) -> WalletResult<Zeroizing<[u8; DERIVED_KEY_LENGTH]>> {
    let params = scrypt.to_scrypt_params()?;
    let mut derived = Zeroizing::new([0u8; DERIVED_KEY_LENGTH]);
    scrypt::scrypt(credential.as_bytes(), salt, &params, &mut derived[..])
        .map_err(|e| WalletError::Scrypt(e.to_string()))?;
    Ok(derived)
}
