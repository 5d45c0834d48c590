//! Credential requests made to the user.

use aleth_core::Address;
use zeroize::Zeroizing;

/// What the user is being asked to unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub title: String,
    pub purpose: String,
    pub account: Option<Address>,
    pub hint: Option<String>,
}

impl CredentialRequest {
    pub fn unlock(account: Address, hint: Option<String>) -> Self {
        Self {
            title: "Unlock Account".to_string(),
            purpose: format!("Enter the credential for account {}", account.abridged()),
            account: Some(account),
            hint,
        }
    }
}

/// Asks the user for a credential.
///
/// Returns `None` when the user dismisses the request. Implementations may block.
pub trait CredentialPrompt: Send + Sync {
    fn request(&self, request: &CredentialRequest) -> Option<Zeroizing<String>>;
}

/// A prompt that is always dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl CredentialPrompt for DenyAll {
    fn request(&self, _request: &CredentialRequest) -> Option<Zeroizing<String>> {
        None
    }
}

impl<F> CredentialPrompt for F
where
    F: Fn(&CredentialRequest) -> Option<Zeroizing<String>> + Send + Sync,
{
    fn request(&self, request: &CredentialRequest) -> Option<Zeroizing<String>> {
        self(request)
    }
}
