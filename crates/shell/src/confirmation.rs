//! Proof that the user confirmed a destructive operation.

/// Obtained by the caller from its own confirmation step and handed to
/// destructive operations such as killing an account.
#[derive(Debug)]
pub struct Confirmation(());

impl Confirmation {
    /// The user explicitly agreed to the operation.
    pub fn confirmed_by_user() -> Self {
        Confirmation(())
    }
}
