//! Custody collaborator: the only way tokens cross the vault boundary.

use crate::{Address, Result};

/// Moves tokens between user wallets and auction vaults, keyed by mint.
pub trait Custody {
    /// Wallet of `owner` → `vault`.
    fn deposit_to_vault(&mut self, owner: &Address, mint: &Address, vault: &Address, amount: u64) -> Result<()>;

    /// `vault` → wallet of `owner`.
    fn withdraw_from_vault(&mut self, vault: &Address, mint: &Address, owner: &Address, amount: u64) -> Result<()>;

    /// Current balance held by `vault` in `mint`.
    fn vault_balance(&self, vault: &Address, mint: &Address) -> u64;
}
