//! In-memory token custody.
//!
//! Tracks wallet balances per (owner, mint) and vault balances per
//! (vault, mint). Every transfer is checked first and applied second, so a
//! failed transfer leaves both sides unchanged.

use std::collections::HashMap;

use sealbid_types::{Address, AuctionError, Custody, Result};

/// Source of truth for every token outside the auction's own bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    wallets: HashMap<(Address, Address), u64>,
    vaults: HashMap<(Address, Address), u64>,
}

impl TokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint tokens straight into a wallet.
    pub fn airdrop(&mut self, owner: Address, mint: Address, amount: u64) -> Result<()> {
        let entry = self.wallets.entry((owner, mint)).or_default();
        *entry = entry.checked_add(amount).ok_or(AuctionError::NumericalOverflow)?;
        Ok(())
    }

    #[must_use]
    pub fn wallet_balance(&self, owner: &Address, mint: &Address) -> u64 {
        self.wallets.get(&(*owner, *mint)).copied().unwrap_or(0)
    }

    /// Total supply of a mint across wallets and vaults.
    #[must_use]
    pub fn total_supply(&self, mint: &Address) -> u64 {
        self.wallets
            .iter()
            .chain(self.vaults.iter())
            .filter(|((_, m), _)| m == mint)
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn transfer(
        from: &mut HashMap<(Address, Address), u64>,
        from_key: (Address, Address),
        to: &mut HashMap<(Address, Address), u64>,
        to_key: (Address, Address),
        amount: u64,
    ) -> Result<()> {
        let available = from.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(AuctionError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        let credited = to
            .get(&to_key)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(AuctionError::NumericalOverflow)?;
        from.insert(from_key, available - amount);
        to.insert(to_key, credited);
        Ok(())
    }
}

impl Custody for TokenLedger {
    fn deposit_to_vault(&mut self, owner: &Address, mint: &Address, vault: &Address, amount: u64) -> Result<()> {
        Self::transfer(
            &mut self.wallets,
            (*owner, *mint),
            &mut self.vaults,
            (*vault, *mint),
            amount,
        )?;
        tracing::debug!(owner = %owner, vault = %vault, amount, "Deposited to vault");
        Ok(())
    }

    fn withdraw_from_vault(&mut self, vault: &Address, mint: &Address, owner: &Address, amount: u64) -> Result<()> {
        Self::transfer(
            &mut self.vaults,
            (*vault, *mint),
            &mut self.wallets,
            (*owner, *mint),
            amount,
        )?;
        tracing::debug!(owner = %owner, vault = %vault, amount, "Withdrew from vault");
        Ok(())
    }

    fn vault_balance(&self, vault: &Address, mint: &Address) -> u64 {
        self.vaults.get(&(*vault, *mint)).copied().unwrap_or(0)
    }
}
