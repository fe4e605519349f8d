//! Per-user OpenOrders account.
//!
//! Holds the user's sealed orders, the keys of their revealed orders in the
//! book, and locked/free balances for both assets. The asset a side pays
//! with is its *collateral*: quote for bids, base for asks.

use serde::{Deserialize, Serialize};

use crate::{
    Address, AuctionError, EncryptedOrder, EncryptionPubkey, OrderKey, Result, Side,
    constants::MAX_ORDERS_PER_ACCOUNT,
};

/// Locked/free bookkeeping for one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub locked: u64,
    pub free: u64,
    /// Total ever moved into the vault for this account.
    pub deposited: u64,
}

impl TokenBalance {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.locked.saturating_add(self.free)
    }

    /// New collateral from the user's wallet, locked immediately.
    pub fn deposit_locked(&mut self, amount: u64) -> Result<()> {
        self.locked = self.locked.checked_add(amount).ok_or(AuctionError::NumericalOverflow)?;
        self.deposited = self
            .deposited
            .checked_add(amount)
            .ok_or(AuctionError::NumericalOverflow)?;
        Ok(())
    }

    /// locked → free.
    pub fn unlock(&mut self, amount: u64) -> Result<()> {
        self.spend_locked(amount)?;
        self.credit_free(amount)
    }

    /// Remove from locked without crediting (paid away in a fill).
    pub fn spend_locked(&mut self, amount: u64) -> Result<()> {
        self.locked = self.locked.checked_sub(amount).ok_or(AuctionError::NumericalOverflow)?;
        Ok(())
    }

    pub fn credit_free(&mut self, amount: u64) -> Result<()> {
        self.free = self.free.checked_add(amount).ok_or(AuctionError::NumericalOverflow)?;
        Ok(())
    }
}

/// One user's position in one auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrders {
    pub authority: Address,
    pub this_open_orders: Address,
    pub auction: Address,
    pub side: Side,
    pub max_orders: u8,
    /// Unset until the first sealed order.
    pub nacl_pubkey: EncryptionPubkey,
    pub encrypted_orders: Vec<EncryptedOrder>,
    /// Revealed orders resting in the book.
    pub orders: Vec<OrderKey>,
    pub quote: TokenBalance,
    pub base: TokenBalance,
}

impl OpenOrders {
    #[must_use]
    pub fn address(auction: &Address, authority: &Address) -> Address {
        Address::derive(&[b"open_orders", auction.as_bytes(), authority.as_bytes()])
    }

    pub fn new(authority: Address, auction: Address, side: Side, max_orders: u8) -> Result<Self> {
        if max_orders == 0 || max_orders > MAX_ORDERS_PER_ACCOUNT {
            return Err(AuctionError::MaxOrdersValueIsInvalid);
        }
        Ok(Self {
            authority,
            this_open_orders: Self::address(&auction, &authority),
            auction,
            side,
            max_orders,
            nacl_pubkey: EncryptionPubkey::default(),
            encrypted_orders: Vec::new(),
            orders: Vec::new(),
            quote: TokenBalance::default(),
            base: TokenBalance::default(),
        })
    }

    /// Revealed orders currently in the book.
    #[must_use]
    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn has_space(&self) -> bool {
        self.orders.len() + self.encrypted_orders.len() < usize::from(self.max_orders)
    }

    pub fn find_order_index(&self, key: OrderKey) -> Result<usize> {
        self.orders
            .iter()
            .position(|k| *k == key)
            .ok_or(AuctionError::OrderIdNotFound)
    }

    pub fn remove_order(&mut self, key: OrderKey) -> Result<()> {
        let idx = self.find_order_index(key)?;
        self.orders.remove(idx);
        Ok(())
    }

    /// Balance of the asset this side pays with.
    pub fn collateral_mut(&mut self) -> &mut TokenBalance {
        match self.side {
            Side::Bid => &mut self.quote,
            Side::Ask => &mut self.base,
        }
    }

    #[must_use]
    pub fn collateral(&self) -> &TokenBalance {
        match self.side {
            Side::Bid => &self.quote,
            Side::Ask => &self.base,
        }
    }

    /// No orders of either kind and nothing locked: ready to settle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
            && self.encrypted_orders.is_empty()
            && self.quote.locked == 0
            && self.base.locked == 0
    }

    #[must_use]
    pub fn has_sealed_orders(&self) -> bool {
        !self.encrypted_orders.is_empty()
    }
}
