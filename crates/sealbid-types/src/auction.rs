//! The Auction account and its creation arguments.

use serde::{Deserialize, Serialize};

use crate::{Address, AuctionError, AuctionId, EncryptionPubkey, OrderKey, Result, Side};

/// Arguments to `init_auction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitAuctionArgs {
    pub auction_id: AuctionId,
    pub start_order_phase: i64,
    pub end_order_phase: i64,
    pub end_decryption_phase: i64,
    pub are_asks_encrypted: bool,
    pub are_bids_encrypted: bool,
    /// Auctioneer's auction-wide x25519 key. Sealed orders are addressed to it.
    pub nacl_pubkey: EncryptionPubkey,
    pub base_mint: Address,
    pub quote_mint: Address,
    pub min_base_order_size: u64,
    /// 32.32 fixed point.
    pub tick_size: u64,
}

impl InitAuctionArgs {
    /// Reject bad timings and sizes before any account is created.
    pub fn validate(&self, now: i64) -> Result<()> {
        if self.end_order_phase <= now {
            return Err(AuctionError::InvalidEndTimes);
        }
        if self.start_order_phase >= self.end_order_phase {
            return Err(AuctionError::InvalidStartTimes);
        }
        if self.end_decryption_phase < self.end_order_phase {
            return Err(AuctionError::InvalidDecryptionEndTime);
        }
        if self.min_base_order_size == 0 {
            return Err(AuctionError::InvalidMinBaseOrderSize);
        }
        if self.tick_size == 0 {
            return Err(AuctionError::InvalidTickSize);
        }
        if self.are_asks_encrypted && self.are_bids_encrypted {
            return Err(AuctionError::BothSidesEncrypted);
        }
        Ok(())
    }
}

/// Running state of the resumable clearing walk and of matching.
///
/// Once `has_found_clearing_price` is set, only matching touches this, and
/// only by lowering the two `remaining_*_fills` counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingState {
    pub current_bid_key: Option<OrderKey>,
    pub current_ask_key: Option<OrderKey>,
    pub current_bid_quantity_filled: u64,
    pub current_ask_quantity_filled: u64,
    pub total_quantity_filled_so_far: u64,
    pub has_found_clearing_price: bool,
    pub clearing_price: u64,
    pub total_quantity_matched: u64,
    pub remaining_bid_fills: u64,
    pub remaining_ask_fills: u64,
}

impl ClearingState {
    #[must_use]
    pub fn remaining_fills(&self, side: Side) -> u64 {
        match side {
            Side::Bid => self.remaining_bid_fills,
            Side::Ask => self.remaining_ask_fills,
        }
    }

    pub fn remaining_fills_mut(&mut self, side: Side) -> &mut u64 {
        match side {
            Side::Bid => &mut self.remaining_bid_fills,
            Side::Ask => &mut self.remaining_ask_fills,
        }
    }
}

/// One auction instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: AuctionId,
    pub authority: Address,
    pub start_order_phase: i64,
    pub end_order_phase: i64,
    pub end_decryption_phase: i64,
    pub are_asks_encrypted: bool,
    pub are_bids_encrypted: bool,
    pub nacl_pubkey: EncryptionPubkey,
    pub order_book: Address,
    pub event_queue: Address,
    pub base_mint: Address,
    pub quote_mint: Address,
    pub base_vault: Address,
    pub quote_vault: Address,
    pub min_base_order_size: u64,
    pub tick_size: u64,
    /// Next book insertion sequence.
    pub order_sequence: u64,
    /// Orders currently resting in the book.
    pub resting_orders: u64,
    pub clearing: ClearingState,
}

impl Auction {
    /// Address of the auction created by `authority` under `auction_id`.
    #[must_use]
    pub fn address(auction_id: &AuctionId, authority: &Address) -> Address {
        Address::derive(&[b"auction", auction_id.as_bytes(), authority.as_bytes()])
    }

    #[must_use]
    pub fn new(authority: Address, args: &InitAuctionArgs) -> Self {
        let this = Self::address(&args.auction_id, &authority);
        Self {
            auction_id: args.auction_id,
            authority,
            start_order_phase: args.start_order_phase,
            end_order_phase: args.end_order_phase,
            end_decryption_phase: args.end_decryption_phase,
            are_asks_encrypted: args.are_asks_encrypted,
            are_bids_encrypted: args.are_bids_encrypted,
            nacl_pubkey: args.nacl_pubkey,
            order_book: Address::derive(&[b"order_book", this.as_bytes()]),
            event_queue: Address::derive(&[b"event_queue", this.as_bytes()]),
            base_mint: args.base_mint,
            quote_mint: args.quote_mint,
            base_vault: Address::derive(&[b"base_vault", this.as_bytes()]),
            quote_vault: Address::derive(&[b"quote_vault", this.as_bytes()]),
            min_base_order_size: args.min_base_order_size,
            tick_size: args.tick_size,
            order_sequence: 0,
            resting_orders: 0,
            clearing: ClearingState::default(),
        }
    }

    #[must_use]
    pub fn this_address(&self) -> Address {
        Self::address(&self.auction_id, &self.authority)
    }

    #[must_use]
    pub fn is_side_encrypted(&self, side: Side) -> bool {
        match side {
            Side::Bid => self.are_bids_encrypted,
            Side::Ask => self.are_asks_encrypted,
        }
    }

    /// Mint and vault holding the collateral a side pays with.
    #[must_use]
    pub fn collateral_accounts(&self, side: Side) -> (Address, Address) {
        match side {
            Side::Bid => (self.quote_mint, self.quote_vault),
            Side::Ask => (self.base_mint, self.base_vault),
        }
    }

    /// Take the next book sequence number.
    pub fn next_sequence(&mut self) -> Result<u64> {
        let seq = self.order_sequence;
        self.order_sequence = seq.checked_add(1).ok_or(AuctionError::NumericalOverflow)?;
        Ok(seq)
    }
}
