//! Sealed order entry, withdrawal and reveal.
//!
//! A sealed order is stored on the OpenOrders account with its collateral
//! already locked. During the decryption phase the auctioneer reveals all of
//! an account's sealed orders in one go: either every one of them lands in
//! the book, or none does.

use sealbid_matchcore::Market;
use sealbid_types::{
    Auction, AuctionError, Custody, EncryptedOrder, EncryptionPubkey, OpenOrders, OrderKey,
    Result, Side, constants::NONCE_LEN, fixed_point::price_from_ticks, order_collateral,
};

use crate::{guards, orders::validate_order, sealed_order::SharedKey};

/// Arguments of `new_encrypted_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSubmission {
    /// Collateral deposited with the order, in the asset the side pays with.
    pub token_qty: u64,
    /// The user's encryption key for this auction side.
    pub pubkey: EncryptionPubkey,
    pub nonce: [u8; NONCE_LEN],
    pub cipher_text: Vec<u8>,
}

pub fn new_encrypted_order(
    auction: &Auction,
    open_orders: &mut OpenOrders,
    custody: &mut impl Custody,
    now: i64,
    submission: SealedSubmission,
) -> Result<()> {
    let side = open_orders.side;
    guards::require_order_phase(auction, now)?;
    guards::require_sealed_side(auction, side)?;
    if !open_orders.has_space() {
        return Err(AuctionError::TooManyOrders);
    }
    if !open_orders.nacl_pubkey.is_unset() && open_orders.nacl_pubkey != submission.pubkey {
        return Err(AuctionError::EncryptionPubkeysDoNotMatch);
    }
    if open_orders
        .encrypted_orders
        .iter()
        .any(|o| o.same_envelope(&submission.nonce, &submission.cipher_text))
    {
        return Err(AuctionError::IdenticalEncryptedOrderFound);
    }

    let (mint, vault) = auction.collateral_accounts(side);
    custody.deposit_to_vault(&open_orders.authority, &mint, &vault, submission.token_qty)?;
    open_orders.collateral_mut().deposit_locked(submission.token_qty)?;
    open_orders.nacl_pubkey = submission.pubkey;
    open_orders.encrypted_orders.push(EncryptedOrder {
        nonce: submission.nonce,
        cipher_text: submission.cipher_text,
        token_qty: submission.token_qty,
    });

    tracing::debug!(
        user = %open_orders.authority,
        side = %side,
        token_qty = submission.token_qty,
        sealed = open_orders.encrypted_orders.len(),
        "Sealed order placed"
    );
    Ok(())
}

/// Withdraw a sealed order without revealing it. Its collateral becomes free.
pub fn cancel_encrypted_order(
    auction: &Auction,
    open_orders: &mut OpenOrders,
    now: i64,
    idx: u8,
) -> Result<()> {
    guards::require_sealed_withdrawal_window(auction, now)?;
    guards::require_sealed_side(auction, open_orders.side)?;
    let position = usize::from(idx);
    if position >= open_orders.encrypted_orders.len() {
        return Err(AuctionError::OrderIdxNotValid { idx: position });
    }
    let order = open_orders.encrypted_orders.remove(position);
    open_orders.collateral_mut().unlock(order.token_qty)?;

    tracing::debug!(user = %open_orders.authority, idx, released = order.token_qty, "Sealed order withdrawn");
    Ok(())
}

/// A sealed order that opened cleanly and passed every check.
struct Revealed {
    price: u64,
    base_quantity: u64,
    excess: u64,
}

fn reveal(auction: &Auction, side: Side, key: &SharedKey, order: &EncryptedOrder) -> Result<Revealed> {
    let payload = key.open(&order.nonce, &order.cipher_text)?;
    let price = price_from_ticks(payload.price_multiple, auction.tick_size)?;
    validate_order(auction, price, payload.base_quantity)?;
    let needed = order_collateral(side, payload.base_quantity, price)?;
    if order.token_qty < needed {
        return Err(AuctionError::InsufficientTokensForOrder {
            needed,
            deposited: order.token_qty,
        });
    }
    Ok(Revealed {
        price,
        base_quantity: payload.base_quantity,
        excess: order.token_qty - needed,
    })
}

/// Reveal every sealed order on `open_orders` and rest them in the book.
///
/// All entries are opened and checked before the book is touched, so any
/// failure (wrong key, bad price, short collateral) leaves the account's
/// sealed orders exactly as they were. Collateral deposited beyond what an
/// order needs is unlocked.
pub fn decrypt_order(
    market: &mut Market,
    open_orders: &mut OpenOrders,
    now: i64,
    key: &SharedKey,
) -> Result<Vec<OrderKey>> {
    let side = open_orders.side;
    guards::require_decryption_phase(&market.auction, now)?;
    guards::require_sealed_side(&market.auction, side)?;

    let revealed = open_orders
        .encrypted_orders
        .iter()
        .map(|order| reveal(&market.auction, side, key, order))
        .collect::<Result<Vec<_>>>()?;
    if market.book.free_space(side) < revealed.len() {
        return Err(AuctionError::OrderBookFull);
    }

    let mut keys = Vec::with_capacity(revealed.len());
    for order in &revealed {
        let key = market.rest_order(side, open_orders.this_open_orders, order.price, order.base_quantity)?;
        open_orders.collateral_mut().unlock(order.excess)?;
        open_orders.orders.push(key);
        keys.push(key);
    }
    open_orders.encrypted_orders.clear();

    tracing::debug!(user = %open_orders.authority, revealed = keys.len(), "Sealed orders revealed");
    Ok(keys)
}
