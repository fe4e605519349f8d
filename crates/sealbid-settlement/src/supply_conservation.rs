//! Vault solvency invariant checker.
//!
//! Invariant enforced after every mutating operation:
//! ```text
//! ∀ vault: balance(vault) >= Σ over open accounts (locked + free)
//! ```
//!
//! Once a clearing price is found, a trade is owed to its buyer before its
//! seller has given it up: consuming a bid Fill credits base while the
//! seller's base is still locked until the matching ask Fill is consumed.
//! What is owed is therefore measured as it will stand when every fill has
//! been applied:
//! ```text
//! base  owed = Σ base  + (bid fills not yet credited) - (ask fills not yet debited)
//! quote owed = Σ quote - (queued bid payments)        + (queued ask proceeds)
//! ```
//! Fills not yet credited or debited are the ones still in the event queue
//! plus the ones matching has not emitted yet. Matching emits every bid
//! before any ask, so no ask proceeds exist while a bid payment is unknown.
//!
//! Bidders pay rounded up and sellers receive rounded down, so the quote
//! vault may hold a few units of dust beyond what is owed. It may never
//! hold less.

use sealbid_matchcore::Market;
use sealbid_types::{AuctionError, Custody, Event, OpenOrders, Result, Side};
use serde::{Deserialize, Serialize};

/// What one vault owes against what it holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPosition {
    pub owed: u64,
    pub held: u64,
}

impl VaultPosition {
    /// Units held beyond what is owed.
    #[must_use]
    pub fn dust(&self) -> u64 {
        self.held.saturating_sub(self.owed)
    }

    #[must_use]
    pub fn is_solvent(&self) -> bool {
        self.held >= self.owed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyReport {
    pub base: VaultPosition,
    pub quote: VaultPosition,
}

fn sum(mut values: impl Iterator<Item = u64>) -> Result<u64> {
    values.try_fold(0u64, |acc, v| acc.checked_add(v).ok_or(AuctionError::NumericalOverflow))
}

/// Fill sizes still sitting in the queue for `side`: `(base, quote)`.
fn queued_fills(market: &Market, side: Side) -> Result<(u64, u64)> {
    let fills = || {
        market.event_queue.peek(usize::MAX).filter_map(move |event| match *event {
            Event::Fill {
                side: s,
                base_size,
                quote_size,
                ..
            } if s == side => Some((base_size, quote_size)),
            _ => None,
        })
    };
    Ok((sum(fills().map(|(b, _)| b))?, sum(fills().map(|(_, q)| q))?))
}

/// Compare both vaults of `market` against the accounts that claim them.
pub fn vault_positions<'a>(
    market: &Market,
    accounts: impl IntoIterator<Item = &'a OpenOrders> + Clone,
    custody: &impl Custody,
) -> Result<SolvencyReport> {
    let auction = &market.auction;
    let (bid_base, bid_quote) = queued_fills(market, Side::Bid)?;
    let (ask_base, ask_quote) = queued_fills(market, Side::Ask)?;
    let uncredited = sum([bid_base, auction.clearing.remaining_bid_fills].into_iter())?;
    let undebited = sum([ask_base, auction.clearing.remaining_ask_fills].into_iter())?;

    let base_total = sum(accounts.clone().into_iter().map(|oo| oo.base.total()))?;
    let base_owed = sum([base_total, uncredited].into_iter())?
        .checked_sub(undebited)
        .ok_or_else(|| {
            AuctionError::Internal(format!(
                "{undebited} base of ask fills pending against {base_total} held by accounts"
            ))
        })?;

    let quote_total = sum(accounts.into_iter().map(|oo| oo.quote.total()))?;
    let quote_owed = sum([quote_total, ask_quote].into_iter())?
        .checked_sub(bid_quote)
        .ok_or_else(|| {
            AuctionError::Internal(format!(
                "{bid_quote} quote of bid payments pending against {quote_total} held by accounts"
            ))
        })?;

    Ok(SolvencyReport {
        base: VaultPosition {
            owed: base_owed,
            held: custody.vault_balance(&auction.base_vault, &auction.base_mint),
        },
        quote: VaultPosition {
            owed: quote_owed,
            held: custody.vault_balance(&auction.quote_vault, &auction.quote_mint),
        },
    })
}

/// # Errors
/// Returns [`AuctionError::SupplyInvariantViolation`] if either vault holds
/// less than its accounts are owed.
pub fn verify_solvency<'a>(
    market: &Market,
    accounts: impl IntoIterator<Item = &'a OpenOrders> + Clone,
    custody: &impl Custody,
) -> Result<SolvencyReport> {
    let auction = &market.auction;
    let report = vault_positions(market, accounts, custody)?;
    for (name, position) in [("base", report.base), ("quote", report.quote)] {
        if !position.is_solvent() {
            tracing::error!(
                auction = %auction.auction_id,
                vault = name,
                owed = position.owed,
                held = position.held,
                "Vault insolvent"
            );
            return Err(AuctionError::SupplyInvariantViolation {
                reason: format!(
                    "{name} vault of {} holds {} but owes {}",
                    auction.auction_id, position.held, position.owed
                ),
            });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use sealbid_ingress::TokenLedger;
    use sealbid_types::{
        Address, Auction, AuctionConfig, AuctionId, EncryptionPubkey, InitAuctionArgs, OrderKey,
    };

    use super::*;

    fn market() -> Market {
        let args = InitAuctionArgs {
            auction_id: AuctionId::new("supply").unwrap(),
            start_order_phase: 0,
            end_order_phase: 10,
            end_decryption_phase: 20,
            are_asks_encrypted: false,
            are_bids_encrypted: false,
            nacl_pubkey: EncryptionPubkey::default(),
            base_mint: Address::new_unique(),
            quote_mint: Address::new_unique(),
            min_base_order_size: 1,
            tick_size: 1,
        };
        Market::new(Auction::new(Address::new_unique(), &args), &AuctionConfig::default())
    }

    fn funded(ledger: &mut TokenLedger, market: &Market, side: Side, amount: u64) -> OpenOrders {
        let a = &market.auction;
        let user = Address::new_unique();
        let (mint, vault) = match side {
            Side::Bid => (a.quote_mint, a.quote_vault),
            Side::Ask => (a.base_mint, a.base_vault),
        };
        ledger.airdrop(user, mint, amount).unwrap();
        ledger.deposit_to_vault(&user, &mint, &vault, amount).unwrap();
        OpenOrders::new(user, a.this_address(), side, 1).unwrap()
    }

    fn fill(side: Side, owner: Address, base_size: u64, quote_size: u64) -> Event {
        Event::Fill {
            side,
            order_key: OrderKey(1),
            owner,
            price: 1,
            quote_size,
            base_size,
        }
    }

    #[test]
    fn empty_auction_is_solvent() {
        let m = market();
        let report = verify_solvency(&m, std::iter::empty(), &TokenLedger::new()).unwrap();
        assert_eq!(report, SolvencyReport::default());
    }

    #[test]
    fn dust_is_allowed() {
        let m = market();
        let mut ledger = TokenLedger::new();
        let mut oo = funded(&mut ledger, &m, Side::Bid, 1_000);
        oo.quote.free = 999;
        let report = verify_solvency(&m, [&oo], &ledger).unwrap();
        assert_eq!(report.quote.dust(), 1);
        assert_eq!(report.base.dust(), 0);
    }

    #[test]
    fn shortfall_is_a_violation() {
        let m = market();
        let mut ledger = TokenLedger::new();
        let mut oo = funded(&mut ledger, &m, Side::Bid, 1_000);
        oo.quote.locked = 600;
        oo.quote.free = 401;
        let err = verify_solvency(&m, [&oo], &ledger).unwrap_err();
        assert!(matches!(err, AuctionError::SupplyInvariantViolation { .. }));
    }

    /// One trade of 60 base for 31 quote (bidder pays 31, seller gets 30),
    /// walked through every state between matching and consumption.
    #[test]
    fn fills_in_flight_are_netted_out() {
        let mut m = market();
        let mut ledger = TokenLedger::new();
        let mut bidder = funded(&mut ledger, &m, Side::Bid, 31);
        let mut seller = funded(&mut ledger, &m, Side::Ask, 60);
        bidder.quote.locked = 31;
        seller.base.locked = 60;

        // Clearing concluded, nothing emitted yet.
        m.auction.clearing.remaining_bid_fills = 60;
        m.auction.clearing.remaining_ask_fills = 60;
        verify_solvency(&m, [&bidder, &seller], &ledger).unwrap();

        // The bid Fill is queued, the ask side is not matched yet.
        m.auction.clearing.remaining_bid_fills = 0;
        m.event_queue.push(fill(Side::Bid, bidder.this_open_orders, 60, 31)).unwrap();
        verify_solvency(&m, [&bidder, &seller], &ledger).unwrap();

        // The bid Fill is consumed: the bidder is owed base the seller still holds.
        m.event_queue.pop_n(1);
        bidder.quote.locked = 0;
        bidder.base.free = 60;
        let report = verify_solvency(&m, [&bidder, &seller], &ledger).unwrap();
        assert_eq!(report.base, VaultPosition { owed: 60, held: 60 });

        // The ask Fill is queued, then consumed.
        m.auction.clearing.remaining_ask_fills = 0;
        m.event_queue.push(fill(Side::Ask, seller.this_open_orders, 60, 30)).unwrap();
        let report = verify_solvency(&m, [&bidder, &seller], &ledger).unwrap();
        assert_eq!(report.quote.dust(), 1);
        m.event_queue.pop_n(1);
        seller.base.locked = 0;
        seller.quote.free = 30;
        let report = verify_solvency(&m, [&bidder, &seller], &ledger).unwrap();
        assert_eq!(report.base.owed, 60);
        assert_eq!(report.quote, VaultPosition { owed: 30, held: 31 });
    }

    #[test]
    fn netting_does_not_hide_a_real_shortfall() {
        let mut m = market();
        let mut ledger = TokenLedger::new();
        let mut bidder = funded(&mut ledger, &m, Side::Bid, 31);
        let mut seller = funded(&mut ledger, &m, Side::Ask, 60);
        seller.base.locked = 60;
        // Credited base that no pending ask fill will ever cover.
        bidder.base.free = 60;
        m.event_queue.push(fill(Side::Ask, seller.this_open_orders, 20, 10)).unwrap();
        let err = verify_solvency(&m, [&bidder, &seller], &ledger).unwrap_err();
        assert!(matches!(err, AuctionError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn report_serializes() {
        let report = SolvencyReport {
            base: VaultPosition { owed: 1, held: 2 },
            quote: VaultPosition::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"held\":2"));
    }
}
