//! The ledger facade.
//!
//! [`AuctionHouse`] owns every account (auctions with their book and queue,
//! OpenOrders, OrderHistory) and the token ledger, and exposes the twelve
//! auction operations on top of them.
//!
//! Each operation runs against copies of the accounts it touches. The
//! copies are written back only if the operation succeeded and the
//! auction's vaults still cover every open account, so a failed call never
//! leaves a partial change behind.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use sealbid_ingress::{
    SealedSubmission, SharedKey, TokenLedger, encrypted_orders, guards, orders,
};
use sealbid_matchcore::{ClearingProgress, Market, MatchProgress, check_node_budget};
use sealbid_settlement::{Payout, SolvencyReport, consume, settle, verify_solvency};
use sealbid_types::{
    Address, Auction, AuctionConfig, AuctionError, AuctionId, AuctionPhase, Event,
    InitAuctionArgs, OpenOrders, OrderHistory, OrderKey, Result, Side,
    fixed_point::fp32_to_decimal,
};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};

/// Which OpenOrders accounts a scan returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOrdersFilter {
    All,
    /// Still holding orders that were never revealed.
    HasSealedOrders,
    /// Nothing in flight: ready for settle-and-close.
    IsEmpty,
}

/// Read-only view of an auction for operators and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuctionSummary {
    pub auction_id: AuctionId,
    pub address: Address,
    pub phase: AuctionPhase,
    pub clearing_price: Decimal,
    pub total_quantity_matched: u64,
    pub resting_orders: u64,
    pub queued_events: usize,
    pub closed: bool,
}

/// Working copies for one operation.
struct Txn {
    now: i64,
    market: Market,
    ledger: TokenLedger,
}

/// All auctions on one ledger.
#[derive(Debug)]
pub struct AuctionHouse<C: Clock = SystemClock> {
    clock: C,
    config: AuctionConfig,
    markets: HashMap<Address, Market>,
    /// Auctions whose book and queue were released.
    closed: HashSet<Address>,
    open_orders: BTreeMap<Address, OpenOrders>,
    histories: HashMap<Address, OrderHistory>,
    ledger: TokenLedger,
}

impl<C: Clock> AuctionHouse<C> {
    #[must_use]
    pub fn new(clock: C, config: AuctionConfig) -> Self {
        Self {
            clock,
            config,
            markets: HashMap::new(),
            closed: HashSet::new(),
            open_orders: BTreeMap::new(),
            histories: HashMap::new(),
            ledger: TokenLedger::new(),
        }
    }

    // =================================================================
    // Accessors
    // =================================================================

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    /// Direct access to wallets, for funding users outside any auction.
    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.ledger
    }

    pub fn market(&self, auction: &Address) -> Result<&Market> {
        self.markets
            .get(auction)
            .ok_or(AuctionError::AccountNotFound(*auction))
    }

    pub fn auction(&self, auction: &Address) -> Result<&Auction> {
        self.market(auction).map(|m| &m.auction)
    }

    pub fn open_orders(&self, address: &Address) -> Result<&OpenOrders> {
        self.open_orders
            .get(address)
            .ok_or(AuctionError::AccountNotFound(*address))
    }

    pub fn order_history(&self, address: &Address) -> Result<&OrderHistory> {
        self.histories
            .get(address)
            .ok_or(AuctionError::AccountNotFound(*address))
    }

    pub fn phase(&self, auction: &Address) -> Result<AuctionPhase> {
        Ok(self.auction(auction)?.phase(self.clock.now()))
    }

    pub fn summary(&self, auction: &Address) -> Result<AuctionSummary> {
        let market = self.market(auction)?;
        let a = &market.auction;
        Ok(AuctionSummary {
            auction_id: a.auction_id,
            address: *auction,
            phase: a.phase(self.clock.now()),
            clearing_price: fp32_to_decimal(a.clearing.clearing_price),
            total_quantity_matched: a.clearing.total_quantity_matched,
            resting_orders: a.resting_orders,
            queued_events: market.event_queue.len(),
            closed: self.closed.contains(auction),
        })
    }

    pub fn solvency(&self, auction: &Address) -> Result<SolvencyReport> {
        verify_solvency(self.market(auction)?, self.accounts_of(auction), &self.ledger)
    }

    fn accounts_of<'a>(&'a self, auction: &'a Address) -> impl Iterator<Item = &'a OpenOrders> + Clone + 'a {
        self.open_orders.values().filter(move |oo| oo.auction == *auction)
    }

    // =================================================================
    // Transactions
    // =================================================================

    fn begin(&self, auction: &Address, needs_book: bool) -> Result<Txn> {
        let market = self.market(auction)?;
        if needs_book && self.closed.contains(auction) {
            return Err(AuctionError::InvalidAobMarketState);
        }
        Ok(Txn {
            now: self.clock.now(),
            market: market.clone(),
            ledger: self.ledger.clone(),
        })
    }

    /// Write back `tx` and the `staged` accounts, dropping `removed`.
    fn commit(
        &mut self,
        op: &'static str,
        tx: Txn,
        staged: Vec<OpenOrders>,
        removed: Option<Address>,
    ) -> Result<()> {
        let auction = tx.market.auction.this_address();
        let untouched = self.open_orders.values().filter(|oo| {
            oo.auction == auction
                && Some(oo.this_open_orders) != removed
                && !staged.iter().any(|s| s.this_open_orders == oo.this_open_orders)
        });
        let staged_here = staged.iter().filter(|oo| oo.auction == auction);
        verify_solvency(&tx.market, untouched.chain(staged_here), &tx.ledger)?;

        for oo in staged {
            self.open_orders.insert(oo.this_open_orders, oo);
        }
        if let Some(address) = removed {
            self.open_orders.remove(&address);
        }
        self.markets.insert(auction, tx.market);
        self.ledger = tx.ledger;
        tracing::debug!(op, auction = %auction.short(), "Committed");
        Ok(())
    }

    fn owned_open_orders(&self, signer: &Address, address: &Address) -> Result<OpenOrders> {
        let oo = self.open_orders(address)?;
        guards::require_owner(oo, signer)?;
        Ok(oo.clone())
    }

    // =================================================================
    // Operations
    // =================================================================

    /// Create an auction with its book, queue and vaults.
    pub fn init_auction(&mut self, authority: Address, args: &InitAuctionArgs) -> Result<Address> {
        args.validate(self.clock.now())?;
        let address = Auction::address(&args.auction_id, &authority);
        if self.markets.contains_key(&address) {
            return Err(AuctionError::AccountAlreadyExists(address));
        }
        let auction = Auction::new(authority, args);
        tracing::info!(
            auction = %args.auction_id,
            address = %address.short(),
            asks_sealed = args.are_asks_encrypted,
            bids_sealed = args.are_bids_encrypted,
            "Auction created"
        );
        self.markets.insert(address, Market::new(auction, &self.config));
        Ok(address)
    }

    /// Open `user`'s account on one side of `auction`. Returns its address.
    pub fn init_open_orders(
        &mut self,
        user: Address,
        auction: &Address,
        side: Side,
        max_orders: u8,
    ) -> Result<Address> {
        let now = self.clock.now();
        let a = self.auction(auction)?;
        let address = OpenOrders::address(auction, &user);
        let history_address = OrderHistory::address(auction, &user);
        if self.open_orders.contains_key(&address) || self.histories.contains_key(&history_address) {
            return Err(AuctionError::AccountAlreadyExists(address));
        }
        let (oo, history) = orders::init_open_orders(a, user, side, max_orders, now)?;
        self.open_orders.insert(address, oo);
        self.histories.insert(history_address, history);
        Ok(address)
    }

    pub fn new_order(
        &mut self,
        signer: &Address,
        open_orders: &Address,
        limit_price: u64,
        max_base_qty: u64,
    ) -> Result<OrderKey> {
        let mut oo = self.owned_open_orders(signer, open_orders)?;
        let mut tx = self.begin(&oo.auction, true)?;
        let key = orders::new_order(&mut tx.market, &mut oo, &mut tx.ledger, tx.now, limit_price, max_base_qty)?;
        self.commit("new_order", tx, vec![oo], None)?;
        Ok(key)
    }

    pub fn cancel_order(&mut self, signer: &Address, open_orders: &Address, key: OrderKey) -> Result<()> {
        let mut oo = self.owned_open_orders(signer, open_orders)?;
        let mut tx = self.begin(&oo.auction, true)?;
        orders::cancel_order(&mut tx.market, &mut oo, tx.now, key)?;
        self.commit("cancel_order", tx, vec![oo], None)
    }

    pub fn new_encrypted_order(
        &mut self,
        signer: &Address,
        open_orders: &Address,
        submission: SealedSubmission,
    ) -> Result<()> {
        let mut oo = self.owned_open_orders(signer, open_orders)?;
        let mut tx = self.begin(&oo.auction, false)?;
        encrypted_orders::new_encrypted_order(&tx.market.auction, &mut oo, &mut tx.ledger, tx.now, submission)?;
        self.commit("new_encrypted_order", tx, vec![oo], None)
    }

    pub fn cancel_encrypted_order(&mut self, signer: &Address, open_orders: &Address, idx: u8) -> Result<()> {
        let mut oo = self.owned_open_orders(signer, open_orders)?;
        let tx = self.begin(&oo.auction, false)?;
        encrypted_orders::cancel_encrypted_order(&tx.market.auction, &mut oo, tx.now, idx)?;
        self.commit("cancel_encrypted_order", tx, vec![oo], None)
    }

    /// Reveal an account's sealed orders. Needs no signer: only the holder
    /// of the matching shared key can open them.
    pub fn decrypt_order(&mut self, open_orders: &Address, key: &SharedKey) -> Result<Vec<OrderKey>> {
        let mut oo = self.open_orders(open_orders)?.clone();
        let mut tx = self.begin(&oo.auction, true)?;
        let keys = encrypted_orders::decrypt_order(&mut tx.market, &mut oo, tx.now, key)?;
        self.commit("decrypt_order", tx, vec![oo], None)?;
        Ok(keys)
    }

    pub fn calculate_clearing_price(&mut self, auction: &Address, limit: u16) -> Result<ClearingProgress> {
        let mut tx = self.begin(auction, true)?;
        guards::require_clearing_phase(&tx.market.auction, tx.now)?;
        check_node_budget(limit, self.config.max_nodes_per_invocation)?;
        let m = &mut tx.market;
        let progress = sealbid_matchcore::calculate_clearing_price(&mut m.auction.clearing, &m.book, limit)?;
        self.commit("calculate_clearing_price", tx, Vec::new(), None)?;
        Ok(progress)
    }

    pub fn match_orders(&mut self, auction: &Address, limit: u16) -> Result<MatchProgress> {
        let mut tx = self.begin(auction, true)?;
        guards::require_matching_phase(&tx.market.auction, tx.now)?;
        check_node_budget(limit, self.config.max_nodes_per_invocation)?;
        let m = &mut tx.market;
        let progress = sealbid_matchcore::match_orders(&mut m.auction, &mut m.book, &mut m.event_queue, limit)?;
        self.commit("match_orders", tx, Vec::new(), None)?;
        Ok(progress)
    }

    /// Consume up to `limit` events, crediting the supplied accounts.
    pub fn consume_events(
        &mut self,
        auction: &Address,
        accounts: &[Address],
        limit: u16,
        allow_no_op: bool,
    ) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut supplied: Vec<OpenOrders> = accounts
            .iter()
            .filter(|a| seen.insert(**a))
            .filter_map(|a| self.open_orders.get(a).cloned())
            .collect();
        let mut tx = self.begin(auction, true)?;
        let consumed = consume::consume_events(&mut tx.market, &mut supplied, limit, allow_no_op)?;
        self.commit("consume_events", tx, supplied, None)?;
        Ok(consumed)
    }

    /// Settle an emptied account and pay its free balances to the owner.
    pub fn settle_and_close_open_orders(&mut self, open_orders: &Address) -> Result<Payout> {
        let mut oo = self.open_orders(open_orders)?.clone();
        let history_address = OrderHistory::address(&oo.auction, &oo.authority);
        let mut history = self.order_history(&history_address)?.clone();
        let mut tx = self.begin(&oo.auction, false)?;
        let payout = settle::settle_and_close(&tx.market.auction, &mut oo, &mut history, &mut tx.ledger)?;
        self.commit("settle_and_close_open_orders", tx, Vec::new(), Some(*open_orders))?;
        self.histories.insert(history_address, history);
        Ok(payout)
    }

    /// Release the book and queue of a finished auction.
    pub fn close_auction_accounts(&mut self, signer: &Address, auction: &Address) -> Result<()> {
        let tx = self.begin(auction, true)?;
        settle::close_auction_accounts(&tx.market, signer, tx.now)?;
        self.closed.insert(*auction);
        Ok(())
    }

    // =================================================================
    // Discovery
    // =================================================================

    /// Addresses of the auction's OpenOrders accounts, in address order.
    pub fn scan_open_orders(&self, auction: &Address, filter: OpenOrdersFilter) -> Vec<Address> {
        self.accounts_of(auction)
            .filter(|oo| match filter {
                OpenOrdersFilter::All => true,
                OpenOrdersFilter::HasSealedOrders => oo.has_sealed_orders(),
                OpenOrdersFilter::IsEmpty => settle::require_settleable(oo).is_ok(),
            })
            .map(|oo| oo.this_open_orders)
            .collect()
    }

    /// The next `limit` events, without consuming them.
    pub fn peek_events(&self, auction: &Address, limit: usize) -> Result<Vec<Event>> {
        if self.closed.contains(auction) {
            return Err(AuctionError::InvalidAobMarketState);
        }
        Ok(self.market(auction)?.event_queue.peek(limit).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use sealbid_types::EncryptionPubkey;

    use super::*;
    use crate::clock::ManualClock;

    const TICK: u64 = 429_496_729;

    fn house() -> (AuctionHouse<ManualClock>, Address, Address) {
        let mut house = AuctionHouse::new(ManualClock::new(0), AuctionConfig::default());
        let authority = Address::new_unique();
        let args = InitAuctionArgs {
            auction_id: AuctionId::new("house").unwrap(),
            start_order_phase: 0,
            end_order_phase: 100,
            end_decryption_phase: 200,
            are_asks_encrypted: false,
            are_bids_encrypted: false,
            nacl_pubkey: EncryptionPubkey([5; 32]),
            base_mint: Address::new_unique(),
            quote_mint: Address::new_unique(),
            min_base_order_size: 1,
            tick_size: TICK,
        };
        let auction = house.init_auction(authority, &args).unwrap();
        (house, authority, auction)
    }

    fn funded_account(house: &mut AuctionHouse<ManualClock>, auction: &Address, side: Side) -> (Address, Address) {
        let user = Address::new_unique();
        let a = house.auction(auction).unwrap().clone();
        house.ledger_mut().airdrop(user, a.base_mint, 1_000_000).unwrap();
        house.ledger_mut().airdrop(user, a.quote_mint, 1_000_000).unwrap();
        let oo = house.init_open_orders(user, auction, side, 2).unwrap();
        (user, oo)
    }

    #[test]
    fn duplicate_accounts_are_rejected() {
        let (mut house, authority, auction) = house();
        let args = InitAuctionArgs {
            auction_id: house.auction(&auction).unwrap().auction_id,
            start_order_phase: 0,
            end_order_phase: 100,
            end_decryption_phase: 200,
            are_asks_encrypted: false,
            are_bids_encrypted: false,
            nacl_pubkey: EncryptionPubkey::default(),
            base_mint: Address::new_unique(),
            quote_mint: Address::new_unique(),
            min_base_order_size: 1,
            tick_size: 1,
        };
        assert_eq!(
            house.init_auction(authority, &args),
            Err(AuctionError::AccountAlreadyExists(auction))
        );
        let user = Address::new_unique();
        let oo = house.init_open_orders(user, &auction, Side::Bid, 1).unwrap();
        assert_eq!(
            house.init_open_orders(user, &auction, Side::Ask, 1),
            Err(AuctionError::AccountAlreadyExists(oo))
        );
    }

    #[test]
    fn failed_operation_changes_nothing() {
        let (mut house, _, auction) = house();
        let (user, oo) = funded_account(&mut house, &auction, Side::Bid);
        // 2_000_000 at 1.0 needs more quote than the wallet holds
        let err = house.new_order(&user, &oo, 10 * TICK, 2_000_000).unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientFunds { .. }));
        assert_eq!(house.auction(&auction).unwrap().resting_orders, 0);
        assert_eq!(house.auction(&auction).unwrap().order_sequence, 0);
        assert_eq!(house.open_orders(&oo).unwrap().num_orders(), 0);
        assert!(house.market(&auction).unwrap().book.is_empty());
    }

    #[test]
    fn only_the_owner_places_orders() {
        let (mut house, _, auction) = house();
        let (_, oo) = funded_account(&mut house, &auction, Side::Ask);
        assert_eq!(
            house.new_order(&Address::new_unique(), &oo, TICK, 10),
            Err(AuctionError::Unauthorized)
        );
    }

    #[test]
    fn scans_filter_accounts() {
        let (mut house, _, auction) = house();
        let (user, busy) = funded_account(&mut house, &auction, Side::Ask);
        let (_, idle) = funded_account(&mut house, &auction, Side::Bid);
        house.new_order(&user, &busy, TICK, 10).unwrap();

        let all = house.scan_open_orders(&auction, OpenOrdersFilter::All);
        assert_eq!(all.len(), 2);
        assert_eq!(house.scan_open_orders(&auction, OpenOrdersFilter::IsEmpty), vec![idle]);
        assert!(house.scan_open_orders(&auction, OpenOrdersFilter::HasSealedOrders).is_empty());
        assert!(house.scan_open_orders(&Address::new_unique(), OpenOrdersFilter::All).is_empty());
    }

    #[test]
    fn node_budget_is_enforced() {
        let (mut house, _, auction) = house();
        let (user, ask) = funded_account(&mut house, &auction, Side::Ask);
        house.new_order(&user, &ask, TICK, 10).unwrap();
        let (user, bid) = funded_account(&mut house, &auction, Side::Bid);
        house.new_order(&user, &bid, TICK, 10).unwrap();
        house.clock().set(200);
        let budget = house.config().max_nodes_per_invocation;
        assert_eq!(
            house.calculate_clearing_price(&auction, budget + 1),
            Err(AuctionError::SlabIteratorOverflow {
                requested: budget + 1,
                budget
            })
        );
        assert!(house.calculate_clearing_price(&auction, budget).unwrap().found);
    }

    #[test]
    fn empty_auction_cannot_clear() {
        let (mut house, authority, auction) = house();
        house.clock().set(200);
        // nothing was ever placed: clearing has no orders to walk
        assert_eq!(house.calculate_clearing_price(&auction, 8), Err(AuctionError::NoBidOrders));

        let summary = house.summary(&auction).unwrap();
        assert!(summary.phase.is_clearing());
        assert_eq!(
            house.close_auction_accounts(&authority, &auction),
            Err(AuctionError::AuctionNotFinished)
        );
    }

    #[test]
    fn one_sided_auction_unwinds_but_never_closes() {
        let (mut house, authority, auction) = house();
        let (user, ask) = funded_account(&mut house, &auction, Side::Ask);
        let key = house.new_order(&user, &ask, TICK, 10).unwrap();
        house.clock().set(200);
        assert_eq!(house.calculate_clearing_price(&auction, 8), Err(AuctionError::NoBidOrders));
        house.cancel_order(&user, &ask, key).unwrap();
        let payout = house.settle_and_close_open_orders(&ask).unwrap();
        assert_eq!(payout.base, 10);
        assert!(house.open_orders(&ask).is_err());

        let history = OrderHistory::address(&auction, &user);
        assert!(house.order_history(&history).unwrap().settled);
        assert_eq!(house.solvency(&auction).unwrap(), SolvencyReport::default());

        // no clearing price will ever be found, so the auction stays open
        assert!(house.phase(&auction).unwrap().is_clearing());
        assert_eq!(
            house.close_auction_accounts(&authority, &auction),
            Err(AuctionError::AuctionNotFinished)
        );
    }

    #[test]
    fn summary_serializes_price_as_decimal() {
        let (house, _, auction) = house();
        let json = serde_json::to_value(house.summary(&auction).unwrap()).unwrap();
        assert_eq!(json["phase"], "Ordering");
        assert!(json["clearing_price"].is_string());
        assert_eq!(json["closed"], false);
    }
}
