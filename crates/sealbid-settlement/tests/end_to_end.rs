//! End-to-end tests across all three planes.
//!
//! These tests drive one auction through every phase without the ledger
//! facade: Ingress (order entry, reveal) -> `MatchCore` (clearing,
//! matching) -> Finality Plane (consume, settle, teardown), checking vault
//! solvency after each step.

use rand::rngs::OsRng;
use sealbid_ingress::{
    EncryptionKeypair, OrderPayload, SealedSubmission, TokenLedger, decrypt_order,
    init_open_orders, new_encrypted_order, new_order, seal_order,
};
use sealbid_matchcore::{Market, calculate_clearing_price, match_orders};
use sealbid_settlement::{
    Payout, SolvencyReport, close_auction_accounts, consume_events, pending_owners,
    settle_and_close, verify_solvency,
};
use sealbid_types::*;

const TICK: u64 = 429_496_729;
const ORDER_END: i64 = 100;
const DECRYPT_END: i64 = 200;

/// Helper: one auction and everyone in it.
struct AuctionPipeline {
    market: Market,
    ledger: TokenLedger,
    auctioneer: EncryptionKeypair,
    accounts: Vec<OpenOrders>,
    histories: Vec<OrderHistory>,
}

impl AuctionPipeline {
    fn new(bids_encrypted: bool, queue_capacity: usize) -> Self {
        let auctioneer = EncryptionKeypair::generate(&mut OsRng);
        let args = InitAuctionArgs {
            auction_id: AuctionId::new("e2e").unwrap(),
            start_order_phase: 0,
            end_order_phase: ORDER_END,
            end_decryption_phase: DECRYPT_END,
            are_asks_encrypted: false,
            are_bids_encrypted: bids_encrypted,
            nacl_pubkey: auctioneer.public(),
            base_mint: Address::new_unique(),
            quote_mint: Address::new_unique(),
            min_base_order_size: 1_000,
            tick_size: TICK,
        };
        args.validate(0).unwrap();
        let config = AuctionConfig {
            event_queue_capacity: queue_capacity,
            ..AuctionConfig::default()
        };
        Self {
            market: Market::new(Auction::new(Address::new_unique(), &args), &config),
            ledger: TokenLedger::new(),
            auctioneer,
            accounts: Vec::new(),
            histories: Vec::new(),
        }
    }

    /// Fund a new user and open their account. Returns its index.
    fn join(&mut self, side: Side, funds: u64) -> usize {
        let user = Address::new_unique();
        let mint = match side {
            Side::Bid => self.market.auction.quote_mint,
            Side::Ask => self.market.auction.base_mint,
        };
        self.ledger.airdrop(user, mint, funds).unwrap();
        let (oo, history) = init_open_orders(&self.market.auction, user, side, 4, 1).unwrap();
        self.accounts.push(oo);
        self.histories.push(history);
        self.accounts.len() - 1
    }

    fn plain(&mut self, idx: usize, ticks: u64, qty: u64) -> OrderKey {
        new_order(&mut self.market, &mut self.accounts[idx], &mut self.ledger, 10, ticks * TICK, qty).unwrap()
    }

    fn sealed(&mut self, idx: usize, user_key: &EncryptionKeypair, ticks: u64, qty: u64, token_qty: u64) {
        let payload = OrderPayload {
            price_multiple: ticks,
            base_quantity: qty,
        };
        let envelope = seal_order(user_key, &self.auctioneer.public(), &payload, &mut OsRng).unwrap();
        let submission = SealedSubmission {
            token_qty,
            pubkey: user_key.public(),
            nonce: envelope.nonce,
            cipher_text: envelope.cipher_text,
        };
        new_encrypted_order(&self.market.auction, &mut self.accounts[idx], &mut self.ledger, 10, submission)
            .unwrap();
    }

    fn reveal_all(&mut self) -> Vec<Result<Vec<OrderKey>>> {
        let now = ORDER_END + 1;
        let mut outcomes = Vec::new();
        for oo in self.accounts.iter_mut().filter(|oo| oo.has_sealed_orders()) {
            let key = self.auctioneer.shared_key(&oo.nacl_pubkey);
            outcomes.push(decrypt_order(&mut self.market, oo, now, &key));
        }
        outcomes
    }

    fn assert_solvent(&self) -> SolvencyReport {
        verify_solvency(&self.market, &self.accounts, &self.ledger).unwrap()
    }

    fn clear(&mut self, limit: u16) {
        while !calculate_clearing_price(&mut self.market.auction.clearing, &self.market.book, limit)
            .unwrap()
            .found
        {}
    }

    fn consume_all(&mut self) {
        while !self.market.event_queue.is_empty() {
            assert!(!pending_owners(&self.market, 3).is_empty());
            consume_events(&mut self.market, &mut self.accounts, 3, false).unwrap();
            self.assert_solvent();
        }
    }

    /// Match in small steps, draining the queue whenever it fills up.
    fn match_all(&mut self, limit: u16) {
        loop {
            let m = &mut self.market;
            match match_orders(&mut m.auction, &mut m.book, &mut m.event_queue, limit) {
                Ok(progress) if progress.complete => break,
                Ok(_) | Err(AuctionError::AobEventQueueFull) => self.consume_all(),
                Err(e) => panic!("unexpected matching error: {e}"),
            }
        }
        self.consume_all();
    }

    fn settle_all(&mut self) -> Vec<Payout> {
        let auction = self.market.auction.clone();
        self.accounts
            .iter_mut()
            .zip(self.histories.iter_mut())
            .map(|(oo, history)| settle_and_close(&auction, oo, history, &mut self.ledger).unwrap())
            .collect()
    }
}

// =============================================================================
// Test: two bids at 1.1, one ask at 0.9, tick 0.1
// =============================================================================
#[test]
fn e2e_uniform_price_auction() {
    let mut p = AuctionPipeline::new(false, 64);
    let bidder_a = p.join(Side::Bid, 2_000_000);
    let bidder_b = p.join(Side::Bid, 2_000_000);
    let seller = p.join(Side::Ask, 1_000_000);

    p.plain(bidder_a, 11, 1_000_000);
    p.plain(bidder_b, 11, 1_000_000);
    p.plain(seller, 9, 1_000_000);
    assert_eq!(p.accounts[bidder_a].quote.locked, 1_100_000);
    p.assert_solvent();

    p.clear(1);
    let clearing = p.market.auction.clearing;
    assert_eq!(clearing.clearing_price, 9 * TICK);
    assert_eq!(clearing.total_quantity_matched, 1_000_000);
    assert!(matches!(
        p.market.auction.phase(DECRYPT_END),
        AuctionPhase::Matching { .. }
    ));

    p.match_all(1);
    assert!(matches!(p.market.auction.phase(DECRYPT_END), AuctionPhase::Settlement));

    // the earlier bidder wins the whole lot
    assert_eq!(p.accounts[bidder_a].base.free, 1_000_000);
    assert_eq!(p.accounts[bidder_a].quote.free, 200_000);
    assert_eq!(p.accounts[bidder_b].quote.free, 1_100_000);
    assert_eq!(p.accounts[seller].quote.free, 899_999);
    let report = p.assert_solvent();
    assert_eq!(report.quote.dust(), 1);

    let payouts = p.settle_all();
    assert_eq!(payouts[seller].quote, 899_999);
    assert!(p.histories.iter().all(|h| h.settled));
    assert_eq!(p.histories[bidder_a].net_quote(), -900_000);
    assert_eq!(p.ledger.wallet_balance(&p.accounts[bidder_b].authority, &p.market.auction.quote_mint), 2_000_000);

    close_auction_accounts(&p.market, &p.market.auction.authority, DECRYPT_END).unwrap();
}

// =============================================================================
// Test: sealed bids revealed during decryption
// =============================================================================
#[test]
fn e2e_sealed_bids() {
    let mut p = AuctionPipeline::new(true, 64);
    let user_key = EncryptionKeypair::generate(&mut OsRng);
    let bidder = p.join(Side::Bid, 5_000_000);
    let short = p.join(Side::Bid, 5_000_000);
    let short_key = EncryptionKeypair::generate(&mut OsRng);
    let seller = p.join(Side::Ask, 3_000_000);

    p.sealed(bidder, &user_key, 11, 1_000_000, 1_500_000);
    p.sealed(bidder, &user_key, 10, 500_000, 500_000);
    p.sealed(short, &short_key, 12, 1_000_000, 1_000_000);
    p.plain(seller, 9, 2_000_000);
    p.assert_solvent();

    let outcomes = p.reveal_all();
    assert_eq!(outcomes[0].as_ref().map(Vec::len), Ok(2));
    assert!(matches!(
        outcomes[1],
        Err(AuctionError::InsufficientTokensForOrder { .. })
    ));
    // the short account keeps its sealed order and can only withdraw it
    assert!(p.accounts[short].has_sealed_orders());
    sealbid_ingress::cancel_encrypted_order(&p.market.auction, &mut p.accounts[short], DECRYPT_END, 0).unwrap();
    assert_eq!(p.accounts[short].quote.free, 1_000_000);

    p.clear(2);
    assert_eq!(p.market.auction.clearing.total_quantity_matched, 1_500_000);
    p.match_all(2);

    assert_eq!(p.accounts[bidder].base.free, 1_500_000);
    assert_eq!(p.accounts[seller].base.free, 500_000);
    p.assert_solvent();
    p.settle_all();
    assert_eq!(p.ledger.wallet_balance(&p.accounts[seller].authority, &p.market.auction.base_mint), 1_500_000);
}

// =============================================================================
// Test: a tiny event queue forces interleaved match and consume
// =============================================================================
#[test]
fn e2e_tiny_event_queue() {
    let mut p = AuctionPipeline::new(false, 2);
    let mut bidders = Vec::new();
    for _ in 0..3 {
        let idx = p.join(Side::Bid, 1_000_000);
        p.plain(idx, 10, 100_000);
        bidders.push(idx);
    }
    let seller = p.join(Side::Ask, 1_000_000);
    p.plain(seller, 10, 250_000);

    p.clear(8);
    p.match_all(8);
    let bought: u64 = bidders.iter().map(|&i| p.accounts[i].base.free).sum();
    assert_eq!(bought, 250_000);
    assert!(p.accounts.iter().all(OpenOrders::is_empty));
    p.settle_all();
    close_auction_accounts(&p.market, &p.market.auction.authority, DECRYPT_END).unwrap();
}
