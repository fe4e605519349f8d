//! The ledger as seen by a crank.

use sealbid_ingress::SharedKey;
use sealbid_matchcore::{ClearingProgress, MatchProgress};
use sealbid_program::{AuctionHouse, Clock, OpenOrdersFilter};
use sealbid_settlement::Payout;
use sealbid_types::{Address, AuctionPhase, Event, OpenOrders, OrderKey};

use crate::error::CrankResult;

/// Reads and permissionless invocations a crank needs.
///
/// Implementations may fail with [`crate::CrankError::Transport`] when an
/// invocation is lost; the drivers retry those.
pub trait AuctionClient {
    fn phase(&self, auction: &Address) -> CrankResult<AuctionPhase>;

    fn scan_open_orders(&self, auction: &Address, filter: OpenOrdersFilter) -> CrankResult<Vec<Address>>;

    fn open_orders(&self, address: &Address) -> CrankResult<OpenOrders>;

    fn peek_events(&self, auction: &Address, limit: usize) -> CrankResult<Vec<Event>>;

    fn decrypt_order(&mut self, open_orders: &Address, key: &SharedKey) -> CrankResult<Vec<OrderKey>>;

    fn calculate_clearing_price(&mut self, auction: &Address, limit: u16) -> CrankResult<ClearingProgress>;

    fn match_orders(&mut self, auction: &Address, limit: u16) -> CrankResult<MatchProgress>;

    fn consume_events(
        &mut self,
        auction: &Address,
        accounts: &[Address],
        limit: u16,
        allow_no_op: bool,
    ) -> CrankResult<usize>;

    fn settle_and_close_open_orders(&mut self, open_orders: &Address) -> CrankResult<Payout>;
}

impl<C: Clock> AuctionClient for AuctionHouse<C> {
    fn phase(&self, auction: &Address) -> CrankResult<AuctionPhase> {
        Ok(AuctionHouse::phase(self, auction)?)
    }

    fn scan_open_orders(&self, auction: &Address, filter: OpenOrdersFilter) -> CrankResult<Vec<Address>> {
        Ok(AuctionHouse::scan_open_orders(self, auction, filter))
    }

    fn open_orders(&self, address: &Address) -> CrankResult<OpenOrders> {
        Ok(AuctionHouse::open_orders(self, address)?.clone())
    }

    fn peek_events(&self, auction: &Address, limit: usize) -> CrankResult<Vec<Event>> {
        Ok(AuctionHouse::peek_events(self, auction, limit)?)
    }

    fn decrypt_order(&mut self, open_orders: &Address, key: &SharedKey) -> CrankResult<Vec<OrderKey>> {
        Ok(AuctionHouse::decrypt_order(self, open_orders, key)?)
    }

    fn calculate_clearing_price(&mut self, auction: &Address, limit: u16) -> CrankResult<ClearingProgress> {
        Ok(AuctionHouse::calculate_clearing_price(self, auction, limit)?)
    }

    fn match_orders(&mut self, auction: &Address, limit: u16) -> CrankResult<MatchProgress> {
        Ok(AuctionHouse::match_orders(self, auction, limit)?)
    }

    fn consume_events(
        &mut self,
        auction: &Address,
        accounts: &[Address],
        limit: u16,
        allow_no_op: bool,
    ) -> CrankResult<usize> {
        Ok(AuctionHouse::consume_events(self, auction, accounts, limit, allow_no_op)?)
    }

    fn settle_and_close_open_orders(&mut self, open_orders: &Address) -> CrankResult<Payout> {
        Ok(AuctionHouse::settle_and_close_open_orders(self, open_orders)?)
    }
}
