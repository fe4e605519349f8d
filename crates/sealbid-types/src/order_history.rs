//! Terminal per-user record that outlives the OpenOrders account.

use serde::{Deserialize, Serialize};

use crate::{Address, AuctionError, OpenOrders, Result, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub authority: Address,
    pub auction: Address,
    pub side: Side,
    pub quote_amount_deposited: u64,
    pub base_amount_deposited: u64,
    pub quote_amount_returned: u64,
    pub base_amount_returned: u64,
    pub clearing_price: u64,
    pub settled: bool,
}

impl OrderHistory {
    #[must_use]
    pub fn address(auction: &Address, authority: &Address) -> Address {
        Address::derive(&[b"order_history", auction.as_bytes(), authority.as_bytes()])
    }

    /// Zeroed record created alongside the OpenOrders account.
    #[must_use]
    pub fn new(authority: Address, auction: Address, side: Side) -> Self {
        Self {
            authority,
            auction,
            side,
            quote_amount_deposited: 0,
            base_amount_deposited: 0,
            quote_amount_returned: 0,
            base_amount_returned: 0,
            clearing_price: 0,
            settled: false,
        }
    }

    /// Write the settlement outcome. Only ever done once.
    pub fn record_settlement(&mut self, open_orders: &OpenOrders, clearing_price: u64) -> Result<()> {
        if self.settled {
            return Err(AuctionError::Internal(format!(
                "order history for {} already written",
                self.authority
            )));
        }
        self.side = open_orders.side;
        self.quote_amount_deposited = open_orders.quote.deposited;
        self.base_amount_deposited = open_orders.base.deposited;
        self.quote_amount_returned = open_orders.quote.free;
        self.base_amount_returned = open_orders.base.free;
        self.clearing_price = clearing_price;
        self.settled = true;
        Ok(())
    }

    /// Net quote movement for the user (returned minus deposited).
    #[must_use]
    pub fn net_quote(&self) -> i128 {
        i128::from(self.quote_amount_returned) - i128::from(self.quote_amount_deposited)
    }

    #[must_use]
    pub fn net_base(&self) -> i128 {
        i128::from(self.base_amount_returned) - i128::from(self.base_amount_deposited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_is_written_once() {
        let user = Address::new_unique();
        let auction = Address::new_unique();
        let mut oo = OpenOrders::new(user, auction, Side::Bid, 1).unwrap();
        oo.quote.deposited = 1_100_000;
        oo.quote.free = 200_000;
        oo.base.free = 1_000_000;

        let mut history = OrderHistory::new(user, auction, Side::Bid);
        history.record_settlement(&oo, 42).unwrap();
        assert_eq!(history.net_quote(), -900_000);
        assert_eq!(history.net_base(), 1_000_000);
        assert!(history.record_settlement(&oo, 42).is_err());
    }
}
