//! # sealbid-settlement
//!
//! **Finality Plane**: event consumption, settle-and-close of OpenOrders
//! accounts, auction teardown, and the vault solvency invariant.
//!
//! ## Architecture
//!
//! Matching leaves Fill/Out events in the queue. The Finality Plane:
//! 1. Consumes them in bounded batches, crediting the named accounts
//! 2. Settles each emptied account: history written, free balances paid out
//! 3. Releases the book and queue once the auction is fully drained
//! 4. Checks after every step that no vault owes more than it holds

pub mod consume;
pub mod settle;
pub mod supply_conservation;

pub use consume::{consume_events, pending_owners};
pub use settle::{Payout, close_auction_accounts, require_settleable, settle_and_close};
pub use supply_conservation::{SolvencyReport, VaultPosition, verify_solvency};
