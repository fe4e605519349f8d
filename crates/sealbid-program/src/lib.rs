//! # sealbid-program
//!
//! Ledger facade for the **sealbid** sealed-bid batch auction.
//!
//! This crate holds every account and exposes the auction operations:
//!
//! - [`AuctionHouse`]: account store plus the twelve operations, each
//!   applied all-or-nothing
//! - [`Clock`]: source of the ledger timestamp ([`SystemClock`] in
//!   production, [`ManualClock`] in tests and simulations)
//!
//! ## Atomicity
//!
//! An operation works on copies of the accounts it touches. The copies are
//! committed only when the operation succeeded **and** each vault of the
//! auction still holds at least what the open accounts are owed. Anything
//! else rolls back completely.
//!
//! ## Auction Lifecycle
//!
//! ```text
//! ┌─────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ PENDING │──▶│ ORDERING │──▶│ DECRYPTION │──▶│ CLEARING │──▶│ MATCHING │──▶│ SETTLEMENT │
//! └─────────┘   └──────────┘   └────────────┘   └──────────┘   └──────────┘   └────────────┘
//!                place/cancel    reveal sealed    crank the       crank fills     settle
//!                orders          orders           price walk      and consume     and close
//! ```

pub mod clock;
pub mod house;

pub use clock::{Clock, ManualClock, SystemClock};
pub use house::{AuctionHouse, AuctionSummary, OpenOrdersFilter};
