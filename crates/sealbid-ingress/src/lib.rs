//! # sealbid-ingress
//!
//! **Order Ingress Plane**: phase guards, the sealed-order envelope, plain
//! and sealed order entry, reveal, and token custody.
//!
//! ## Architecture
//!
//! Everything a user does before the book is frozen goes through here:
//! 1. **guards**: one phase guard per operation, plus side/signer checks
//! 2. **orders**: open an OpenOrders account, place and cancel plain orders
//! 3. **encrypted_orders**: place, withdraw and reveal sealed orders
//! 4. **sealed_order**: the 16-byte payload and its `crypto_box` envelope
//! 5. **custody**: in-memory wallets and vaults behind the `Custody` trait
//!
//! ## Order Flow
//!
//! ```text
//! plain:  new_order()           → vault deposit → lock → OrderBook
//! sealed: new_encrypted_order() → vault deposit → lock → OpenOrders
//!         decrypt_order()       → open all → check all → OrderBook
//! ```
//!
//! Reveal is all-or-nothing per account: one bad entry keeps every sealed
//! order on that account out of the book.

pub mod custody;
pub mod encrypted_orders;
pub mod guards;
pub mod orders;
pub mod sealed_order;

pub use custody::TokenLedger;
pub use encrypted_orders::{SealedSubmission, cancel_encrypted_order, decrypt_order, new_encrypted_order};
pub use orders::{cancel_order, init_open_orders, new_order};
pub use sealed_order::{EncryptionKeypair, OrderPayload, SealedEnvelope, SharedKey, seal_order};
