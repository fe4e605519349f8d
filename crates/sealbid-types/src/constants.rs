//! System-wide constants for the sealbid auction.

/// Number of fractional bits in a 32.32 fixed-point value.
pub const FP32_SHIFT: u32 = 32;

/// `1.0` in 32.32 fixed point.
pub const FP32_ONE: u64 = 1 << FP32_SHIFT;

/// Maximum length of an auction identifier in bytes.
pub const AUCTION_ID_LEN: usize = 10;

/// Upper bound for `max_orders` on a single OpenOrders account.
pub const MAX_ORDERS_PER_ACCOUNT: u8 = 6;

/// Length of an x25519 public key.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Length of the XSalsa20 nonce used to seal an order.
pub const NONCE_LEN: usize = 24;

/// Plaintext size of a sealed order: price multiple + base quantity.
pub const SEALED_PLAINTEXT_LEN: usize = 16;

/// Poly1305 tag appended to every ciphertext.
pub const SEALED_TAG_LEN: usize = 16;

/// Default number of events the queue can hold.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Default number of resting orders per book side.
pub const DEFAULT_BOOK_SIDE_CAPACITY: usize = 1000;

/// Default upper bound on book nodes visited by one clearing or matching call.
pub const DEFAULT_MAX_NODES_PER_INVOCATION: u16 = 512;

/// Consecutive failed invocations after which a crank driver gives up.
pub const DEFAULT_CRANK_FAILURE_LIMIT: u32 = 3;

/// Book nodes a crank asks for per clearing or matching call.
pub const DEFAULT_CRANK_NODE_BATCH: u16 = 16;

/// Events a crank asks for per consume call.
pub const DEFAULT_CRANK_CONSUME_BATCH: u16 = 32;

/// OpenOrders accounts supplied to a single consume call.
pub const DEFAULT_CRANK_ACCOUNTS_PER_CONSUME: usize = 8;

/// Hard stop for one driver run, counted in invocations.
pub const DEFAULT_CRANK_MAX_INVOCATIONS: u32 = 10_000;
