//! Invocation outcome classification.
//!
//! Several callers may crank the same auction at once, so a driver sees
//! errors that only mean "someone else got there first". Each error is
//! mapped, per driver step, to what the driver should do next.

use sealbid_types::{AuctionError, ErrorClass};
use serde::Serialize;

use crate::error::CrankError;

/// The driver an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CrankStep {
    Decrypt,
    Clear,
    Match,
    Consume,
    Settle,
}

/// What to do after a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The step's work is finished. Stop looping.
    Done,
    /// The auction has not reached this step's phase yet.
    NotReady,
    /// Matching stalled on a full event queue. Consume, then continue.
    DrainQueue,
    /// The supplied accounts were stale. Read them again and continue.
    Refetch,
    /// This account cannot be processed now. Move to the next one.
    SkipAccount,
    /// Try the same invocation again.
    Retry,
    /// Stop the driver and surface the error.
    Fatal,
}

/// Map a failed invocation of `step` to the driver's next move.
#[must_use]
pub fn classify(step: CrankStep, err: &CrankError) -> Outcome {
    let e = match err {
        CrankError::Transport { .. } => return Outcome::Retry,
        CrankError::Config { .. } => return Outcome::Fatal,
        CrankError::Rejected(e) => e,
    };

    match (step, e) {
        (_, AuctionError::InvalidAobMarketState) => Outcome::Fatal,

        (CrankStep::Decrypt, AuctionError::DecryptionPhaseHasEnded) => Outcome::Done,
        (CrankStep::Decrypt, AuctionError::DecryptionPhaseHasNotStarted) => Outcome::NotReady,
        // bad key, bad payload, short collateral or no room: the owner can only withdraw
        (
            CrankStep::Decrypt,
            AuctionError::AccountNotFound(_)
            | AuctionError::InsufficientTokensForOrder { .. }
            | AuctionError::NumericalOverflow
            | AuctionError::OrderBookFull,
        ) => Outcome::SkipAccount,
        (CrankStep::Decrypt, e) if e.class() == ErrorClass::DataIntegrity => Outcome::SkipAccount,

        (CrankStep::Clear, AuctionError::ClearingPriceAlreadyFound) => Outcome::Done,
        (CrankStep::Clear, AuctionError::CalcClearingPricePhaseNotActive) => Outcome::NotReady,

        (CrankStep::Match, AuctionError::MatchOrdersPhaseNotActive) => Outcome::Done,
        (CrankStep::Match, AuctionError::NoClearingPriceYet | AuctionError::CalcClearingPricePhaseNotActive) => {
            Outcome::NotReady
        }
        (CrankStep::Match, AuctionError::AobEventQueueFull) => Outcome::DrainQueue,

        (CrankStep::Consume, AuctionError::NoEventsProcessed) => Outcome::Done,
        (
            CrankStep::Consume,
            AuctionError::MissingOpenOrdersPubkeyInRemainingAccounts(_) | AuctionError::UserSideDiffFromEventSide,
        ) => Outcome::Refetch,

        (
            CrankStep::Settle,
            AuctionError::OpenOrdersHasOpenOrders
            | AuctionError::OpenOrdersHasLockedTokens
            | AuctionError::AccountNotFound(_),
        ) => Outcome::SkipAccount,

        _ => Outcome::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use sealbid_types::Address;

    use super::*;

    fn rejected(e: AuctionError) -> CrankError {
        CrankError::Rejected(e)
    }

    #[test]
    fn transport_failures_are_retried_everywhere() {
        let lost = CrankError::Transport {
            reason: "dropped".into(),
        };
        for step in [
            CrankStep::Decrypt,
            CrankStep::Clear,
            CrankStep::Match,
            CrankStep::Consume,
            CrankStep::Settle,
        ] {
            assert_eq!(classify(step, &lost), Outcome::Retry);
        }
    }

    #[test]
    fn terminal_signals_per_step() {
        assert_eq!(
            classify(CrankStep::Clear, &rejected(AuctionError::ClearingPriceAlreadyFound)),
            Outcome::Done
        );
        assert_eq!(
            classify(CrankStep::Match, &rejected(AuctionError::MatchOrdersPhaseNotActive)),
            Outcome::Done
        );
        assert_eq!(
            classify(CrankStep::Consume, &rejected(AuctionError::NoEventsProcessed)),
            Outcome::Done
        );
        assert_eq!(
            classify(CrankStep::Decrypt, &rejected(AuctionError::DecryptionPhaseHasEnded)),
            Outcome::Done
        );
    }

    #[test]
    fn same_error_means_different_things_per_step() {
        let found = rejected(AuctionError::ClearingPriceAlreadyFound);
        assert_eq!(classify(CrankStep::Clear, &found), Outcome::Done);
        assert_eq!(classify(CrankStep::Match, &found), Outcome::Fatal);

        let gone = rejected(AuctionError::AccountNotFound(Address::ZERO));
        assert_eq!(classify(CrankStep::Settle, &gone), Outcome::SkipAccount);
        assert_eq!(classify(CrankStep::Clear, &gone), Outcome::Fatal);
    }

    #[test]
    fn stalls_and_stale_accounts() {
        assert_eq!(
            classify(CrankStep::Match, &rejected(AuctionError::AobEventQueueFull)),
            Outcome::DrainQueue
        );
        assert_eq!(
            classify(
                CrankStep::Consume,
                &rejected(AuctionError::MissingOpenOrdersPubkeyInRemainingAccounts(Address::ZERO))
            ),
            Outcome::Refetch
        );
        assert_eq!(
            classify(CrankStep::Decrypt, &rejected(AuctionError::InvalidSharedKey)),
            Outcome::SkipAccount
        );
        assert_eq!(
            classify(CrankStep::Decrypt, &rejected(AuctionError::NumericalOverflow)),
            Outcome::SkipAccount
        );
        assert_eq!(
            classify(CrankStep::Decrypt, &rejected(AuctionError::OrderBookFull)),
            Outcome::SkipAccount
        );
        assert_eq!(
            classify(CrankStep::Match, &rejected(AuctionError::NumericalOverflow)),
            Outcome::Fatal
        );
        assert_eq!(
            classify(CrankStep::Match, &rejected(AuctionError::NoClearingPriceYet)),
            Outcome::NotReady
        );
    }

    #[test]
    fn broken_ledger_is_fatal() {
        let broken = rejected(AuctionError::SupplyInvariantViolation {
            reason: "quote vault short".into(),
        });
        assert_eq!(classify(CrankStep::Consume, &broken), Outcome::Fatal);
        assert_eq!(classify(CrankStep::Decrypt, &broken), Outcome::Fatal);
        assert_eq!(classify(CrankStep::Clear, &rejected(AuctionError::NoBidOrders)), Outcome::Fatal);
    }
}
