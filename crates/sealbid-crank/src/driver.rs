//! Crank drivers.
//!
//! Each driver loops one kind of invocation until the auction signals the
//! step is finished, classifying every failure on the way. Any number of
//! drivers may run against the same auction: the ledger operations are
//! idempotent per phase, so a lost race shows up as a terminal or skip
//! signal, never as corrupted state.

use std::collections::HashSet;
use std::fmt;

use sealbid_ingress::EncryptionKeypair;
use sealbid_program::OpenOrdersFilter;
use sealbid_types::{Address, Event};
use serde::Serialize;

use crate::classify::{CrankStep, Outcome, classify};
use crate::client::AuctionClient;
use crate::config::CrankConfig;
use crate::error::{CrankError, CrankResult};

/// How a driver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrankStatus {
    /// The step's work is done.
    Complete,
    /// The auction is not in this step's phase yet. Run again later.
    NotReady,
    /// Too many consecutive failures, or the invocation cap was hit.
    GaveUp,
}

/// What a driver run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrankReport {
    pub step: CrankStep,
    pub status: CrankStatus,
    /// Invocations sent, including failed ones.
    pub invocations: u32,
    /// Invocations that failed and counted towards the failure limit.
    pub failures: u32,
    /// Accounts passed over (decrypt and settle only).
    pub skipped: u32,
}

impl CrankReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == CrankStatus::Complete
    }
}

/// Reports of a full run, in execution order. Steps not reached are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub decrypt: Option<CrankReport>,
    pub clear: Option<CrankReport>,
    pub matching: Option<CrankReport>,
    pub consume: Option<CrankReport>,
    pub settle: Option<CrankReport>,
}

impl RunReport {
    /// True once every step, down to settle-and-close, completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.settle.is_some_and(|r| r.is_complete())
    }
}

/// Result of one invocation after retries.
enum Attempt<T> {
    Landed(T),
    Signal(Outcome),
    Exhausted,
}

/// Running counters of one driver.
struct Tally {
    report: CrankReport,
    consecutive_failures: u32,
    failure_limit: u32,
    max_invocations: u32,
}

impl Tally {
    fn new(step: CrankStep, config: &CrankConfig) -> Self {
        Self {
            report: CrankReport {
                step,
                status: CrankStatus::Complete,
                invocations: 0,
                failures: 0,
                skipped: 0,
            },
            consecutive_failures: 0,
            failure_limit: config.max_consecutive_failures,
            max_invocations: config.max_invocations,
        }
    }

    fn out_of_invocations(&self) -> bool {
        self.report.invocations >= self.max_invocations
    }

    fn landed(&mut self) {
        self.report.invocations += 1;
        self.consecutive_failures = 0;
    }

    fn signalled(&mut self) {
        self.report.invocations += 1;
    }

    /// Count a failed invocation. Returns true once the driver should give up.
    fn failed(&mut self, err: &CrankError) -> bool {
        self.report.invocations += 1;
        self.strike(err)
    }

    /// Count a failure towards the limit without a new invocation.
    fn strike(&mut self, err: &dyn fmt::Display) -> bool {
        self.report.failures += 1;
        self.consecutive_failures += 1;
        tracing::warn!(
            step = ?self.report.step,
            consecutive = self.consecutive_failures,
            limit = self.failure_limit,
            error = %err,
            "Crank invocation failed"
        );
        self.consecutive_failures >= self.failure_limit
    }

    /// Fold a nested driver's counts into this one.
    fn absorb(&mut self, other: &CrankReport) {
        self.report.invocations += other.invocations;
        self.report.failures += other.failures;
    }

    fn finish(mut self, status: CrankStatus) -> CrankReport {
        self.report.status = status;
        tracing::info!(
            step = ?self.report.step,
            status = ?status,
            invocations = self.report.invocations,
            failures = self.report.failures,
            skipped = self.report.skipped,
            "Crank finished"
        );
        self.report
    }
}

/// Status for a signal the step has no special handling for.
fn terminal(outcome: Outcome) -> CrankStatus {
    match outcome {
        Outcome::Done => CrankStatus::Complete,
        Outcome::NotReady => CrankStatus::NotReady,
        _ => CrankStatus::GaveUp,
    }
}

/// Drives one auction through its bounded invocations.
#[derive(Debug)]
pub struct Crank<C> {
    client: C,
    config: CrankConfig,
}

impl<C: AuctionClient> Crank<C> {
    #[must_use]
    pub fn new(client: C, config: CrankConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    pub fn config(&self) -> &CrankConfig {
        &self.config
    }

    /// Run `op` until it lands, signals, or the failure limit is reached.
    fn attempt<T>(
        &mut self,
        tally: &mut Tally,
        mut op: impl FnMut(&mut C) -> CrankResult<T>,
    ) -> CrankResult<Attempt<T>> {
        loop {
            if tally.out_of_invocations() {
                return Ok(Attempt::Exhausted);
            }
            let err = match op(&mut self.client) {
                Ok(value) => {
                    tally.landed();
                    return Ok(Attempt::Landed(value));
                }
                Err(err) => err,
            };
            match classify(tally.report.step, &err) {
                Outcome::Retry => {
                    if tally.failed(&err) {
                        return Ok(Attempt::Exhausted);
                    }
                }
                Outcome::Fatal => {
                    tally.signalled();
                    tracing::error!(step = ?tally.report.step, error = %err, "Crank aborted");
                    return Err(err);
                }
                signal => {
                    tally.signalled();
                    return Ok(Attempt::Signal(signal));
                }
            }
        }
    }

    /// Reveal every sealed order of the auction with the auctioneer's key.
    ///
    /// Accounts whose reveal fails on their own data (wrong key, malformed
    /// payload, short collateral) or finds the book full are skipped; their
    /// owners can still withdraw.
    pub fn decrypt_all(&mut self, auction: &Address, auctioneer: &EncryptionKeypair) -> CrankResult<CrankReport> {
        let mut tally = Tally::new(CrankStep::Decrypt, &self.config);
        let targets = match self.attempt(&mut tally, |c| c.scan_open_orders(auction, OpenOrdersFilter::HasSealedOrders))? {
            Attempt::Landed(targets) => targets,
            Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
            Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
        };

        for target in targets {
            let account = match self.attempt(&mut tally, |c| c.open_orders(&target))? {
                Attempt::Landed(account) => account,
                Attempt::Signal(Outcome::SkipAccount) => {
                    tally.report.skipped += 1;
                    continue;
                }
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            };
            let key = auctioneer.shared_key(&account.nacl_pubkey);
            match self.attempt(&mut tally, |c| c.decrypt_order(&target, &key))? {
                Attempt::Landed(keys) => {
                    tracing::debug!(account = %target.short(), revealed = keys.len(), "Sealed orders revealed");
                }
                Attempt::Signal(Outcome::SkipAccount) => {
                    tracing::debug!(account = %target.short(), "Sealed orders left for withdrawal");
                    tally.report.skipped += 1;
                }
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            }
        }
        Ok(tally.finish(CrankStatus::Complete))
    }

    /// Walk the book until the clearing price is found.
    pub fn clear(&mut self, auction: &Address) -> CrankResult<CrankReport> {
        let mut tally = Tally::new(CrankStep::Clear, &self.config);
        let limit = self.config.clear_batch;
        loop {
            match self.attempt(&mut tally, |c| c.calculate_clearing_price(auction, limit))? {
                Attempt::Landed(progress) if progress.found => return Ok(tally.finish(CrankStatus::Complete)),
                Attempt::Landed(_) => {}
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            }
        }
    }

    /// Empty the book into the event queue, consuming whenever it fills up.
    pub fn match_all(&mut self, auction: &Address) -> CrankResult<CrankReport> {
        let mut tally = Tally::new(CrankStep::Match, &self.config);
        let limit = self.config.match_batch;
        loop {
            let stalled = match self.attempt(&mut tally, |c| c.match_orders(auction, limit))? {
                Attempt::Landed(progress) if progress.complete => return Ok(tally.finish(CrankStatus::Complete)),
                // stopped short of its limit: the queue is nearly full
                Attempt::Landed(progress) => progress.nodes_matched < limit,
                Attempt::Signal(Outcome::DrainQueue) => true,
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            };
            if stalled {
                let drained = self.consume(auction)?;
                tally.absorb(&drained);
                if !drained.is_complete() {
                    return Ok(tally.finish(drained.status));
                }
            }
        }
    }

    /// Consume every queued event, supplying the owners the queue names.
    pub fn consume(&mut self, auction: &Address) -> CrankResult<CrankReport> {
        let mut tally = Tally::new(CrankStep::Consume, &self.config);
        let batch = self.config.consume_batch;
        let max_accounts = self.config.accounts_per_consume;
        loop {
            let events = match self.attempt(&mut tally, |c| c.peek_events(auction, usize::from(batch)))? {
                Attempt::Landed(events) => events,
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            };
            if events.is_empty() {
                return Ok(tally.finish(CrankStatus::Complete));
            }
            let (owners, limit) = leading_owners(&events, max_accounts);
            match self.attempt(&mut tally, |c| c.consume_events(auction, &owners, limit, false))? {
                Attempt::Landed(consumed) => {
                    tracing::debug!(consumed, accounts = owners.len(), "Events consumed by crank");
                }
                Attempt::Signal(Outcome::Refetch) => {
                    if tally.strike(&"supplied accounts were stale") {
                        return Ok(tally.finish(CrankStatus::GaveUp));
                    }
                }
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            }
        }
    }

    /// Settle and close every emptied account of the auction.
    pub fn settle_all(&mut self, auction: &Address) -> CrankResult<CrankReport> {
        let mut tally = Tally::new(CrankStep::Settle, &self.config);
        let targets = match self.attempt(&mut tally, |c| c.scan_open_orders(auction, OpenOrdersFilter::IsEmpty))? {
            Attempt::Landed(targets) => targets,
            Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
            Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
        };
        for target in targets {
            match self.attempt(&mut tally, |c| c.settle_and_close_open_orders(&target))? {
                Attempt::Landed(payout) => {
                    tracing::debug!(account = %target.short(), base = payout.base, quote = payout.quote, "Account settled");
                }
                Attempt::Signal(Outcome::SkipAccount) => tally.report.skipped += 1,
                Attempt::Signal(outcome) => return Ok(tally.finish(terminal(outcome))),
                Attempt::Exhausted => return Ok(tally.finish(CrankStatus::GaveUp)),
            }
        }
        Ok(tally.finish(CrankStatus::Complete))
    }

    /// Decrypt, clear, match, consume and settle, stopping at the first step
    /// that does not complete. Safe to call again later from the start.
    pub fn run(&mut self, auction: &Address, auctioneer: Option<&EncryptionKeypair>) -> CrankResult<RunReport> {
        let mut run = RunReport::default();
        if let Ok(phase) = self.client.phase(auction) {
            tracing::info!(auction = %auction.short(), ?phase, "Crank run started");
        }
        if let Some(auctioneer) = auctioneer {
            let report = self.decrypt_all(auction, auctioneer)?;
            run.decrypt = Some(report);
            if !report.is_complete() {
                return Ok(run);
            }
        }

        let report = self.clear(auction)?;
        run.clear = Some(report);
        if !report.is_complete() {
            return Ok(run);
        }

        let report = self.match_all(auction)?;
        run.matching = Some(report);
        if !report.is_complete() {
            return Ok(run);
        }

        let report = self.consume(auction)?;
        run.consume = Some(report);
        if !report.is_complete() {
            return Ok(run);
        }

        run.settle = Some(self.settle_all(auction)?);
        Ok(run)
    }
}

/// Distinct owners of the first events, at most `max_accounts` of them, and
/// how many leading events those owners cover.
fn leading_owners(events: &[Event], max_accounts: usize) -> (Vec<Address>, u16) {
    let mut owners = Vec::new();
    let mut seen = HashSet::new();
    let mut covered: u16 = 0;
    for event in events {
        let owner = event.owner();
        if !seen.contains(&owner) {
            if owners.len() == max_accounts {
                break;
            }
            seen.insert(owner);
            owners.push(owner);
        }
        covered = covered.saturating_add(1);
    }
    (owners, covered)
}
