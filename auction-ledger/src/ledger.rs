//! Auction ledger state machine
//!
//! Owns the configuration, bid set, lifecycle phase and escrowed pool, and
//! enforces every admission and settlement rule. Operations take `now`
//! explicitly; the ledger never reads a clock.
//!
//! # Example
//!
//! ```
//! use auction_ledger::{AccountId, AuctionLedger, Error};
//! use chrono::{Duration, Utc};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> auction_ledger::Result<()> {
//! let start = Utc::now();
//! let mut auction = AuctionLedger::create(
//!     Duration::hours(24),
//!     2,
//!     Decimal::ONE,
//!     Decimal::TWO,
//!     AccountId::new("sponsor"),
//!     start,
//! )?;
//!
//! auction.place_bid(AccountId::new("alice"), Decimal::new(4, 1), start)?;
//! auction.place_bid(AccountId::new("bob"), Decimal::new(6, 1), start)?;
//!
//! assert!(matches!(auction.end_auction(start), Err(Error::AuctionStillOpen { .. })));
//!
//! let report = auction.end_auction(start + Duration::hours(24))?;
//! assert_eq!(report.highest_winning_bid, Decimal::new(6, 1));
//! assert_eq!(report.refund, Decimal::new(8, 1));
//! # Ok(())
//! # }
//! ```

use crate::{
    escrow::Escrow,
    events::{AuctionEvent, EventLog},
    settlement::SettlementPlan,
    types::{
        AccountId, AllBids, AuctionConfig, AuctionState, AuctionStatus, Bid, BidReceipt, Phase,
        Transfer, WinnerReport, WinnersInfo,
    },
    Error, Result,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

/// The auction ledger
#[derive(Debug, Clone)]
pub struct AuctionLedger {
    /// Immutable parameters
    config: AuctionConfig,

    /// Phase, bids, escrow
    state: AuctionState,

    /// Bidders on record, for O(1) duplicate checks
    bidders: HashSet<AccountId>,

    /// Audit trail
    events: EventLog,
}

impl AuctionLedger {
    /// Create an auction and take custody of the deposit
    ///
    /// Fails with `InvalidConfiguration` unless `num_winners >= 1`,
    /// `max_bid > 0`, `deadline_offset >= 0` and `deposit == num_winners * max_bid`.
    pub fn create(
        deadline_offset: Duration,
        num_winners: usize,
        max_bid: Decimal,
        deposit: Decimal,
        sponsor: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if num_winners == 0 {
            return Err(Error::InvalidConfiguration(
                "Number of winners must be at least 1".to_string(),
            ));
        }

        if max_bid <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration(format!(
                "Maximum bid must be positive, got {}",
                max_bid
            )));
        }

        if deadline_offset < Duration::zero() {
            return Err(Error::InvalidConfiguration(
                "Bidding time cannot be negative".to_string(),
            ));
        }

        let total_reward_pool = max_bid
            .checked_mul(Decimal::from(num_winners))
            .ok_or_else(|| {
                Error::InvalidConfiguration("Reward pool N * M overflows".to_string())
            })?;

        if deposit != total_reward_pool {
            return Err(Error::InvalidConfiguration(format!(
                "Deposit {} must equal N * M = {}",
                deposit, total_reward_pool
            )));
        }

        let bidding_deadline = now.checked_add_signed(deadline_offset).ok_or_else(|| {
            Error::InvalidConfiguration("Bidding deadline out of range".to_string())
        })?;

        let escrow = Escrow::deposit(deposit)?;

        let config = AuctionConfig {
            auction_id: Uuid::now_v7(),
            sponsor,
            created_at: now,
            bidding_deadline,
            num_winners,
            max_bid,
            total_reward_pool,
        };

        let mut events = EventLog::new();
        events.append(
            AuctionEvent::AuctionCreated {
                auction_id: config.auction_id,
                sponsor: config.sponsor.clone(),
                num_winners,
                max_bid,
                total_reward_pool,
                bidding_deadline,
            },
            now,
        )?;

        tracing::info!(
            auction_id = %config.auction_id,
            sponsor = %config.sponsor,
            num_winners,
            %max_bid,
            %total_reward_pool,
            deadline = %bidding_deadline,
            "Auction created"
        );

        Ok(Self {
            config,
            state: AuctionState {
                phase: Phase::Open,
                bids: Vec::new(),
                escrow,
                report: None,
            },
            bidders: HashSet::new(),
            events,
        })
    }

    /// Rebuild a ledger from persisted parts, validating every invariant
    pub fn from_parts(config: AuctionConfig, state: AuctionState, events: EventLog) -> Result<Self> {
        let bidders = validate_state(&config, &state)?;
        events.verify_chain()?;
        validate_events(&config, &state, &events)?;

        Ok(Self {
            config,
            state,
            bidders,
            events,
        })
    }

    /// Place a bid
    ///
    /// Rejections, in check order: `AuctionClosed`, `ZeroBid`, `BidTooHigh`,
    /// `DuplicateBidder`.
    pub fn place_bid(
        &mut self,
        bidder: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<BidReceipt> {
        if self.state.phase != Phase::Open || now >= self.config.bidding_deadline {
            return Err(Error::AuctionClosed);
        }

        if amount <= Decimal::ZERO {
            return Err(Error::ZeroBid(amount));
        }

        if amount > self.config.max_bid {
            return Err(Error::BidTooHigh {
                amount,
                max_bid: self.config.max_bid,
            });
        }

        if self.bidders.contains(&bidder) {
            return Err(Error::DuplicateBidder(bidder));
        }

        let sequence = self.state.bids.len() as u64;

        // Record the event first: a failure here must leave the bid set untouched
        self.events.append(
            AuctionEvent::BidPlaced {
                bidder: bidder.clone(),
                amount,
            },
            now,
        )?;

        self.bidders.insert(bidder.clone());
        self.state.bids.push(Bid {
            bidder: bidder.clone(),
            amount,
            sequence,
            placed_at: now,
        });

        tracing::info!(
            auction_id = %self.config.auction_id,
            %bidder,
            %amount,
            sequence,
            "Bid placed"
        );

        Ok(BidReceipt {
            bidder,
            amount,
            sequence,
        })
    }

    /// Finalize the auction and distribute the pool
    ///
    /// Rejections, in check order: `AuctionAlreadyEnded`, `AuctionStillOpen`,
    /// `InsufficientBidders`. The settlement is fully computed and checked
    /// before any state changes.
    pub fn end_auction(&mut self, now: DateTime<Utc>) -> Result<WinnerReport> {
        if self.state.phase == Phase::Ended {
            return Err(Error::AuctionAlreadyEnded);
        }

        if now < self.config.bidding_deadline {
            return Err(Error::AuctionStillOpen {
                deadline: self.config.bidding_deadline,
            });
        }

        if self.state.bids.len() < self.config.num_winners {
            return Err(Error::InsufficientBidders {
                required: self.config.num_winners,
                received: self.state.bids.len(),
            });
        }

        let plan = SettlementPlan::compute(
            &self.state.bids,
            self.config.num_winners,
            self.config.total_reward_pool,
            &self.config.sponsor,
        )?;

        tracing::debug!(
            auction_id = %self.config.auction_id,
            winners = ?plan.winners.iter().map(|w| w.bidder.as_str()).collect::<Vec<_>>(),
            clearing_price = %plan.highest_winning_bid,
            "Winners selected"
        );

        let report = WinnerReport {
            winners: plan.winners.clone(),
            highest_winning_bid: plan.highest_winning_bid,
            reward_per_winner: plan.highest_winning_bid,
            total_paid: plan.total_paid,
            refund: plan.refund,
            ended_at: now,
        };

        // Stage every change on copies, then swap them in together
        let mut escrow = self.state.escrow.clone();
        escrow.settle(plan.transfers)?;
        escrow.check_conservation()?;

        let mut events = self.events.clone();
        events.append(
            AuctionEvent::AuctionEnded {
                winners: plan.winners,
                highest_winning_bid: plan.highest_winning_bid,
                refund: plan.refund,
            },
            now,
        )?;

        self.state.escrow = escrow;
        self.events = events;
        self.state.report = Some(report.clone());
        self.state.phase = Phase::Ended;

        tracing::info!(
            auction_id = %self.config.auction_id,
            winners = report.winners.len(),
            highest_winning_bid = %report.highest_winning_bid,
            total_paid = %report.total_paid,
            refund = %report.refund,
            "Auction ended"
        );

        Ok(report)
    }

    /// Current status
    pub fn status(&self, now: DateTime<Utc>) -> AuctionStatus {
        AuctionStatus {
            phase: self.state.phase,
            num_winners: self.config.num_winners,
            max_bid: self.config.max_bid,
            pool_balance: self.state.escrow.balance(),
            bidder_count: self.state.bids.len(),
            time_remaining_secs: seconds_until(now, self.config.bidding_deadline),
            bidding_deadline: self.config.bidding_deadline,
        }
    }

    /// All bids as parallel lists, in arrival order
    pub fn all_bids(&self) -> AllBids {
        let (bidders, amounts) = self
            .state
            .bids
            .iter()
            .map(|bid| (bid.bidder.clone(), bid.amount))
            .unzip();

        AllBids { bidders, amounts }
    }

    /// Winners, or `NotFinalized` before the auction ends
    pub fn winners_info(&self) -> WinnersInfo {
        match &self.state.report {
            Some(report) => WinnersInfo::Finalized {
                winners: report.winners.iter().map(|w| w.bidder.clone()).collect(),
                winning_amounts: report.winners.iter().map(|w| w.amount).collect(),
                highest_winning_bid: report.highest_winning_bid,
            },
            None => WinnersInfo::NotFinalized,
        }
    }

    /// Finalization report, once ended
    pub fn report(&self) -> Option<&WinnerReport> {
        self.state.report.as_ref()
    }

    /// Immutable parameters
    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// Mutable state (read-only view)
    pub fn state(&self) -> &AuctionState {
        &self.state
    }

    /// Audit log
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Auction ID
    pub fn auction_id(&self) -> Uuid {
        self.config.auction_id
    }

    /// Sponsor identity
    pub fn sponsor(&self) -> &AccountId {
        &self.config.sponsor
    }

    /// Escrowed pool size (N × M)
    pub fn total_reward_pool(&self) -> Decimal {
        self.config.total_reward_pool
    }

    /// Bidding deadline
    pub fn bidding_deadline(&self) -> DateTime<Utc> {
        self.config.bidding_deadline
    }

    /// Lifecycle phase
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Funds still in escrow
    pub fn escrow_balance(&self) -> Decimal {
        self.state.escrow.balance()
    }

    /// Bids in arrival order
    pub fn bids(&self) -> &[Bid] {
        &self.state.bids
    }

    /// Bid placed by `bidder`, if any
    pub fn bid_of(&self, bidder: &AccountId) -> Option<&Bid> {
        if !self.bidders.contains(bidder) {
            return None;
        }
        self.state.bids.iter().find(|bid| &bid.bidder == bidder)
    }

    /// Committed transfers out of escrow
    pub fn disbursements(&self) -> &[Transfer] {
        self.state.escrow.disbursements()
    }

    /// Consume into persisted parts
    pub fn into_parts(self) -> (AuctionConfig, AuctionState, EventLog) {
        (self.config, self.state, self.events)
    }
}

/// Whole seconds until `deadline`, rounded up, zero once passed
fn seconds_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> u64 {
    let millis = (deadline - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}

/// Check persisted state against the ledger invariants
fn validate_state(config: &AuctionConfig, state: &AuctionState) -> Result<HashSet<AccountId>> {
    let corrupt = |msg: String| Error::Storage(format!("Corrupt auction state: {}", msg));

    if config.num_winners == 0 || config.max_bid <= Decimal::ZERO {
        return Err(corrupt("invalid configuration".to_string()));
    }

    let expected_pool = config
        .max_bid
        .checked_mul(Decimal::from(config.num_winners))
        .ok_or_else(|| corrupt("reward pool overflows".to_string()))?;
    if expected_pool != config.total_reward_pool || state.escrow.deposited() != expected_pool {
        return Err(corrupt("reward pool does not equal N * M".to_string()));
    }

    let mut bidders = HashSet::with_capacity(state.bids.len());
    for (position, bid) in state.bids.iter().enumerate() {
        if bid.sequence != position as u64 {
            return Err(corrupt(format!("bid sequence gap at {}", position)));
        }
        if bid.amount <= Decimal::ZERO || bid.amount > config.max_bid {
            return Err(corrupt(format!("bid amount {} out of range", bid.amount)));
        }
        if !bidders.insert(bid.bidder.clone()) {
            return Err(corrupt(format!("bidder {} appears twice", bid.bidder)));
        }
    }

    state
        .escrow
        .check_conservation()
        .map_err(|e| corrupt(e.to_string()))?;

    match state.phase {
        Phase::Open => {
            if state.escrow.balance() != config.total_reward_pool || state.report.is_some() {
                return Err(corrupt("open auction has moved funds".to_string()));
            }
        }
        Phase::Ended => {
            let report = match &state.report {
                Some(report) if state.escrow.is_settled() => report,
                _ => return Err(corrupt("ended auction is not settled".to_string())),
            };

            // Settlement must be exactly what the bids produce
            let plan = SettlementPlan::compute(
                &state.bids,
                config.num_winners,
                config.total_reward_pool,
                &config.sponsor,
            )
            .map_err(|e| corrupt(format!("settlement cannot be recomputed: {}", e)))?;

            if plan.transfers.as_slice() != state.escrow.disbursements() {
                return Err(corrupt(
                    "disbursements differ from recomputed settlement".to_string(),
                ));
            }

            if report.winners != plan.winners
                || report.highest_winning_bid != plan.highest_winning_bid
                || report.reward_per_winner != plan.highest_winning_bid
                || report.total_paid != plan.total_paid
                || report.refund != plan.refund
            {
                return Err(corrupt("report differs from recomputed settlement".to_string()));
            }
        }
    }

    Ok(bidders)
}

/// Check that the audit log records exactly this auction's history
fn validate_events(config: &AuctionConfig, state: &AuctionState, events: &EventLog) -> Result<()> {
    let corrupt = |msg: &str| Error::Storage(format!("Audit log does not match state: {}", msg));
    let records = events.records();

    match records.first().map(|r| &r.event) {
        Some(AuctionEvent::AuctionCreated {
            auction_id,
            sponsor,
            num_winners,
            max_bid,
            total_reward_pool,
            bidding_deadline,
        }) if *auction_id == config.auction_id
            && sponsor == &config.sponsor
            && *num_winners == config.num_winners
            && *max_bid == config.max_bid
            && *total_reward_pool == config.total_reward_pool
            && *bidding_deadline == config.bidding_deadline => {}
        _ => return Err(corrupt("first record is not this auction's creation")),
    }

    let mut placed = records.iter().filter_map(|r| match &r.event {
        AuctionEvent::BidPlaced { bidder, amount } => Some((bidder, *amount)),
        _ => None,
    });
    for bid in &state.bids {
        match placed.next() {
            Some((bidder, amount)) if bidder == &bid.bidder && amount == bid.amount => {}
            _ => return Err(corrupt("bid has no matching BidPlaced record")),
        }
    }
    if placed.next().is_some() {
        return Err(corrupt("BidPlaced record without a bid"));
    }

    let ended: Vec<_> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches!(r.event, AuctionEvent::AuctionEnded { .. }))
        .collect();

    match (&state.report, ended.as_slice()) {
        (None, []) => Ok(()),
        (Some(report), [(position, record)]) if *position == records.len() - 1 => {
            match &record.event {
                AuctionEvent::AuctionEnded {
                    winners,
                    highest_winning_bid,
                    refund,
                } if winners == &report.winners
                    && *highest_winning_bid == report.highest_winning_bid
                    && *refund == report.refund =>
                {
                    Ok(())
                }
                _ => Err(corrupt("AuctionEnded record differs from report")),
            }
        }
        _ => Err(corrupt("AuctionEnded record inconsistent with phase")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferKind;
    use rust_decimal_macros::dec;

    const DAY: i64 = 24 * 60 * 60;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn after_deadline() -> DateTime<Utc> {
        start() + Duration::seconds(DAY + 1)
    }

    fn create_test_auction() -> AuctionLedger {
        AuctionLedger::create(
            Duration::seconds(DAY),
            3,
            dec!(1.0),
            dec!(3.0),
            AccountId::new("owner"),
            start(),
        )
        .unwrap()
    }

    fn bidder(n: u32) -> AccountId {
        AccountId::new(format!("bidder{}", n))
    }

    #[test]
    fn test_create_locks_reward_pool() {
        let auction = create_test_auction();

        assert_eq!(auction.sponsor(), &AccountId::new("owner"));
        assert_eq!(auction.total_reward_pool(), dec!(3.0));
        assert_eq!(auction.escrow_balance(), dec!(3.0));
        assert_eq!(auction.phase(), Phase::Open);
        assert_eq!(auction.bidding_deadline(), start() + Duration::seconds(DAY));
        assert_eq!(auction.events().len(), 1);
    }

    #[test]
    fn test_create_rejects_bad_parameters() {
        let sponsor = AccountId::new("owner");
        let offset = Duration::seconds(DAY);

        let cases = [
            (0, dec!(1.0), dec!(0)),
            (3, dec!(0), dec!(0)),
            (3, dec!(-1), dec!(-3)),
            (3, dec!(1.0), dec!(2.9)),
            (3, dec!(1.0), dec!(3.1)),
        ];

        for (n, m, deposit) in cases {
            let result = AuctionLedger::create(offset, n, m, deposit, sponsor.clone(), start());
            assert!(
                matches!(result, Err(Error::InvalidConfiguration(_))),
                "n={} m={} deposit={}",
                n,
                m,
                deposit
            );
        }

        let negative = AuctionLedger::create(
            Duration::seconds(-1),
            3,
            dec!(1.0),
            dec!(3.0),
            sponsor,
            start(),
        );
        assert!(matches!(negative, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_place_bid() {
        let mut auction = create_test_auction();

        let receipt = auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();
        assert_eq!(receipt.sequence, 0);
        assert_eq!(receipt.amount, dec!(0.5));

        let last = auction.events().records().last().unwrap();
        assert_eq!(
            last.event,
            AuctionEvent::BidPlaced {
                bidder: bidder(1),
                amount: dec!(0.5)
            }
        );
        assert_eq!(auction.bid_of(&bidder(1)).unwrap().amount, dec!(0.5));
        assert!(auction.bid_of(&bidder(2)).is_none());
    }

    #[test]
    fn test_bid_at_ceiling_accepted() {
        let mut auction = create_test_auction();
        assert!(auction.place_bid(bidder(1), dec!(1.0), start()).is_ok());
    }

    #[test]
    fn test_bid_too_high() {
        let mut auction = create_test_auction();

        let result = auction.place_bid(bidder(1), dec!(1.5), start());
        assert!(matches!(result, Err(Error::BidTooHigh { .. })));
        assert!(auction.bids().is_empty());
        assert_eq!(auction.events().len(), 1);
    }

    #[test]
    fn test_zero_and_negative_bids() {
        let mut auction = create_test_auction();

        assert!(matches!(
            auction.place_bid(bidder(1), Decimal::ZERO, start()),
            Err(Error::ZeroBid(_))
        ));
        assert!(matches!(
            auction.place_bid(bidder(1), dec!(-0.1), start()),
            Err(Error::ZeroBid(_))
        ));
        assert!(auction.bids().is_empty());
    }

    #[test]
    fn test_duplicate_bidder() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();

        let result = auction.place_bid(bidder(1), dec!(0.3), start());
        assert!(matches!(result, Err(Error::DuplicateBidder(ref b)) if *b == bidder(1)));
        assert_eq!(auction.bids().len(), 1);
        assert_eq!(auction.bids()[0].amount, dec!(0.5));
    }

    #[test]
    fn test_bid_at_deadline_rejected() {
        let mut auction = create_test_auction();
        let deadline = auction.bidding_deadline();

        assert!(auction
            .place_bid(bidder(1), dec!(0.5), deadline - Duration::seconds(1))
            .is_ok());
        assert!(matches!(
            auction.place_bid(bidder(2), dec!(0.5), deadline),
            Err(Error::AuctionClosed)
        ));
    }

    #[test]
    fn test_end_before_deadline() {
        let mut auction = create_test_auction();
        for n in 1..=5 {
            auction.place_bid(bidder(n), dec!(0.5), start()).unwrap();
        }

        let result = auction.end_auction(start() + Duration::seconds(DAY - 1));
        assert!(matches!(result, Err(Error::AuctionStillOpen { .. })));
        assert_eq!(auction.phase(), Phase::Open);
        assert_eq!(auction.escrow_balance(), dec!(3.0));
    }

    #[test]
    fn test_end_exactly_at_deadline() {
        let mut auction = create_test_auction();
        for n in 1..=3 {
            auction.place_bid(bidder(n), dec!(0.5), start()).unwrap();
        }

        assert!(auction.end_auction(auction.bidding_deadline()).is_ok());
    }

    #[test]
    fn test_not_enough_bidders() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();
        auction.place_bid(bidder(2), dec!(0.7), start()).unwrap();

        let result = auction.end_auction(after_deadline());
        assert!(matches!(
            result,
            Err(Error::InsufficientBidders {
                required: 3,
                received: 2
            })
        ));
        assert_eq!(auction.phase(), Phase::Open);
        assert_eq!(auction.winners_info(), WinnersInfo::NotFinalized);
    }

    #[test]
    fn test_winners_and_rewards() {
        let mut auction = create_test_auction();
        let amounts = [dec!(0.5), dec!(0.7), dec!(0.9), dec!(1.0), dec!(0.8)];
        for (i, amount) in amounts.iter().enumerate() {
            auction
                .place_bid(bidder(i as u32 + 1), *amount, start())
                .unwrap();
        }

        let report = auction.end_auction(after_deadline()).unwrap();

        assert_eq!(report.winners.len(), 3);
        assert_eq!(report.highest_winning_bid, dec!(0.8));
        assert_eq!(report.reward_per_winner, dec!(0.8));
        assert_eq!(report.refund, dec!(0.6));

        let winner_ids: Vec<AccountId> = report.winners.iter().map(|w| w.bidder.clone()).collect();
        assert_eq!(winner_ids, vec![bidder(1), bidder(2), bidder(5)]);

        let paid = |who: AccountId| -> Decimal {
            auction
                .disbursements()
                .iter()
                .filter(|t| t.recipient == who && t.kind == TransferKind::Payout)
                .map(|t| t.amount)
                .sum()
        };
        assert_eq!(paid(bidder(1)), dec!(0.8));
        assert_eq!(paid(bidder(2)), dec!(0.8));
        assert_eq!(paid(bidder(5)), dec!(0.8));
        assert_eq!(paid(bidder(3)), Decimal::ZERO);
        assert_eq!(paid(bidder(4)), Decimal::ZERO);

        assert_eq!(auction.escrow_balance(), Decimal::ZERO);
        assert_eq!(auction.phase(), Phase::Ended);
    }

    #[test]
    fn test_refund_to_owner() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();
        auction.place_bid(bidder(2), dec!(0.7), start()).unwrap();
        auction.place_bid(bidder(3), dec!(0.9), start()).unwrap();

        let report = auction.end_auction(after_deadline()).unwrap();
        assert_eq!(report.highest_winning_bid, dec!(0.9));
        assert_eq!(report.refund, dec!(0.3));

        let refund = auction
            .disbursements()
            .iter()
            .find(|t| t.kind == TransferKind::Refund)
            .unwrap();
        assert_eq!(refund.recipient, AccountId::new("owner"));
        assert_eq!(refund.amount, dec!(0.3));
    }

    #[test]
    fn test_end_twice() {
        let mut auction = create_test_auction();
        for n in 1..=3 {
            auction.place_bid(bidder(n), dec!(0.5), start()).unwrap();
        }
        auction.end_auction(after_deadline()).unwrap();
        let snapshot = auction.state().clone();

        let result = auction.end_auction(after_deadline() + Duration::hours(1));
        assert!(matches!(result, Err(Error::AuctionAlreadyEnded)));
        assert_eq!(auction.state(), &snapshot);
    }

    #[test]
    fn test_bids_rejected_after_end() {
        let mut auction = create_test_auction();
        for n in 1..=3 {
            auction.place_bid(bidder(n), dec!(0.5), start()).unwrap();
        }
        auction.end_auction(after_deadline()).unwrap();

        assert!(matches!(
            auction.place_bid(bidder(9), dec!(0.1), after_deadline()),
            Err(Error::AuctionClosed)
        ));
    }

    #[test]
    fn test_status_and_all_bids() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();
        auction.place_bid(bidder(2), dec!(0.7), start()).unwrap();

        let status = auction.status(start() + Duration::seconds(100));
        assert_eq!(status.num_winners, 3);
        assert_eq!(status.max_bid, dec!(1.0));
        assert_eq!(status.pool_balance, dec!(3.0));
        assert_eq!(status.bidder_count, 2);
        assert_eq!(status.time_remaining_secs, (DAY - 100) as u64);
        assert!(status.is_accepting_bids());

        let late = auction.status(after_deadline());
        assert_eq!(late.time_remaining_secs, 0);
        assert!(!late.is_accepting_bids());

        let bids = auction.all_bids();
        assert_eq!(bids.bidders, vec![bidder(1), bidder(2)]);
        assert_eq!(bids.amounts, vec![dec!(0.5), dec!(0.7)]);
    }

    #[test]
    fn test_winners_info_after_end() {
        let mut auction = create_test_auction();
        assert_eq!(auction.winners_info(), WinnersInfo::NotFinalized);

        for (n, amount) in [(1, dec!(0.6)), (2, dec!(0.2)), (3, dec!(0.4))] {
            auction.place_bid(bidder(n), amount, start()).unwrap();
        }
        auction.end_auction(after_deadline()).unwrap();

        match auction.winners_info() {
            WinnersInfo::Finalized {
                winners,
                winning_amounts,
                highest_winning_bid,
            } => {
                assert_eq!(winners, vec![bidder(2), bidder(3), bidder(1)]);
                assert_eq!(winning_amounts, vec![dec!(0.2), dec!(0.4), dec!(0.6)]);
                assert_eq!(highest_winning_bid, dec!(0.6));
            }
            WinnersInfo::NotFinalized => panic!("auction should be finalized"),
        }
    }

    #[test]
    fn test_round_trip_parts() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();

        let (config, state, events) = auction.clone().into_parts();
        let restored = AuctionLedger::from_parts(config, state, events).unwrap();
        assert_eq!(restored.bids(), auction.bids());

        let mut restored = restored;
        assert!(matches!(
            restored.place_bid(bidder(1), dec!(0.4), start()),
            Err(Error::DuplicateBidder(_))
        ));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_bidders() {
        let mut auction = create_test_auction();
        auction.place_bid(bidder(1), dec!(0.5), start()).unwrap();

        let (config, mut state, events) = auction.into_parts();
        let mut dup = state.bids[0].clone();
        dup.sequence = 1;
        state.bids.push(dup);

        let result = AuctionLedger::from_parts(config, state, events);
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
