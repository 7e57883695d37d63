//! Property-based tests for auction invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Pool conservation: N × clearing price + refund == N × M
//! - Uniqueness: no bidder appears twice, every amount in (0, M]
//! - Ranking: winners are exactly the N lowest bids, ties by arrival
//! - Atomicity: rejected operations leave state unchanged

use auction_ledger::{
    settlement::select_winners, AccountId, AuctionLedger, Error, Phase, TransferKind,
};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Strategy for generating bid ceilings (0.01 .. 100.00)
fn max_bid_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating a config plus bids as fractions of the ceiling
fn auction_strategy() -> impl Strategy<Value = (usize, Decimal, Vec<(u8, i64)>)> {
    (1usize..6, max_bid_strategy()).prop_flat_map(|(n, max_bid)| {
        (
            Just(n),
            Just(max_bid),
            prop::collection::vec((0u8..12, 1i64..=1_000i64), 0..25),
        )
    })
}

/// Scale a per-mille fraction onto (0, max_bid]
fn scaled(max_bid: Decimal, per_mille: i64) -> Decimal {
    let amount = (max_bid * Decimal::new(per_mille, 3)).round_dp(4);
    if amount <= Decimal::ZERO {
        Decimal::new(1, 4).min(max_bid)
    } else {
        amount.min(max_bid)
    }
}

fn create(n: usize, max_bid: Decimal) -> AuctionLedger {
    AuctionLedger::create(
        Duration::hours(24),
        n,
        max_bid,
        max_bid * Decimal::from(n),
        AccountId::new("sponsor"),
        start(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: create succeeds iff deposit == N × M
    #[test]
    fn prop_create_requires_exact_deposit(
        n in 1usize..10,
        max_bid in max_bid_strategy(),
        delta_cents in -500i64..500i64,
    ) {
        let exact = max_bid * Decimal::from(n);
        let deposit = exact + Decimal::new(delta_cents, 2);

        let result = AuctionLedger::create(
            Duration::hours(1),
            n,
            max_bid,
            deposit,
            AccountId::new("sponsor"),
            start(),
        );

        if deposit == exact {
            let ledger = result.unwrap();
            prop_assert_eq!(ledger.escrow_balance(), exact);
        } else {
            prop_assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        }
    }

    /// Property: accepted bids have unique bidders and amounts in (0, M]
    #[test]
    fn prop_admission_rules((n, max_bid, bids) in auction_strategy()) {
        let mut ledger = create(n, max_bid);

        for (who, per_mille) in &bids {
            let bidder = AccountId::new(format!("bidder{}", who));
            let amount = scaled(max_bid, *per_mille);
            let already = ledger.bid_of(&bidder).is_some();

            let before = ledger.bids().len();
            let result = ledger.place_bid(bidder, amount, start());

            if already {
                prop_assert!(matches!(result, Err(Error::DuplicateBidder(_))));
                prop_assert_eq!(ledger.bids().len(), before);
            } else {
                prop_assert!(result.is_ok());
            }
        }

        let mut seen = std::collections::HashSet::new();
        for bid in ledger.bids() {
            prop_assert!(seen.insert(bid.bidder.clone()));
            prop_assert!(bid.amount > Decimal::ZERO);
            prop_assert!(bid.amount <= max_bid);
        }
    }

    /// Property: bids above the ceiling never change the bid set
    #[test]
    fn prop_bid_too_high_rejected(max_bid in max_bid_strategy(), excess in 1i64..100_000i64) {
        let mut ledger = create(1, max_bid);
        let amount = max_bid + Decimal::new(excess, 4);

        let result = ledger.place_bid(AccountId::new("bidder"), amount, start());
        let rejected = matches!(result, Err(Error::BidTooHigh { .. }));
        prop_assert!(rejected);
        prop_assert!(ledger.bids().is_empty());
    }

    /// Property: ending before the deadline always fails, regardless of bids
    #[test]
    fn prop_end_before_deadline((n, max_bid, bids) in auction_strategy(), early_secs in 0i64..86_400) {
        let mut ledger = create(n, max_bid);
        for (who, per_mille) in &bids {
            let _ = ledger.place_bid(AccountId::new(format!("bidder{}", who)), scaled(max_bid, *per_mille), start());
        }
        let before = ledger.state().clone();

        let result = ledger.end_auction(start() + Duration::seconds(early_secs));
        prop_assert!(matches!(result, Err(Error::AuctionStillOpen { .. })), "expected Err(AuctionStillOpen)");
        prop_assert_eq!(ledger.state(), &before);
    }

    /// Property: settlement conserves the pool and pays winners uniformly
    #[test]
    fn prop_pool_conservation((n, max_bid, bids) in auction_strategy()) {
        let mut ledger = create(n, max_bid);
        for (who, per_mille) in &bids {
            let _ = ledger.place_bid(AccountId::new(format!("bidder{}", who)), scaled(max_bid, *per_mille), start());
        }

        let after = start() + Duration::hours(25);
        let bid_count = ledger.bids().len();
        let result = ledger.end_auction(after);

        if bid_count < n {
            let insufficient = matches!(result, Err(Error::InsufficientBidders { .. }));
            prop_assert!(insufficient);
            prop_assert_eq!(ledger.phase(), Phase::Open);
            prop_assert_eq!(ledger.escrow_balance(), ledger.total_reward_pool());
            return Ok(());
        }

        let report = result.unwrap();
        let pool = ledger.total_reward_pool();

        prop_assert_eq!(report.winners.len(), n);
        prop_assert_eq!(
            report.highest_winning_bid * Decimal::from(n) + report.refund,
            pool
        );
        prop_assert!(report.refund >= Decimal::ZERO);
        prop_assert!(report.highest_winning_bid <= max_bid);
        prop_assert_eq!(ledger.escrow_balance(), Decimal::ZERO);

        let paid: Decimal = ledger.disbursements().iter().map(|t| t.amount).sum();
        prop_assert_eq!(paid, pool);

        for transfer in ledger.disbursements() {
            if transfer.kind == TransferKind::Payout {
                prop_assert_eq!(transfer.amount, report.highest_winning_bid);
            }
        }

        // Repeat finalization is rejected and changes nothing
        let settled = ledger.state().clone();
        prop_assert!(matches!(ledger.end_auction(after), Err(Error::AuctionAlreadyEnded)));
        prop_assert_eq!(ledger.state(), &settled);
    }

    /// Property: winners are the N lowest bids, ties broken by arrival
    #[test]
    fn prop_winners_are_lowest((n, max_bid, bids) in auction_strategy()) {
        let mut ledger = create(n, max_bid);
        for (i, (_, per_mille)) in bids.iter().enumerate() {
            ledger
                .place_bid(AccountId::new(format!("bidder{}", i)), scaled(max_bid, *per_mille), start())
                .unwrap();
        }

        let mut expected: Vec<_> = ledger.bids().to_vec();
        expected.sort_by(|a, b| a.amount.cmp(&b.amount).then(a.sequence.cmp(&b.sequence)));
        expected.truncate(n);

        let selected: Vec<_> = select_winners(ledger.bids(), n).into_iter().cloned().collect();
        prop_assert_eq!(selected, expected);
    }
}
