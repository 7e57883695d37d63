//! Winner selection and settlement planning
//!
//! Settlement is computed entirely in memory before anything is committed.
//!
//! # Algorithm
//!
//! 1. Pick the N lowest bids (ties broken by arrival sequence)
//! 2. Clearing price = largest amount among the winners
//! 3. Every winner is paid the clearing price
//! 4. Sponsor receives pool − N × clearing price
//!
//! # Example
//!
//! ```text
//! Pool: 3.0 (N = 3, M = 1.0)
//! Bids: 0.5, 0.7, 0.9, 1.0, 0.8
//!
//! Winners:        0.5, 0.7, 0.8
//! Clearing price: 0.8
//! Payouts:        3 × 0.8 = 2.4
//! Refund:         3.0 − 2.4 = 0.6
//! ```

use crate::{
    types::{AccountId, Bid, Transfer, TransferKind, Winner},
    Error, Result,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Order bids for reverse-auction ranking: lowest amount first, then earliest arrival
fn rank(a: &Bid, b: &Bid) -> Ordering {
    a.amount
        .cmp(&b.amount)
        .then_with(|| a.sequence.cmp(&b.sequence))
}

/// Select the `n` winning bids, in ranking order
///
/// Uses a partial selection so only the winning prefix is fully sorted.
/// Returns fewer than `n` bids when fewer were placed.
pub fn select_winners(bids: &[Bid], n: usize) -> Vec<&Bid> {
    let mut ranked: Vec<&Bid> = bids.iter().collect();
    if n == 0 {
        return Vec::new();
    }

    if ranked.len() > n {
        ranked.select_nth_unstable_by(n - 1, |a, b| rank(a, b));
        ranked.truncate(n);
    }
    ranked.sort_unstable_by(|a, b| rank(a, b));
    ranked
}

/// Complete set of transfers for one finalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Winners in ranking order
    pub winners: Vec<Winner>,

    /// Clearing price paid to every winner
    pub highest_winning_bid: Decimal,

    /// Sum of winner payouts
    pub total_paid: Decimal,

    /// Remainder returned to the sponsor
    pub refund: Decimal,

    /// Payouts followed by the sponsor refund
    pub transfers: Vec<Transfer>,
}

impl SettlementPlan {
    /// Compute the settlement for `bids` against a pool of `total_reward_pool`
    pub fn compute(
        bids: &[Bid],
        num_winners: usize,
        total_reward_pool: Decimal,
        sponsor: &AccountId,
    ) -> Result<Self> {
        if num_winners == 0 {
            return Err(Error::InvariantViolation(
                "Settlement requires at least one winner".to_string(),
            ));
        }

        if bids.len() < num_winners {
            return Err(Error::InsufficientBidders {
                required: num_winners,
                received: bids.len(),
            });
        }

        let selected = select_winners(bids, num_winners);

        let highest_winning_bid = selected
            .iter()
            .map(|bid| bid.amount)
            .max()
            .ok_or_else(|| Error::InvariantViolation("No winners selected".to_string()))?;

        let total_paid = highest_winning_bid
            .checked_mul(Decimal::from(num_winners))
            .ok_or_else(|| Error::InvariantViolation("Payout total overflows".to_string()))?;

        let refund = total_reward_pool
            .checked_sub(total_paid)
            .filter(|refund| !refund.is_sign_negative())
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "Payouts {} exceed reward pool {}",
                    total_paid, total_reward_pool
                ))
            })?;

        let winners: Vec<Winner> = selected
            .iter()
            .map(|bid| Winner {
                bidder: bid.bidder.clone(),
                amount: bid.amount,
            })
            .collect();

        let mut transfers: Vec<Transfer> = winners
            .iter()
            .map(|winner| Transfer {
                recipient: winner.bidder.clone(),
                amount: highest_winning_bid,
                kind: TransferKind::Payout,
            })
            .collect();

        transfers.push(Transfer {
            recipient: sponsor.clone(),
            amount: refund,
            kind: TransferKind::Refund,
        });

        let plan = Self {
            winners,
            highest_winning_bid,
            total_paid,
            refund,
            transfers,
        };
        plan.verify_conservation(total_reward_pool)?;

        Ok(plan)
    }

    /// Check that the transfers account for the whole pool exactly
    pub fn verify_conservation(&self, total_reward_pool: Decimal) -> Result<()> {
        let distributed: Decimal = self.transfers.iter().map(|t| t.amount).sum();

        if distributed != total_reward_pool {
            return Err(Error::InvariantViolation(format!(
                "Distributed {} but pool holds {}",
                distributed, total_reward_pool
            )));
        }

        if self.transfers.iter().any(|t| t.amount.is_sign_negative()) {
            return Err(Error::InvariantViolation(
                "Negative transfer in settlement plan".to_string(),
            ));
        }

        Ok(())
    }

    /// Amount paid to `bidder` (zero for losers)
    pub fn payout_for(&self, bidder: &AccountId) -> Decimal {
        self.transfers
            .iter()
            .filter(|t| t.kind == TransferKind::Payout && &t.recipient == bidder)
            .map(|t| t.amount)
            .sum()
    }
}
