//! Core types for the auction ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode snapshots)
//! - Exact arithmetic (Decimal for money)

use crate::escrow::Escrow;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Participant identity (sponsor or bidder), e.g. a wallet address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 8 chars)
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Immutable auction parameters, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Auction ID (UUIDv7)
    pub auction_id: Uuid,

    /// Party that funded the pool and receives the refund
    pub sponsor: AccountId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Bids are accepted strictly before this instant
    pub bidding_deadline: DateTime<Utc>,

    /// Number of winners (N)
    pub num_winners: usize,

    /// Bid ceiling (M)
    pub max_bid: Decimal,

    /// Escrowed pool, always N × M
    pub total_reward_pool: Decimal,
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// Accepting bids
    Open = 1,
    /// Finalized (terminal)
    Ended = 2,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Open => write!(f, "open"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

/// Admitted bid (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Bidder identity (unique across the bid set)
    pub bidder: AccountId,

    /// Bid amount, in (0, M]
    pub amount: Decimal,

    /// Arrival order, starting at 0
    pub sequence: u64,

    /// Admission timestamp
    pub placed_at: DateTime<Utc>,
}

/// Acknowledgement for an admitted bid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidReceipt {
    /// Bidder identity
    pub bidder: AccountId,

    /// Admitted amount
    pub amount: Decimal,

    /// Assigned sequence number
    pub sequence: u64,
}

/// Kind of escrow disbursement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Uniform reward to a winner
    Payout,
    /// Unspent pool returned to the sponsor
    Refund,
}

/// Funds leaving escrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Recipient
    pub recipient: AccountId,

    /// Amount transferred
    pub amount: Decimal,

    /// Payout or refund
    pub kind: TransferKind,
}

/// Winning bid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Bidder identity
    pub bidder: AccountId,

    /// The winner's own bid (not what they are paid)
    pub amount: Decimal,
}

/// Result of finalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerReport {
    /// Winners in selection order (ascending amount, then arrival)
    pub winners: Vec<Winner>,

    /// Clearing price: largest amount among the winners
    pub highest_winning_bid: Decimal,

    /// Paid to every winner (equals the clearing price)
    pub reward_per_winner: Decimal,

    /// N × clearing price
    pub total_paid: Decimal,

    /// Returned to the sponsor
    pub refund: Decimal,

    /// Finalization timestamp
    pub ended_at: DateTime<Utc>,
}

/// Persistent mutable state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    /// Lifecycle phase
    pub phase: Phase,

    /// Bids in arrival order
    pub bids: Vec<Bid>,

    /// Reward pool custody
    pub escrow: Escrow,

    /// Finalization result (present once Ended)
    pub report: Option<WinnerReport>,
}

/// Status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionStatus {
    /// Lifecycle phase
    pub phase: Phase,

    /// Number of winners (N)
    pub num_winners: usize,

    /// Bid ceiling (M)
    pub max_bid: Decimal,

    /// Funds currently in escrow
    pub pool_balance: Decimal,

    /// Bids on record
    pub bidder_count: usize,

    /// Seconds left before the deadline, zero once passed
    pub time_remaining_secs: u64,

    /// Bidding deadline
    pub bidding_deadline: DateTime<Utc>,
}

impl AuctionStatus {
    /// Time left before the deadline
    pub fn time_remaining(&self) -> Duration {
        Duration::seconds(self.time_remaining_secs as i64)
    }

    /// True while bids can still be admitted
    pub fn is_accepting_bids(&self) -> bool {
        self.phase == Phase::Open && self.time_remaining_secs > 0
    }
}

/// All bids as parallel lists, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllBids {
    /// Bidder identities
    pub bidders: Vec<AccountId>,

    /// Bid amounts (same index as `bidders`)
    pub amounts: Vec<Decimal>,
}

impl AllBids {
    /// Number of bids
    pub fn len(&self) -> usize {
        self.bidders.len()
    }

    /// True when no bids were placed
    pub fn is_empty(&self) -> bool {
        self.bidders.is_empty()
    }

    /// Iterate (bidder, amount) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Decimal)> {
        self.bidders.iter().zip(self.amounts.iter())
    }
}

/// Winners view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinnersInfo {
    /// Auction not finalized yet
    NotFinalized,

    /// Finalized result
    Finalized {
        /// Winner identities in selection order
        winners: Vec<AccountId>,
        /// Each winner's own bid (same index as `winners`)
        winning_amounts: Vec<Decimal>,
        /// Clearing price
        highest_winning_bid: Decimal,
    },
}

impl WinnersInfo {
    /// Check if the auction was finalized
    pub fn is_finalized(&self) -> bool {
        matches!(self, WinnersInfo::Finalized { .. })
    }
}
