//! Error types for the auction ledger

use crate::types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for auction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Auction errors
///
/// Validation variants are returned by the ledger operations and always leave
/// the auction state untouched. The remaining variants belong to the host
/// layers (actor, snapshots, configuration).
#[derive(Error, Debug)]
pub enum Error {
    /// Construction parameters rejected (N, M, deposit, deadline)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Bidding phase is over (auction ended or deadline passed)
    #[error("Auction closed: bidding is no longer accepted")]
    AuctionClosed,

    /// Bid exceeds the published ceiling
    #[error("Bid too high: {amount} exceeds maximum bid {max_bid}")]
    BidTooHigh {
        /// Submitted amount
        amount: Decimal,
        /// Ceiling M
        max_bid: Decimal,
    },

    /// Bidder already has a bid on record
    #[error("Duplicate bidder: {0} has already placed a bid")]
    DuplicateBidder(AccountId),

    /// Bid amount is zero or negative
    #[error("Zero bid: amount must be positive, got {0}")]
    ZeroBid(Decimal),

    /// Deadline not reached yet
    #[error("Auction still open until {deadline}")]
    AuctionStillOpen {
        /// Bidding deadline
        deadline: DateTime<Utc>,
    },

    /// Fewer bids than winners
    #[error("Insufficient bidders: need {required}, got {received}")]
    InsufficientBidders {
        /// Number of winners N
        required: usize,
        /// Bids on record
        received: usize,
    },

    /// Finalization already happened
    #[error("Auction already ended")]
    AuctionAlreadyEnded,

    /// Invariant violation (pool conservation, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Snapshot storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether resubmitting the same call later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::AuctionStillOpen { .. } | Error::Concurrency(_))
    }

    /// Whether this is a caller-side validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration(_)
                | Error::AuctionClosed
                | Error::BidTooHigh { .. }
                | Error::DuplicateBidder(_)
                | Error::ZeroBid(_)
                | Error::AuctionStillOpen { .. }
                | Error::InsufficientBidders { .. }
                | Error::AuctionAlreadyEnded
        )
    }

    /// Short stable label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "invalid_configuration",
            Error::AuctionClosed => "auction_closed",
            Error::BidTooHigh { .. } => "bid_too_high",
            Error::DuplicateBidder(_) => "duplicate_bidder",
            Error::ZeroBid(_) => "zero_bid",
            Error::AuctionStillOpen { .. } => "auction_still_open",
            Error::InsufficientBidders { .. } => "insufficient_bidders",
            Error::AuctionAlreadyEnded => "auction_already_ended",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Storage(_) => "storage",
            Error::Serialization(_) => "serialization",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}
