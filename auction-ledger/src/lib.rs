//! Reverse Auction Ledger
//!
//! Sealed-deadline reverse auction with escrowed settlement.
//!
//! # Lifecycle
//!
//! 1. **Create**: Sponsor escrows a reward pool of exactly N × M
//! 2. **Bid**: Each participant submits at most one bid in (0, M] before the deadline
//! 3. **End**: After the deadline, the N lowest bids win; every winner is paid
//!    the highest winning bid and the remainder is refunded to the sponsor
//!
//! # Architecture
//!
//! - **State Machine**: [`AuctionLedger`] owns config, bids, phase and escrow
//! - **Injected Time**: Operations take `now`; hosts read a [`Clock`]
//! - **Single Writer**: [`actor`] serializes all operations on one task
//! - **Audit Log**: Hash-chained [`events`] for external monitors
//!
//! # Invariants
//!
//! - Pool conservation: Σ(payouts) + refund == N × M
//! - Escrow balance never increases after creation
//! - At most one bid per bidder, every amount in (0, M]
//! - Open → Ended happens exactly once

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod clock;
pub mod escrow;
pub mod settlement;
pub mod events;
pub mod ledger;
pub mod storage;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    AccountId, AllBids, AuctionConfig, AuctionState, AuctionStatus, Bid, BidReceipt, Phase,
    Transfer, TransferKind, Winner, WinnerReport, WinnersInfo,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{AuctionEvent, EventLog, EventRecord};
pub use ledger::AuctionLedger;
pub use actor::{spawn_auction_actor, AuctionHandle};
pub use storage::{AuctionSnapshot, SnapshotStore};
pub use metrics::Metrics;
pub use config::Config;
