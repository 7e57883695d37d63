//! Actor-based host for the auction ledger
//!
//! The ledger is a plain owned value; this module provides the single-writer
//! discipline around it:
//! - One task owns the ledger, so operations never interleave
//! - Every message reads the injected clock once, at processing time
//! - Async message passing with backpressure (bounded mailbox)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Callers (transport / wallet layer)           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               AuctionHandle (Clone)                   │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              AuctionActor (Single Task)               │
//! │   now = clock.now()                                   │
//! │   AuctionLedger::{place_bid, end_auction, ...}        │
//! │   SnapshotStore::save() after each mutation           │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    clock::Clock,
    events::EventRecord,
    ledger::AuctionLedger,
    metrics::Metrics,
    storage::{AuctionSnapshot, SnapshotStore},
    types::{AccountId, AllBids, AuctionStatus, BidReceipt, WinnerReport, WinnersInfo},
    Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the auction actor
#[derive(Debug)]
pub enum AuctionMessage {
    /// Place a bid
    PlaceBid {
        /// Bidder identity
        bidder: AccountId,
        /// Bid amount
        amount: Decimal,
        /// Receipt or rejection
        response: oneshot::Sender<Result<BidReceipt>>,
    },

    /// Finalize the auction
    EndAuction {
        /// Settlement report or rejection
        response: oneshot::Sender<Result<WinnerReport>>,
    },

    /// Get status
    GetStatus {
        /// Status as of processing time
        response: oneshot::Sender<AuctionStatus>,
    },

    /// Get all bids
    GetAllBids {
        /// Bids in arrival order
        response: oneshot::Sender<AllBids>,
    },

    /// Get winners info
    GetWinnersInfo {
        /// Winners, or `NotFinalized`
        response: oneshot::Sender<WinnersInfo>,
    },

    /// Get audit records from an index onwards
    GetEvents {
        /// First record index to return
        since: u64,
        /// Matching records
        response: oneshot::Sender<Vec<EventRecord>>,
    },

    /// Capture a snapshot
    Snapshot {
        /// Snapshot of the current ledger
        response: oneshot::Sender<AuctionSnapshot>,
    },

    /// Shutdown actor
    Shutdown {
        /// The ledger, handed back to the caller
        response: oneshot::Sender<AuctionLedger>,
    },
}

/// Actor that owns the ledger
pub struct AuctionActor {
    /// The auction
    ledger: AuctionLedger,

    /// Time source
    clock: Arc<dyn Clock>,

    /// Metrics (optional)
    metrics: Option<Metrics>,

    /// Snapshot store (optional)
    store: Option<SnapshotStore>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<AuctionMessage>,
}

impl AuctionActor {
    /// Create new actor
    pub fn new(
        ledger: AuctionLedger,
        clock: Arc<dyn Clock>,
        metrics: Option<Metrics>,
        store: Option<SnapshotStore>,
        mailbox: mpsc::Receiver<AuctionMessage>,
    ) -> Self {
        if let Some(ref metrics) = metrics {
            metrics.set_escrow_balance(ledger.escrow_balance());
            metrics.bidder_count.set(ledger.bids().len() as i64);
        }

        Self {
            ledger,
            clock,
            metrics,
            store,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                AuctionMessage::Shutdown { response } => {
                    tracing::info!(auction_id = %self.ledger.auction_id(), "Auction actor shutting down");
                    let _ = response.send(self.ledger);
                    return;
                }
                other => self.handle_message(other),
            }
        }

        tracing::debug!(auction_id = %self.ledger.auction_id(), "Auction mailbox closed");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: AuctionMessage) {
        let now = self.clock.now();

        match msg {
            AuctionMessage::PlaceBid {
                bidder,
                amount,
                response,
            } => {
                let result = self.ledger.place_bid(bidder.clone(), amount, now);
                match &result {
                    Ok(_) => {
                        if let Some(ref metrics) = self.metrics {
                            metrics.record_bid(self.ledger.bids().len());
                        }
                        self.persist();
                    }
                    Err(e) => {
                        tracing::warn!(%bidder, %amount, reason = e.kind(), "Bid rejected: {}", e);
                        if let Some(ref metrics) = self.metrics {
                            metrics.record_rejection(e.kind());
                        }
                    }
                }
                let _ = response.send(result);
            }

            AuctionMessage::EndAuction { response } => {
                let started = Instant::now();
                let result = self.ledger.end_auction(now);
                match &result {
                    Ok(_) => {
                        if let Some(ref metrics) = self.metrics {
                            metrics.record_finalization(started.elapsed().as_secs_f64());
                            metrics.set_escrow_balance(self.ledger.escrow_balance());
                        }
                        self.persist();
                    }
                    Err(e) => {
                        tracing::warn!(reason = e.kind(), "End auction rejected: {}", e);
                    }
                }
                let _ = response.send(result);
            }

            AuctionMessage::GetStatus { response } => {
                let _ = response.send(self.ledger.status(now));
            }

            AuctionMessage::GetAllBids { response } => {
                let _ = response.send(self.ledger.all_bids());
            }

            AuctionMessage::GetWinnersInfo { response } => {
                let _ = response.send(self.ledger.winners_info());
            }

            AuctionMessage::GetEvents { since, response } => {
                let _ = response.send(self.ledger.events().since(since).to_vec());
            }

            AuctionMessage::Snapshot { response } => {
                let _ = response.send(AuctionSnapshot::capture(&self.ledger));
            }

            AuctionMessage::Shutdown { .. } => {
                // Handled in run loop
            }
        }
    }

    /// Save a snapshot after a committed mutation
    ///
    /// The in-memory commit stands even if the save fails.
    fn persist(&self) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save(&self.ledger) {
                tracing::error!(path = %store.path().display(), "Failed to save snapshot: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for AuctionActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionActor")
            .field("auction_id", &self.ledger.auction_id())
            .field("phase", &self.ledger.phase())
            .field("metrics", &self.metrics.is_some())
            .field("store", &self.store)
            .finish()
    }
}

/// Handle to communicate with the auction actor
#[derive(Clone, Debug)]
pub struct AuctionHandle {
    sender: mpsc::Sender<AuctionMessage>,
}

impl AuctionHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<AuctionMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> AuctionMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Actor response channel closed".to_string()))
    }

    /// Place a bid
    pub async fn place_bid(&self, bidder: AccountId, amount: Decimal) -> Result<BidReceipt> {
        self.request(|response| AuctionMessage::PlaceBid {
            bidder,
            amount,
            response,
        })
        .await?
    }

    /// Finalize the auction
    pub async fn end_auction(&self) -> Result<WinnerReport> {
        self.request(|response| AuctionMessage::EndAuction { response })
            .await?
    }

    /// Current status
    pub async fn status(&self) -> Result<AuctionStatus> {
        self.request(|response| AuctionMessage::GetStatus { response })
            .await
    }

    /// All bids in arrival order
    pub async fn all_bids(&self) -> Result<AllBids> {
        self.request(|response| AuctionMessage::GetAllBids { response })
            .await
    }

    /// Winners, or `NotFinalized`
    pub async fn winners_info(&self) -> Result<WinnersInfo> {
        self.request(|response| AuctionMessage::GetWinnersInfo { response })
            .await
    }

    /// Audit records from `since` onwards
    pub async fn events(&self, since: u64) -> Result<Vec<EventRecord>> {
        self.request(|response| AuctionMessage::GetEvents { since, response })
            .await
    }

    /// Snapshot of config, state and audit log
    pub async fn snapshot(&self) -> Result<AuctionSnapshot> {
        self.request(|response| AuctionMessage::Snapshot { response })
            .await
    }

    /// Stop the actor and take the ledger back
    pub async fn shutdown(&self) -> Result<AuctionLedger> {
        self.request(|response| AuctionMessage::Shutdown { response })
            .await
    }
}

/// Spawn the auction actor
pub fn spawn_auction_actor(
    ledger: AuctionLedger,
    clock: Arc<dyn Clock>,
    metrics: Option<Metrics>,
    store: Option<SnapshotStore>,
    mailbox_capacity: usize,
) -> AuctionHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);

    let actor = AuctionActor::new(ledger, clock, metrics, store, rx);
    tokio::spawn(actor.run());

    AuctionHandle::new(tx)
}
