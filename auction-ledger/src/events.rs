//! Append-only audit event log
//!
//! Each record is chained to its predecessor by a SHA-256 hash so external
//! monitors can detect tampering or gaps.
//!
//! ```text
//! hash[i] = SHA256(hash[i-1] || i || secs[i] || nanos[i] || bincode(event[i]))
//! hash[-1] = [0; 32]
//! ```

use crate::{
    types::{AccountId, Winner},
    Error, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Observable auction event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionEvent {
    /// Auction created and pool escrowed
    AuctionCreated {
        /// Auction ID
        auction_id: Uuid,
        /// Sponsor identity
        sponsor: AccountId,
        /// Number of winners (N)
        num_winners: usize,
        /// Bid ceiling (M)
        max_bid: Decimal,
        /// Escrowed pool
        total_reward_pool: Decimal,
        /// Bidding deadline
        bidding_deadline: DateTime<Utc>,
    },

    /// Bid admitted
    BidPlaced {
        /// Bidder identity
        bidder: AccountId,
        /// Bid amount
        amount: Decimal,
    },

    /// Auction finalized and pool distributed
    AuctionEnded {
        /// Winners in ranking order
        winners: Vec<Winner>,
        /// Clearing price
        highest_winning_bid: Decimal,
        /// Returned to the sponsor
        refund: Decimal,
    },
}

impl AuctionEvent {
    /// Event name
    pub fn name(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionCreated { .. } => "AuctionCreated",
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::AuctionEnded { .. } => "AuctionEnded",
        }
    }
}

/// Hash-chained log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub index: u64,

    /// Time the event was recorded
    pub recorded_at: DateTime<Utc>,

    /// The event
    pub event: AuctionEvent,

    /// Hash of the previous record (zeros for the first)
    pub previous_hash: [u8; 32],

    /// Hash of this record
    pub hash: [u8; 32],
}

/// Compute the chained hash of an event
pub fn hash_event(
    previous_hash: &[u8; 32],
    index: u64,
    recorded_at: DateTime<Utc>,
    event: &AuctionEvent,
) -> Result<[u8; 32]> {
    let encoded = bincode::serialize(event)?;

    let mut hasher = Sha256::new();
    hasher.update(previous_hash);
    hasher.update(index.to_be_bytes());
    hasher.update(recorded_at.timestamp().to_be_bytes());
    hasher.update(recorded_at.timestamp_subsec_nanos().to_be_bytes());
    hasher.update(&encoded);

    Ok(hasher.finalize().into())
}

/// Append-only event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its record
    pub fn append(&mut self, event: AuctionEvent, recorded_at: DateTime<Utc>) -> Result<&EventRecord> {
        let index = self.records.len() as u64;
        let previous_hash = self.head_hash();
        let hash = hash_event(&previous_hash, index, recorded_at, &event)?;

        tracing::debug!(index, event = event.name(), "Audit event recorded");

        self.records.push(EventRecord {
            index,
            recorded_at,
            event,
            previous_hash,
            hash,
        });

        Ok(&self.records[self.records.len() - 1])
    }

    /// Hash of the latest record (zeros when empty)
    pub fn head_hash(&self) -> [u8; 32] {
        self.records.last().map(|r| r.hash).unwrap_or([0u8; 32])
    }

    /// All records
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records from `index` onwards
    pub fn since(&self, index: u64) -> &[EventRecord] {
        let start = (index as usize).min(self.records.len());
        &self.records[start..]
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute the hash chain
    pub fn verify_chain(&self) -> Result<()> {
        let mut previous_hash = [0u8; 32];

        for (position, record) in self.records.iter().enumerate() {
            if record.index != position as u64 {
                return Err(Error::InvariantViolation(format!(
                    "Event record {} stored at position {}",
                    record.index, position
                )));
            }

            if record.previous_hash != previous_hash {
                return Err(Error::InvariantViolation(format!(
                    "Event record {} does not link to its predecessor",
                    record.index
                )));
            }

            let expected = hash_event(&previous_hash, record.index, record.recorded_at, &record.event)?;
            if record.hash != expected {
                return Err(Error::InvariantViolation(format!(
                    "Event record {} hash mismatch",
                    record.index
                )));
            }

            previous_hash = record.hash;
        }

        Ok(())
    }

    /// Export as newline-delimited JSON
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            let line = serde_json::to_string(record)
                .map_err(|e| Error::Storage(format!("Failed to encode event: {}", e)))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}
