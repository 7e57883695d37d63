//! Snapshot persistence
//!
//! The persisted layout is the (AuctionConfig, AuctionState) tuple plus the
//! audit log, bincode-encoded behind a format version:
//!
//! ```text
//! AuctionSnapshot {
//!     version: u32,
//!     config:  AuctionConfig,
//!     state:   AuctionState,
//!     events:  EventLog,
//! }
//! ```
//!
//! Writes go to a temporary sibling file that is renamed over the target, so
//! a crash mid-write never leaves a truncated snapshot behind.

use crate::{
    events::EventLog,
    ledger::AuctionLedger,
    types::{AuctionConfig, AuctionState},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    /// Format version
    pub version: u32,

    /// Immutable parameters
    pub config: AuctionConfig,

    /// Mutable state
    pub state: AuctionState,

    /// Audit log
    pub events: EventLog,
}

impl AuctionSnapshot {
    /// Capture a ledger
    pub fn capture(ledger: &AuctionLedger) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            config: ledger.config().clone(),
            state: ledger.state().clone(),
            events: ledger.events().clone(),
        }
    }

    /// Rebuild the ledger, validating invariants
    pub fn restore(self) -> Result<AuctionLedger> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::Storage(format!(
                "Unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        AuctionLedger::from_parts(self.config, self.state, self.events)
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Open a store at `path`, creating the parent directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a snapshot file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist the ledger atomically
    pub fn save(&self, ledger: &AuctionLedger) -> Result<()> {
        let bytes = AuctionSnapshot::capture(ledger).to_bytes()?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            auction_id = %ledger.auction_id(),
            "Snapshot saved"
        );

        Ok(())
    }

    /// Load and validate the persisted ledger
    pub fn load(&self) -> Result<AuctionLedger> {
        let bytes = fs::read(&self.path)?;
        let snapshot = AuctionSnapshot::from_bytes(&bytes)
            .map_err(|e| Error::Storage(format!("Failed to decode snapshot: {}", e)))?;
        snapshot.restore()
    }

    /// Load the ledger if a snapshot exists
    pub fn load_if_exists(&self) -> Result<Option<AuctionLedger>> {
        if !self.exists() {
            return Ok(None);
        }
        self.load().map(Some)
    }
}
