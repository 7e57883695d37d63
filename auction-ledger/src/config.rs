//! Configuration for the auction host

use crate::types::AccountId;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Auction parameters
    pub auction: AuctionParams,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Snapshot file (no persistence when unset)
    pub snapshot_path: Option<PathBuf>,

    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "auction-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            auction: AuctionParams::default(),
            actor: ActorConfig::default(),
            snapshot_path: None,
            log_json: false,
        }
    }
}

/// Parameters for creating an auction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Bidding window in seconds (default: 24 hours)
    pub bidding_time_seconds: u64,

    /// Number of winners (N)
    pub num_winners: usize,

    /// Bid ceiling (M)
    pub max_bid: Decimal,

    /// Sponsor identity
    pub sponsor: String,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            bidding_time_seconds: 86_400, // 24 hours
            num_winners: 3,
            max_bid: Decimal::ONE,
            sponsor: "sponsor".to_string(),
        }
    }
}

impl AuctionParams {
    /// Required deposit, N × M
    pub fn deposit(&self) -> Option<Decimal> {
        self.max_bid.checked_mul(Decimal::from(self.num_winners))
    }

    /// Bidding window as a duration
    pub fn bidding_time(&self) -> crate::Result<Duration> {
        i64::try_from(self.bidding_time_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                crate::Error::Config(format!(
                    "Bidding time {}s out of range",
                    self.bidding_time_seconds
                ))
            })
    }

    /// Sponsor identity
    pub fn sponsor_id(&self) -> AccountId {
        AccountId::new(self.sponsor.clone())
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Mailbox capacity (messages)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(secs) = std::env::var("AUCTION_BIDDING_TIME") {
            config.auction.bidding_time_seconds = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("AUCTION_BIDDING_TIME: {}", e)))?;
        }

        if let Ok(n) = std::env::var("AUCTION_NUM_WINNERS") {
            config.auction.num_winners = n
                .parse()
                .map_err(|e| crate::Error::Config(format!("AUCTION_NUM_WINNERS: {}", e)))?;
        }

        if let Ok(max_bid) = std::env::var("AUCTION_MAX_BID") {
            config.auction.max_bid = Decimal::from_str(&max_bid)
                .map_err(|e| crate::Error::Config(format!("AUCTION_MAX_BID: {}", e)))?;
        }

        if let Ok(sponsor) = std::env::var("AUCTION_SPONSOR") {
            config.auction.sponsor = sponsor;
        }

        if let Ok(path) = std::env::var("AUCTION_SNAPSHOT_PATH") {
            config.snapshot_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.auction.num_winners == 0 {
            return Err(crate::Error::Config(
                "auction.num_winners must be at least 1".to_string(),
            ));
        }

        if self.auction.max_bid <= Decimal::ZERO {
            return Err(crate::Error::Config(
                "auction.max_bid must be positive".to_string(),
            ));
        }

        if self.auction.deposit().is_none() {
            return Err(crate::Error::Config(
                "auction reward pool overflows".to_string(),
            ));
        }

        if self.auction.sponsor.trim().is_empty() {
            return Err(crate::Error::Config(
                "auction.sponsor must not be empty".to_string(),
            ));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }

        self.auction.bidding_time()?;
        Ok(())
    }
}
