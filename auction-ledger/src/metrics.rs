//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring an auction.
//!
//! # Metrics
//!
//! - `auction_bids_total` - Total number of admitted bids
//! - `auction_bids_rejected_total` - Rejected bids, by reason
//! - `auction_finalizations_total` - Successful finalizations
//! - `auction_escrow_balance` - Funds currently held in escrow
//! - `auction_bidder_count` - Bids on record
//! - `auction_settlement_duration_seconds` - Histogram of finalization latencies

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Admitted bids
    pub bids_total: IntCounter,

    /// Rejected bids by reason
    pub bids_rejected: IntCounterVec,

    /// Successful finalizations
    pub finalizations_total: IntCounter,

    /// Escrow balance
    pub escrow_balance: Gauge,

    /// Bids on record
    pub bidder_count: IntGauge,

    /// Finalization latency
    pub settlement_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let bids_total = IntCounter::new("auction_bids_total", "Total number of admitted bids")?;
        registry.register(Box::new(bids_total.clone()))?;

        let bids_rejected = IntCounterVec::new(
            Opts::new("auction_bids_rejected_total", "Rejected bids by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(bids_rejected.clone()))?;

        let finalizations_total = IntCounter::new(
            "auction_finalizations_total",
            "Successful auction finalizations",
        )?;
        registry.register(Box::new(finalizations_total.clone()))?;

        let escrow_balance = Gauge::new("auction_escrow_balance", "Funds currently held in escrow")?;
        registry.register(Box::new(escrow_balance.clone()))?;

        let bidder_count = IntGauge::new("auction_bidder_count", "Bids on record")?;
        registry.register(Box::new(bidder_count.clone()))?;

        let settlement_duration = Histogram::with_opts(
            HistogramOpts::new(
                "auction_settlement_duration_seconds",
                "Histogram of finalization latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(settlement_duration.clone()))?;

        Ok(Self {
            bids_total,
            bids_rejected,
            finalizations_total,
            escrow_balance,
            bidder_count,
            settlement_duration,
            registry,
        })
    }

    /// Record an admitted bid
    pub fn record_bid(&self, bidder_count: usize) {
        self.bids_total.inc();
        self.bidder_count.set(bidder_count as i64);
    }

    /// Record a rejected bid
    pub fn record_rejection(&self, reason: &str) {
        self.bids_rejected.with_label_values(&[reason]).inc();
    }

    /// Record a finalization
    pub fn record_finalization(&self, duration_secs: f64) {
        self.finalizations_total.inc();
        self.settlement_duration.observe(duration_secs);
    }

    /// Update escrow balance gauge
    pub fn set_escrow_balance(&self, balance: Decimal) {
        self.escrow_balance.set(balance.to_f64().unwrap_or(0.0));
    }

    /// Render in Prometheus text format
    ///
    /// Includes every metric on this collector's registry.
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("bids_total", &self.bids_total.get())
            .field("finalizations_total", &self.finalizations_total.get())
            .field("escrow_balance", &self.escrow_balance.get())
            .field("bidder_count", &self.bidder_count.get())
            .finish()
    }
}
