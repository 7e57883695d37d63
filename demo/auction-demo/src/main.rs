// Auction Demo - walks one reverse auction from deposit to settlement
// Mirrors the deploy/bid/end flow a sponsor and five bidders would go through

use anyhow::Context;
use auction_ledger::{
    spawn_auction_actor, AccountId, AuctionHandle, AuctionLedger, Clock, Config, ManualClock,
    Metrics, SnapshotStore, WinnersInfo,
};
use chrono::{Duration, Utc};
use colored::Colorize;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Bid amounts as fractions of the ceiling, in submission order
const BID_FRACTIONS: [Decimal; 5] = [dec!(0.5), dec!(0.7), dec!(0.9), dec!(1.0), dec!(0.8)];

fn load_config() -> anyhow::Result<Config> {
    match std::env::var("AUCTION_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path)),
        Err(_) => Config::from_env().context("reading AUCTION_* environment"),
    }
}

fn init_tracing(log_json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    if log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn print_status(handle: &AuctionHandle) -> anyhow::Result<()> {
    let status = handle.status().await?;
    println!("{}", "📊 Auction status".bold());
    println!("   phase:          {}", status.phase);
    println!("   winners (N):    {}", status.num_winners);
    println!("   max bid (M):    {}", status.max_bid);
    println!("   pool balance:   {}", status.pool_balance);
    println!("   bidders:        {}", status.bidder_count);
    let remaining = status.time_remaining();
    println!(
        "   time remaining: {}h {:02}m {:02}s",
        remaining.num_hours(),
        remaining.num_minutes() % 60,
        remaining.num_seconds() % 60
    );
    println!();
    Ok(())
}

async fn print_bids(handle: &AuctionHandle) -> anyhow::Result<()> {
    let bids = handle.all_bids().await?;
    println!("{}", format!("📝 All bids ({})", bids.len()).bold());
    for (bidder, amount) in bids.iter() {
        println!("   {:<12} {}", bidder.short(), amount);
    }
    println!();
    Ok(())
}

async fn run_demo(config: Config) -> anyhow::Result<()> {
    println!("\n🚀 =================================================================");
    println!("🚀 Reverse Auction - Sealed Deadline, Escrowed Settlement");
    println!("🚀 =================================================================\n");

    let params = &config.auction;
    let deposit = params
        .deposit()
        .context("reward pool N * M overflows")?;
    let bidding_time = params.bidding_time()?;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let ledger = AuctionLedger::create(
        bidding_time,
        params.num_winners,
        params.max_bid,
        deposit,
        params.sponsor_id(),
        clock.now(),
    )?;

    println!(
        "🏦 {} deposited {} for {} winners (ceiling {})",
        params.sponsor.cyan(),
        deposit.to_string().green(),
        params.num_winners,
        params.max_bid
    );
    println!("🏦 Auction {}\n", ledger.auction_id());

    let store = config
        .snapshot_path
        .as_ref()
        .map(SnapshotStore::open)
        .transpose()?;
    let metrics = Metrics::new()?;

    let handle = spawn_auction_actor(
        ledger,
        clock.clone(),
        Some(metrics.clone()),
        store,
        config.actor.mailbox_capacity,
    );

    print_status(&handle).await?;

    // Enough bidders to fill every winning slot
    let bidder_count = params.num_winners.max(BID_FRACTIONS.len());
    for i in 0..bidder_count {
        let bidder = AccountId::new(format!("bidder{}", i + 1));
        let amount = (params.max_bid * BID_FRACTIONS[i % BID_FRACTIONS.len()]).normalize();
        let receipt = handle.place_bid(bidder, amount).await?;
        println!(
            "  ✅ {} bid {} (#{})",
            receipt.bidder.short(),
            receipt.amount,
            receipt.sequence
        );
    }
    println!();

    // Rejections leave the auction untouched
    let over = params.max_bid + dec!(0.5);
    if let Err(e) = handle.place_bid(AccountId::new("greedy"), over).await {
        println!("  ⚠️  {}", e.to_string().yellow());
    }
    if let Err(e) = handle.place_bid(AccountId::new("bidder1"), dec!(0.1)).await {
        println!("  ⚠️  {}", e.to_string().yellow());
    }
    if let Err(e) = handle.end_auction().await {
        println!("  ⚠️  {}", e.to_string().yellow());
    }
    println!();

    print_bids(&handle).await?;

    println!("⏰ Advancing clock past the bidding deadline\n");
    clock.advance(bidding_time + Duration::seconds(1));

    let report = handle.end_auction().await?;

    println!("{}", "🏆 Winners".bold());
    if let WinnersInfo::Finalized {
        winners,
        winning_amounts,
        highest_winning_bid,
    } = handle.winners_info().await?
    {
        for (winner, amount) in winners.iter().zip(&winning_amounts) {
            println!("   {:<12} bid {}", winner.short(), amount);
        }
        println!("   highest winning bid: {}", highest_winning_bid.to_string().green());
    }
    println!();

    println!("{}", "💰 Settlement".bold());
    println!("   reward per winner: {}", report.reward_per_winner);
    println!("   total paid:        {}", report.total_paid);
    println!("   refund to sponsor: {}", report.refund);
    println!();

    print_status(&handle).await?;

    let ledger = handle.shutdown().await?;
    ledger.events().verify_chain()?;
    let head_hash = ledger.events().head_hash();
    println!(
        "🔗 Audit log: {} records, head {}",
        ledger.events().len(),
        hex::encode(&head_hash[..8])
    );

    if std::env::var("AUCTION_DEMO_VERBOSE").is_ok() {
        println!("\n{}", ledger.events().to_json_lines()?);
        println!("{}", metrics.export()?);
    }

    println!("\n✅ Auction settled");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(config.log_json);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting auction demo"
    );

    run_demo(config).await
}
