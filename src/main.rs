use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::Duration;
use tokio::time::interval;

use coinwatch::cli::Cli;
use coinwatch::config::Config;
use coinwatch::logging;
use coinwatch::service::DashboardService;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init(if cli.debug { "debug" } else { "info" });

    // Load configuration
    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from {:?}: {}", path, e);
                return Err(anyhow::anyhow!("Configuration loading failed: {}", e));
            }
        },
        None => Config::default(),
    };
    info!("Starting coinwatch dashboard...");

    let mut service = DashboardService::new(config.clone());
    service.load().await;
    log_snapshot(&service);

    if cli.once {
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(config.refresh.interval_secs));
    ticker.tick().await; // the first tick fires immediately
    loop {
        ticker.tick().await;
        if service.refresh_all().await {
            log_snapshot(&service);
        }
    }
}

fn log_snapshot(service: &DashboardService) {
    let prices = service.header_prices();
    info!(
        "BTC ${:.2} | ETH ${:.2} | SOL ${:.2} | Fear&Greed {}",
        prices.get("bitcoin").copied().unwrap_or(0.0),
        prices.get("ethereum").copied().unwrap_or(0.0),
        prices.get("solana").copied().unwrap_or(0.0),
        service
            .sentiment_index()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    );
    for coin in service.watchlist() {
        info!(
            "  {} ({}) price={} change24h={}",
            coin.name,
            coin.symbol,
            coin.price
                .map(|p| format!("${:.4}", p))
                .unwrap_or_else(|| "N/A".to_string()),
            coin.change_24h
                .map(|c| format!("{:.2}%", c))
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
    let trending = service.trending();
    info!(
        "Trending: {} crypto / {} eth / {} sol entries",
        trending.crypto.len(),
        trending.ethereum.len(),
        trending.solana.len()
    );
    info!("Portfolio value: ${:.2}", service.portfolio_value());
}
