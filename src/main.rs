//! cache-admin - maintenance tool for the analysis cache
//!
//! Inspects and maintains the persistent cache tier:
//!
//! ```text
//! cache-admin stats                    # statistics report
//! cache-admin clear-expired            # sweep expired entries
//! cache-admin clear-all --yes          # wipe the whole cache
//! cache-admin clear-product <barcode>  # targeted invalidation
//! cache-admin warm                     # report cache coverage for popular products
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analysis_cache::{CacheService, Config};

#[derive(Parser, Debug)]
#[command(name = "cache-admin", about = "Manage the product analysis cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show cache statistics
    Stats,
    /// Remove all expired entries
    ClearExpired,
    /// Remove every entry in the cache
    ClearAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Remove every entry for a specific product
    ClearProduct {
        /// Product barcode
        barcode: String,
    },
    /// Report cache coverage for a fixed list of popular products
    Warm,
}

/// Popular products worth keeping warm. The analysis pipeline populates the
/// cache; this command only reports which of these are currently covered.
const POPULAR_PRODUCTS: &[&str] = &[
    "3017620422003",
    "3600541253499",
    "3337875598996",
    "8711600306554",
    "3282770204513",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analysis_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let service = CacheService::connect(&config).await?;

    match cli.command {
        Command::Stats => show_stats(&service).await?,
        Command::ClearExpired => {
            let removed = service.clear_expired().await?;
            if removed > 0 {
                println!("{} expired entries removed", removed);
            } else {
                println!("No expired entries found");
            }
        }
        Command::ClearAll { yes } => clear_all(&service, yes).await?,
        Command::ClearProduct { barcode } => {
            let removed = service.invalidate_product(&barcode).await?;
            if removed > 0 {
                println!("{} entries removed for {}", removed, barcode);
            } else {
                println!("No entries found for {}", barcode);
            }
        }
        Command::Warm => warm_report(&service).await?,
    }

    Ok(())
}

/// Prints the full statistics report.
async fn show_stats(service: &CacheService) -> Result<()> {
    let stats = service.statistics().await?;

    println!("Analysis Cache Statistics");
    println!("{}", "=".repeat(40));
    println!("Total entries:   {}", stats.store.total_entries);
    println!("Active entries:  {}", stats.store.active_entries);
    println!("Expired entries: {}", stats.store.expired_entries);
    println!("Total accesses:  {}", stats.store.total_access);
    println!("Average access:  {:.1}", stats.average_access());

    println!("\nBy category:");
    for (category, counts) in &stats.by_category {
        if counts.total > 0 {
            println!(
                "  {}: {} active, {} expired",
                category, counts.active, counts.expired
            );
        }
    }

    if !stats.top_entries.is_empty() {
        println!("\nMost accessed:");
        for (i, entry) in stats.top_entries.iter().enumerate() {
            println!(
                "  {}. {} - {} accesses",
                i + 1,
                entry.cache_key,
                entry.access_count
            );
        }
    }

    Ok(())
}

/// Wipes the cache after an interactive confirmation unless `--yes`.
async fn clear_all(service: &CacheService, yes: bool) -> Result<()> {
    let stats = service.statistics().await?;
    if stats.store.total_entries == 0 {
        println!("Cache is already empty");
        return Ok(());
    }

    if !yes {
        print!(
            "This will remove all {} entries. Continue? (yes/no): ",
            stats.store.total_entries
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "yes" | "y") {
            println!("Aborted");
            return Ok(());
        }
    }

    let removed = service.clear_all().await?;
    println!("{} entries removed", removed);
    Ok(())
}

/// Reports which popular products currently have a cached complete
/// analysis. Actual warming happens through the analysis pipeline; the
/// cache exposes no warm primitive beyond normal set semantics.
async fn warm_report(service: &CacheService) -> Result<()> {
    info!("Checking cache coverage for {} products", POPULAR_PRODUCTS.len());

    let mut covered = 0;
    for barcode in POPULAR_PRODUCTS {
        let cached = service.get_cached_analysis(barcode, None).await?;
        if cached.is_some() {
            covered += 1;
            println!("  {} cached", barcode);
        } else {
            println!("  {} not cached (run the analysis pipeline to populate)", barcode);
        }
    }

    println!("{}/{} popular products covered", covered, POPULAR_PRODUCTS.len());
    Ok(())
}
