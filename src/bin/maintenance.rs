use modarec::{init_tracing, AppState, Config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute the user-user similarity table
    ComputeUserSimilarities,
    /// Recompute the product-product similarity table
    ComputeProductSimilarities {
        /// "full" pairwise cosine or cheap "cooccurrence" counting
        #[arg(short, long, default_value = "full")]
        mode: String,
    },
    /// Remove expired cached recommendation sets
    CleanupCache,
    /// Run every maintenance task once and print a report per task
    ComputeAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    let state = AppState::new(config);

    match args.command {
        Command::ComputeUserSimilarities => {
            let rows = state.user_based.compute_user_similarities(None).await?;
            println!("user_similarities: {} pairs stored", rows);
        }
        Command::ComputeProductSimilarities { mode } => {
            let rows = match mode.as_str() {
                "full" => state.item_based.compute_product_similarities(None).await?,
                "cooccurrence" => {
                    state
                        .item_based
                        .compute_similarities_by_co_occurrence()
                        .await?
                }
                other => {
                    return Err(anyhow::anyhow!("unknown similarity mode: {}", other));
                }
            };
            println!("product_similarities: {} pairs stored", rows);
        }
        Command::CleanupCache => {
            let swept = state.hybrid.cleanup_expired_cache().await?;
            println!("cache_cleanup: {} entries removed", swept);
        }
        Command::ComputeAll => {
            for report in state.scheduler.compute_all().await {
                let status = if report.success { "ok" } else { "failed" };
                println!(
                    "{}: {} ({}, {}ms)",
                    report.task, status, report.detail, report.duration_ms
                );
            }
        }
    }

    Ok(())
}
