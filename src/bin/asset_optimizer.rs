//! asset-optimizer: command-line front end for the optimization cache.
//!
//! Runs decisions against the configured cache and inspects the usage
//! ledger and audit log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use asset_optimizer::{
    AssetId, AssetOptimizer, AssetRequest, AuditLog, Clock, Decision, FileDataStore, MonthKey,
    OptimizerConfig, RecordStore, StoredRecord, SystemClock, UsageLedger,
};

/// Asset optimizer CLI
#[derive(Parser)]
#[command(name = "asset-optimizer")]
#[command(version = asset_optimizer::PKG_VERSION)]
#[command(about = "Lazy optimization cache for image assets")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "ASSET_OPTIMIZER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide what to serve for an asset, calling the service if needed
    Prepare {
        /// Path of the original file
        path: PathBuf,
        /// Logical filename recorded in the audit log (default: the path)
        #[arg(short, long)]
        filename: Option<String>,
        /// Processing option recorded in the audit log (repeatable)
        #[arg(short, long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Show the cache record for an asset without calling the service
    Inspect {
        /// Path of the original file
        path: PathBuf,
    },

    /// Show bytes counted against the quota
    Usage {
        /// Month as YYYYMM (default: current month)
        #[arg(short, long, value_parser = parse_month)]
        month: Option<MonthKey>,
    },

    /// Print audit entries as JSON lines
    Log {
        /// Month as YYYYMM (default: current month)
        #[arg(short, long, value_parser = parse_month)]
        month: Option<MonthKey>,
    },

    /// Print version information
    Version,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))
}

fn parse_month(s: &str) -> Result<MonthKey, String> {
    MonthKey::parse(s).ok_or_else(|| format!("expected YYYYMM, got {s:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = OptimizerConfig::load(args.config.as_deref())?;
    let this_month = SystemClock.this_month();

    match args.command {
        Command::Prepare {
            path,
            filename,
            options,
        } => {
            let optimizer = AssetOptimizer::builder().config(config).build()?;
            let mut request = AssetRequest::new(&path)
                .filename(filename.unwrap_or_else(|| path.display().to_string()));
            for (key, value) in options {
                request = request.option(key, value);
            }
            match optimizer.prepare(&request).await? {
                Decision::Optimized(served) => println!("{}", served.display()),
                Decision::Original(reason) => {
                    println!("{}", path.display());
                    eprintln!("serving original: {reason}");
                }
            }
        }
        Command::Inspect { path } => inspect(&config, &path).await?,
        Command::Usage { month } => {
            let month = month.unwrap_or(this_month);
            let ledger = UsageLedger::new(data_store(&config), config.key_prefix.clone());
            let used = ledger.get(month).await?;
            let limit = config.monthly_limit_bytes;
            println!("{month}: {used} / {limit} bytes");
            if used > limit {
                println!("limit reached; optimization suspended until next month");
            }
        }
        Command::Log { month } => {
            let month = month.unwrap_or(this_month);
            let log = AuditLog::new(data_store(&config), config.key_prefix.clone());
            for entry in log.entries(month).await? {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
        Command::Version => println!("asset-optimizer {}", asset_optimizer::version_string()),
    }

    Ok(())
}

fn data_store(config: &OptimizerConfig) -> Arc<FileDataStore> {
    Arc::new(FileDataStore::new(config.data_dir.clone()))
}

async fn inspect(config: &OptimizerConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let id = AssetId::from_path(path);
    println!("identity: {id}");

    let extensions = config.normalized_extensions();
    let Some(asset_type) = asset_optimizer::AssetType::from_path(path, &extensions) else {
        println!("state:    unsupported (not one of {})", extensions.join(", "));
        return Ok(());
    };

    let records = RecordStore::new(config.cache_dir.clone());
    let today = SystemClock.today();
    match records.lookup(&id, &asset_type).await? {
        None => println!("state:    absent"),
        Some(StoredRecord::Optimized(served)) => {
            let size = tokio::fs::metadata(&served).await?.len();
            println!("state:    optimized ({size} bytes)");
            println!("served:   {}", served.display());
        }
        Some(StoredRecord::Sentinel(sentinel)) => {
            let activity = if sentinel.is_active(today) {
                "active"
            } else {
                "expired"
            };
            println!("state:    {sentinel:?} [{sentinel}] ({activity})");
        }
    }
    Ok(())
}
