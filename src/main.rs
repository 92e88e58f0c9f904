//! Litscope CLI entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use litscope::Config;

mod cli;

/// Litscope: semantic clustering and citation-gap detection
#[derive(Parser, Debug)]
#[command(name = "litscope")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to a JSON library snapshot (overrides the configured one)
    #[arg(short, long, global = true)]
    library: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute clusters and warm the gap analysis cache for a project
    Prepare {
        /// Project ID
        #[arg(short, long)]
        project: String,
    },
    /// Find similar article pairs that do not cite each other
    Gaps {
        /// Project ID
        #[arg(short, long)]
        project: String,
        #[command(flatten)]
        query: GapArgs,
    },
    /// Print the cache key of a gap analysis
    CacheKey {
        /// Project ID
        #[arg(short, long)]
        project: String,
        #[command(flatten)]
        query: GapArgs,
    },
}

/// Gap analysis parameters; unset values fall back to the `[gaps]` config section.
#[derive(clap::Args, Debug)]
struct GapArgs {
    /// Minimum similarity (-1.0 to 1.0)
    #[arg(short, long)]
    threshold: Option<f64>,
    /// Maximum number of gaps
    #[arg(short = 'n', long)]
    limit: Option<usize>,
    /// Earliest publication year (inclusive)
    #[arg(long)]
    year_from: Option<i32>,
    /// Latest publication year (inclusive)
    #[arg(long)]
    year_to: Option<i32>,
}

impl GapArgs {
    fn into_query(self, config: &Config) -> cli::GapRequest {
        cli::GapRequest {
            threshold: self.threshold.unwrap_or(config.gaps.threshold),
            limit: self.limit.unwrap_or(config.gaps.limit),
            year_from: self.year_from,
            year_to: self.year_to,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let library_path = args
        .library
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.snapshot_path());

    tracing::debug!(library = %library_path.display(), "Starting litscope v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Prepare { project } => {
            cli::run_prepare(config, &library_path, &project, args.json).await
        }
        Command::Gaps { project, query } => {
            let request = query.into_query(&config);
            cli::run_gaps(config, &library_path, &project, request, args.json).await
        }
        Command::CacheKey { project, query } => {
            cli::run_cache_key(&project, &query.into_query(&config));
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
