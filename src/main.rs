//! # Inlink Fixer
//!
//! Bulk replacement of broken links inside the articles of a Shopify blog.
//! A CSV maps each broken link to its replacement; every article body is
//! scanned, matching anchors are rewritten, the article is saved back through
//! the Admin API, and every replaced link is appended to a CSV change log.
//!
//! ## Usage
//!
//! ```sh
//! export SHOPIFY_STORE=my-store.myshopify.com
//! export SHOPIFY_API_TOKEN=shpat_...
//! inlink_fixer --dry-run          # preview
//! inlink_fixer -i links.csv       # apply
//! ```
//!
//! ## Architecture
//!
//! 1. **Rules**: `link_broken,link_new` rows from the input CSV
//! 2. **Discovery**: resolve the blog, page through all of its articles
//! 3. **Rewriting**: exact-match `href` substitution, one serialization per article
//! 4. **Output**: article update (skipped in dry run) and one audit row per link

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod audit;
mod cli;
mod config;
mod error;
mod models;
mod rewriter;
mod rules;
mod run;
mod shopify;
mod utils;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // .env first so RUST_LOG and the credentials it holds are visible below
    let dotenv = dotenvy::dotenv_override();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("inlink_fixer starting up");
    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Could not read .env file; continuing with the environment"),
    }

    // Parse CLI
    let args = Cli::parse();
    debug!(
        input = %args.input.display(),
        log_file = %args.log_file.display(),
        dry_run = args.dry_run,
        "Parsed CLI arguments"
    );

    let config = match Config::from_cli(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if config.dry_run {
        warn!("Dry run: articles will NOT be updated");
    }

    match run::run(&config).await {
        Ok(summary) => {
            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                secs = elapsed.as_secs(),
                millis = elapsed.subsec_millis(),
                articles = summary.articles,
                changed = summary.changed,
                updated = summary.updated,
                failed = summary.failed,
                audited = summary.audited,
                "Execution complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
