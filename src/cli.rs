//! Command-line interface definitions for Inlink Fixer.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and API settings can be provided via command-line flags,
//! environment variables, or a `.env` file in the working directory.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Inlink Fixer application.
///
/// # Examples
///
/// ```sh
/// # Preview the changes without touching the store
/// inlink_fixer --dry-run
///
/// # Apply the replacements listed in a custom file
/// inlink_fixer -i ./broken_links.csv -l ./changes.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Shop domain, e.g. `my-store.myshopify.com`
    #[arg(long, env = "SHOPIFY_STORE")]
    pub store: Option<String>,

    /// Admin API access token
    #[arg(long, env = "SHOPIFY_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// CSV with `link_broken` and `link_new` columns
    #[arg(short, long, default_value = "links.csv")]
    pub input: PathBuf,

    /// CSV file that receives one row per replaced link
    #[arg(short, long, default_value = "link_changes_log.csv")]
    pub log_file: PathBuf,

    /// Compute and log the replacements without updating any article
    #[arg(long)]
    pub dry_run: bool,

    /// Admin REST API version
    #[arg(long, env = "SHOPIFY_API_VERSION", default_value = "2023-10")]
    pub api_version: String,

    /// Override the Admin API base URL (defaults to `https://{store}/admin/api/{version}`)
    #[arg(long, env = "SHOPIFY_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Articles requested per page
    #[arg(long, default_value_t = 250)]
    pub page_size: u32,

    /// Pause after each article update, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub pace_ms: u64,

    /// Wait used when a 429 response carries no usable Retry-After, in seconds
    #[arg(long, default_value_t = 5)]
    pub default_retry_after: u64,

    /// Give up on a request after this many 429 responses (unbounded when unset)
    #[arg(long)]
    pub max_rate_limit_retries: Option<usize>,
}
