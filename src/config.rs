//! Validated run configuration.
//!
//! [`Config`] is built once from the parsed [`Cli`] and handed to every
//! component at construction time. Nothing reads the environment after this
//! point.

use crate::cli::Cli;
use crate::error::FixError;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a run needs to know, resolved and checked.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shop domain, used for article URLs in the audit log.
    pub store: String,
    /// Value of the `X-Shopify-Access-Token` header.
    pub token: String,
    /// Admin API root, without a trailing slash.
    pub api_base: String,
    pub input: PathBuf,
    pub log_file: PathBuf,
    pub dry_run: bool,
    pub page_size: u32,
    /// Pause after each live article update.
    pub pace: Duration,
    /// Wait used for a 429 without a usable `Retry-After` header.
    pub default_retry_after: Duration,
    /// `None` retries rate-limited requests until they succeed.
    pub max_rate_limit_retries: Option<usize>,
}

impl Config {
    /// Validate the CLI arguments and derive the API root.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::MissingCredential`] when the store domain or the
    /// access token is absent or blank.
    pub fn from_cli(cli: Cli) -> Result<Self, FixError> {
        let store = non_blank(cli.store).ok_or(FixError::MissingCredential("SHOPIFY_STORE"))?;
        let token =
            non_blank(cli.token).ok_or(FixError::MissingCredential("SHOPIFY_API_TOKEN"))?;

        let api_base = match non_blank(cli.api_base_url) {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}/admin/api/{}", store, cli.api_version),
        };

        Ok(Self {
            store,
            token,
            api_base,
            input: cli.input,
            log_file: cli.log_file,
            dry_run: cli.dry_run,
            page_size: cli.page_size,
            pace: Duration::from_millis(cli.pace_ms),
            default_retry_after: Duration::from_secs(cli.default_retry_after),
            max_rate_limit_retries: cli.max_rate_limit_retries,
        })
    }

    /// Public storefront URL of an article, as recorded in the audit log.
    pub fn article_url(&self, blog_handle: &str, article_handle: &str) -> String {
        format!(
            "https://{}/blogs/{}/{}",
            self.store, blog_handle, article_handle
        )
    }
}

#[cfg(test)]
impl Config {
    /// Live-mode configuration against a mock server, files under `dir`, no pacing.
    pub(crate) fn for_tests(api_base: &str, dir: &std::path::Path) -> Self {
        Self {
            store: "shop.example.com".to_string(),
            token: "test-token".to_string(),
            api_base: api_base.to_string(),
            input: dir.join("links.csv"),
            log_file: dir.join("link_changes_log.csv"),
            dry_run: false,
            page_size: 250,
            pace: Duration::ZERO,
            default_retry_after: Duration::from_secs(5),
            max_rate_limit_retries: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
