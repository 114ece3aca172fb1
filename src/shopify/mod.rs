//! Shopify Admin API operations used by a run.
//!
//! All calls go through one [`ShopifyApi`] value, which owns the transport
//! and the settings it needs from [`Config`]:
//!
//! | Operation | Module | Endpoint |
//! |-----------|--------|----------|
//! | [`ShopifyApi::resolve_blog`] | [`blogs`] | `GET /blogs.json` |
//! | [`ShopifyApi::fetch_all_articles`] | [`articles`] | `GET /blogs/{id}/articles.json` (cursor paginated) |
//! | [`ShopifyApi::update_article`] | [`articles`] | `PUT /blogs/{id}/articles/{id}.json` |
//!
//! # Failure Policy
//!
//! - Blog resolution failing is fatal: without a blog there is nothing to do.
//! - A failed article page ends pagination; the articles already fetched are
//!   still processed.
//! - A failed article update is logged and reported as an
//!   [`articles::UpdateOutcome`]; the run moves on to the next article.

pub mod articles;
pub mod blogs;
pub mod pagination;

use crate::api::SendRequest;
use crate::config::Config;
use std::fmt;

/// Admin API client bound to one store and one run mode.
pub struct ShopifyApi<S> {
    client: S,
    api_base: String,
    page_size: u32,
    dry_run: bool,
}

impl<S> ShopifyApi<S>
where
    S: SendRequest,
{
    pub fn new(client: S, config: &Config) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            page_size: config.page_size,
            dry_run: config.dry_run,
        }
    }
}

impl<S> fmt::Debug for ShopifyApi<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyApi")
            .field("api_base", &self.api_base)
            .field("page_size", &self.page_size)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
