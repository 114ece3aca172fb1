//! Data models for the Admin API payloads and the audit trail.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Blog`] and [`Article`]: resources read from the Admin API
//! - [`BlogsPage`] and [`ArticlesPage`]: response envelopes of the listing endpoints
//! - [`ArticleUpdate`]: partial body sent back when an article changed
//! - [`AuditRecord`]: one row of the change log
//!
//! Only the fields this tool uses are modeled; everything else in the API
//! payloads is ignored during deserialization.

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

/// The blog whose articles are scanned. Only the first blog of a store is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Blog {
    pub id: u64,
    pub handle: String,
}

/// Envelope of `GET /blogs.json`.
#[derive(Debug, Deserialize)]
pub struct BlogsPage {
    #[serde(default)]
    pub blogs: Vec<Blog>,
}

/// A blog article as returned by the Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Article {
    pub id: u64,
    /// Falls back to `"Untitled"` when the API omits it.
    #[serde(default = "untitled", deserialize_with = "null_as_untitled")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub handle: String,
    /// Article markup. `null` and missing are both treated as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body_html: String,
}

/// Envelope of `GET /blogs/{id}/articles.json`.
#[derive(Debug, Deserialize)]
pub struct ArticlesPage {
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Body of `PUT /blogs/{blog_id}/articles/{id}.json`: only the new markup is sent.
#[derive(Debug, Serialize)]
pub struct ArticleUpdate<'a> {
    pub article: ArticlePatch<'a>,
}

#[derive(Debug, Serialize)]
pub struct ArticlePatch<'a> {
    pub id: u64,
    pub body_html: &'a str,
}

impl<'a> ArticleUpdate<'a> {
    pub fn body_html(id: u64, body_html: &'a str) -> Self {
        Self {
            article: ArticlePatch { id, body_html },
        }
    }
}

/// One replaced link, as written to the audit log.
///
/// Field order is the column order of the log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub article_url: String,
    pub old_link: String,
    pub new_link: String,
    pub anchor_text: String,
}

impl AuditRecord {
    /// Build a record stamped with the current local time
    /// (`YYYY-MM-DDTHH:MM:SS.ffffff`).
    pub fn now(
        article_url: impl Into<String>,
        old_link: impl Into<String>,
        new_link: impl Into<String>,
        anchor_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            article_url: article_url.into(),
            old_link: old_link.into(),
            new_link: new_link.into(),
            anchor_text: anchor_text.into(),
        }
    }
}

fn untitled() -> String {
    "Untitled".to_string()
}

fn null_as_untitled<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(untitled))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
