//! Fatal error conditions that abort a run.
//!
//! Only failures that make the whole run meaningless end up here. Failures
//! scoped to a single page or a single article are logged and carried as
//! values instead (see [`crate::shopify::articles::UpdateOutcome`]).

use std::path::PathBuf;
use thiserror::Error;

/// Every way a run can be aborted.
#[derive(Debug, Error)]
pub enum FixError {
    /// A required credential was not supplied by the environment or the CLI.
    #[error("missing configuration: {0} must be set (environment or .env file)")]
    MissingCredential(&'static str),

    /// The replacement CSV does not exist.
    #[error("input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    /// The replacement CSV lacks one of the required columns.
    #[error("input file must have columns 'link_broken' and 'link_new' (missing '{0}')")]
    MissingColumn(&'static str),

    /// The replacement CSV could not be read or parsed.
    #[error("failed to read replacement rules: {0}")]
    Csv(#[from] csv::Error),

    /// The audit log could not be opened or written.
    #[error("audit log '{}': {source}", path.display())]
    AuditLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an audit row failed after the file was opened.
    #[error("failed to write audit record: {0}")]
    AuditWrite(csv::Error),

    /// The blog listing did not produce a usable blog.
    #[error("could not resolve the blog id and handle: {0}")]
    BlogUnresolved(String),

    /// The HTTP transport failed (connection, TLS, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}
