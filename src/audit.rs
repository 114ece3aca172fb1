//! Append-only CSV log of every replaced link.
//!
//! # Format
//!
//! ```text
//! timestamp,article_url,old_link,new_link,anchor_text
//! 2025-05-06T14:30:00.123456,https://shop.myshopify.com/blogs/news/post,/old-page,/new-page,Click here
//! ```
//!
//! The header is written only when the file is empty, so repeated runs keep
//! appending to the same log. Each record is flushed as soon as it is
//! written: a crash mid-run leaves every row up to that point on disk.

use crate::error::FixError;
use crate::models::AuditRecord;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const HEADER: [&str; 5] = ["timestamp", "article_url", "old_link", "new_link", "anchor_text"];

/// Open handle on the change log.
pub struct AuditLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl AuditLog {
    /// Open `path` for appending, creating it (and its directory) if needed.
    ///
    /// # Errors
    ///
    /// [`FixError::AuditLog`] if the file cannot be created or opened, and
    /// [`FixError::AuditWrite`] if the header cannot be written.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, FixError> {
        let io_err = |source| FixError::AuditLog {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(HEADER).map_err(FixError::AuditWrite)?;
            writer.flush().map_err(io_err)?;
            info!("Created audit log");
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Write one record and flush it to disk.
    pub fn append(&mut self, record: &AuditRecord) -> Result<(), FixError> {
        self.writer
            .serialize(record)
            .map_err(FixError::AuditWrite)?;
        self.writer.flush().map_err(|source| FixError::AuditLog {
            path: self.path.clone(),
            source,
        })?;
        debug!(old_link = %record.old_link, new_link = %record.new_link, "Audit record written");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(old: &str, anchor: &str) -> AuditRecord {
        AuditRecord {
            timestamp: "2025-05-06T14:30:00.000000".to_string(),
            article_url: "https://shop/blogs/news/post".to_string(),
            old_link: old.to_string(),
            new_link: "/new-page".to_string(),
            anchor_text: anchor.to_string(),
        }
    }

    #[test]
    fn test_header_written_once_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.append(&record("/old-page", "Click here")).unwrap();
        }
        {
            let mut log = AuditLog::open(&path).unwrap();
            log.append(&record("/other", "More")).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "timestamp,article_url,old_link,new_link,anchor_text\n\
             2025-05-06T14:30:00.000000,https://shop/blogs/news/post,/old-page,/new-page,Click here\n\
             2025-05-06T14:30:00.000000,https://shop/blogs/news/post,/other,/new-page,More\n"
        );
    }

    #[test]
    fn test_open_without_records_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.csv");

        AuditLog::open(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "timestamp,article_url,old_link,new_link,anchor_text\n");
    }

    #[test]
    fn test_existing_content_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "timestamp,article_url,old_link,new_link,anchor_text\n").unwrap();

        let mut log = AuditLog::open(&path).unwrap();
        log.append(&record("/a", "")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("timestamp").count(), 1);
        assert!(content.ends_with(",/a,/new-page,\n"));
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut log = AuditLog::open(&path).unwrap();
        log.append(&record("/search?q=a,b", "Say \"hi\"")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<AuditRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].old_link, "/search?q=a,b");
        assert_eq!(rows[0].anchor_text, "Say \"hi\"");
    }
}
