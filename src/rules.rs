//! Replacement rules loaded from the input CSV.
//!
//! The file needs a `link_broken` and a `link_new` column; any other column
//! is ignored. Duplicate `(link_broken, link_new)` rows collapse into one
//! rule. When the same broken link is listed with two different
//! replacements, the row that comes last wins.
//!
//! Every rule is applied as written: `/a -> /b` always records `/b`, even
//! when `/b` is itself listed as broken. Such chains are only reported, since
//! a later run will then rewrite `/b` in turn. A rule whose replacement is
//! its own broken link would change nothing and is dropped.

use crate::error::FixError;
use itertools::Itertools;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const BROKEN_COLUMN: &str = "link_broken";
pub const REPLACEMENT_COLUMN: &str = "link_new";

/// A broken link and the link that should take its place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplacementRule {
    pub broken: String,
    pub replacement: String,
}

/// Rule set keyed by broken link. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ReplacementRules {
    by_broken: HashMap<String, String>,
}

impl ReplacementRules {
    /// Build a rule set, collapsing duplicate pairs.
    ///
    /// # Arguments
    ///
    /// * `rules` - Rules in file order; for a repeated broken link the last one wins
    ///
    /// # Returns
    ///
    /// The rule set keyed by broken link, without rules that map a link to itself.
    pub fn from_rules(rules: impl IntoIterator<Item = ReplacementRule>) -> Self {
        let mut by_broken: HashMap<String, String> = HashMap::new();
        for rule in rules.into_iter().unique() {
            if rule.broken == rule.replacement {
                warn!(broken = %rule.broken, "Replacement equals the broken link; rule dropped");
                continue;
            }
            if let Some(previous) = by_broken.get(&rule.broken) {
                warn!(
                    broken = %rule.broken,
                    previous = %previous,
                    replacement = %rule.replacement,
                    "Broken link listed twice with different replacements; keeping the last one"
                );
            }
            by_broken.insert(rule.broken, rule.replacement);
        }
        report_chains(&by_broken);
        Self { by_broken }
    }

    /// Replacement for an href, matched by exact string equality.
    pub fn replacement_for(&self, href: &str) -> Option<&str> {
        self.by_broken.get(href).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_broken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_broken.is_empty()
    }
}

/// Warn about replacements that are themselves listed as broken.
fn report_chains(by_broken: &HashMap<String, String>) {
    for (broken, replacement) in by_broken {
        if let Some(next) = by_broken.get(replacement) {
            warn!(
                %broken,
                %replacement,
                %next,
                "Replacement is itself a broken link; a later run will rewrite it again"
            );
        }
    }
}

/// Load the rule set from a CSV file on disk.
///
/// # Errors
///
/// - [`FixError::InputNotFound`] if `path` is not an existing file
/// - [`FixError::MissingColumn`] if a required column is absent
/// - [`FixError::Csv`] if the file cannot be read or parsed
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_rules(path: &Path) -> Result<ReplacementRules, FixError> {
    if !path.is_file() {
        return Err(FixError::InputNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path).map_err(|e| FixError::Csv(e.into()))?;
    let rules = read_rules(file)?;
    info!(count = rules.len(), "Loaded replacement rules");
    Ok(rules)
}

/// Parse rules from any CSV source.
///
/// # Arguments
///
/// * `reader` - CSV with a header row naming `link_broken` and `link_new`
///
/// # Returns
///
/// The rule set, or [`FixError::MissingColumn`] / [`FixError::Csv`].
///
/// # Example
///
/// ```ignore
/// let rules = read_rules("link_broken,link_new\n/old-page,/new-page\n".as_bytes())?;
/// assert_eq!(rules.replacement_for("/old-page"), Some("/new-page"));
/// ```
pub fn read_rules<R: Read>(reader: R) -> Result<ReplacementRules, FixError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(FixError::MissingColumn(name))
    };
    let broken_idx = column(BROKEN_COLUMN)?;
    let replacement_idx = column(REPLACEMENT_COLUMN)?;

    let mut rules = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let broken = record.get(broken_idx).unwrap_or_default();
        let replacement = record.get(replacement_idx).unwrap_or_default();
        if broken.trim().is_empty() || replacement.trim().is_empty() {
            // +2: one for the header, one for 1-based numbering
            warn!(line = row + 2, "Skipping row with an empty link");
            continue;
        }
        rules.push(ReplacementRule {
            broken: broken.to_string(),
            replacement: replacement.to_string(),
        });
    }

    Ok(ReplacementRules::from_rules(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_rules_basic() {
        let csv = "link_broken,link_new\n/old-page,/new-page\nhttps://a.com/x,https://a.com/y\n";
        let rules = read_rules(csv.as_bytes()).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.replacement_for("/old-page"), Some("/new-page"));
        assert_eq!(rules.replacement_for("https://a.com/x"), Some("https://a.com/y"));
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let csv = "link_broken,link_new\n/a,/b\n/a,/b\n/a,/b\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.replacement_for("/a"), Some("/b"));
    }

    #[test]
    fn test_conflicting_broken_link_last_wins() {
        let csv = "link_broken,link_new\n/a,/b\n/a,/c\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.replacement_for("/a"), Some("/c"));
    }

    #[test]
    fn test_extra_columns_and_order() {
        let csv = "note,link_new,link_broken\nfix,/new,/old\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.replacement_for("/old"), Some("/new"));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "link_broken,link_new\n\"/search?q=a,b\",\"/search?q=c\"\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.replacement_for("/search?q=a,b"), Some("/search?q=c"));
    }

    #[test]
    fn test_empty_values_skipped() {
        let csv = "link_broken,link_new\n/a,\n,/b\n/c,/d\n/e\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.replacement_for("/c"), Some("/d"));
    }

    #[test]
    fn test_matching_is_exact() {
        let csv = "link_broken,link_new\n/old-page,/new-page\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.replacement_for("/old-page/"), None);
        assert_eq!(rules.replacement_for("/OLD-PAGE"), None);
        assert_eq!(rules.replacement_for("/old-page?x=1"), None);
    }

    #[test]
    fn test_chained_rules_keep_their_own_targets() {
        let csv = "link_broken,link_new\n/a,/b\n/b,/c\n/c,/d\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.replacement_for("/a"), Some("/b"));
        assert_eq!(rules.replacement_for("/b"), Some("/c"));
        assert_eq!(rules.replacement_for("/c"), Some("/d"));
    }

    #[test]
    fn test_swapped_links_are_kept_and_self_rules_dropped() {
        let csv = "link_broken,link_new\n/self,/self\n/a,/b\n/b,/a\n/x,/y\n";
        let rules = read_rules(csv.as_bytes()).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.replacement_for("/self"), None);
        assert_eq!(rules.replacement_for("/a"), Some("/b"));
        assert_eq!(rules.replacement_for("/b"), Some("/a"));
        assert_eq!(rules.replacement_for("/x"), Some("/y"));
    }

    #[test]
    fn test_missing_column() {
        let csv = "link_broken,replacement\n/a,/b\n";
        let err = read_rules(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FixError::MissingColumn("link_new")));
    }

    #[test]
    fn test_load_rules_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules(&dir.path().join("links.csv")).unwrap_err();
        assert!(matches!(err, FixError::InputNotFound(_)));
    }

    #[test]
    fn test_load_rules_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "link_broken,link_new").unwrap();
        writeln!(file, "/old-page,/new-page").unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.replacement_for("/old-page"), Some("/new-page"));
    }
}
