//! Load report types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sni_content::Record;

/// Why a Markdown file produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SkipReason {
    /// The file has no front matter block, or the block is empty.
    NoFrontMatter,
    /// The front matter failed schema validation.
    ValidationFailed {
        /// One message per violation.
        errors: Vec<String>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFrontMatter => f.write_str("no front matter"),
            Self::ValidationFailed { errors } => {
                write!(f, "validation failed: {}", errors.join("; "))
            }
        }
    }
}

/// A Markdown file omitted from the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Path of the skipped file.
    pub file: PathBuf,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl SkippedFile {
    /// Format for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: {}", self.file.display(), self.reason)
    }
}

/// Result of a load run.
///
/// `records` holds one entry per loaded file, in filename order: the
/// validated fields plus `slug` and `content`.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct LoadReport {
    /// Number of Markdown files read.
    pub scanned_files: usize,
    /// Records built from files that passed validation.
    pub records: Vec<Record>,
    /// Files that were read but produced no record.
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    /// Number of records loaded.
    #[must_use]
    pub fn records_count(&self) -> usize {
        self.records.len()
    }

    /// Whether every scanned file produced a record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
