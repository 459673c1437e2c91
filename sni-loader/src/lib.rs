//! # sni-loader
//!
//! Loads a directory of Markdown files into records validated against a
//! front matter schema.
//!
//! Every `*.md` file directly inside the directory is read in filename order.
//! Files whose front matter validates become records holding the validated
//! fields, the `slug` (file name up to the first `.`) and the body as
//! `content`. The file name and body win over validated fields of the same
//! name. Files without front matter, or whose front matter is not a mapping
//! or fails validation, are skipped and listed in [`LoadReport::skipped`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sni_content::{Schema, content::MempoolPost};
//! use sni_loader::{LoaderConfig, load_all};
//!
//! let schema = Schema::<MempoolPost>::new().unwrap();
//! let report = load_all(Path::new("content/mempool"), &schema, &LoaderConfig::default()).unwrap();
//! println!("Records loaded: {}", report.records_count());
//! println!("Files skipped: {}", report.skipped.len());
//! ```

mod config;
pub mod output;
mod report;

pub use config::LoaderConfig;
pub use report::{LoadReport, SkipReason, SkippedFile};

use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::Pattern;
use serde_json::Value;
use sni_content::{FrontMatterError, FrontMatterSchema, Record, Schema, front_matter, slug_of};
use walkdir::WalkDir;

/// Check if a path matches any of the exclude patterns
fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

fn compile_excludes(exclude: &[String]) -> anyhow::Result<Vec<Pattern>> {
    exclude
        .iter()
        .map(|pat_str| {
            Pattern::new(pat_str)
                .with_context(|| format!("Invalid exclude glob pattern '{pat_str}'"))
        })
        .collect()
}

/// List the Markdown files directly inside `directory`, in filename order.
fn find_markdown_files(directory: &Path, exclude: &[Pattern]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .with_context(|| format!("Failed to list directory: {}", directory.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".md"));
        if !is_markdown || matches_exclude(entry.path(), exclude) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Load every Markdown file in `directory` that validates against `schema`.
///
/// # Errors
///
/// Returns an error if `directory` does not exist or is not a directory, an
/// exclude pattern is invalid, a file cannot be read, or a front matter block
/// is not valid YAML. Files that lack front matter, hold a non-mapping block
/// or fail validation are skipped, not reported as errors.
pub fn load_all<T: FrontMatterSchema>(
    directory: &Path,
    schema: &Schema<T>,
    config: &LoaderConfig,
) -> anyhow::Result<LoadReport> {
    if !directory.exists() {
        anyhow::bail!("Path does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        anyhow::bail!("Path is not a directory: {}", directory.display());
    }

    let exclude = compile_excludes(&config.exclude)?;
    let files = find_markdown_files(directory, &exclude)?;

    let mut report = LoadReport {
        scanned_files: 0,
        records: Vec::new(),
        skipped: Vec::new(),
    };

    for path in files {
        let content = front_matter::read_bounded(&path, config.max_file_size)?;
        report.scanned_files += 1;
        let _span = tracing::debug_span!("load_file", file = %path.display()).entered();

        let parsed = match front_matter::parse(&content) {
            Ok(parsed) => parsed,
            Err(e @ FrontMatterError::NotAMapping { .. }) => {
                tracing::warn!("Validation error: {e}");
                report.skipped.push(SkippedFile {
                    file: path,
                    reason: SkipReason::ValidationFailed {
                        errors: vec![e.to_string()],
                    },
                });
                continue;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to parse front matter: {}", path.display())));
            }
        };

        let Some(front_matter) = parsed.front_matter.filter(|fm| !fm.is_empty()) else {
            tracing::debug!("skipping file without front matter");
            report.skipped.push(SkippedFile {
                file: path,
                reason: SkipReason::NoFrontMatter,
            });
            continue;
        };

        match schema.validate_record(&front_matter) {
            Ok(mut record) => {
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                set_loader_field(&mut record, "slug", Value::from(slug_of(&filename)));
                set_loader_field(&mut record, "content", Value::from(parsed.body));
                tracing::debug!("loaded record");
                report.records.push(record);
            }
            Err(errors) => report.skipped.push(SkippedFile {
                file: path,
                reason: SkipReason::ValidationFailed { errors },
            }),
        }
    }

    tracing::info!(
        directory = %directory.display(),
        scanned = report.scanned_files,
        records = report.records.len(),
        skipped = report.skipped.len(),
        "loaded markdown files"
    );
    Ok(report)
}

/// Set a field the loader owns, warning when it replaces a validated value.
fn set_loader_field(record: &mut Record, field: &str, value: Value) {
    let replaced = record.insert(field.to_owned(), value);
    if replaced.is_some_and(|old| !old.is_null()) {
        tracing::warn!(field, "validated field replaced by the loader value");
    }
}
