//! Canonical and translated content import.
//!
//! A content directory holds one file per (slug, locale) pair:
//!
//! ```text
//! content/mempool/
//!   bitcoin-and-me.en.md     <- canonical
//!   bitcoin-and-me.es.md     <- translation of the same slug
//!   running-bitcoin.en.md
//! ```
//!
//! [`ContentImporter`] lists the directory, processes every canonical file
//! before any translation (translations reference the canonical row staged
//! for their slug), then commits the session once. The per-file work is
//! supplied by a [`ContentVariant`].
//!
//! The run is a strict state machine:
//!
//! ```text
//! Created -> FilesIdentified -> CanonicalProcessed -> TranslatedProcessed -> Committed
//! ```
//!
//! Any failure moves the importer to `Aborted` and rolls back the session,
//! so rows staged by the failed run cannot reach a later commit.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::document::DocumentName;
use crate::error::ImportError;
use crate::front_matter::{self, FrontMatter};
use crate::schema::{FrontMatterSchema, Schema};
use crate::store::{RowId, Session};

/// Completion marker printed by [`ContentImporter::run_import`].
pub const DONE: &str = "Done";

/// Lifecycle of a [`ContentImporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportState {
    /// Nothing done yet.
    Created,
    /// Directory listed and files classified.
    FilesIdentified,
    /// Every canonical file staged.
    CanonicalProcessed,
    /// Every translated file staged.
    TranslatedProcessed,
    /// Session committed. Terminal.
    Committed,
    /// A step failed. Terminal; staged rows were dropped.
    Aborted,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::FilesIdentified => "files identified",
            Self::CanonicalProcessed => "canonical processed",
            Self::TranslatedProcessed => "translated processed",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        })
    }
}

/// Per-content-type processing hooks.
///
/// Implementations parse a file, validate its front matter and stage rows in
/// the session. They are called in slug order, canonical files first.
pub trait ContentVariant {
    /// Human-readable name, e.g. `"mempool posts"`.
    fn content_type(&self) -> &'static str;

    /// Stage the canonical row and its English translation for `slug`.
    ///
    /// # Errors
    /// Returns [`ImportError`] if the file cannot be parsed or validated, or
    /// staging fails.
    fn process_and_add_canonical_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
    ) -> Result<(), ImportError>;

    /// Stage the `locale` translation of `slug`.
    ///
    /// # Errors
    /// Returns [`ImportError`] if the file cannot be parsed or validated, no
    /// canonical row was staged for `slug`, or staging fails.
    fn process_and_add_translated_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
        locale: &str,
    ) -> Result<(), ImportError>;
}

impl<V: ContentVariant + ?Sized> ContentVariant for Box<V> {
    fn content_type(&self) -> &'static str {
        (**self).content_type()
    }

    fn process_and_add_canonical_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
    ) -> Result<(), ImportError> {
        (**self).process_and_add_canonical_file(session, path, slug)
    }

    fn process_and_add_translated_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
        locale: &str,
    ) -> Result<(), ImportError> {
        (**self).process_and_add_translated_file(session, path, slug, locale)
    }
}

/// Slug -> canonical row id, filled while canonical files are staged.
#[derive(Debug, Default)]
pub struct ContentMap {
    ids: HashMap<String, RowId>,
}

impl ContentMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the canonical row staged for `slug`.
    pub fn insert(&mut self, slug: &str, id: RowId) {
        self.ids.insert(slug.to_owned(), id);
    }

    /// The canonical row for `slug`, if staged.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<RowId> {
        self.ids.get(slug).copied()
    }

    /// The canonical row a `locale` translation of `slug` must reference.
    ///
    /// # Errors
    /// Returns [`ImportError::MissingCanonical`] if no canonical row was staged.
    pub fn canonical_id(&self, slug: &str, locale: &str) -> Result<RowId, ImportError> {
        self.get(slug).ok_or_else(|| ImportError::MissingCanonical {
            slug: slug.to_owned(),
            locale: locale.to_owned(),
        })
    }

    /// Number of staged canonical rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no canonical row was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A canonical file validated against both of its schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument<C, T> {
    /// Language-independent fields.
    pub canonical: C,
    /// English translation fields, from the same front matter.
    pub translation: T,
    /// Markdown body.
    pub content: String,
}

/// A translated file validated against its translation schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDocument<T> {
    /// Translation fields.
    pub translation: T,
    /// Markdown body.
    pub content: String,
}

fn process_common(path: &Path) -> Result<(FrontMatter, String), ImportError> {
    let parsed = front_matter::parse_file(path).map_err(|source| ImportError::FrontMatter {
        path: path.to_owned(),
        source,
    })?;
    let front_matter = parsed
        .front_matter
        .ok_or_else(|| ImportError::MissingFrontMatter {
            path: path.to_owned(),
        })?;
    Ok((front_matter, parsed.body))
}

fn validate_data<T: FrontMatterSchema>(
    path: &Path,
    front_matter: &FrontMatter,
    schema: &Schema<T>,
) -> Result<T, ImportError> {
    schema
        .validate_front_matter_data(front_matter)
        .map_err(|source| ImportError::Schema {
            path: path.to_owned(),
            source,
        })
}

/// Parse a canonical file and validate it against both schemas.
///
/// # Errors
/// Returns [`ImportError`] if the file cannot be read, has no front matter,
/// or fails either schema.
pub fn process_canonical_file<C: FrontMatterSchema, T: FrontMatterSchema>(
    path: &Path,
    canonical: &Schema<C>,
    translation: &Schema<T>,
) -> Result<CanonicalDocument<C, T>, ImportError> {
    let (front_matter, content) = process_common(path)?;
    Ok(CanonicalDocument {
        canonical: validate_data(path, &front_matter, canonical)?,
        translation: validate_data(path, &front_matter, translation)?,
        content,
    })
}

/// Parse a translated file and validate it against the translation schema.
///
/// # Errors
/// Returns [`ImportError`] if the file cannot be read, has no front matter,
/// or fails the schema.
pub fn process_translated_file<T: FrontMatterSchema>(
    path: &Path,
    translation: &Schema<T>,
) -> Result<TranslatedDocument<T>, ImportError> {
    let (front_matter, content) = process_common(path)?;
    Ok(TranslatedDocument {
        translation: validate_data(path, &front_matter, translation)?,
        content,
    })
}

/// List a content directory in filename order and decompose every name.
fn list_documents(directory: &Path) -> Result<Vec<DocumentName>, ImportError> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ImportError::Walk {
            path: directory.to_owned(),
            source,
        })?;
        let Some(filename) = entry.file_name().to_str() else {
            return Err(ImportError::NonUtf8Filename {
                path: entry.path().to_owned(),
            });
        };
        documents.push(DocumentName::parse(filename)?);
    }
    Ok(documents)
}

/// Outcome of a committed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// The variant's content type.
    pub content_type: &'static str,
    /// Canonical files processed.
    pub canonical_files: usize,
    /// Translated files processed.
    pub translated_files: usize,
    /// Rows written by the commit.
    pub committed_rows: usize,
}

/// Drives one import of a content directory into a session.
pub struct ContentImporter<V, S> {
    directory: PathBuf,
    variant: V,
    session: S,
    state: ImportState,
    canonical_files: Vec<DocumentName>,
    translated_files: Vec<DocumentName>,
}

impl<V: ContentVariant, S: Session> ContentImporter<V, S> {
    /// Create an importer for `directory` writing through `session`.
    pub fn new(directory: impl Into<PathBuf>, variant: V, session: S) -> Self {
        Self {
            directory: directory.into(),
            variant,
            session,
            state: ImportState::Created,
            canonical_files: Vec::new(),
            translated_files: Vec::new(),
        }
    }

    /// The content directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The variant's content type.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.variant.content_type()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ImportState {
        self.state
    }

    /// Canonical files in processing order (after [`Self::identify_files`]).
    #[must_use]
    pub fn canonical_files(&self) -> &[DocumentName] {
        &self.canonical_files
    }

    /// Translated files in processing order (after [`Self::identify_files`]).
    #[must_use]
    pub fn translated_files(&self) -> &[DocumentName] {
        &self.translated_files
    }

    /// The injected session.
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Give back the injected session.
    pub fn into_session(self) -> S {
        self.session
    }

    fn begin(&self, operation: &'static str, expected: ImportState) -> Result<(), ImportError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidState {
                operation,
                expected,
                actual: self.state,
            })
        }
    }

    fn finish<T>(
        &mut self,
        result: Result<T, ImportError>,
        next: ImportState,
    ) -> Result<T, ImportError> {
        if result.is_ok() {
            self.state = next;
        } else {
            self.state = ImportState::Aborted;
            self.session.rollback();
            tracing::debug!(
                directory = %self.directory.display(),
                "import aborted, staged rows dropped"
            );
        }
        result
    }

    /// List the directory and split files into canonical and translated.
    ///
    /// # Errors
    /// Returns [`ImportError`] if the directory cannot be listed, any entry
    /// is not named `<slug>.<locale>.<ext>`, or the importer is not `Created`.
    pub fn identify_files(&mut self) -> Result<(), ImportError> {
        self.begin("identify files", ImportState::Created)?;
        let result = list_documents(&self.directory);
        let documents = self.finish(result, ImportState::FilesIdentified)?;

        (self.canonical_files, self.translated_files) =
            documents.into_iter().partition(DocumentName::is_canonical);
        tracing::debug!(
            directory = %self.directory.display(),
            canonical = self.canonical_files.len(),
            translated = self.translated_files.len(),
            "identified content files"
        );
        Ok(())
    }

    fn process_canonical(&mut self) -> Result<usize, ImportError> {
        for document in &self.canonical_files {
            let path = self.directory.join(&document.filename);
            tracing::debug!(file = %document, "processing canonical file");
            self.variant
                .process_and_add_canonical_file(&mut self.session, &path, &document.slug)?;
        }
        Ok(self.canonical_files.len())
    }

    fn process_translated(&mut self) -> Result<usize, ImportError> {
        for document in &self.translated_files {
            let path = self.directory.join(&document.filename);
            tracing::debug!(file = %document, "processing translated file");
            self.variant.process_and_add_translated_file(
                &mut self.session,
                &path,
                &document.slug,
                &document.locale,
            )?;
        }
        Ok(self.translated_files.len())
    }

    /// Stage every canonical file, in filename order.
    ///
    /// # Errors
    /// Returns the first [`ImportError`] from the variant, or
    /// [`ImportError::InvalidState`] unless files were just identified.
    pub fn process_canonical_files(&mut self) -> Result<usize, ImportError> {
        self.begin("process canonical files", ImportState::FilesIdentified)?;
        let result = self.process_canonical();
        self.finish(result, ImportState::CanonicalProcessed)
    }

    /// Stage every translated file, in filename order.
    ///
    /// # Errors
    /// Returns the first [`ImportError`] from the variant, or
    /// [`ImportError::InvalidState`] unless canonical files were just processed.
    pub fn process_translated_files(&mut self) -> Result<usize, ImportError> {
        self.begin("process translated files", ImportState::CanonicalProcessed)?;
        let result = self.process_translated();
        self.finish(result, ImportState::TranslatedProcessed)
    }

    /// Commit everything staged during this run.
    ///
    /// # Errors
    /// Returns [`ImportError::Store`] if the commit fails, or
    /// [`ImportError::InvalidState`] unless translations were just processed.
    pub fn commit(&mut self) -> Result<usize, ImportError> {
        self.begin("commit", ImportState::TranslatedProcessed)?;
        let result = self.session.commit().map_err(ImportError::from);
        self.finish(result, ImportState::Committed)
    }

    /// Run every step: identify, canonical, translated, commit.
    ///
    /// # Errors
    /// Returns the first [`ImportError`]; nothing is committed in that case.
    pub fn import_content(&mut self) -> Result<ImportSummary, ImportError> {
        self.identify_files()?;
        let canonical_files = self.process_canonical_files()?;
        let translated_files = self.process_translated_files()?;
        let committed_rows = self.commit()?;

        let summary = ImportSummary {
            content_type: self.content_type(),
            canonical_files,
            translated_files,
            committed_rows,
        };
        tracing::info!(
            content_type = summary.content_type,
            canonical = summary.canonical_files,
            translated = summary.translated_files,
            rows = summary.committed_rows,
            "import committed"
        );
        Ok(summary)
    }

    /// [`Self::import_content`], announcing start and completion on `out`.
    ///
    /// # Errors
    /// Returns [`ImportError`] if the import fails or `out` cannot be written.
    pub fn run_import(&mut self, out: &mut dyn Write) -> Result<ImportSummary, ImportError> {
        write!(out, "Importing {}...", self.content_type()).map_err(ImportError::Output)?;
        out.flush().map_err(ImportError::Output)?;
        let summary = self.import_content()?;
        writeln!(out, "{DONE}").map_err(ImportError::Output)?;
        Ok(summary)
    }
}
