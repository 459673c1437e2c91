//! Error types for content import.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocumentNameError;
use crate::front_matter::FrontMatterError;
use crate::importer::ImportState;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Errors that abort an import run.
///
/// None of these are recovered from: the run stops and nothing staged is
/// committed.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The content directory could not be listed.
    #[error("Failed to list {}: {source}", path.display())]
    Walk {
        /// The directory being listed.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// A directory entry name is not valid UTF-8.
    #[error("Filename is not valid UTF-8: {}", path.display())]
    NonUtf8Filename {
        /// The offending entry.
        path: PathBuf,
    },

    /// A filename does not follow `<slug>.<locale>.<ext>`.
    #[error(transparent)]
    Filename(#[from] DocumentNameError),

    /// A document could not be read or its front matter could not be decoded.
    #[error("{}: {source}", path.display())]
    FrontMatter {
        /// The document.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: FrontMatterError,
    },

    /// A document has no front matter block.
    #[error("{}: no front matter found", path.display())]
    MissingFrontMatter {
        /// The document.
        path: PathBuf,
    },

    /// Front matter failed schema validation.
    #[error("{}: {source}", path.display())]
    Schema {
        /// The document.
        path: PathBuf,
        /// Underlying validation error.
        #[source]
        source: SchemaError,
    },

    /// A translation was processed before (or without) its canonical document.
    #[error("No canonical content staged for slug '{slug}' (translation '{locale}')")]
    MissingCanonical {
        /// Slug of the translation.
        slug: String,
        /// Locale of the translation.
        locale: String,
    },

    /// An import operation was called out of order.
    #[error("Cannot {operation} while import is {actual} (expected {expected})")]
    InvalidState {
        /// The operation attempted.
        operation: &'static str,
        /// State the operation requires.
        expected: ImportState,
        /// Current state.
        actual: ImportState,
    },

    /// Staging or committing rows failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing progress output failed.
    #[error("Failed to write progress output: {0}")]
    Output(#[source] std::io::Error),
}
