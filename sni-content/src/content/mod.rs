//! Concrete content types.
//!
//! Each content type pairs a canonical schema (language-independent fields)
//! with a translation schema (fields that differ per locale) and decides how
//! validated documents become rows.

pub mod library;
pub mod mempool;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::error::ImportError;
use crate::importer::ContentVariant;
use crate::schema::{FrontMatterSchema, Schema, SchemaError};
use crate::store::{Row, RowId};

pub use library::{DocType, LibraryDoc, LibraryDocTranslation, LibraryImporter};
pub use mempool::{MempoolImporter, MempoolPost, MempoolPostTranslation};

/// Unknown content kind name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown content kind '{0}' (expected one of: mempool, library)")]
pub struct UnknownContentKind(pub String);

/// The content types that can be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Mempool blog posts.
    Mempool,
    /// Library documents.
    Library,
}

impl ContentKind {
    /// Every kind, in CLI order.
    pub const ALL: [Self; 2] = [Self::Mempool, Self::Library];

    /// Short name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mempool => "mempool",
            Self::Library => "library",
        }
    }

    /// Human-readable content type.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mempool => mempool::CONTENT_TYPE,
            Self::Library => library::CONTENT_TYPE,
        }
    }

    /// Build the import variant for this kind.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if a schema fails to compile.
    pub fn variant(self) -> Result<Box<dyn ContentVariant>, SchemaError> {
        Ok(match self {
            Self::Mempool => Box::new(MempoolImporter::new()?),
            Self::Library => Box::new(LibraryImporter::new()?),
        })
    }

    /// JSON Schema of the canonical front matter.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if the schema fails to compile.
    pub fn canonical_schema(self) -> Result<Value, SchemaError> {
        match self {
            Self::Mempool => json_schema::<MempoolPost>(),
            Self::Library => json_schema::<LibraryDoc>(),
        }
    }

    /// JSON Schema of the translation front matter.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if the schema fails to compile.
    pub fn translation_schema(self) -> Result<Value, SchemaError> {
        match self {
            Self::Mempool => json_schema::<MempoolPostTranslation>(),
            Self::Library => json_schema::<LibraryDocTranslation>(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownContentKind(s.to_owned()))
    }
}

fn json_schema<T: FrontMatterSchema>() -> Result<Value, SchemaError> {
    Ok(Schema::<T>::new()?.json_schema().clone())
}

/// Flatten a validated value into a row, attributing failures to `path`.
fn record<T: FrontMatterSchema>(
    schema: &Schema<T>,
    path: &Path,
    value: &T,
) -> Result<Row, ImportError> {
    schema.to_record(value).map_err(|source| ImportError::Schema {
        path: path.to_owned(),
        source,
    })
}

/// Complete a translation row: link it to its canonical row, tag the locale,
/// attach the body, and fall back to the canonical slug when the translation
/// does not set its own.
fn translation_row(
    mut row: Row,
    foreign_key: &str,
    canonical_id: RowId,
    slug: &str,
    locale: &str,
    content: String,
) -> Row {
    if row.get("slug").is_none_or(Value::is_null) {
        row.insert("slug".to_owned(), Value::from(slug));
    }
    row.insert(foreign_key.to_owned(), canonical_id.into());
    row.insert("locale".to_owned(), Value::from(locale));
    row.insert("content".to_owned(), Value::from(content));
    row
}
