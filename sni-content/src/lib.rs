//! # sni-content
//!
//! Front matter Markdown parsing, schema validation and content import.
//!
//! Content lives in flat directories of Markdown files named
//! `<slug>.<locale>.md`. Each file opens with a YAML front matter block:
//!
//! ```text
//! ---
//! title: Bitcoin and Me
//! date: 2009-01-09
//! authors: [hal-finney]
//! ---
//! Body text.
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sni_content::{ContentImporter, ContentKind, JsonStore};
//!
//! let variant = ContentKind::Mempool.variant().unwrap();
//! let store = JsonStore::open("content.json").unwrap();
//! let mut importer = ContentImporter::new("content/mempool", variant, store);
//! let summary = importer.run_import(&mut std::io::stdout()).unwrap();
//! println!("Committed {} rows", summary.committed_rows);
//! ```

pub mod content;
pub mod document;
pub mod error;
pub mod front_matter;
pub mod importer;
pub mod schema;
pub mod store;


// Re-export commonly used types
pub use content::{ContentKind, LibraryImporter, MempoolImporter, UnknownContentKind};
pub use document::{CANONICAL_LOCALE, DocumentName, DocumentNameError, slug_of};
pub use error::ImportError;
pub use front_matter::{FrontMatter, FrontMatterError, ParsedDocument};
pub use importer::{ContentImporter, ContentMap, ContentVariant, ImportState, ImportSummary};
pub use schema::{FrontMatterSchema, Record, Schema, SchemaError};
pub use store::{JsonStore, MemorySession, Row, RowId, Session, StoreError};
