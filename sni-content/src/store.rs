//! Persistence sessions.
//!
//! A [`Session`] stages rows for write and makes them visible in one
//! [`Session::commit`]. Row ids are assigned when a row is staged so that
//! later rows (translations) can reference earlier ones (canonical content)
//! before anything is committed. Staged rows have no effect outside the
//! session until commit.
//!
//! Two implementations are provided:
//! - [`MemorySession`]: in-memory tables, used for dry runs and tests.
//! - [`JsonStore`]: tables persisted as a single JSON document, written
//!   atomically on commit.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Column holding the row id in every table.
pub const ID_COLUMN: &str = "id";

/// A table row: column name -> value.
pub type Row = Map<String, Value>;

/// Tables by name, rows in insertion order.
pub type Tables = BTreeMap<String, Vec<Row>>;

/// Identifier of a row within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RowId> for Value {
    fn from(id: RowId) -> Self {
        Value::from(id.0)
    }
}

/// Errors from persistence sessions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The store file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not hold valid tables.
    #[error("{} is not a valid content store: {source}", path.display())]
    Corrupt {
        /// The store file.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The tables could not be serialized.
    #[error("Failed to serialize tables: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A unit of work against a relational store.
pub trait Session {
    /// Stage `row` for insertion into `table` and return its id.
    ///
    /// Any `id` column already present in `row` is overwritten.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the row cannot be staged.
    fn add(&mut self, table: &str, row: Row) -> Result<RowId, StoreError>;

    /// Write every staged row. Returns the number of rows written.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the write fails; staged rows are kept.
    fn commit(&mut self) -> Result<usize, StoreError>;

    /// Drop every staged row. Committed rows are untouched.
    fn rollback(&mut self);

    /// Number of rows staged and not yet committed.
    fn staged(&self) -> usize;
}

impl<S: Session + ?Sized> Session for &mut S {
    fn add(&mut self, table: &str, row: Row) -> Result<RowId, StoreError> {
        (**self).add(table, row)
    }

    fn commit(&mut self) -> Result<usize, StoreError> {
        (**self).commit()
    }

    fn rollback(&mut self) {
        (**self).rollback();
    }

    fn staged(&self) -> usize {
        (**self).staged()
    }
}

/// Rows waiting for commit, plus the next id per table.
#[derive(Debug, Default)]
struct Staging {
    rows: Vec<(String, Row)>,
    next_ids: BTreeMap<String, u64>,
}

impl Staging {
    fn stage(&mut self, committed: &Tables, table: &str, mut row: Row) -> RowId {
        let next = self
            .next_ids
            .entry(table.to_owned())
            .or_insert_with(|| max_id(committed.get(table)) + 1);
        let id = RowId(*next);
        *next += 1;

        row.insert(ID_COLUMN.to_owned(), id.into());
        self.rows.push((table.to_owned(), row));
        id
    }

    fn discard(&mut self) {
        *self = Self::default();
    }

    fn apply_to(&self, tables: &mut Tables) {
        for (table, row) in &self.rows {
            tables.entry(table.clone()).or_default().push(row.clone());
        }
    }
}

fn max_id(rows: Option<&Vec<Row>>) -> u64 {
    rows.into_iter()
        .flatten()
        .filter_map(|row| row.get(ID_COLUMN).and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
}

/// An in-memory session.
#[derive(Debug, Default)]
pub struct MemorySession {
    tables: Tables,
    staging: Staging,
}

impl MemorySession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed tables.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Committed rows of `table`, empty if the table does not exist.
    #[must_use]
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Session for MemorySession {
    fn add(&mut self, table: &str, row: Row) -> Result<RowId, StoreError> {
        Ok(self.staging.stage(&self.tables, table, row))
    }

    fn commit(&mut self) -> Result<usize, StoreError> {
        self.staging.apply_to(&mut self.tables);
        let written = self.staging.rows.len();
        self.staging.rows.clear();
        Ok(written)
    }

    fn rollback(&mut self) {
        self.staging.discard();
    }

    fn staged(&self) -> usize {
        self.staging.rows.len()
    }
}

/// A session over tables stored in a JSON file.
///
/// The file holds one object mapping table names to row arrays. Commit
/// writes the whole document to a sibling temporary file, syncs it, and
/// renames it over the original.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    tables: Tables,
    staging: Staging,
}

impl JsonStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            tables,
            staging: Staging::default(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Committed tables.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_atomically(&self, tables: &Tables) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tables).map_err(StoreError::Serialize)?;
        let temp_path = self.temp_path();
        let io_err = |source| StoreError::Io {
            path: temp_path.clone(),
            source,
        };

        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        std::fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Session for JsonStore {
    fn add(&mut self, table: &str, row: Row) -> Result<RowId, StoreError> {
        Ok(self.staging.stage(&self.tables, table, row))
    }

    fn commit(&mut self) -> Result<usize, StoreError> {
        let written = self.staging.rows.len();
        if written == 0 {
            return Ok(0);
        }

        let mut tables = self.tables.clone();
        self.staging.apply_to(&mut tables);
        self.write_atomically(&tables)?;

        self.tables = tables;
        self.staging.rows.clear();
        tracing::debug!(path = %self.path.display(), rows = written, "committed content store");
        Ok(written)
    }

    fn rollback(&mut self) {
        self.staging.discard();
    }

    fn staged(&self) -> usize {
        self.staging.rows.len()
    }
}
