//! Front matter extraction for Markdown documents.
//!
//! A document may start with a YAML block fenced by two lines that contain
//! exactly `---`:
//!
//! ```text
//! ---
//! title: The Bitcoin Whitepaper
//! date: 2008-10-31
//! ---
//! Body text, passed through untouched.
//! ```
//!
//! Only the first block is extracted. Any later `---` lines belong to the body.

use std::io::Read;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Line that opens and closes a front matter block.
pub const DELIMITER: &str = "---";

/// Maximum document size read by [`read`] (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;

/// Untyped front matter: string keys, arbitrary YAML values.
pub type FrontMatter = Map<String, Value>;

/// Errors from reading and decoding documents.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// The file could not be opened or read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file exceeded the configured maximum size.
    #[error("{} exceeds maximum size of {max_file_size} bytes", path.display())]
    FileTooLarge {
        /// The oversized file.
        path: PathBuf,
        /// The limit that was exceeded.
        max_file_size: u64,
    },

    /// The file content is not valid UTF-8.
    #[error("{} is not valid UTF-8", path.display())]
    InvalidEncoding {
        /// The offending file.
        path: PathBuf,
    },

    /// The front matter block is not valid YAML.
    #[error("YAML parse error in front matter: {message}")]
    Yaml {
        /// Parser error message.
        message: String,
    },

    /// The front matter block parsed, but its root is not a mapping.
    #[error("Front matter must be a mapping, found {found}")]
    NotAMapping {
        /// JSON type name of the root value.
        found: &'static str,
    },
}

/// A document split into its raw front matter block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    /// Raw text between the first two delimiter lines, if there are two.
    pub front_matter: Option<&'a str>,
    /// Body text: trimmed remainder after the block, or the whole document.
    pub body: &'a str,
}

/// A document with decoded front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Decoded front matter; `None` when the document has no block or the
    /// block is empty.
    pub front_matter: Option<FrontMatter>,
    /// Body text.
    pub body: String,
}

/// Read a document as UTF-8, bounded by [`DEFAULT_MAX_FILE_SIZE`].
///
/// # Errors
/// Returns [`FrontMatterError`] if the file is missing, unreadable, too large
/// or not UTF-8.
pub fn read(path: &Path) -> Result<String, FrontMatterError> {
    read_bounded(path, DEFAULT_MAX_FILE_SIZE)
}

/// Read a document as UTF-8, refusing files larger than `max_file_size`.
///
/// Reads at most `max_file_size + 1` bytes through `Read::take`, so the size
/// check and the read are the same operation.
///
/// # Errors
/// Returns [`FrontMatterError`] if the file is missing, unreadable, too large
/// or not UTF-8.
pub fn read_bounded(path: &Path, max_file_size: u64) -> Result<String, FrontMatterError> {
    let io_err = |source| FrontMatterError::Io {
        path: path.to_owned(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(io_err)?;

    if buffer.len() as u64 > max_file_size {
        return Err(FrontMatterError::FileTooLarge {
            path: path.to_owned(),
            max_file_size,
        });
    }

    String::from_utf8(buffer).map_err(|_| FrontMatterError::InvalidEncoding {
        path: path.to_owned(),
    })
}

/// Byte ranges (including the line terminator) of every delimiter line.
fn delimiter_lines(content: &str) -> impl Iterator<Item = Range<usize>> {
    let mut offset = 0;
    content.split_inclusive('\n').filter_map(move |line| {
        let start = offset;
        offset += line.len();
        let text = line.strip_suffix('\n').unwrap_or(line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        (text == DELIMITER).then_some(start..offset)
    })
}

/// Split a document into raw front matter and body.
///
/// With fewer than two delimiter lines the whole content is returned as the
/// body, unchanged. Otherwise the text between the first two delimiters is
/// the front matter and everything after the second one, trimmed, is the
/// body. Text before the first delimiter is dropped.
#[must_use]
pub fn split(content: &str) -> SplitDocument<'_> {
    let mut delimiters = delimiter_lines(content);
    let (Some(open), Some(close)) = (delimiters.next(), delimiters.next()) else {
        return SplitDocument {
            front_matter: None,
            body: content,
        };
    };

    SplitDocument {
        front_matter: Some(&content[open.end..close.start]),
        body: content[close.end..].trim(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Decode a raw front matter block as a YAML mapping.
///
/// A blank block or an explicit `null` decodes to `None`.
///
/// # Errors
/// Returns [`FrontMatterError::Yaml`] on malformed YAML and
/// [`FrontMatterError::NotAMapping`] when the root is a scalar or sequence.
pub fn decode(raw: &str) -> Result<Option<FrontMatter>, FrontMatterError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_saphyr::from_str(raw).map_err(|e| FrontMatterError::Yaml {
        message: e.to_string(),
    })?;

    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(FrontMatterError::NotAMapping {
            found: json_type_name(&other),
        }),
    }
}

/// Split and decode a document.
///
/// # Errors
/// Returns [`FrontMatterError`] if the front matter block cannot be decoded.
pub fn parse(content: &str) -> Result<ParsedDocument, FrontMatterError> {
    let split = split(content);
    let front_matter = match split.front_matter {
        Some(raw) => decode(raw)?,
        None => None,
    };
    Ok(ParsedDocument {
        front_matter,
        body: split.body.to_owned(),
    })
}

/// Read, split and decode a document from disk.
///
/// # Errors
/// Returns [`FrontMatterError`] if the file cannot be read or its front
/// matter cannot be decoded.
pub fn parse_file(path: &Path) -> Result<ParsedDocument, FrontMatterError> {
    let content = read(path)?;
    tracing::trace!(path = %path.display(), bytes = content.len(), "read document");
    parse(&content)
}
