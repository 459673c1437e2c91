//! Content document filenames.
//!
//! Importable content files are named `<slug>.<locale>.<ext>`, for example
//! `bitcoin-and-me.en.md` or `bitcoin-and-me.es.md`. The slug is the stable
//! key shared by a canonical document and all of its translations.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Locale of canonical content. Every other locale is a translation.
pub const CANONICAL_LOCALE: &str = "en";

/// Separator between filename segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Errors from document filename decomposition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentNameError {
    /// The filename does not have the `<slug>.<locale>.<ext>` shape.
    #[error(
        "Invalid document filename '{filename}': expected <slug>.<locale>.<ext>, got {segments} segment(s)"
    )]
    TooFewSegments {
        /// The offending filename.
        filename: String,
        /// Number of dot-separated segments found.
        segments: usize,
    },

    /// A slug or locale segment is empty (e.g. `.en.md` or `post..md`).
    #[error("Invalid document filename '{filename}': segment #{num} is empty")]
    EmptySegment {
        /// The offending filename.
        filename: String,
        /// 1-based segment number.
        num: usize,
    },
}

/// A content filename decomposed into slug, locale and extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentName {
    /// The full filename, as found on disk.
    pub filename: String,
    /// First segment: the content key.
    pub slug: String,
    /// Second segment: the language tag.
    pub locale: String,
    /// Everything after the locale (usually `md`).
    pub extension: String,
}

impl DocumentName {
    /// Decompose a filename of the form `<slug>.<locale>.<ext>`.
    ///
    /// Extra segments after the locale are kept together as the extension,
    /// so `notes.de.draft.md` has extension `draft.md`.
    ///
    /// # Errors
    /// Returns [`DocumentNameError`] if the filename has fewer than three
    /// segments or an empty slug or locale.
    pub fn parse(filename: &str) -> Result<Self, DocumentNameError> {
        let mut parts = filename.splitn(3, SEGMENT_SEPARATOR);
        let (Some(slug), Some(locale), Some(extension)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DocumentNameError::TooFewSegments {
                filename: filename.to_owned(),
                segments: filename.split(SEGMENT_SEPARATOR).count(),
            });
        };

        for (i, segment) in [slug, locale].iter().enumerate() {
            if segment.is_empty() {
                return Err(DocumentNameError::EmptySegment {
                    filename: filename.to_owned(),
                    num: i + 1,
                });
            }
        }

        Ok(Self {
            filename: filename.to_owned(),
            slug: slug.to_owned(),
            locale: locale.to_owned(),
            extension: extension.to_owned(),
        })
    }

    /// Whether this document holds canonical (English) content.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.locale == CANONICAL_LOCALE
    }
}

impl FromStr for DocumentName {
    type Err = DocumentNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename)
    }
}

/// The slug of a simple `<slug>.<ext>` filename: everything before the first `.`.
///
/// A filename without any `.` is its own slug.
#[must_use]
pub fn slug_of(filename: &str) -> &str {
    filename
        .split_once(SEGMENT_SEPARATOR)
        .map_or(filename, |(slug, _)| slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_segments() {
        let name = DocumentName::parse("bitcoin-and-me.en.md").unwrap();
        assert_eq!(name.slug, "bitcoin-and-me");
        assert_eq!(name.locale, "en");
        assert_eq!(name.extension, "md");
        assert!(name.is_canonical());
        assert_eq!(name.to_string(), "bitcoin-and-me.en.md");
    }

    #[test]
    fn test_parse_translation() {
        let name: DocumentName = "bitcoin-and-me.pt-br.md".parse().unwrap();
        assert_eq!(name.locale, "pt-br");
        assert!(!name.is_canonical());
    }

    #[test]
    fn test_parse_extra_segments_join_extension() {
        let name = DocumentName::parse("notes.de.draft.md").unwrap();
        assert_eq!(name.slug, "notes");
        assert_eq!(name.locale, "de");
        assert_eq!(name.extension, "draft.md");
    }

    #[test]
    fn test_parse_two_segments_fails() {
        let err = DocumentName::parse("post.md").unwrap_err();
        assert_eq!(
            err,
            DocumentNameError::TooFewSegments {
                filename: "post.md".to_owned(),
                segments: 2,
            }
        );
        assert!(err.to_string().contains("<slug>.<locale>.<ext>"));
    }

    #[test]
    fn test_parse_no_separator_fails() {
        let err = DocumentName::parse("README").unwrap_err();
        assert!(matches!(
            err,
            DocumentNameError::TooFewSegments { segments: 1, .. }
        ));
    }

    #[test]
    fn test_parse_empty_slug_fails() {
        let err = DocumentName::parse(".en.md").unwrap_err();
        assert!(matches!(err, DocumentNameError::EmptySegment { num: 1, .. }));
    }

    #[test]
    fn test_parse_empty_locale_fails() {
        let err = DocumentName::parse("post..md").unwrap_err();
        assert!(matches!(err, DocumentNameError::EmptySegment { num: 2, .. }));
    }

    #[test]
    fn test_slug_of() {
        assert_eq!(slug_of("genesis.md"), "genesis");
        assert_eq!(slug_of("genesis.en.md"), "genesis");
        assert_eq!(slug_of("genesis"), "genesis");
    }
}
