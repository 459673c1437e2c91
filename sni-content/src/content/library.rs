//! Library documents.
//!
//! Authors and categories are stored in join tables so a document can be
//! listed under each of them.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{record, translation_row};
use crate::document::CANONICAL_LOCALE;
use crate::error::ImportError;
use crate::importer::{
    ContentMap, ContentVariant, process_canonical_file, process_translated_file,
};
use crate::schema::{Schema, SchemaError};
use crate::store::{Row, RowId, Session};

/// Content type announced by the importer.
pub const CONTENT_TYPE: &str = "library docs";

/// Canonical rows.
pub const DOC_TABLE: &str = "library_doc";

/// Translation rows, one per (doc, locale).
pub const TRANSLATION_TABLE: &str = "library_doc_translation";

/// Author links, one per (doc, author).
pub const AUTHOR_TABLE: &str = "library_doc_author";

/// Category links, one per (doc, category).
pub const CATEGORY_TABLE: &str = "library_doc_category";

/// Column linking translations and join rows to their doc.
pub const DOC_FOREIGN_KEY: &str = "library_doc_id";

/// Kind of library document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Magazine, journal or blog article.
    Article,
    /// Book or book chapter.
    Book,
    /// Email or mailing list post.
    Email,
    /// Essay.
    Essay,
    /// Academic or technical paper.
    Paper,
    /// Transcribed talk.
    Speech,
}

/// Language-independent document fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LibraryDoc {
    /// Author slugs, in byline order.
    #[schemars(length(min = 1))]
    pub authors: Vec<String>,
    /// Publication date as printed (may be partial, e.g. `1998` or `October 1998`).
    #[serde(default)]
    pub date: Option<String>,
    /// Kind of document.
    #[serde(default)]
    pub doc_type: Option<DocType>,
    /// Link to the original publication.
    #[serde(default)]
    pub external: Option<String>,
    /// Category slugs.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Per-locale document fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LibraryDocTranslation {
    /// Localized title.
    pub title: String,
    /// Localized subtitle.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Title for listings when it differs from `title`.
    #[serde(default)]
    pub display_title: Option<String>,
    /// Localized slug; defaults to the canonical slug.
    #[serde(default)]
    pub slug: Option<String>,
}

/// Imports library documents into [`DOC_TABLE`], its join tables and
/// [`TRANSLATION_TABLE`].
#[derive(Debug)]
pub struct LibraryImporter {
    doc: Schema<LibraryDoc>,
    translation: Schema<LibraryDocTranslation>,
    content_map: ContentMap,
}

impl LibraryImporter {
    /// Compile the document schemas.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if a schema fails to compile.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            doc: Schema::new()?,
            translation: Schema::new()?,
            content_map: ContentMap::new(),
        })
    }

    /// Documents staged so far.
    #[must_use]
    pub fn content_map(&self) -> &ContentMap {
        &self.content_map
    }
}

fn link_row(doc_id: RowId, column: &str, value: &str) -> Row {
    let mut row = Row::new();
    row.insert(DOC_FOREIGN_KEY.to_owned(), doc_id.into());
    row.insert(column.to_owned(), Value::from(value));
    row
}

impl ContentVariant for LibraryImporter {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn process_and_add_canonical_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
    ) -> Result<(), ImportError> {
        let document = process_canonical_file(path, &self.doc, &self.translation)?;

        let mut doc = record(&self.doc, path, &document.canonical)?;
        doc.remove("authors");
        doc.remove("categories");
        doc.insert("slug".to_owned(), Value::from(slug));
        let doc_id = session.add(DOC_TABLE, doc)?;
        self.content_map.insert(slug, doc_id);

        for (position, author) in document.canonical.authors.iter().enumerate() {
            let mut row = link_row(doc_id, "author", author);
            row.insert("position".to_owned(), Value::from(position));
            session.add(AUTHOR_TABLE, row)?;
        }
        for category in &document.canonical.categories {
            session.add(CATEGORY_TABLE, link_row(doc_id, "category", category))?;
        }

        let translation = record(&self.translation, path, &document.translation)?;
        session.add(
            TRANSLATION_TABLE,
            translation_row(
                translation,
                DOC_FOREIGN_KEY,
                doc_id,
                slug,
                CANONICAL_LOCALE,
                document.content,
            ),
        )?;
        Ok(())
    }

    fn process_and_add_translated_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
        locale: &str,
    ) -> Result<(), ImportError> {
        let doc_id = self.content_map.canonical_id(slug, locale)?;
        let document = process_translated_file(path, &self.translation)?;

        let translation = record(&self.translation, path, &document.translation)?;
        session.add(
            TRANSLATION_TABLE,
            translation_row(
                translation,
                DOC_FOREIGN_KEY,
                doc_id,
                slug,
                locale,
                document.content,
            ),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySession;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_file_stages_join_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("crypto-anarchist-manifesto.en.md");
        fs::write(
            &path,
            "---\n\
title: The Crypto Anarchist Manifesto\n\
authors: [timothy-may]\n\
date: 1988\n\
doc_type: essay\n\
categories: [cypherpunks, privacy]\n\
---\n\
A specter is haunting the modern world.\n",
        )
        .unwrap();

        let mut importer = LibraryImporter::new().unwrap();
        let mut session = MemorySession::new();
        importer
            .process_and_add_canonical_file(&mut session, &path, "crypto-anarchist-manifesto")
            .unwrap();
        session.commit().unwrap();

        let doc = &session.rows(DOC_TABLE)[0];
        assert_eq!(doc["slug"], json!("crypto-anarchist-manifesto"));
        assert_eq!(doc["doc_type"], json!("essay"));
        assert_eq!(doc["date"], json!("1988"));
        assert!(doc.get("authors").is_none());

        let authors = session.rows(AUTHOR_TABLE);
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0]["author"], json!("timothy-may"));
        assert_eq!(authors[0]["position"], json!(0));
        assert_eq!(authors[0][DOC_FOREIGN_KEY], doc["id"]);

        let categories: Vec<&Value> = session
            .rows(CATEGORY_TABLE)
            .iter()
            .map(|row| &row["category"])
            .collect();
        assert_eq!(categories, [&json!("cypherpunks"), &json!("privacy")]);

        let translation = &session.rows(TRANSLATION_TABLE)[0];
        assert_eq!(translation["title"], json!("The Crypto Anarchist Manifesto"));
        assert_eq!(translation["locale"], json!("en"));
    }

    #[test]
    fn test_unknown_doc_type_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tweet.en.md");
        fs::write(
            &path,
            "---\ntitle: Running bitcoin\nauthors: [hal-finney]\ndoc_type: tweet\n---\n",
        )
        .unwrap();

        let mut importer = LibraryImporter::new().unwrap();
        let mut session = MemorySession::new();
        let err = importer
            .process_and_add_canonical_file(&mut session, &path, "tweet")
            .unwrap_err();
        assert!(matches!(err, ImportError::Schema { .. }), "got {err:?}");
        assert_eq!(session.staged(), 0);
    }

    #[test]
    fn test_translation_with_localized_slug() {
        let tmp = TempDir::new().unwrap();
        let canonical = tmp.path().join("manifesto.en.md");
        let translated = tmp.path().join("manifesto.es.md");
        fs::write(&canonical, "---\ntitle: Manifesto\nauthors: [timothy-may]\n---\nEN\n").unwrap();
        fs::write(&translated, "---\ntitle: Manifiesto\nslug: manifiesto\n---\nES\n").unwrap();

        let mut importer = LibraryImporter::new().unwrap();
        let mut session = MemorySession::new();
        importer
            .process_and_add_canonical_file(&mut session, &canonical, "manifesto")
            .unwrap();
        importer
            .process_and_add_translated_file(&mut session, &translated, "manifesto", "es")
            .unwrap();
        session.commit().unwrap();

        let translations = session.rows(TRANSLATION_TABLE);
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[1]["slug"], json!("manifiesto"));
        assert_eq!(translations[1]["locale"], json!("es"));
        assert_eq!(translations[1]["content"], json!("ES"));
        assert_eq!(translations[1][DOC_FOREIGN_KEY], translations[0][DOC_FOREIGN_KEY]);
    }

    #[test]
    fn test_numeric_title_is_a_string() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nineteen-eighty-four.en.md");
        fs::write(&path, "---\ntitle: 1984\nauthors: [george-orwell]\n---\n").unwrap();

        let mut importer = LibraryImporter::new().unwrap();
        let mut session = MemorySession::new();
        importer
            .process_and_add_canonical_file(&mut session, &path, "nineteen-eighty-four")
            .unwrap();
        session.commit().unwrap();

        assert_eq!(session.rows(TRANSLATION_TABLE)[0]["title"], json!("1984"));
    }
}
