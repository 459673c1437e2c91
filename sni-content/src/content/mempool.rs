//! Mempool blog posts.
//!
//! ```text
//! ---
//! title: Bitcoin and Me
//! date: 2009-01-09
//! authors:
//!   - hal-finney
//! series: early-days
//! series_index: 1
//! excerpt: Hal Finney on the first days of Bitcoin.
//! ---
//! ```

use std::path::Path;

use chrono::NaiveDate;
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
use crate::store::Session;

/// Content type announced by the importer.
pub const CONTENT_TYPE: &str = "mempool posts";

/// Canonical rows.
pub const POST_TABLE: &str = "mempool_post";

/// Translation rows, one per (post, locale).
pub const TRANSLATION_TABLE: &str = "mempool_post_translation";

/// Column linking a translation to its post.
pub const POST_FOREIGN_KEY: &str = "mempool_post_id";

/// Language-independent post fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MempoolPost {
    /// Original publication date.
    pub date: NaiveDate,
    /// Date the post was added to the site, if different.
    #[serde(default)]
    pub added: Option<NaiveDate>,
    /// Author slugs, in byline order.
    #[schemars(length(min = 1))]
    pub authors: Vec<String>,
    /// Slug of the series this post belongs to.
    #[serde(default)]
    pub series: Option<String>,
    /// Position within the series.
    #[serde(default)]
    pub series_index: Option<u32>,
    /// Header image filename.
    #[serde(default)]
    pub image: Option<String>,
}

/// Per-locale post fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MempoolPostTranslation {
    /// Localized title.
    pub title: String,
    /// Localized slug; defaults to the canonical slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Short summary for listings.
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Alt text for the header image.
    #[serde(default)]
    pub image_alt: Option<String>,
}

/// Imports mempool posts into [`POST_TABLE`] and [`TRANSLATION_TABLE`].
#[derive(Debug)]
pub struct MempoolImporter {
    post: Schema<MempoolPost>,
    translation: Schema<MempoolPostTranslation>,
    content_map: ContentMap,
}

impl MempoolImporter {
    /// Compile the post schemas.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if a schema fails to compile.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            post: Schema::new()?,
            translation: Schema::new()?,
            content_map: ContentMap::new(),
        })
    }

    /// Posts staged so far.
    #[must_use]
    pub fn content_map(&self) -> &ContentMap {
        &self.content_map
    }
}

impl ContentVariant for MempoolImporter {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn process_and_add_canonical_file(
        &mut self,
        session: &mut dyn Session,
        path: &Path,
        slug: &str,
    ) -> Result<(), ImportError> {
        let document = process_canonical_file(path, &self.post, &self.translation)?;

        let mut post = record(&self.post, path, &document.canonical)?;
        post.insert("slug".to_owned(), Value::from(slug));
        let post_id = session.add(POST_TABLE, post)?;
        self.content_map.insert(slug, post_id);

        let translation = record(&self.translation, path, &document.translation)?;
        session.add(
            TRANSLATION_TABLE,
            translation_row(
                translation,
                POST_FOREIGN_KEY,
                post_id,
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
        let post_id = self.content_map.canonical_id(slug, locale)?;
        let document = process_translated_file(path, &self.translation)?;

        let translation = record(&self.translation, path, &document.translation)?;
        session.add(
            TRANSLATION_TABLE,
            translation_row(
                translation,
                POST_FOREIGN_KEY,
                post_id,
                slug,
                locale,
                document.content,
            ),
        )?;
        Ok(())
    }
}
