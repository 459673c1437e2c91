#![allow(clippy::unwrap_used)]
//! Integration tests for importing content directories into a `JsonStore`.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use sni_content::content::library;
use sni_content::{ContentImporter, ContentKind, ImportError, ImportState, JsonStore};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn library_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write(
        dir,
        "bitcoin.en.md",
        "---\n\
title: 'Bitcoin: A Peer-to-Peer Electronic Cash System'\n\
authors: [satoshi-nakamoto]\n\
date: October 31, 2008\n\
doc_type: paper\n\
categories: [bitcoin]\n\
---\n\
A purely peer-to-peer version of electronic cash.\n",
    );
    write(
        dir,
        "bitcoin.es.md",
        "---\ntitle: 'Bitcoin: un sistema de efectivo electronico'\nslug: bitcoin-es\n---\nUna version puramente p2p.\n",
    );
    write(
        dir,
        "b-money.en.md",
        "---\ntitle: b-money\nauthors: [wei-dai]\ndoc_type: essay\n---\nI am fascinated by crypto-anarchy.\n",
    );
    tmp
}

fn read_store(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_import_library_into_json_store() {
    let content = library_dir();
    let db = TempDir::new().unwrap();
    let store_path = db.path().join("content.json");

    let store = JsonStore::open(&store_path).unwrap();
    let variant = ContentKind::Library.variant().unwrap();
    let mut importer = ContentImporter::new(content.path(), variant, store);
    let mut out = Vec::new();
    let summary = importer.run_import(&mut out).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Importing library docs...Done\n");
    assert_eq!(summary.canonical_files, 2);
    assert_eq!(summary.translated_files, 1);
    assert_eq!(importer.state(), ImportState::Committed);

    let stored = read_store(&store_path);
    let docs = stored[library::DOC_TABLE].as_array().unwrap();
    let slugs: Vec<&Value> = docs.iter().map(|doc| &doc["slug"]).collect();
    assert_eq!(slugs, [&json!("b-money"), &json!("bitcoin")]);
    assert_eq!(docs[1]["date"], json!("October 31, 2008"));

    let translations = stored[library::TRANSLATION_TABLE].as_array().unwrap();
    assert_eq!(translations.len(), 3);
    let spanish = translations
        .iter()
        .find(|t| t["locale"] == json!("es"))
        .unwrap();
    assert_eq!(spanish["slug"], json!("bitcoin-es"));
    assert_eq!(spanish[library::DOC_FOREIGN_KEY], docs[1]["id"]);
    assert_eq!(spanish["content"], json!("Una version puramente p2p."));

    assert_eq!(stored[library::AUTHOR_TABLE].as_array().unwrap().len(), 2);
    assert_eq!(stored[library::CATEGORY_TABLE].as_array().unwrap().len(), 1);
}

#[test]
fn test_second_import_continues_ids() {
    let content = library_dir();
    let db = TempDir::new().unwrap();
    let store_path = db.path().join("content.json");

    for _ in 0..2 {
        let store = JsonStore::open(&store_path).unwrap();
        let variant = ContentKind::Library.variant().unwrap();
        ContentImporter::new(content.path(), variant, store)
            .import_content()
            .unwrap();
    }

    let stored = read_store(&store_path);
    let ids: Vec<u64> = stored[library::DOC_TABLE]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [1, 2, 3, 4]);
}

#[test]
fn test_invalid_document_leaves_store_untouched() {
    let content = library_dir();
    write(
        content.path(),
        "anonymous.en.md",
        "---\ntitle: Anonymous\nauthors: []\n---\n",
    );
    let db = TempDir::new().unwrap();
    let store_path = db.path().join("content.json");

    let store = JsonStore::open(&store_path).unwrap();
    let variant = ContentKind::Library.variant().unwrap();
    let mut importer = ContentImporter::new(content.path(), variant, store);
    let err = importer.import_content().unwrap_err();

    assert!(matches!(err, ImportError::Schema { .. }), "got {err:?}");
    assert!(err.to_string().contains("anonymous.en.md"), "got: {err}");
    assert!(!store_path.exists());
}

#[test]
fn test_document_without_front_matter_fails() {
    let content = TempDir::new().unwrap();
    write(content.path(), "notes.en.md", "Just some notes.\n");

    let db = TempDir::new().unwrap();
    let store = JsonStore::open(db.path().join("content.json")).unwrap();
    let variant = ContentKind::Mempool.variant().unwrap();
    let err = ContentImporter::new(content.path(), variant, store)
        .import_content()
        .unwrap_err();

    assert!(matches!(err, ImportError::MissingFrontMatter { .. }), "got {err:?}");
}
