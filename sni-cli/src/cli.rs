//! Command line definitions and dispatch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use sni_content::content::{LibraryDoc, MempoolPost};
use sni_content::{
    ContentImporter, ContentKind, ContentVariant, ImportSummary, JsonStore, MemorySession, Schema,
    Session,
};
use sni_loader::{LoaderConfig, load_all, output};

/// Import Markdown content with YAML front matter into the SNI content store.
#[derive(Parser, Debug)]
#[command(name = "sni", author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a content directory: canonical files first, then translations.
    Import {
        /// Content type to import (mempool, library).
        kind: ContentKind,

        /// Directory of `<slug>.<locale>.md` files.
        #[arg(short, long)]
        dir: PathBuf,

        /// JSON store to commit into. Without it the import runs in memory.
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Validate and stage everything without writing the store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Load every Markdown file in a directory against a canonical schema.
    Load {
        /// Directory of Markdown files.
        dir: PathBuf,

        /// Content type whose canonical schema applies (mempool, library).
        #[arg(short, long)]
        kind: ContentKind,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Glob patterns of files to leave out.
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Print the JSON Schemas of a content type.
    Schema {
        /// Content type (mempool, library).
        kind: ContentKind,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);
    execute(cli.command, &mut io::stdout().lock())
}

fn execute(command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Import {
            kind,
            dir,
            store,
            dry_run,
        } => import(kind, &dir, store.as_deref(), dry_run, out),
        Command::Load {
            dir,
            kind,
            json,
            exclude,
        } => load(kind, &dir, json, exclude, out),
        Command::Schema { kind } => print_schema(kind, out),
    }
}

fn import(
    kind: ContentKind,
    dir: &Path,
    store: Option<&Path>,
    dry_run: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let variant = kind.variant()?;
    let summary = match store {
        Some(path) if !dry_run => run_import(dir, variant, JsonStore::open(path)?, out)?,
        _ => run_import(dir, variant, MemorySession::new(), out)?,
    };

    let counts = format!(
        "{} canonical, {} translated, {} rows",
        summary.canonical_files, summary.translated_files, summary.committed_rows
    );
    writeln!(out, "  {}", counts.dimmed())?;
    match store {
        Some(path) if !dry_run => {
            tracing::info!(store = %path.display(), rows = summary.committed_rows, "store updated");
            writeln!(out, "  Committed to {}", path.display())?;
        }
        _ => writeln!(out, "  {}", "Dry run: no store was written".yellow())?,
    }
    Ok(())
}

fn run_import<V: ContentVariant, S: Session>(
    dir: &Path,
    variant: V,
    session: S,
    out: &mut dyn Write,
) -> anyhow::Result<ImportSummary> {
    let mut importer = ContentImporter::new(dir, variant, session);
    match importer.run_import(out) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            // Close the "Importing ..." line before the error is reported.
            writeln!(out)?;
            Err(e.into())
        }
    }
}

fn load(
    kind: ContentKind,
    dir: &Path,
    json: bool,
    exclude: Vec<String>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut config = LoaderConfig::default();
    config.exclude = exclude;

    let report = match kind {
        ContentKind::Mempool => load_all(dir, &Schema::<MempoolPost>::new()?, &config)?,
        ContentKind::Library => load_all(dir, &Schema::<LibraryDoc>::new()?, &config)?,
    };

    if json {
        output::write_json(&report, out)
    } else {
        output::write_human(&report, out)
    }
}

fn print_schema(kind: ContentKind, out: &mut dyn Write) -> anyhow::Result<()> {
    let schemas = serde_json::json!({
        "kind": kind.name(),
        "canonical": kind.canonical_schema()?,
        "translation": kind.translation_schema()?,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&schemas)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn mempool_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("genesis.en.md"),
            "---\ntitle: Genesis\ndate: 2009-01-03\nauthors: [satoshi-nakamoto]\n---\nBody\n",
        )
        .unwrap();
        tmp
    }

    #[test]
    fn test_import_command() {
        let cli = parse(&["sni", "import", "mempool", "--dir", "content/mempool"]);
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Command::Import {
                kind,
                dir,
                store,
                dry_run,
            } => {
                assert_eq!(kind, ContentKind::Mempool);
                assert_eq!(dir, PathBuf::from("content/mempool"));
                assert!(store.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected Import command"),
        }
    }

    #[test]
    fn test_verbose_is_global_and_counted() {
        let cli = parse(&["sni", "schema", "library", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Schema {
                kind: ContentKind::Library
            }
        ));
    }

    #[test]
    fn test_load_command_with_excludes() {
        let cli = parse(&[
            "sni", "load", "docs", "--kind", "library", "--json", "-e", "draft-*", "-e", "*.bak.md",
        ]);
        match cli.command {
            Command::Load {
                kind,
                json,
                exclude,
                ..
            } => {
                assert_eq!(kind, ContentKind::Library);
                assert!(json);
                assert_eq!(exclude, ["draft-*", "*.bak.md"]);
            }
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = Cli::try_parse_from(["sni", "schema", "podcast"]).unwrap_err();
        assert!(err.to_string().contains("Unknown content kind"), "got: {err}");
    }

    #[test]
    fn test_import_dry_run_writes_nothing() {
        let content = mempool_dir();
        let db = TempDir::new().unwrap();
        let store = db.path().join("content.json");
        let mut out = Vec::new();

        import(ContentKind::Mempool, content.path(), Some(&store), true, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Importing mempool posts...Done\n"), "got: {text}");
        assert!(text.contains("1 canonical, 0 translated, 2 rows"), "got: {text}");
        assert!(text.contains("Dry run"), "got: {text}");
        assert!(!store.exists());
    }

    #[test]
    fn test_import_commits_to_store() {
        let content = mempool_dir();
        let db = TempDir::new().unwrap();
        let store = db.path().join("content.json");
        let mut out = Vec::new();

        import(ContentKind::Mempool, content.path(), Some(&store), false, &mut out).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
        assert_eq!(stored["mempool_post"].as_array().unwrap().len(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Committed to"));
    }

    #[test]
    fn test_import_failure_closes_progress_line() {
        let content = TempDir::new().unwrap();
        fs::write(content.path().join("post.md"), "").unwrap();
        let mut out = Vec::new();

        let err = import(ContentKind::Library, content.path(), None, false, &mut out).unwrap_err();

        assert!(err.to_string().contains("post.md"), "got: {err}");
        assert_eq!(String::from_utf8(out).unwrap(), "Importing library docs...\n");
    }

    #[test]
    fn test_load_json_report() {
        let content = mempool_dir();
        let mut out = Vec::new();

        load(ContentKind::Mempool, content.path(), true, Vec::new(), &mut out).unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["scanned_files"], serde_json::json!(1));
        assert_eq!(report["records"][0]["slug"], serde_json::json!("genesis"));
    }

    #[test]
    fn test_print_schema() {
        let mut out = Vec::new();
        print_schema(ContentKind::Mempool, &mut out).unwrap();

        let schemas: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(schemas["kind"], serde_json::json!("mempool"));
        assert!(schemas["canonical"]["properties"]["authors"].is_object());
        assert!(schemas["translation"]["properties"]["title"].is_object());
    }
}
