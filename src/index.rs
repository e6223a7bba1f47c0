//! The article index: `articles-data.json`.
//!
//! A JSON array of [`ArticleRecord`]s keyed by slug. Generation runs only
//! ever append to it through [`reconcile`]; the rebuilder replaces it
//! wholesale. Writes go through a temporary file in the same directory and
//! a rename, so readers see either the old index or the new one.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::models::ArticleRecord;

/// Result of merging a run's records into an existing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub index: Vec<ArticleRecord>,
    /// Entries that were already present.
    pub existing: usize,
    /// New records appended.
    pub appended: usize,
    /// New records dropped because their slug was already taken.
    pub skipped: usize,
}

/// Appends `incoming` records whose slugs are not yet in `existing`.
///
/// Existing entries are kept verbatim and in order. Among incoming records
/// the first occurrence of a slug wins.
pub fn reconcile(existing: Vec<ArticleRecord>, incoming: Vec<ArticleRecord>) -> Reconciliation {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.slug.clone()).collect();
    let existing_count = existing.len();
    let incoming_count = incoming.len();

    let mut index = existing;
    for record in incoming {
        if seen.insert(record.slug.clone()) {
            index.push(record);
        }
    }

    let appended = index.len() - existing_count;
    Reconciliation {
        index,
        existing: existing_count,
        appended,
        skipped: incoming_count - appended,
    }
}

/// Reads the index at `path`.
///
/// A missing, unreadable or unparseable file yields an empty index; the
/// problem is logged and the run carries on.
pub fn load_index(path: &Path) -> Vec<ArticleRecord> {
    if !path.exists() {
        return Vec::new();
    }
    match read_index(path) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{:#}", e),
                "could not read existing article index, starting a new one"
            );
            Vec::new()
        }
    }
}

pub fn read_index(path: &Path) -> Result<Vec<ArticleRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read index: {}", path.display()))?;
    let records = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse index: {}", path.display()))?;
    Ok(records)
}

/// Atomically replaces the index at `path` with `records`.
pub fn save_index(path: &Path, records: &[ArticleRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let json = serde_json::to_string_pretty(records)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write index: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug: &str) -> ArticleRecord {
        ArticleRecord {
            title: format!("Title {}", slug),
            slug: slug.to_string(),
            description: String::new(),
            keywords: String::new(),
            target_topic: slug.to_string(),
        }
    }

    fn slugs(records: &[ArticleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn existing_slug_wins() {
        let mut existing = record("a");
        existing.title = "Original".to_string();
        let result = reconcile(vec![existing], vec![record("a"), record("b")]);
        assert_eq!(slugs(&result.index), vec!["a", "b"]);
        assert_eq!(result.index[0].title, "Original");
        assert_eq!((result.existing, result.appended, result.skipped), (1, 1, 1));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let incoming = vec![record("b"), record("c")];
        let once = reconcile(vec![record("a")], incoming.clone());
        let twice = reconcile(once.index.clone(), incoming);
        assert_eq!(once.index, twice.index);
        assert_eq!(twice.appended, 0);
    }

    #[test]
    fn duplicate_slugs_within_a_run_collapse() {
        let mut second = record("x");
        second.title = "Second".to_string();
        let result = reconcile(Vec::new(), vec![record("x"), second]);
        assert_eq!(result.index.len(), 1);
        assert_eq!(result.index[0].title, "Title x");
    }

    #[test]
    fn append_preserves_order() {
        let result = reconcile(
            vec![record("m"), record("a")],
            vec![record("z"), record("b")],
        );
        assert_eq!(slugs(&result.index), vec!["m", "a", "z", "b"]);
    }

    #[test]
    fn missing_or_corrupt_index_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles-data.json");
        assert!(load_index(&path).is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_index(&path).is_empty());
        assert!(read_index(&path).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles-data.json");
        save_index(&path, &[record("a"), record("b")]).unwrap();
        let loaded = load_index(&path);
        assert_eq!(slugs(&loaded), vec!["a", "b"]);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"targetKeyword\": \"a\""));
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save_index(&path, &[record("a"), record("b"), record("c")]).unwrap();
        save_index(&path, &[record("z")]).unwrap();
        assert_eq!(slugs(&load_index(&path)), vec!["z"]);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
