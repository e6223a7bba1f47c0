//! Source document discovery and loading.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::PathsConfig;
use crate::extract::{extract_file, ExtractError};
use crate::models::SourceDocument;

/// Lists documents directly inside the documents folder whose file names
/// match the include globs and none of the exclude globs, sorted by name.
pub fn scan_documents(paths: &PathsConfig) -> Result<Vec<PathBuf>> {
    let root = &paths.documents_dir;
    if !root.exists() {
        bail!("Documents folder does not exist: {}", root.display());
    }

    let include_set = build_globset(&paths.include_globs)?;
    let exclude_set = build_globset(&paths.exclude_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if exclude_set.is_match(&name) || !include_set.is_match(&name) {
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

/// Why a document was not split.
#[derive(Debug)]
pub enum DocumentSkip {
    Extraction(ExtractError),
    TooShort { chars: usize, minimum: usize },
}

impl std::fmt::Display for DocumentSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSkip::Extraction(e) => write!(f, "{}", e),
            DocumentSkip::TooShort { chars, minimum } => write!(
                f,
                "document too short ({} characters, minimum {})",
                chars, minimum
            ),
        }
    }
}

impl std::error::Error for DocumentSkip {}

/// Extracts a document and rejects it if its trimmed text is shorter than
/// `min_chars`.
pub fn load_document(path: &Path, min_chars: usize) -> Result<SourceDocument, DocumentSkip> {
    let text = extract_file(path).map_err(DocumentSkip::Extraction)?;
    let chars = text.trim().chars().count();
    if chars < min_chars {
        return Err(DocumentSkip::TooShort {
            chars,
            minimum: min_chars,
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(SourceDocument {
        file_name,
        path: path.to_path_buf(),
        text,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
