//! Core data models used throughout the pipeline.
//!
//! A [`SourceDocument`] is split into [`ArticleDraft`]s, each draft is turned
//! into a [`GeneratedArticle`], and the [`ArticleRecord`] part of that is what
//! the JSON index stores.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A document read from the documents folder. Never persisted.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub path: PathBuf,
    pub text: String,
}

/// An unprocessed article cut out of a source document.
///
/// `content` is never empty and `target_topic` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub target_topic: String,
    pub title: String,
    pub content: String,
}

/// One entry of the article index.
///
/// The slug is the natural key: two records with the same slug are the
/// same article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(rename = "targetKeyword", default)]
    pub target_topic: String,
}

/// A fully processed article: the index record plus its body markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub record: ArticleRecord,
    pub html_content: String,
}

impl GeneratedArticle {
    pub fn file_name(&self) -> String {
        format!("{}.html", self.record.slug)
    }
}
