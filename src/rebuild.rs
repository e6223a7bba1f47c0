//! Rebuilding the article index from rendered pages.
//!
//! Recovery path for a lost or damaged index: every `*.html` file in the
//! articles folder is read back and its metadata is pulled out of the head
//! tags the renderer writes. The previous index is not consulted.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::index::save_index;
use crate::models::ArticleRecord;
use crate::render::{escape_html, unescape_html};

/// Title used when a page has no recognisable `<title>` tag.
pub const UNTITLED: &str = "Untitled";

static DESCRIPTION_META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta name="description" content="(.*?)""#).expect("Invalid description regex")
});

static KEYWORDS_META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta name="keywords" content="(.*?)""#).expect("Invalid keywords regex")
});

static DASH_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-\s*.*$").expect("Invalid dash suffix regex"));

static PIPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\|\s*.*$").expect("Invalid pipe suffix regex"));

/// Metadata recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub target_topic: String,
}

/// Pattern matcher bound to one site name.
pub struct PageScanner {
    title: Regex,
}

impl PageScanner {
    pub fn new(site_name: &str) -> Result<Self> {
        let pattern = format!(
            r"<title>(.*?)\s*\|\s*{}</title>",
            regex::escape(&escape_html(site_name))
        );
        Ok(Self {
            title: Regex::new(&pattern).context("Invalid title pattern")?,
        })
    }

    /// Extracts title, description and keywords from page text.
    ///
    /// Missing tags never fail: the title becomes [`UNTITLED`] and the meta
    /// fields become empty strings.
    pub fn extract(&self, html: &str) -> PageMetadata {
        let title = self
            .title
            .captures(html)
            .map(|c| unescape_html(c[1].trim()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let description = capture(&DESCRIPTION_META, html);
        let keywords = capture(&KEYWORDS_META, html);
        let target_topic = topic_from_title(&title);

        PageMetadata {
            title,
            description,
            keywords,
            target_topic,
        }
    }
}

fn capture(re: &Regex, html: &str) -> String {
    re.captures(html)
        .map(|c| unescape_html(&c[1]))
        .unwrap_or_default()
}

/// Lowercased title with any trailing ` - …` and then ` | …` removed.
pub fn topic_from_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_dash = DASH_SUFFIX.replace(&lowered, "");
    PIPE_SUFFIX.replace(&without_dash, "").into_owned()
}

/// A page that could not be read.
#[derive(Debug, Clone)]
pub struct RebuildFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    pub records: Vec<ArticleRecord>,
    pub failures: Vec<RebuildFailure>,
}

/// Lists `*.html` files directly inside `dir`, sorted by file name.
pub fn html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to list articles folder: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_html = entry
            .path()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if is_html {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Builds a fresh index from the pages in `dir`.
///
/// One record per readable page, in file-name order, slug = file stem.
/// Unreadable pages are collected in [`RebuildReport::failures`].
pub fn rebuild_index(dir: &Path, site_name: &str) -> Result<RebuildReport> {
    let scanner = PageScanner::new(site_name)?;
    let mut report = RebuildReport::default();

    for path in html_files(dir)? {
        let slug = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match std::fs::read_to_string(&path) {
            Ok(html) => {
                let meta = scanner.extract(&html);
                tracing::debug!(%slug, title = %meta.title, "recovered page metadata");
                report.records.push(ArticleRecord {
                    title: meta.title,
                    slug,
                    description: meta.description,
                    keywords: meta.keywords,
                    target_topic: meta.target_topic,
                });
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not read page");
                report.failures.push(RebuildFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// `forge rebuild-index`: replaces the index with what the pages say.
pub fn run_rebuild_index(config: &Config) -> Result<()> {
    let dir = &config.paths.articles_dir;
    if !dir.exists() {
        println!("Articles folder does not exist: {}", dir.display());
        println!("  Nothing to rebuild; the index was left untouched.");
        return Ok(());
    }

    let report = rebuild_index(dir, &config.site.name)?;
    save_index(&config.paths.index_file, &report.records)?;

    println!("rebuild-index");
    println!("  pages indexed: {}", report.records.len());
    if !report.failures.is_empty() {
        println!("  unreadable pages: {}", report.failures.len());
        for failure in &report.failures {
            println!("    {}: {}", failure.path.display(), failure.error);
        }
    }
    println!("  index file: {}", config.paths.index_file.display());
    println!("ok");
    Ok(())
}
