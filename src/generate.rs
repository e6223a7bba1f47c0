//! Generation pipeline orchestration.
//!
//! Coordinates a full run: discover documents → extract → split → process
//! each draft → render and write `<slug>.html` → reconcile the index.
//! Documents and articles are handled strictly one at a time with fixed
//! pauses between model calls. No single document, article or file can end
//! the run; every failure is logged and counted in the [`GenerateReport`].
//!
//! A slug is written at most once: a page is only written when its slug is
//! neither in the existing index nor already written earlier in the run, so
//! every index entry keeps describing the page on disk.

use anyhow::{Context, Result};
use chrono::Datelike;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::documents::{load_document, scan_documents};
use crate::index::{load_index, reconcile, save_index};
use crate::llm::{CompletionService, OpenAiChat};
use crate::models::ArticleRecord;
use crate::process::ArticleProcessor;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::render::render_page;
use crate::split::{truncate_chars, ArticleSplitter, SplitStrategy};

/// Outcome of one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    pub file_name: String,
    /// Set when the document was skipped before splitting.
    pub skipped: Option<String>,
    pub split_fallback: bool,
    pub articles: Vec<ArticleRecord>,
    pub article_fallbacks: usize,
    pub write_failures: usize,
    pub written: Vec<PathBuf>,
    /// Slugs whose page was not written because the slug was already taken.
    pub duplicates: Vec<String>,
}

impl DocumentReport {
    /// True when every article of the document is accounted for by a page,
    /// either written now or already present under the same slug.
    pub fn succeeded(&self) -> bool {
        !self.articles.is_empty() || !self.duplicates.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub documents: Vec<DocumentReport>,
    pub index_existing: usize,
    pub index_appended: usize,
    pub index_skipped: usize,
    pub index_total: usize,
    /// False when there was nothing to process and the index was left alone.
    pub index_written: bool,
}

impl GenerateReport {
    pub fn articles_generated(&self) -> usize {
        self.documents.iter().map(|d| d.articles.len()).sum()
    }

    pub fn documents_failed(&self) -> usize {
        self.documents.iter().filter(|d| !d.succeeded()).count()
    }

    pub fn article_fallbacks(&self) -> usize {
        self.documents.iter().map(|d| d.article_fallbacks).sum()
    }

    pub fn split_fallbacks(&self) -> usize {
        self.documents.iter().filter(|d| d.split_fallback).count()
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.documents.iter().map(|d| d.duplicates.len()).sum()
    }
}

/// Creates the documents and articles folders.
pub fn setup_folders(config: &Config) -> Result<()> {
    for dir in [&config.paths.documents_dir, &config.paths.articles_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create folder: {}", dir.display()))?;
    }
    Ok(())
}

/// Runs the pipeline over every document in the documents folder.
pub async fn generate(
    config: &Config,
    service: &dyn CompletionService,
    progress: &dyn ProgressReporter,
    limit: Option<usize>,
) -> Result<GenerateReport> {
    setup_folders(config)?;

    let mut files = scan_documents(&config.paths)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    let mut report = GenerateReport::default();
    if files.is_empty() {
        tracing::warn!(
            folder = %config.paths.documents_dir.display(),
            "no documents found"
        );
        return Ok(report);
    }

    tracing::info!(documents = files.len(), model = service.model_name(), "starting generation");
    let splitter = ArticleSplitter::new(config)?;
    let processor = ArticleProcessor::new(config);
    let year = chrono::Utc::now().year();
    let total = files.len();

    let existing = load_index(&config.paths.index_file);
    let mut claimed: HashSet<String> = existing.iter().map(|r| r.slug.clone()).collect();

    for (i, path) in files.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        progress.report(ProgressEvent::Document {
            n: (i + 1) as u64,
            total: total as u64,
            file_name: file_name.clone(),
        });

        let doc_report = process_document(
            config,
            service,
            progress,
            &splitter,
            &processor,
            &mut claimed,
            path,
            file_name,
            year,
        )
        .await;
        if doc_report.succeeded() {
            tracing::info!(
                file = %doc_report.file_name,
                articles = doc_report.articles.len(),
                "document done"
            );
        } else {
            tracing::error!(file = %doc_report.file_name, "no articles generated from document");
        }
        report.documents.push(doc_report);

        if i + 1 < total {
            pause(config.pipeline.document_delay_ms, progress).await;
        }
    }

    let incoming: Vec<ArticleRecord> = report
        .documents
        .iter()
        .flat_map(|d| d.articles.iter().cloned())
        .collect();
    let merged = reconcile(existing, incoming);
    save_index(&config.paths.index_file, &merged.index)?;

    report.index_existing = merged.existing;
    report.index_appended = merged.appended;
    report.index_skipped = merged.skipped + report.duplicates_skipped();
    report.index_total = merged.index.len();
    report.index_written = true;
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
async fn process_document(
    config: &Config,
    service: &dyn CompletionService,
    progress: &dyn ProgressReporter,
    splitter: &ArticleSplitter<'_>,
    processor: &ArticleProcessor<'_>,
    claimed: &mut HashSet<String>,
    path: &Path,
    file_name: String,
    year: i32,
) -> DocumentReport {
    let mut report = DocumentReport {
        file_name,
        ..DocumentReport::default()
    };

    let document = match load_document(path, config.pipeline.min_document_chars) {
        Ok(doc) => doc,
        Err(skip) => {
            tracing::warn!(file = %report.file_name, reason = %skip, "skipping document");
            report.skipped = Some(skip.to_string());
            return report;
        }
    };

    let split = splitter
        .split(service, &document.text, &document.file_name)
        .await;
    report.split_fallback = matches!(split.strategy, SplitStrategy::WholeDocument(_));

    let total = split.drafts.len();
    for (i, draft) in split.drafts.iter().enumerate() {
        progress.report(ProgressEvent::Article {
            n: (i + 1) as u64,
            total: total as u64,
            topic: draft.target_topic.clone(),
        });

        let processed = processor.process(service, draft).await;
        if processed.fallback.is_some() {
            report.article_fallbacks += 1;
        }

        let article = processed.article;
        if !claimed.insert(article.record.slug.clone()) {
            tracing::warn!(
                slug = %article.record.slug,
                title = %article.record.title,
                "slug already taken, page not written"
            );
            report.duplicates.push(article.record.slug);
        } else {
            let html = render_page(&article, &config.site, year);
            let output = config.paths.articles_dir.join(article.file_name());
            match std::fs::write(&output, html) {
                Ok(()) => {
                    tracing::info!(file = %output.display(), title = %article.record.title, "article written");
                    report.written.push(output);
                    report.articles.push(article.record);
                }
                Err(e) => {
                    tracing::error!(file = %output.display(), error = %e, "could not write article");
                    claimed.remove(&article.record.slug);
                    report.write_failures += 1;
                }
            }
        }

        if i + 1 < total {
            pause(config.pipeline.article_delay_ms, progress).await;
        }
    }

    report
}

async fn pause(millis: u64, progress: &dyn ProgressReporter) {
    if millis == 0 {
        return;
    }
    progress.report(ProgressEvent::Waiting { millis });
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// `forge generate`: requires the API key, runs the pipeline, prints a summary.
pub async fn run_generate(
    config: &Config,
    progress: &dyn ProgressReporter,
    limit: Option<usize>,
) -> Result<()> {
    let api_key = config.require_api_key()?;
    let service = OpenAiChat::new(&config.llm, api_key)?;

    let report = generate(config, &service, progress, limit).await?;
    print_summary(config, &report);
    Ok(())
}

/// `forge init`
pub fn run_init(config: &Config) -> Result<()> {
    setup_folders(config)?;
    println!("Folders ready:");
    println!("  documents: {}", config.paths.documents_dir.display());
    println!("  articles:  {}", config.paths.articles_dir.display());
    Ok(())
}

/// `forge split <file>`: shows the drafts one document would produce.
/// Nothing is processed or written.
pub async fn run_split_preview(config: &Config, file: &Path) -> Result<()> {
    let api_key = config.require_api_key()?;
    let service = OpenAiChat::new(&config.llm, api_key)?;

    let document = load_document(file, config.pipeline.min_document_chars)
        .with_context(|| format!("Cannot split {}", file.display()))?;
    let splitter = ArticleSplitter::new(config)?;
    let outcome = splitter
        .split(&service, &document.text, &document.file_name)
        .await;

    let strategy = match &outcome.strategy {
        SplitStrategy::Delimited => "delimiter".to_string(),
        SplitStrategy::ModelAssisted => "model".to_string(),
        SplitStrategy::WholeDocument(reason) => format!("whole document ({})", reason),
    };
    println!("{}: {} draft(s), split by {}", document.file_name, outcome.drafts.len(), strategy);
    for (i, draft) in outcome.drafts.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, draft.title);
        println!("   topic: {}", draft.target_topic);
        println!("   chars: {}", draft.content.chars().count());
        let preview = truncate_chars(&draft.content, 160).replace('\n', " ");
        println!("   {}", preview);
    }
    Ok(())
}

fn print_summary(config: &Config, report: &GenerateReport) {
    if report.documents.is_empty() {
        println!(
            "No documents found in {}",
            config.paths.documents_dir.display()
        );
        println!(
            "  Add files matching {} and run again.",
            config.paths.include_globs.join(", ")
        );
        return;
    }

    println!("generate");
    println!("  documents: {}", report.documents.len());
    println!("  articles generated: {}", report.articles_generated());
    println!("  model fallbacks: {}", report.article_fallbacks());
    println!("  whole-document splits: {}", report.split_fallbacks());
    if report.documents_failed() > 0 {
        println!("  failed documents: {}", report.documents_failed());
        for doc in report.documents.iter().filter(|d| !d.succeeded()) {
            let reason = doc.skipped.as_deref().unwrap_or("no article could be written");
            println!("    {}: {}", doc.file_name, reason);
        }
    }
    println!(
        "  index: {} existing + {} new = {} total ({} duplicate slugs skipped)",
        report.index_existing, report.index_appended, report.index_total, report.index_skipped
    );
    println!("  index file: {}", config.paths.index_file.display());
    println!("  articles folder: {}", config.paths.articles_dir.display());
    println!("ok");
}
