//! Article splitting.
//!
//! One source document can hold many articles. The splitter finds them in
//! three steps, stopping at the first that produces drafts:
//!
//! 1. **Delimited**: the document contains the marker phrase followed by a
//!    number (`lexa article 1`, `Lexa Article 2`, ...) at least twice. Text
//!    before the first marker is preamble and is dropped.
//! 2. **Model-assisted**: the document prefix is sent to the model, which
//!    returns `{"articles":[{"targetKeyword","title","content"}]}`.
//! 3. **Whole document**: the model call or its payload failed; the entire
//!    text becomes one draft named after the file.
//!
//! The splitter never returns zero drafts for non-empty input.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::llm::{CompletionRequest, CompletionService};
use crate::models::ArticleDraft;
use crate::payload::{non_empty, parse_untrusted, FallbackReason, ModelOutcome};

/// Maximum characters in a derived target topic.
pub const MAX_TOPIC_CHARS: usize = 60;

static HEADING_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#+\s*").expect("Invalid heading marker regex"));

static NON_TOPIC_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("Invalid topic character regex"));

const SPLIT_SYSTEM_PROMPT: &str = "You are an SEO expert. Always respond with valid JSON only, \
no markdown formatting. Escape all quotes properly in JSON strings.";

/// How a document's drafts were produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitStrategy {
    Delimited,
    ModelAssisted,
    WholeDocument(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub drafts: Vec<ArticleDraft>,
    pub strategy: SplitStrategy,
}

pub struct ArticleSplitter<'a> {
    config: &'a Config,
    delimiter: Regex,
}

impl<'a> ArticleSplitter<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            delimiter: delimiter_regex(&config.pipeline.delimiter)?,
            config,
        })
    }

    /// Splits `text` into drafts, consulting `service` only when the
    /// document carries fewer than two delimiters.
    pub async fn split(
        &self,
        service: &dyn CompletionService,
        text: &str,
        file_name: &str,
    ) -> SplitOutcome {
        if let Some(drafts) = self.split_delimited(text) {
            if !drafts.is_empty() {
                tracing::info!(articles = drafts.len(), "split on delimiter");
                return SplitOutcome {
                    drafts,
                    strategy: SplitStrategy::Delimited,
                };
            }
            tracing::warn!("delimiters found but every section was empty");
        }

        tracing::info!("no delimiters found, asking the model to find articles");
        let outcome = match service.complete(&self.split_request(text)).await {
            Ok(response) => interpret_split_response(&response),
            Err(e) => ModelOutcome::Fallback(FallbackReason::Service(format!("{:#}", e))),
        };

        match outcome {
            ModelOutcome::Accepted(drafts) => {
                tracing::info!(articles = drafts.len(), "model detected articles");
                SplitOutcome {
                    drafts,
                    strategy: SplitStrategy::ModelAssisted,
                }
            }
            ModelOutcome::Fallback(reason) => {
                tracing::warn!(%reason, "model-assisted split failed, using whole document");
                SplitOutcome {
                    drafts: vec![whole_document_draft(text, file_name)],
                    strategy: SplitStrategy::WholeDocument(reason),
                }
            }
        }
    }

    /// Delimiter-based split.
    ///
    /// Returns `None` when the document has fewer than two delimiters.
    /// Otherwise returns one draft per non-empty section after the first
    /// delimiter; the preamble before it is always discarded.
    pub fn split_delimited(&self, text: &str) -> Option<Vec<ArticleDraft>> {
        let sections: Vec<&str> = self.delimiter.split(text).collect();
        if sections.len() <= 2 {
            return None;
        }

        let drafts = sections
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(position, section)| {
                let content = section.trim();
                if content.is_empty() {
                    return None;
                }
                let title = first_non_empty_line(content)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Article {}", position));
                Some(ArticleDraft {
                    target_topic: derive_topic(&title, position),
                    title,
                    content: content.to_string(),
                })
            })
            .collect();
        Some(drafts)
    }

    fn split_request(&self, text: &str) -> CompletionRequest {
        let excerpt = truncate_chars(text, self.config.pipeline.split_prefix_chars);
        CompletionRequest {
            system: SPLIT_SYSTEM_PROMPT.to_string(),
            prompt: split_prompt(excerpt),
            temperature: self.config.llm.split_temperature,
            max_tokens: self.config.llm.split_max_tokens,
        }
    }
}

/// Builds the delimiter pattern: the marker words separated by any
/// whitespace, then whitespace and a number. Case-insensitive.
pub fn delimiter_regex(marker: &str) -> Result<Regex> {
    let words: Vec<String> = marker.split_whitespace().map(regex::escape).collect();
    let pattern = format!(r"(?i){}\s+\d+", words.join(r"\s+"));
    Ok(Regex::new(&pattern)?)
}

fn split_prompt(excerpt: &str) -> String {
    format!(
        r#"The following document contains MULTIPLE separate articles, each targeting a different search term or keyword phrase.

DOCUMENT CONTENT:
{excerpt}

YOUR TASK:
1. Identify and separate every individual article in this document.
2. Each article targets one specific search term or keyword phrase.
3. For EACH article extract:
   - the target search term / keyword phrase
   - the article title (write a compelling one if none is stated)
   - the article content (everything that belongs to that article)

RESPOND IN THIS EXACT JSON FORMAT (valid JSON only, no markdown):
{{
  "articles": [
    {{
      "targetKeyword": "best language learning app",
      "title": "Article title here",
      "content": "Full article text content here..."
    }}
  ]
}}

IMPORTANT:
- Return ALL articles found in the document
- Each article must be complete with all of its content
- Preserve the original content structure"#
    )
}

#[derive(Debug, Deserialize)]
struct SplitResponse {
    #[serde(default)]
    articles: Option<Vec<SplitArticle>>,
}

#[derive(Debug, Deserialize)]
struct SplitArticle {
    #[serde(rename = "targetKeyword", default)]
    target_keyword: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Validates a model split response and turns it into drafts.
///
/// Entries without content are dropped; missing titles and topics are
/// derived the same way the delimited path derives them.
pub fn interpret_split_response(response: &str) -> ModelOutcome<Vec<ArticleDraft>> {
    parse_untrusted::<SplitResponse>(response).and_then(|parsed| {
        let drafts: Vec<ArticleDraft> = parsed
            .articles
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, article)| {
                let position = i + 1;
                let content = non_empty(article.content)?;
                let title = non_empty(article.title)
                    .or_else(|| first_non_empty_line(&content).map(str::to_string))
                    .unwrap_or_else(|| format!("Article {}", position));
                let target_topic = non_empty(article.target_keyword)
                    .map(|t| truncate_chars(&t, MAX_TOPIC_CHARS).to_string())
                    .unwrap_or_else(|| derive_topic(&title, position));
                Some(ArticleDraft {
                    target_topic,
                    title,
                    content,
                })
            })
            .collect();

        if drafts.is_empty() {
            ModelOutcome::Fallback(FallbackReason::NoArticles)
        } else {
            ModelOutcome::Accepted(drafts)
        }
    })
}

/// One draft covering the entire document, named after the file.
pub fn whole_document_draft(text: &str, file_name: &str) -> ArticleDraft {
    let name = document_stem(file_name);
    ArticleDraft {
        target_topic: name.clone(),
        title: name,
        content: text.trim().to_string(),
    }
}

/// File name with its extension stripped.
pub fn document_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// Turns a title into a target topic: heading markers and punctuation
/// removed, lowercased, trimmed, at most [`MAX_TOPIC_CHARS`] characters.
/// Falls back to `article-<position>` when nothing is left.
pub fn derive_topic(title: &str, position: usize) -> String {
    let without_heading = HEADING_MARKERS.replace(title, "");
    let cleaned = NON_TOPIC_CHARS.replace_all(&without_heading, "");
    let lowered = cleaned.to_lowercase();
    let topic = truncate_chars(lowered.trim(), MAX_TOPIC_CHARS);
    if topic.trim().is_empty() {
        format!("article-{}", position)
    } else {
        topic.to_string()
    }
}

pub fn first_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
