//! Article processing: one draft in, one SEO article out.
//!
//! The model is asked for a JSON object with `title`, `slug`,
//! `metaDescription`, `keywords`, `targetKeyword` and `htmlContent`. If the
//! call fails, the payload does not parse, or `title`/`slug`/`htmlContent` is
//! missing, the article is rebuilt deterministically from the draft text
//! instead. Processing therefore never fails; the caller only learns whether a
//! fallback was used.

use serde::Deserialize;

use crate::config::Config;
use crate::llm::{CompletionRequest, CompletionService};
use crate::models::{ArticleDraft, ArticleRecord, GeneratedArticle};
use crate::payload::{non_empty, parse_untrusted, FallbackReason, ModelOutcome};
use crate::render::{call_to_action, escape_html};
use crate::slug::{is_slug, slugify};
use crate::split::{first_non_empty_line, truncate_chars};

/// Characters of raw content used as a fallback meta description.
pub const DESCRIPTION_CHARS: usize = 160;

/// Lines shorter than this that end in `:` become subheadings in fallback markup.
const SUBHEADING_MAX_CHARS: usize = 100;

const ARTICLE_SYSTEM_PROMPT: &str = "You are an SEO expert and web developer. \
Always respond with valid JSON only, no markdown formatting.";

/// A generated article and, if the model output was not used, why.
#[derive(Debug, Clone)]
pub struct ProcessedArticle {
    pub article: GeneratedArticle,
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(rename = "metaDescription", default)]
    meta_description: Option<String>,
    #[serde(default)]
    keywords: Option<serde_json::Value>,
    #[serde(rename = "targetKeyword", default)]
    target_keyword: Option<String>,
    #[serde(rename = "htmlContent", default)]
    html_content: Option<String>,
}

pub struct ArticleProcessor<'a> {
    config: &'a Config,
}

impl<'a> ArticleProcessor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn process(
        &self,
        service: &dyn CompletionService,
        draft: &ArticleDraft,
    ) -> ProcessedArticle {
        tracing::info!(topic = %draft.target_topic, "processing article");

        let outcome = match service.complete(&self.request(draft)).await {
            Ok(response) => self.interpret_response(&response, draft),
            Err(e) => ModelOutcome::Fallback(FallbackReason::Service(format!("{:#}", e))),
        };

        match outcome {
            ModelOutcome::Accepted(article) => ProcessedArticle {
                article,
                fallback: None,
            },
            ModelOutcome::Fallback(reason) => {
                tracing::warn!(topic = %draft.target_topic, %reason, "using fallback article");
                ProcessedArticle {
                    article: self.fallback_article(draft),
                    fallback: Some(reason),
                }
            }
        }
    }

    /// Validates a model response for `draft`.
    ///
    /// `title`, `slug` and `htmlContent` are required. The slug is always
    /// re-normalised so it is safe as a URL segment and a file name.
    pub fn interpret_response(
        &self,
        response: &str,
        draft: &ArticleDraft,
    ) -> ModelOutcome<GeneratedArticle> {
        parse_untrusted::<ArticleResponse>(response).and_then(|parsed| {
            let Some(title) = non_empty(parsed.title) else {
                return ModelOutcome::Fallback(FallbackReason::MissingField("title"));
            };
            let Some(raw_slug) = non_empty(parsed.slug) else {
                return ModelOutcome::Fallback(FallbackReason::MissingField("slug"));
            };
            let Some(html_content) = non_empty(parsed.html_content) else {
                return ModelOutcome::Fallback(FallbackReason::MissingField("htmlContent"));
            };

            if !is_slug(&raw_slug) {
                tracing::debug!(slug = %raw_slug, "normalising model slug");
            }
            let slug = first_slug(&[&raw_slug, &title, &draft.target_topic]);

            let description = non_empty(parsed.meta_description)
                .unwrap_or_else(|| fallback_description(&draft.content));
            let keywords = parsed
                .keywords
                .and_then(keywords_to_string)
                .unwrap_or_else(|| self.config.site.fallback_keywords.clone());
            let target_topic =
                non_empty(parsed.target_keyword).unwrap_or_else(|| draft.target_topic.clone());

            ModelOutcome::Accepted(GeneratedArticle {
                record: ArticleRecord {
                    title,
                    slug,
                    description,
                    keywords,
                    target_topic,
                },
                html_content,
            })
        })
    }

    /// Builds an article from the draft alone.
    ///
    /// The first content line is the title and the `<h1>`; short lines ending
    /// in a colon become `<h2>`; everything else becomes a paragraph. A
    /// call-to-action block is appended.
    pub fn fallback_article(&self, draft: &ArticleDraft) -> GeneratedArticle {
        let title = first_non_empty_line(&draft.content)
            .map(str::to_string)
            .unwrap_or_else(|| draft.target_topic.clone());
        let slug = first_slug(&[&title, &draft.target_topic]);

        let mut html_content = fallback_markup(&draft.content);
        html_content.push('\n');
        html_content.push_str(&call_to_action(
            &self.config.site.app_store_url,
            &format!("Try {}", self.config.site.name),
        ));

        GeneratedArticle {
            record: ArticleRecord {
                title,
                slug,
                description: fallback_description(&draft.content),
                keywords: self.config.site.fallback_keywords.clone(),
                target_topic: draft.target_topic.clone(),
            },
            html_content,
        }
    }

    fn request(&self, draft: &ArticleDraft) -> CompletionRequest {
        CompletionRequest {
            system: ARTICLE_SYSTEM_PROMPT.to_string(),
            prompt: self.article_prompt(draft),
            temperature: self.config.llm.article_temperature,
            max_tokens: self.config.llm.article_max_tokens,
        }
    }

    fn article_prompt(&self, draft: &ArticleDraft) -> String {
        let site = &self.config.site.name;
        let topic = &draft.target_topic;
        let content = &draft.content;
        let cta = call_to_action(
            &self.config.site.app_store_url,
            &format!("Try {} - Start Learning Today", site),
        );
        format!(
            r#"Convert the following article into well-structured HTML for the website "{site}".

TARGET SEARCH TERM: {topic}

ARTICLE CONTENT:
{content}

YOUR TASK:
1. Optimise for the search term "{topic}":
   - an SEO title of 50-60 characters that naturally includes the search term
   - a URL-friendly slug (lowercase, hyphens) based on the search term
   - a meta description of 150-160 characters that includes the search term
   - 5-8 relevant keywords, including the search term
2. Convert the content to clean, semantic HTML:
   - one H1 containing the search term, H2 for sections, H3 for subsections
   - paragraphs, bullet or numbered lists where appropriate
   - the search term in the H1, the first paragraph and naturally throughout
3. Add a call-to-action near the middle and at the end using exactly this HTML:
{cta}

RESPOND IN THIS EXACT JSON FORMAT (valid JSON only, no markdown):
{{
  "title": "SEO-optimised title with the search term",
  "slug": "url-friendly-slug",
  "metaDescription": "150-160 character description with the search term",
  "keywords": "keyword1, keyword2, keyword3, keyword4, keyword5",
  "targetKeyword": "{topic}",
  "htmlContent": "<h1>Title</h1><p>Content...</p>"
}}"#
        )
    }
}

/// First non-empty slug derived from the candidates, or `article`.
fn first_slug(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|c| slugify(c))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "article".to_string())
}

fn fallback_description(content: &str) -> String {
    let head = truncate_chars(content.trim(), DESCRIPTION_CHARS);
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fallback_markup(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let text = escape_html(line);
            if index == 0 {
                format!("<h1>{}</h1>", text)
            } else if line.chars().count() < SUBHEADING_MAX_CHARS && line.ends_with(':') {
                format!("<h2>{}</h2>", text)
            } else {
                format!("<p>{}</p>", text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accepts `"a, b"` or `["a", "b"]`.
fn keywords_to_string(value: serde_json::Value) -> Option<String> {
    let joined = match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    non_empty(Some(joined))
}
