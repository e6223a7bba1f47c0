//! TOML configuration with environment overrides.
//!
//! Every setting has a default, so a missing config file at the default
//! location is not an error. Three values can be supplied through the
//! environment and always win over the file:
//!
//! | Variable | Field | Required |
//! |----------|-------|----------|
//! | `OPENAI_API_KEY` | [`Config::api_key`] | for `generate` and `split` |
//! | `APP_STORE_URL` | [`SiteConfig::app_store_url`] | no |
//! | `SITE_URL` | [`SiteConfig::url`] | no |
//!
//! The binary loads a `.env` file from the working directory first, so these
//! can also live there. Variables already set in the process win over `.env`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const APP_STORE_URL_VAR: &str = "APP_STORE_URL";
pub const SITE_URL_VAR: &str = "SITE_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Model service credential. Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    #[serde(default = "default_articles_dir")]
    pub articles_dir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            articles_dir: default_articles_dir(),
            index_file: default_index_file(),
            include_globs: default_include_globs(),
            exclude_globs: default_exclude_globs(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./word-documents")
}
fn default_articles_dir() -> PathBuf {
    PathBuf::from("./articles")
}
fn default_index_file() -> PathBuf {
    PathBuf::from("./articles-data.json")
}
fn default_include_globs() -> Vec<String> {
    vec![
        "*.docx".to_string(),
        "*.txt".to_string(),
        "*.md".to_string(),
    ]
}
fn default_exclude_globs() -> Vec<String> {
    // Word lock files: ~$draft.docx
    vec!["~*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "default_app_store_url")]
    pub app_store_url: String,
    #[serde(default = "default_fallback_keywords")]
    pub fallback_keywords: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
            app_store_url: default_app_store_url(),
            fallback_keywords: default_fallback_keywords(),
        }
    }
}

fn default_site_name() -> String {
    "Lexa AI".to_string()
}
fn default_site_url() -> String {
    "https://lexalearn.app".to_string()
}
fn default_app_store_url() -> String {
    "https://apps.apple.com/us/app/lexa-ai-learn-languages/id6754065379".to_string()
}
fn default_fallback_keywords() -> String {
    "language learning, AI tutor, learn languages".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_split_temperature")]
    pub split_temperature: f32,
    #[serde(default = "default_split_max_tokens")]
    pub split_max_tokens: u32,
    #[serde(default = "default_article_temperature")]
    pub article_temperature: f32,
    #[serde(default = "default_article_max_tokens")]
    pub article_max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            split_temperature: default_split_temperature(),
            split_max_tokens: default_split_max_tokens(),
            article_temperature: default_article_temperature(),
            article_max_tokens: default_article_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_split_temperature() -> f32 {
    0.3
}
fn default_split_max_tokens() -> u32 {
    12_000
}
fn default_article_temperature() -> f32 {
    0.7
}
fn default_article_max_tokens() -> u32 {
    6_000
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Marker phrase that, followed by a number, separates articles.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,
    /// How much of an undelimited document is sent for model-assisted splitting.
    #[serde(default = "default_split_prefix_chars")]
    pub split_prefix_chars: usize,
    #[serde(default = "default_article_delay_ms")]
    pub article_delay_ms: u64,
    #[serde(default = "default_document_delay_ms")]
    pub document_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            min_document_chars: default_min_document_chars(),
            split_prefix_chars: default_split_prefix_chars(),
            article_delay_ms: default_article_delay_ms(),
            document_delay_ms: default_document_delay_ms(),
        }
    }
}

fn default_delimiter() -> String {
    "lexa article".to_string()
}
fn default_min_document_chars() -> usize {
    100
}
fn default_split_prefix_chars() -> usize {
    15_000
}
fn default_article_delay_ms() -> u64 {
    1_000
}
fn default_document_delay_ms() -> u64 {
    3_000
}

impl Config {
    /// Returns the model service credential or fails with setup instructions.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!(
                "{} is not set. Add `{}=<key>` to a .env file in the working directory \
                 or export it before running this command; keys are issued at \
                 https://platform.openai.com/api-keys",
                API_KEY_VAR,
                API_KEY_VAR
            ),
        }
    }

    /// Applies environment overrides through a lookup function so tests can
    /// supply a fixed environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(APP_STORE_URL_VAR).filter(|v| !v.is_empty()) {
            self.site.app_store_url = url;
        }
        if let Some(url) = lookup(SITE_URL_VAR).filter(|v| !v.is_empty()) {
            self.site.url = url;
        }
    }
}

/// Loads configuration from `path`.
///
/// When `required` is false and the file does not exist, defaults are used.
/// Environment overrides are applied in both cases.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    let mut config = if path.exists() || required {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok());
    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

fn validate(config: &Config) -> Result<()> {
    if config.pipeline.delimiter.trim().is_empty() {
        bail!("pipeline.delimiter must not be empty");
    }
    if config.pipeline.split_prefix_chars == 0 {
        bail!("pipeline.split_prefix_chars must be > 0");
    }
    if config.site.name.trim().is_empty() {
        bail!("site.name must not be empty");
    }
    if !(0.0..=2.0).contains(&config.llm.split_temperature)
        || !(0.0..=2.0).contains(&config.llm.article_temperature)
    {
        bail!("llm temperatures must be in [0.0, 2.0]");
    }
    if config.paths.include_globs.is_empty() {
        bail!("paths.include_globs must list at least one pattern");
    }
    Ok(())
}
