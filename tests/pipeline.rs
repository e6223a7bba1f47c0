//! Library-level pipeline tests with a scripted completion service.
//!
//! The service replays canned responses in order, so each test controls
//! exactly what the "model" says at every step.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use article_forge::config::Config;
use article_forge::generate::generate;
use article_forge::index::{read_index, reconcile, save_index};
use article_forge::llm::{CompletionRequest, CompletionService};
use article_forge::models::ArticleRecord;
use article_forge::progress::NoProgress;
use article_forge::rebuild::rebuild_index;

// ─── Scripted model ─────────────────────────────────────────────────

struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
    }
}

fn article_json(title: &str, slug: &str) -> Result<String> {
    Ok(serde_json::json!({
        "title": title,
        "slug": slug,
        "metaDescription": format!("All about {}", title),
        "keywords": ["spanish", "learning"],
        "targetKeyword": title.to_lowercase(),
        "htmlContent": format!("<h1>{}</h1><p>Body</p>", title),
    })
    .to_string())
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.documents_dir = root.join("word-documents");
    config.paths.articles_dir = root.join("articles");
    config.paths.index_file = root.join("articles-data.json");
    config.pipeline.article_delay_ms = 0;
    config.pipeline.document_delay_ms = 0;
    config
}

fn write_document(config: &Config, name: &str, text: &str) {
    std::fs::create_dir_all(&config.paths.documents_dir).unwrap();
    std::fs::write(config.paths.documents_dir.join(name), text).unwrap();
}

fn long_text(topic: &str) -> String {
    format!("{}\n\n{}", topic, "Practice a little every day. ".repeat(10))
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delimited_document_skips_model_split() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let text = format!(
        "Editor notes\nlexa article 1\n{}\nLexa Article 2\n{}",
        long_text("Intro"),
        long_text("Outro")
    );
    write_document(&config, "guide.txt", &text);

    let model = ScriptedModel::new(vec![
        article_json("Spanish Intro Guide", "spanish-intro-guide"),
        article_json("Spanish Outro Guide", "spanish-outro-guide"),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();

    assert_eq!(model.calls(), 2);
    assert_eq!(report.articles_generated(), 2);
    assert_eq!(report.split_fallbacks(), 0);
    assert_eq!(report.article_fallbacks(), 0);

    let index = read_index(&config.paths.index_file).unwrap();
    let slugs: Vec<&str> = index.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["spanish-intro-guide", "spanish-outro-guide"]);
    assert_eq!(index[0].keywords, "spanish, learning");
    assert!(config.paths.articles_dir.join("spanish-intro-guide.html").exists());
}

#[tokio::test]
async fn undelimited_document_uses_model_split() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    write_document(&config, "mixed.txt", &long_text("Two topics in one file"));

    let split = serde_json::json!({
        "articles": [
            {"targetKeyword": "learn spanish", "title": "Learn Spanish", "content": "Spanish body"},
            {"targetKeyword": "learn french", "title": "Learn French", "content": "French body"}
        ]
    })
    .to_string();
    let model = ScriptedModel::new(vec![
        Ok(format!("```json\n{}\n```", split)),
        article_json("Learn Spanish", "Learn Spanish Now!"),
        article_json("Learn French", "learn-french"),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();

    assert_eq!(model.calls(), 3);
    assert_eq!(report.articles_generated(), 2);
    let index = read_index(&config.paths.index_file).unwrap();
    assert_eq!(index[0].slug, "learn-spanish-now");
    assert_eq!(index[1].slug, "learn-french");
}

#[tokio::test]
async fn failed_model_split_uses_whole_document() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    write_document(&config, "Travel Phrases.txt", &long_text("Travel phrases"));

    let model = ScriptedModel::new(vec![
        Ok("I could not find any articles, sorry.".to_string()),
        article_json("Travel Phrases for Beginners", "travel-phrases"),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();

    assert_eq!(report.split_fallbacks(), 1);
    assert_eq!(report.articles_generated(), 1);
    let index = read_index(&config.paths.index_file).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].slug, "travel-phrases");
}

#[tokio::test]
async fn malformed_article_response_falls_back() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let text = format!(
        "lexa article 1\n{}\nlexa article 2\n{}",
        long_text("Grammar Basics"),
        long_text("Listening Drills")
    );
    write_document(&config, "doc.txt", &text);

    let model = ScriptedModel::new(vec![
        Ok("{\"title\": \"Broken".to_string()),
        Ok("{\"title\": \"No slug\", \"htmlContent\": \"<p>x</p>\"}".to_string()),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();

    assert_eq!(report.article_fallbacks(), 2);
    let index = read_index(&config.paths.index_file).unwrap();
    assert_eq!(index[0].slug, "grammar-basics");
    assert_eq!(index[1].slug, "listening-drills");
    let page =
        std::fs::read_to_string(config.paths.articles_dir.join("grammar-basics.html")).unwrap();
    assert!(page.contains("article-cta"));
    assert!(page.contains(&config.site.app_store_url));
}

#[tokio::test]
async fn existing_entries_win_and_duplicates_collapse() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let existing = vec![ArticleRecord {
        title: "Hand Written".to_string(),
        slug: "shared-slug".to_string(),
        description: "kept".to_string(),
        keywords: String::new(),
        target_topic: "hand written".to_string(),
    }];
    save_index(&config.paths.index_file, &existing).unwrap();

    let text = format!(
        "lexa article 1\n{}\nlexa article 2\n{}\nlexa article 3\n{}",
        long_text("One"),
        long_text("Two"),
        long_text("Three")
    );
    write_document(&config, "doc.txt", &text);
    let model = ScriptedModel::new(vec![
        article_json("Shared", "shared-slug"),
        article_json("Fresh", "fresh-slug"),
        article_json("Fresh Again", "fresh-slug"),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();

    assert_eq!(report.index_existing, 1);
    assert_eq!(report.index_appended, 1);
    assert_eq!(report.index_skipped, 2);

    let index = read_index(&config.paths.index_file).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index[0], existing[0]);
    assert_eq!(index[1].title, "Fresh");

    assert_eq!(report.duplicates_skipped(), 2);
    assert!(!config.paths.articles_dir.join("shared-slug.html").exists());
    let page =
        std::fs::read_to_string(config.paths.articles_dir.join("fresh-slug.html")).unwrap();
    assert!(page.contains("<title>Fresh | Lexa AI</title>"));
}

#[tokio::test]
async fn repeated_slug_keeps_pages_and_index_in_agreement() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let first = format!(
        "lexa article 1\n{}\nlexa article 2\n{}",
        long_text("Fresh"),
        long_text("Fresh Again")
    );
    write_document(&config, "a.txt", &first);
    let second = format!(
        "lexa article 1\n{}\nlexa article 2\n{}",
        long_text("Other"),
        long_text("Fresh Once More")
    );
    write_document(&config, "b.txt", &second);

    let model = ScriptedModel::new(vec![
        article_json("Fresh", "fresh-slug"),
        article_json("Fresh Again", "fresh-slug"),
        article_json("Other", "other-slug"),
        article_json("Fresh Once More", "Fresh Slug"),
    ]);
    let report = generate(&config, &model, &NoProgress, None).await.unwrap();
    assert_eq!(report.articles_generated(), 2);
    assert_eq!(report.duplicates_skipped(), 2);
    assert_eq!(report.documents_failed(), 0);

    let index = read_index(&config.paths.index_file).unwrap();
    let rebuilt = rebuild_index(&config.paths.articles_dir, &config.site.name).unwrap();
    let mut indexed: Vec<(String, String)> =
        index.iter().map(|r| (r.slug.clone(), r.title.clone())).collect();
    indexed.sort();
    let on_disk: Vec<(String, String)> = rebuilt
        .records
        .iter()
        .map(|r| (r.slug.clone(), r.title.clone()))
        .collect();
    assert_eq!(indexed, on_disk);
    assert_eq!(
        on_disk,
        vec![
            ("fresh-slug".to_string(), "Fresh".to_string()),
            ("other-slug".to_string(), "Other".to_string()),
        ]
    );
}

#[tokio::test]
async fn limit_caps_documents() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    for name in ["a", "b"] {
        let text = format!(
            "lexa article 1\n{}\nlexa article 2\n{}",
            long_text(&format!("{} first", name)),
            long_text(&format!("{} second", name))
        );
        write_document(&config, &format!("{}.txt", name), &text);
    }

    let model = ScriptedModel::new(Vec::new());
    let report = generate(&config, &model, &NoProgress, Some(1)).await.unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].file_name, "a.txt");
    assert_eq!(report.articles_generated(), 2);
}

#[tokio::test]
async fn rebuild_agrees_with_generated_index() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let text = format!(
        "lexa article 1\n{}\nlexa article 2\n{}",
        long_text("Ser vs Estar"),
        long_text("Food & Drink Vocabulary")
    );
    write_document(&config, "doc.txt", &text);

    let model = ScriptedModel::new(vec![
        article_json("Ser vs Estar: \"To Be\" Explained", "ser-vs-estar"),
        article_json("Food & Drink Vocabulary", "food-drink-vocabulary"),
    ]);
    generate(&config, &model, &NoProgress, None).await.unwrap();
    let mut generated = read_index(&config.paths.index_file).unwrap();
    generated.sort_by(|a, b| a.slug.cmp(&b.slug));

    let rebuilt = rebuild_index(&config.paths.articles_dir, &config.site.name).unwrap();
    assert!(rebuilt.failures.is_empty());
    assert_eq!(rebuilt.records.len(), generated.len());
    for (r, g) in rebuilt.records.iter().zip(&generated) {
        assert_eq!(r.slug, g.slug);
        assert_eq!(r.title, g.title);
        assert_eq!(r.description, g.description);
        assert_eq!(r.keywords, g.keywords);
    }

    // Reconciling the rebuilt index with itself changes nothing.
    let again = reconcile(rebuilt.records.clone(), rebuilt.records.clone());
    assert_eq!(again.index, rebuilt.records);
    assert_eq!(again.appended, 0);
}
