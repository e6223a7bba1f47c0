//! # Article Forge
//!
//! Turns word-processor documents into static SEO article pages for a
//! product marketing site.
//!
//! Each source document may hold several articles. They are separated on a
//! delimiter phrase (`lexa article 1`, `lexa article 2`, ...) or, failing that,
//! by asking a chat-completions model where the articles are. Every article
//! is then rewritten by the model into SEO-optimised HTML, rendered into a
//! full page, and recorded in a JSON index (`articles-data.json`) that the
//! site reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │ documents │──▶│ splitter │──▶│ processor │──▶│ renderer │──▶ <slug>.html
//! │ docx/txt  │   │ delim/LLM│   │   LLM     │   │  page    │
//! └───────────┘   └──────────┘   └───────────┘   └────┬─────┘
//!                                                     ▼
//!                          rebuild-index ──▶  articles-data.json
//! ```
//!
//! Model output is untrusted: every model step has a deterministic fallback,
//! so a run always produces pages for every readable document.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Core data types |
//! | [`documents`] | Source discovery and loading |
//! | [`extract`] | Text extraction from docx/txt/md |
//! | [`llm`] | Chat-completions client |
//! | [`payload`] | Tolerant parsing of model JSON |
//! | [`split`] | Article splitting |
//! | [`process`] | Article rewriting and fallback markup |
//! | [`slug`] | URL slugs |
//! | [`render`] | Page template |
//! | [`index`] | Index persistence and reconciliation |
//! | [`rebuild`] | Index recovery from pages |
//! | [`banner`] | Mobile banner back-fill |
//! | [`generate`] | Pipeline orchestration |
//! | [`sample`] | Sample source document |
//! | [`progress`] | Progress reporting |

pub mod banner;
pub mod config;
pub mod documents;
pub mod extract;
pub mod generate;
pub mod index;
pub mod llm;
pub mod models;
pub mod payload;
pub mod process;
pub mod progress;
pub mod rebuild;
pub mod render;
pub mod sample;
pub mod slug;
pub mod split;
