//! # Article Forge CLI (`forge`)
//!
//! ## Usage
//!
//! ```bash
//! forge --config ./forge.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forge init` | Create the documents and articles folders |
//! | `forge generate` | Turn every source document into article pages |
//! | `forge split <file>` | Preview how one document would be split |
//! | `forge rebuild-index` | Rebuild `articles-data.json` from the pages |
//! | `forge add-banner` | Add the mobile download banner to older pages |
//! | `forge sample-doc` | Write a sample source document |
//!
//! `generate` and `split` call the model service and need `OPENAI_API_KEY`,
//! taken from the environment or a `.env` file in the working directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use article_forge::config;
use article_forge::progress::ProgressMode;
use article_forge::{banner, generate, rebuild, sample};

const DEFAULT_CONFIG: &str = "./forge.toml";

/// Article Forge: SEO article pages from word-processor documents.
#[derive(Parser)]
#[command(
    name = "forge",
    about = "Generate SEO article pages from word-processor documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./forge.toml`; built-in defaults are used when that file
    /// is absent. A path given explicitly must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr: `off`, `human`, or `json`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the documents and articles folders.
    Init,

    /// Split, rewrite and render every source document, then update the index.
    Generate {
        /// Only process the first N documents.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the drafts one document would be split into, without writing.
    Split {
        /// Source document (.docx, .txt or .md).
        file: PathBuf,
    },

    /// Rebuild the article index from the HTML pages.
    RebuildIndex,

    /// Insert the mobile download banner into pages that lack it.
    AddBanner,

    /// Write a sample source document into the documents folder.
    SampleDoc,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path, true)?,
        None => config::load_config(Path::new(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Commands::Init => {
            generate::run_init(&cfg)?;
        }
        Commands::Generate { limit } => {
            let reporter = ProgressMode::resolve(cli.progress).reporter();
            generate::run_generate(&cfg, reporter.as_ref(), limit).await?;
        }
        Commands::Split { file } => {
            generate::run_split_preview(&cfg, &file).await?;
        }
        Commands::RebuildIndex => {
            rebuild::run_rebuild_index(&cfg)?;
        }
        Commands::AddBanner => {
            banner::run_add_banner(&cfg)?;
        }
        Commands::SampleDoc => {
            sample::run_sample_doc(&cfg)?;
        }
    }

    Ok(())
}
