//! `forge sample-doc`: a ready-made source document for trying the pipeline.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const SAMPLE_FILE_NAME: &str = "sample-articles.txt";

/// Builds the sample text with two articles separated by `delimiter`.
pub fn sample_text(delimiter: &str) -> String {
    format!(
        "Notes for the content team. Everything above the first marker is ignored.\n\
         \n\
         {delimiter} 1\n\
         How to Learn Spanish Vocabulary Faster\n\
         \n\
         Spaced repetition is the most reliable way to keep new words. Review a word \
         the day you meet it, again two days later, then after a week.\n\
         \n\
         Tips that work:\n\
         Learn words in short phrases rather than alone.\n\
         Say every new word out loud.\n\
         \n\
         {delimiter} 2\n\
         Speaking Practice Without a Partner\n\
         \n\
         You do not need a conversation partner to practise speaking. Shadow short \
         audio clips, describe your day out loud, and record yourself once a week to \
         hear your progress.\n"
    )
}

/// Writes the sample document into `dir`, creating the folder if needed.
pub fn write_sample_document(dir: &Path, delimiter: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create folder: {}", dir.display()))?;
    let path = dir.join(SAMPLE_FILE_NAME);
    std::fs::write(&path, sample_text(delimiter))
        .with_context(|| format!("Failed to write sample document: {}", path.display()))?;
    Ok(path)
}

pub fn run_sample_doc(config: &Config) -> Result<()> {
    let path = write_sample_document(&config.paths.documents_dir, &config.pipeline.delimiter)?;
    println!("Sample document written: {}", path.display());
    println!("  Run `forge generate` to turn it into articles.");
    Ok(())
}
