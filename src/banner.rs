//! Back-filling the mobile download banner into existing pages.
//!
//! Pages rendered before the banner existed are patched in place: the banner
//! block goes right before the last `</body>`. Pages that already carry the
//! banner are left untouched, so running the command twice is harmless.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::{Config, SiteConfig};
use crate::rebuild::html_files;
use crate::render::{mobile_banner, BANNER_MARKER};

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerPatch {
    Added(String),
    AlreadyPresent,
    NoBodyTag,
}

/// Inserts the banner into page text.
pub fn insert_banner(html: &str, site: &SiteConfig) -> BannerPatch {
    if html.contains(BANNER_MARKER) {
        return BannerPatch::AlreadyPresent;
    }
    let Some(pos) = html.rfind("</body>") else {
        return BannerPatch::NoBodyTag;
    };

    let (head, tail) = html.split_at(pos);
    let mut patched = String::with_capacity(html.len() + 2048);
    patched.push_str(head.trim_end());
    patched.push_str("\n\n");
    patched.push_str(&mobile_banner(site));
    patched.push_str(tail);
    BannerPatch::Added(patched)
}

#[derive(Debug, Clone, Default)]
pub struct BannerReport {
    pub added: Vec<PathBuf>,
    pub already_present: Vec<PathBuf>,
    pub no_body_tag: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Patches every page in `dir` that lacks the banner.
pub fn add_banners(dir: &Path, site: &SiteConfig) -> Result<BannerReport> {
    let mut report = BannerReport::default();

    for path in html_files(dir)? {
        let html = match std::fs::read_to_string(&path) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not read page");
                report.failed.push((path, e.to_string()));
                continue;
            }
        };

        match insert_banner(&html, site) {
            BannerPatch::Added(patched) => match std::fs::write(&path, patched) {
                Ok(()) => report.added.push(path),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "could not write page");
                    report.failed.push((path, e.to_string()));
                }
            },
            BannerPatch::AlreadyPresent => report.already_present.push(path),
            BannerPatch::NoBodyTag => {
                tracing::warn!(path = %path.display(), "no </body> tag, banner not added");
                report.no_body_tag.push(path);
            }
        }
    }

    Ok(report)
}

/// `forge add-banner`
pub fn run_add_banner(config: &Config) -> Result<()> {
    let dir = &config.paths.articles_dir;
    if !dir.exists() {
        println!("Articles folder does not exist: {}", dir.display());
        return Ok(());
    }

    let report = add_banners(dir, &config.site)?;
    println!("add-banner");
    println!("  banner added: {}", report.added.len());
    println!("  already present: {}", report.already_present.len());
    if !report.no_body_tag.is_empty() {
        println!("  skipped, no </body>: {}", report.no_body_tag.len());
        for path in &report.no_body_tag {
            println!("    {}", path.display());
        }
    }
    if !report.failed.is_empty() {
        println!("  failed: {}", report.failed.len());
        for (path, error) in &report.failed {
            println!("    {}: {}", path.display(), error);
        }
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html>\n<body>\n    <p>Hi</p>\n</body>\n</html>";

    #[test]
    fn banner_goes_before_body_close() {
        let site = SiteConfig::default();
        let BannerPatch::Added(patched) = insert_banner(PAGE, &site) else {
            panic!("expected banner to be added");
        };
        let banner_at = patched.find(BANNER_MARKER).unwrap();
        let body_close = patched.rfind("</body>").unwrap();
        assert!(banner_at < body_close);
        assert!(patched.ends_with("</body>\n</html>"));
        assert!(patched.contains(&site.app_store_url));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let site = SiteConfig::default();
        let BannerPatch::Added(patched) = insert_banner(PAGE, &site) else {
            panic!("expected banner to be added");
        };
        assert_eq!(insert_banner(&patched, &site), BannerPatch::AlreadyPresent);
    }

    #[test]
    fn page_without_body_is_reported() {
        assert_eq!(
            insert_banner("<p>fragment</p>", &SiteConfig::default()),
            BannerPatch::NoBodyTag
        );
    }

    #[test]
    fn add_banners_patches_directory() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteConfig::default();
        std::fs::write(dir.path().join("a.html"), PAGE).unwrap();
        std::fs::write(dir.path().join("b.html"), "<p>fragment</p>").unwrap();

        let first = add_banners(dir.path(), &site).unwrap();
        assert_eq!(first.added.len(), 1);
        assert_eq!(first.no_body_tag.len(), 1);

        let second = add_banners(dir.path(), &site).unwrap();
        assert!(second.added.is_empty());
        assert_eq!(second.already_present.len(), 1);
    }
}
