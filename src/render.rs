//! Page rendering.
//!
//! Pure string templating: a [`GeneratedArticle`] plus site settings become a
//! complete HTML document. The head carries the tags the index rebuilder
//! reads back (`<title>… | Site</title>`, description and keywords meta),
//! Open Graph and Twitter tags mirroring them, and the canonical URL.

use crate::config::SiteConfig;
use crate::models::GeneratedArticle;

/// Class name that identifies the mobile download banner in a page.
pub const BANNER_MARKER: &str = "mobile-download-banner";

/// Escapes text for use in HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Reverses [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Call-to-action block placed inside article bodies.
pub fn call_to_action(app_store_url: &str, label: &str) -> String {
    format!(
        r#"<div class="article-cta">
  <a class="cta-button" href="{}" target="_blank" rel="noopener noreferrer">{}</a>
</div>"#,
        escape_html(app_store_url),
        escape_html(label)
    )
}

/// Sticky mobile download banner and its dismiss script.
///
/// Ends just before `</body>`; callers append the closing tags.
pub fn mobile_banner(site: &SiteConfig) -> String {
    format!(
        r#"    <!-- Mobile Download Banner (sticky on mobile) -->
    <div class="{marker}" id="mobileBanner">
        <button class="close-banner" onclick="closeBanner()" aria-label="Close banner">×</button>
        <div class="banner-content">
            <div class="banner-text">
                <h4>Start Learning Today</h4>
                <p>Download {name} and practice speaking!</p>
            </div>
            <div class="banner-button">
                <a class="cta-button" href="{store}" target="_blank" rel="noopener noreferrer">Download</a>
            </div>
        </div>
    </div>

    <script>
        function closeBanner() {{
            const banner = document.getElementById('mobileBanner');
            if (banner) {{
                banner.style.display = 'none';
                localStorage.setItem('bannerClosed', Date.now());
            }}
        }}

        // Hidden for 24 hours after being dismissed.
        window.addEventListener('DOMContentLoaded', function() {{
            const bannerClosed = localStorage.getItem('bannerClosed');
            if (bannerClosed) {{
                const timeSinceClosed = Date.now() - parseInt(bannerClosed);
                if (timeSinceClosed < 24 * 60 * 60 * 1000) {{
                    const banner = document.getElementById('mobileBanner');
                    if (banner) banner.style.display = 'none';
                }}
            }}
        }});
    </script>
"#,
        marker = BANNER_MARKER,
        name = escape_html(&site.name),
        store = escape_html(&site.app_store_url),
    )
}

/// Canonical URL of an article page.
pub fn canonical_url(site: &SiteConfig, slug: &str) -> String {
    format!("{}/articles/{}.html", site.url.trim_end_matches('/'), slug)
}

/// Renders the full page for `article`. `year` is used in the footer notice.
pub fn render_page(article: &GeneratedArticle, site: &SiteConfig, year: i32) -> String {
    let record = &article.record;
    let title = escape_html(&record.title);
    let description = escape_html(&record.description);
    let keywords = escape_html(&record.keywords);
    let canonical = escape_html(&canonical_url(site, &record.slug));
    let name = escape_html(&site.name);
    let banner = mobile_banner(site);
    let body = &article.html_content;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | {name}</title>
    <meta name="description" content="{description}">
    <meta name="keywords" content="{keywords}">

    <!-- Open Graph tags for social sharing -->
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:url" content="{canonical}">
    <meta property="og:type" content="article">

    <!-- Twitter Card tags -->
    <meta name="twitter:card" content="summary_large_image">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{description}">

    <link rel="canonical" href="{canonical}">

    <link rel="stylesheet" href="../styles.css">
    <link rel="stylesheet" href="../article-styles.css">
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap" rel="stylesheet">
</head>
<body>
    <nav class="navbar">
        <div class="nav-container">
            <div class="nav-logo">
                <h2><a href="../index.html" style="color: inherit; text-decoration: none;">{name}</a></h2>
            </div>
            <div class="nav-links">
                <a href="../index.html#features">Features</a>
                <a href="../articles.html">Articles</a>
                <a href="../terms.html">Terms</a>
                <a href="../privacy.html">Privacy</a>
            </div>
        </div>
    </nav>

    <article class="article-container">
        <div class="article-content">
            {body}
        </div>

        <aside class="article-sidebar">
            <h3>More Articles</h3>
            <ul class="related-articles">
                <li><a href="../articles.html">View All Articles</a></li>
                <li><a href="../index.html">Back to Home</a></li>
            </ul>
        </aside>
    </article>

    <footer class="footer">
        <div class="container">
            <div class="footer-content">
                <div class="footer-section">
                    <h3>{name}</h3>
                    <p>AI-powered language learning through natural conversations.</p>
                </div>
                <div class="footer-section">
                    <h4>Product</h4>
                    <ul>
                        <li><a href="../index.html#features">Features</a></li>
                        <li><a href="../articles.html">Articles</a></li>
                    </ul>
                </div>
                <div class="footer-section">
                    <h4>Legal</h4>
                    <ul>
                        <li><a href="../terms.html">Terms of Service</a></li>
                        <li><a href="../privacy.html">Privacy Policy</a></li>
                    </ul>
                </div>
            </div>
            <div class="footer-bottom">
                <p>&copy; {year} {name}. All rights reserved.</p>
            </div>
        </div>
    </footer>

{banner}</body>
</html>"#
    )
}
