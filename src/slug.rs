//! URL-safe slugs.
//!
//! A slug is lowercase ASCII alphanumerics separated by single hyphens, with
//! no leading or trailing hyphen. Accented Latin letters are transliterated by
//! Unicode compatibility decomposition (`é` → `e`); everything else that is
//! not alphanumeric becomes a separator.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        let mapped: &str = match c {
            'ß' => "ss",
            'æ' | 'Æ' => "ae",
            'œ' | 'Œ' => "oe",
            'ø' | 'Ø' => "o",
            'đ' | 'Đ' => "d",
            'ł' | 'Ł' => "l",
            '&' => "and",
            _ => "",
        };

        if !mapped.is_empty() {
            push_word(&mut slug, &mut pending_hyphen, mapped);
        } else if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            // Apostrophes join: "don't" → "dont".
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn push_word(slug: &mut String, pending_hyphen: &mut bool, word: &str) {
    if *pending_hyphen && !slug.is_empty() {
        slug.push('-');
    }
    *pending_hyphen = false;
    slug.push_str(word);
}

/// Returns true when `value` is already a well-formed slug.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty() && slugify(value) == value
}
