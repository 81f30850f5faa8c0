//! Slug generation helpers shared by the repositories.

use std::collections::HashSet;

/// Longest base kept when deriving letter slugs from titles.
const LETTER_SLUG_BASE_LEN: usize = 80;

/// Slugifies arbitrary text; input that slugifies to nothing (punctuation
/// only, emoji) falls back to `"item"` so slugs are never empty.
pub fn slugify(text: &str) -> String {
    let s = slug::slugify(text);
    if s.is_empty() {
        "item".to_string()
    } else {
        s
    }
}

/// Makes `base` unique against `taken` by appending `-2`, `-3`, ... as
/// needed. `base` is assumed to already be slug-shaped.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2u64;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Derives a letter slug from its title plus an 8-hex-char tail, truncating
/// the title part so the whole slug stays short enough for URLs.
pub fn letter_slug(title: &str, tail: &str) -> String {
    let mut base = slugify(title);
    if base.len() > LETTER_SLUG_BASE_LEN {
        base.truncate(LETTER_SLUG_BASE_LEN);
        // Never end the base on a dangling hyphen.
        while base.ends_with('-') {
            base.pop();
        }
    }
    format!("{base}-{tail}")
}

/// An 8-hex-char tail from a fresh UUID, used to keep letter slugs unique
/// without a lookup.
pub fn random_tail() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Central Bank of Examples"), "central-bank-of-examples");
        assert_eq!(slugify("!!!"), "item");
    }

    #[test]
    fn unique_slug_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("banks", &taken), "banks");
        taken.insert("banks".to_string());
        assert_eq!(unique_slug("banks", &taken), "banks-2");
        taken.insert("banks-2".to_string());
        assert_eq!(unique_slug("banks", &taken), "banks-3");
    }

    #[test]
    fn letter_slug_truncates_long_titles() {
        let title = "a ".repeat(200);
        let s = letter_slug(&title, "deadbeef");
        assert!(s.ends_with("-deadbeef"));
        assert!(s.len() <= LETTER_SLUG_BASE_LEN + 9);
        assert!(!s.trim_end_matches("-deadbeef").ends_with('-'));
    }

    #[test]
    fn random_tail_is_hex() {
        let tail = random_tail();
        assert_eq!(tail.len(), 8);
        assert!(tail.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
