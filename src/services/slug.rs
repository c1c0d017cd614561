use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase, replace every non-alphanumeric run with a single hyphen and
/// trim hyphens from both ends.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let replaced = NON_ALNUM.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Disambiguate a taken slug by appending the current unix timestamp.
pub fn with_timestamp_suffix(slug: &str) -> String {
    format!("{}-{}", slug, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --Promo  50% Off--  "), "promo-50-off");
        assert_eq!(slugify("Ramen & Sushi"), "ramen-sushi");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn suffix_produces_distinct_slug() {
        let suffixed = with_timestamp_suffix("hello-world");
        assert!(suffixed.starts_with("hello-world-"));
        assert_ne!(suffixed, "hello-world");
    }
}
