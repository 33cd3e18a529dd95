use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

pub fn normalize(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub const LIMIT_TAG: usize = 32;
pub const LIMIT_INGREDIENT: usize = 128;

/// Non-blank and at most `limit` characters.
pub fn fits(value: &str, limit: usize) -> bool {
    !value.is_empty() && value.chars().count() <= limit
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub fn progress_bar(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::{LIMIT_TAG, fits, is_remote, normalize};

    #[test]
    fn test_basic() {
        assert_eq!(normalize("flour"), "flour");
        assert_eq!(normalize("Wheat Flour"), "Wheat Flour");
    }

    #[test]
    fn test_leading_trailing_spaces() {
        assert_eq!(normalize("   eggs   "), "eggs");
        assert_eq!(normalize("  brown   sugar  "), "brown sugar");
    }

    #[test]
    fn test_tabs_and_newlines() {
        assert_eq!(normalize("olive\toil"), "olive oil");
        assert_eq!(normalize("sea\n salt"), "sea salt");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("     "), "");
    }

    #[test]
    fn test_remote_sources() {
        assert!(is_remote("https://example.com/ingredients.json"));
        assert!(is_remote("http://localhost/tags.json"));
        assert!(!is_remote("data/ingredients.json"));
    }

    #[test]
    fn test_fits() {
        assert!(fits("breakfast", LIMIT_TAG));
        assert!(fits(&"é".repeat(LIMIT_TAG), LIMIT_TAG));
        assert!(!fits(&"a".repeat(LIMIT_TAG + 1), LIMIT_TAG));
        assert!(!fits("", LIMIT_TAG));
    }
}
