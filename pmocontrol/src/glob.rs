//! Shell-style wildcard matching on titles and friendly names.
//!
//! `*`, `?`, `[...]` and `{a,b}` follow globset's syntax; `/` is not
//! special, a pattern always matches one whole name.

use globset::{GlobBuilder, GlobMatcher};

/// Compiled name pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    matcher: GlobMatcher,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(false)
            .backslash_escape(true)
            .build()?
            .compile_matcher();
        Ok(Self {
            source: pattern.to_string(),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }
}

/// One-shot match; an invalid pattern only matches itself literally.
pub fn matches_glob(pattern: &str, candidate: &str) -> bool {
    match GlobPattern::new(pattern) {
        Ok(glob) => glob.is_match(candidate),
        Err(_) => pattern == candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_and_question_mark() {
        assert!(matches_glob("Living*", "Living Room"));
        assert!(matches_glob("Disc ?", "Disc 2"));
        assert!(!matches_glob("Disc ?", "Disc 10"));
        assert!(matches_glob("*", ""));
    }

    #[test]
    fn character_classes() {
        assert!(matches_glob("Track [0-9][0-9]", "Track 07"));
        assert!(!matches_glob("Track [0-9][0-9]", "Track A7"));
        assert!(matches_glob("[!a]*", "bcd"));
    }

    #[test]
    fn slash_is_an_ordinary_character() {
        assert!(matches_glob("AC*DC", "AC/DC"));
    }

    #[test]
    fn not_a_regular_expression() {
        assert!(!matches_glob("a.c", "abc"));
        assert!(matches_glob("a.c", "a.c"));
    }

    #[test]
    fn matching_is_whole_name() {
        assert!(!matches_glob("Room", "Living Room"));
    }

    #[test]
    fn invalid_pattern_falls_back_to_equality() {
        assert!(matches_glob("[abc", "[abc"));
        assert!(!matches_glob("[abc", "a"));
    }
}
