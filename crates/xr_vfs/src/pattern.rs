//! Shell-style name filters over logical paths.
//!
//! The original tools filter with Unix shell wildcards; here a pattern is translated to an
//! anchored, case-insensitive regex once and reused for every candidate path. `*` matches any
//! run of characters (including separators, as the engine's own filters do), `?` matches one
//! character, everything else is literal. Patterns match against the normalized
//! (`/`-separated) form of a path.

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled glob filter
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push_str("(?i)^");
        for ch in pattern.chars() {
            match ch {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                '\\' | '/' => re.push('/'),
                _ => re.push_str(&regex::escape(&ch.to_string())),
            }
        }
        re.push('$');
        let regex = Regex::new(&re).map_err(|source| Error::Pattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(GlobPattern {
            raw: pattern.to_owned(),
            regex,
        })
    }

    /// The filter that accepts every path.
    pub fn match_all() -> Self {
        GlobPattern {
            raw: "*".to_owned(),
            regex: Regex::new("(?s).*").expect("static pattern"),
        }
    }

    /// The pattern as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a normalized path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}
