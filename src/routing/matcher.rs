//! Route matching logic.
//!
//! # Responsibilities
//! - Match a path prefix case-insensitively
//! - Only accept matches that end on a segment boundary
//! - Strip the matched prefix to produce the upstream path
//!
//! # Design Decisions
//! - ASCII case folding only; prefixes are plain path segments
//! - No regex to guarantee O(n) matching

/// Matches and strips a request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing slash is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the remainder of `path` after the prefix, if it matches.
    ///
    /// The remainder is empty or starts with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return path.starts_with('/').then_some(path);
        }
        let head = path.get(..self.prefix.len())?;
        if !head.eq_ignore_ascii_case(&self.prefix) {
            return None;
        }
        let rest = &path[self.prefix.len()..];
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }

    /// Returns true if the path matches this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}
