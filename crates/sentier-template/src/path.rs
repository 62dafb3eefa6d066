//! Request path normalization and tokenization.

use percent_encoding::percent_decode_str;

/// Normalize a request path: strip trailing slashes, collapse double slashes.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    let mut prev_slash = false;

    if !path.starts_with('/') {
        normalized.push('/');
        prev_slash = true;
    }

    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                normalized.push('/');
            }
            prev_slash = true;
        } else {
            normalized.push(ch);
            prev_slash = false;
        }
    }

    // Strip trailing slash (but keep root "/")
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// A request path split into percent-decoded segments.
///
/// `/api/Products/5` yields `["api", "Products", "5"]`; `/` and the empty
/// string yield no segments at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTokens {
    segments: Vec<String>,
}

impl PathTokens {
    pub fn new(path: &str) -> Self {
        let normalized = normalize_path(path);
        let segments = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Segments from `start` to the end, joined with `/`.
    pub fn remainder(&self, start: usize) -> String {
        self.segments
            .get(start..)
            .map(|rest| rest.join("/"))
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}
