//! Source location tracking

use std::fmt;

use serde::{Deserialize, Serialize};

/// A span representing a token's position in its source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Zero-based line of `offset`
    pub line: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize, line: usize) -> Self {
        Self {
            offset,
            length,
            line,
        }
    }

    pub fn dummy() -> Self {
        Self {
            offset: 0,
            length: 0,
            line: 0,
        }
    }

    /// Byte offset of the end (exclusive)
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

/// A value with an associated span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}

/// A file + line pair, as surfaced in diagnostics.
///
/// Lines are stored zero-based and printed one-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl FileLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
        }
    }

    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}", file, line + 1),
            (Some(file), None) => write!(f, "{}:1", file),
            (None, _) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_prints_one_based_line() {
        assert_eq!(FileLocation::new("a.swift", 0).to_string(), "a.swift:1");
        assert_eq!(FileLocation::new("a.swift", 41).to_string(), "a.swift:42");
        assert_eq!(FileLocation::file("a.swift").to_string(), "a.swift:1");
        assert_eq!(FileLocation::unknown().to_string(), "");
    }

    #[test]
    fn test_span_end() {
        assert_eq!(Span::new(10, 5, 2).end(), 15);
    }
}
