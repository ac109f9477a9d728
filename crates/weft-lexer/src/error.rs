//! Lexer error types

use std::fmt;

use thiserror::Error;
use weft_ast::{AttributeName, AttributeTarget, Diagnostic, FileLocation};

/// Why an annotation line was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid annotation: '{0}'")]
    InvalidAnnotation(String),

    #[error("Invalid scope: '{0}'")]
    InvalidScope(String),

    #[error("Invalid configuration attribute value: '{value}'. Expected '{expected}'")]
    InvalidConfigurationAttributeValue { value: String, expected: String },

    #[error("Can't assign configuration attribute '{name}' on '{target}'")]
    InvalidConfigurationAttributeTarget {
        name: AttributeName,
        target: AttributeTarget,
    },

    #[error("Unknown configuration attribute: '{0}'")]
    UnknownConfigurationAttribute(String),
}

/// A [`TokenError`] tagged with the file and line it was found on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct LexerError {
    pub kind: TokenError,
    pub location: FileLocation,
    /// Byte offset of the offending annotation
    pub offset: usize,
}

impl LexerError {
    pub fn new(kind: TokenError, location: FileLocation, offset: usize) -> Self {
        Self {
            kind,
            location,
            offset,
        }
    }

    pub fn location(&self) -> &FileLocation {
        &self.location
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.location.clone(), self.kind.to_string())
    }
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_diagnostic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_renders_like_a_compiler() {
        let error = LexerError::new(
            TokenError::InvalidScope("forever".to_string()),
            FileLocation::new("App.swift", 9),
            120,
        );
        assert_eq!(error.to_string(), "App.swift:10: error: Invalid scope: 'forever'.");
        assert_eq!(error.to_diagnostic().to_string(), error.to_string());
    }

    #[test]
    fn test_invalid_target_message() {
        let kind = TokenError::InvalidConfigurationAttributeTarget {
            name: AttributeName::IsIsolated,
            target: AttributeTarget::Dependency("api".to_string()),
        };
        assert_eq!(kind.to_string(), "Can't assign configuration attribute 'isIsolated' on 'api'");
    }
}
