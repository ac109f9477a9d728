//! Parser error types

use thiserror::Error;
use weft_ast::{AttributeName, Diagnostic, FileLocation, Span};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("Unexpected token")]
    UnexpectedToken { location: FileLocation, span: Span },

    #[error("Unexpected EOF (End of file)")]
    UnexpectedEof { location: FileLocation },

    #[error("Unknown dependency: '{name}'")]
    UnknownDependency {
        name: String,
        location: FileLocation,
        span: Span,
    },

    #[error("Double dependency declaration: '{name}'")]
    DependencyDoubleDeclaration {
        name: String,
        location: FileLocation,
        span: Span,
    },

    #[error("Configuration attribute '{attribute}' was already set")]
    ConfigurationAttributeDoubleAssignation {
        attribute: AttributeName,
        location: FileLocation,
        span: Span,
    },
}

impl ParserError {
    pub fn location(&self) -> &FileLocation {
        match self {
            ParserError::UnexpectedToken { location, .. } => location,
            ParserError::UnexpectedEof { location } => location,
            ParserError::UnknownDependency { location, .. } => location,
            ParserError::DependencyDoubleDeclaration { location, .. } => location,
            ParserError::ConfigurationAttributeDoubleAssignation { location, .. } => location,
        }
    }

    /// Span of the offending token, if there was one
    pub fn span(&self) -> Option<Span> {
        match self {
            ParserError::UnexpectedToken { span, .. } => Some(*span),
            ParserError::UnexpectedEof { .. } => None,
            ParserError::UnknownDependency { span, .. } => Some(*span),
            ParserError::DependencyDoubleDeclaration { span, .. } => Some(*span),
            ParserError::ConfigurationAttributeDoubleAssignation { span, .. } => Some(*span),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.location().clone(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_format() {
        let error = ParserError::DependencyDoubleDeclaration {
            name: "api".to_string(),
            location: FileLocation::new("App.swift", 4),
            span: Span::new(40, 20, 4),
        };
        assert_eq!(
            error.to_diagnostic().to_string(),
            "App.swift:5: error: Double dependency declaration: 'api'."
        );
    }

    #[test]
    fn test_eof_has_no_line() {
        let error = ParserError::UnexpectedEof {
            location: FileLocation::file("App.swift"),
        };
        assert_eq!(error.span(), None);
        assert_eq!(
            error.to_diagnostic().to_string(),
            "App.swift:1: error: Unexpected EOF (End of file)."
        );
    }
}
