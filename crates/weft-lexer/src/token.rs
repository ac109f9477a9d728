//! Token definitions for annotation bodies and the annotation token stream

use std::fmt;

use logos::Logos;
use weft_ast::{
    ConfigurationAnnotation, InjectableType, ParameterAnnotation, ReferenceAnnotation,
    RegisterAnnotation, Span,
};

/// Lexemes of an annotation body, the text after `weaver:`
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
pub enum TokenKind {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9]+")]
    Int,

    // === Operators ===
    #[token("<-")]
    Arrow,
    #[token("<=")]
    ParamArrow,
    #[token("=")]
    Eq,
    #[token("&")]
    Amp,
    #[token("?")]
    Question,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // === Delimiters ===
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Anything else, kept so raw values can still be sliced out
    Error,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Arrow => "'<-'",
            TokenKind::ParamArrow => "'<='",
            TokenKind::Eq => "'='",
            TokenKind::Amp => "'&'",
            TokenKind::Question => "'?'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Error => "unknown character",
        }
    }
}

/// One element of the annotation token stream
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationToken {
    Register(RegisterAnnotation),
    Reference(ReferenceAnnotation),
    Parameter(ParameterAnnotation),
    /// Scope annotations are configuration annotations on the `scope` attribute
    Configuration(ConfigurationAnnotation),
    Import(String),
    InjectableType(InjectableType),
    EndOfInjectableType,
    AnyDeclaration,
    EndOfAnyDeclaration,
}

impl AnnotationToken {
    pub fn describe(&self) -> &'static str {
        match self {
            AnnotationToken::Register(_) => "registration",
            AnnotationToken::Reference(_) => "reference",
            AnnotationToken::Parameter(_) => "parameter",
            AnnotationToken::Configuration(_) => "configuration",
            AnnotationToken::Import(_) => "import",
            AnnotationToken::InjectableType(_) => "type declaration",
            AnnotationToken::EndOfInjectableType => "end of type declaration",
            AnnotationToken::AnyDeclaration => "declaration",
            AnnotationToken::EndOfAnyDeclaration => "end of declaration",
        }
    }
}

impl fmt::Display for AnnotationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationToken::Register(annotation) => {
                write!(f, "{} = {}", annotation.name, annotation.concrete_type)?;
                if let Some(abstract_type) = &annotation.abstract_type {
                    write!(f, " <- {}", abstract_type)?;
                }
                Ok(())
            }
            AnnotationToken::Reference(annotation) => {
                let types: Vec<String> = annotation.types.iter().map(ToString::to_string).collect();
                write!(f, "{} <- {}", annotation.name, types.join(" & "))
            }
            AnnotationToken::Parameter(annotation) => {
                write!(f, "{} <= {}", annotation.name, annotation.ty)
            }
            AnnotationToken::Configuration(annotation) => {
                write!(f, "{}.{}", annotation.target, annotation.attribute)
            }
            AnnotationToken::Import(module) => write!(f, "import {}", module),
            AnnotationToken::InjectableType(header) => {
                write!(f, "{} {} {{", header.access_level.as_str(), header.ty)
            }
            AnnotationToken::EndOfInjectableType => f.write_str("_ }"),
            AnnotationToken::AnyDeclaration => f.write_str("{"),
            AnnotationToken::EndOfAnyDeclaration => f.write_str("}"),
        }
    }
}

/// A token with its span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: AnnotationToken,
    pub span: Span,
}

impl Token {
    pub fn new(kind: AnnotationToken, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}[{}] - at line: {}",
            self.kind, self.span.offset, self.span.length, self.span.line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::TypeIdentity;

    fn kinds(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source)
            .map(|result| result.unwrap_or(TokenKind::Error))
            .collect()
    }

    #[test]
    fn test_arrows_are_not_split() {
        assert_eq!(
            kinds("api <- API"),
            vec![TokenKind::Ident, TokenKind::Arrow, TokenKind::Ident]
        );
        assert_eq!(
            kinds("id <= Int"),
            vec![TokenKind::Ident, TokenKind::ParamArrow, TokenKind::Ident]
        );
    }

    #[test]
    fn test_generic_type_lexemes() {
        assert_eq!(
            kinds("Store<Key,Value>?"),
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Question,
            ]
        );
    }

    #[test]
    fn test_unknown_characters_become_errors() {
        assert_eq!(kinds("\"x\""), vec![TokenKind::Error, TokenKind::Ident, TokenKind::Error]);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new(
            AnnotationToken::Reference(ReferenceAnnotation {
                name: "api".to_string(),
                types: vec![TypeIdentity::new("A"), TypeIdentity::new("B")],
            }),
            Span::new(12, 20, 1),
        );
        assert_eq!(token.to_string(), "api <- A & B - 12[20] - at line: 1");
    }
}
