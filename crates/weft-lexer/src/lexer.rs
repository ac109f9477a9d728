//! Turns declaration records and comment lines into an ordered token stream

use log::{debug, trace};
use weft_ast::{FileLocation, InjectableType, Span};

use crate::grammar::{annotation, parse_type_name, property_attribute};
use crate::{AnnotationToken, DeclarationRecord, LexerError, Token, TokenError};

/// Annotation prefix used when none is configured
pub const DEFAULT_SENTINEL: &str = "weaver";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    /// Annotation prefix, written `<sentinel>:` in comments
    pub sentinel: String,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    offset: usize,
    text: &'a str,
}

/// Resolves offsets to lines, only ever moving forward
struct LineCursor<'l, 'a> {
    lines: &'l [Line<'a>],
    current: usize,
}

impl<'l, 'a> LineCursor<'l, 'a> {
    fn new(lines: &'l [Line<'a>]) -> Self {
        Self { lines, current: 0 }
    }

    fn advance_to(&mut self, offset: usize) -> usize {
        while self.current + 1 < self.lines.len() && self.lines[self.current + 1].offset <= offset {
            self.current += 1;
        }
        self.current
    }
}

/// Structural element waiting for its line number
enum Pending<'r> {
    Token(AnnotationToken),
    Attribute(&'r DeclarationRecord),
}

/// Tokenizer for a single file
pub struct Lexer<'a> {
    file_name: String,
    config: LexerConfig,
    lines: Vec<Line<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_name: impl Into<String>, config: LexerConfig) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for text in source.split('\n') {
            lines.push(Line {
                offset,
                text: text.strip_suffix('\r').unwrap_or(text),
            });
            offset += text.len() + 1;
        }

        Self {
            file_name: file_name.into(),
            config,
            lines,
        }
    }

    /// Generate the tokens of the file, sorted by offset.
    ///
    /// `records` must be sorted by offset, as a [`crate::SyntaxProvider`] returns them.
    pub fn tokenize(&self, records: &[DeclarationRecord]) -> Result<Vec<Token>, LexerError> {
        let mut tokens = self.declaration_tokens(records)?;
        tokens.extend(self.comment_tokens()?);
        tokens.sort_by_key(|token| token.span.offset);

        debug!(file = self.file_name.as_str(), tokens = tokens.len(); "File tokenized");
        Ok(tokens)
    }

    fn location(&self, line: usize) -> FileLocation {
        FileLocation::new(self.file_name.clone(), line)
    }

    fn declaration_tokens(&self, records: &[DeclarationRecord]) -> Result<Vec<Token>, LexerError> {
        let mut pending: Vec<(usize, usize, Pending<'_>)> = Vec::new();

        for record in records {
            if !record.is_structural() {
                if let Some(attribute) = &record.attribute {
                    pending.push((attribute.offset, attribute.length, Pending::Attribute(record)));
                }
                continue;
            }

            let injectable = record.is_injectable();
            let begin = if injectable {
                let ty = parse_type_name(&record.name)
                    .unwrap_or_else(|| weft_ast::TypeIdentity::new(record.name.clone()));
                AnnotationToken::InjectableType(InjectableType {
                    ty,
                    access_level: record.access_level,
                    supports_objc: record.supports_objc(),
                })
            } else {
                AnnotationToken::AnyDeclaration
            };
            pending.push((record.offset, record.length, Pending::Token(begin)));

            if record.has_body() && record.length > 0 {
                let end = if injectable {
                    AnnotationToken::EndOfInjectableType
                } else {
                    AnnotationToken::EndOfAnyDeclaration
                };
                pending.push((record.offset + record.length - 1, 1, Pending::Token(end)));
            }
        }
        pending.sort_by_key(|(offset, _, _)| *offset);

        let mut cursor = LineCursor::new(&self.lines);
        let mut tokens = Vec::with_capacity(pending.len());
        for (offset, length, item) in pending {
            let line = cursor.advance_to(offset);
            let span = Span::new(offset, length, line);
            match item {
                Pending::Token(kind) => tokens.push(Token::new(kind, span)),
                Pending::Attribute(record) => {
                    tokens.extend(self.attribute_tokens(record, span)?);
                }
            }
        }
        Ok(tokens)
    }

    fn attribute_tokens(&self, record: &DeclarationRecord, span: Span) -> Result<Vec<Token>, LexerError> {
        let Some(attribute) = &record.attribute else {
            return Ok(Vec::new());
        };
        let parsed = property_attribute(
            &attribute.text,
            &self.config.sentinel,
            &record.name,
            record.type_name.as_deref(),
        )
        .map_err(|kind| LexerError::new(kind, self.location(span.line), span.offset))?;

        Ok(parsed
            .unwrap_or_default()
            .into_iter()
            .map(|kind| Token::new(kind, span))
            .collect())
    }

    fn comment_tokens(&self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        let mut cursor = LineCursor::new(&self.lines);

        for line in &self.lines {
            let trimmed = line.text.trim_start();
            if !trimmed.starts_with("//") {
                continue;
            }
            let offset = line.offset + (line.text.len() - trimmed.len());
            let number = cursor.advance_to(offset);

            match annotation(trimmed, &self.config.sentinel) {
                Ok(Some(kind)) => {
                    trace!(line = number, token:% = kind; "Annotation");
                    tokens.push(Token::new(kind, Span::new(offset, trimmed.trim_end().len(), number)));
                }
                Ok(None) => {}
                Err(kind) => return Err(self.invalid(kind, number, offset)),
            }
        }
        Ok(tokens)
    }

    fn invalid(&self, kind: TokenError, line: usize, offset: usize) -> LexerError {
        LexerError::new(kind, self.location(line), offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BraceScanner, SyntaxProvider};
    use weft_ast::{AccessLevel, TypeIdentity};

    fn lex(source: &str) -> Result<Vec<Token>, LexerError> {
        let records = BraceScanner.declarations(source);
        Lexer::new(source, "test.swift", LexerConfig::default()).tokenize(&records)
    }

    fn kinds(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.kind.to_string()).collect()
    }

    #[test]
    fn test_annotations_between_type_tokens() {
        let source = "\
final class MovieManager {
    // weaver: logger = Logger
    // weaver: api <- APIProtocol
}
";
        let tokens = lex(source).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                "internal MovieManager {",
                "logger = Logger",
                "api <- APIProtocol",
                "_ }",
            ]
        );
        let lines: Vec<usize> = tokens.iter().map(Token::line).collect();
        assert_eq!(lines, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_opaque_declarations() {
        let source = "enum Kind {\n}\npublic struct App {\n    // weaver: api = API\n}\n";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[0].kind, AnnotationToken::AnyDeclaration);
        assert_eq!(tokens[1].kind, AnnotationToken::EndOfAnyDeclaration);
        assert_eq!(
            tokens[2].kind,
            AnnotationToken::InjectableType(InjectableType {
                ty: TypeIdentity::new("App"),
                access_level: AccessLevel::Public,
                supports_objc: false,
            })
        );
        assert_eq!(tokens[2].line(), 2);
    }

    #[test]
    fn test_end_token_sits_on_closing_brace() {
        let source = "class A {\n    // weaver: b = B\n}";
        let tokens = lex(source).unwrap();
        let end = tokens.last().unwrap();
        assert_eq!(end.kind, AnnotationToken::EndOfInjectableType);
        assert_eq!(&source[end.span.offset..end.span.end()], "}");
        assert_eq!(end.line(), 2);
    }

    #[test]
    fn test_invalid_annotation_is_located() {
        let source = "class A {\n\n    // weaver: b = \n}";
        let error = lex(source).unwrap_err();
        assert_eq!(error.location, FileLocation::new("test.swift", 2));
        assert_eq!(error.kind, TokenError::InvalidAnnotation("weaver: b =".to_string()));
        assert_eq!(error.to_string(), "test.swift:3: error: Invalid annotation: 'weaver: b ='.");
    }

    #[test]
    fn test_attribute_style_tokens() {
        let source = "\
final class App {
    @Weaver(.registration, type: API.self, scope: .container)
    private var api: APIProtocol
}
";
        let tokens = lex(source).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                "internal App {",
                "api = API <- APIProtocol",
                "api.scope = .container",
                "_ }",
            ]
        );
        assert_eq!(tokens[1].line(), 1);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let source = "class A {\n    // weaver: b = B\n    class C {\n        // weaver: d <- D\n    }\n}\n";
        assert_eq!(lex(source).unwrap(), lex(source).unwrap());
    }
}
