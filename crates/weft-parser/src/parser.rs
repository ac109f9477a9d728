//! Recursive descent parser over the annotation token stream

use std::collections::{BTreeSet, HashSet};

use weft_ast::{
    AttributeName, AttributeTarget, ConfigurationAnnotation, Expr, FileExpr, FileLocation,
    InjectableType, Span, Spanned, TypeDeclaration,
};
use weft_lexer::{AnnotationToken, Token};

use crate::ParserError;

/// Bookkeeping for the type declaration currently being parsed
struct Frame {
    header: Spanned<InjectableType>,
    registrations: HashSet<String>,
    references: HashSet<String>,
    parameters: HashSet<String>,
    assigned: HashSet<(AttributeTarget, AttributeName)>,
    config: Vec<Spanned<ConfigurationAnnotation>>,
    children: Vec<Expr>,
}

impl Frame {
    fn new(header: Spanned<InjectableType>) -> Self {
        Self {
            header,
            registrations: HashSet::new(),
            references: HashSet::new(),
            parameters: HashSet::new(),
            assigned: HashSet::new(),
            config: Vec::new(),
            children: Vec::new(),
        }
    }

    fn declares(&self, name: &str) -> bool {
        self.registrations.contains(name)
            || self.references.contains(name)
            || self.parameters.contains(name)
    }

    /// Types without any annotation are dropped
    fn into_declaration(self) -> Option<TypeDeclaration> {
        if self.children.is_empty() && self.config.is_empty() {
            return None;
        }
        Some(TypeDeclaration {
            header: self.header,
            config: self.config,
            children: self.children,
        })
    }
}

/// Parser for one file's tokens
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file_name: String,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file_name: impl Into<String>) -> Self {
        Self {
            tokens,
            pos: 0,
            file_name: file_name.into(),
        }
    }

    /// Parse the whole stream into an `Expr::File`
    pub fn parse(&mut self) -> Result<Expr, ParserError> {
        self.parse_file().map(Expr::File)
    }

    // === Helpers ===

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn location(&self, span: Span) -> FileLocation {
        FileLocation::new(self.file_name.clone(), span.line)
    }

    fn unexpected(&self) -> ParserError {
        match self.current() {
            Some(token) => ParserError::UnexpectedToken {
                location: self.location(token.span),
                span: token.span,
            },
            None => self.eof(),
        }
    }

    fn eof(&self) -> ParserError {
        ParserError::UnexpectedEof {
            location: FileLocation::file(self.file_name.clone()),
        }
    }

    /// Opaque declarations carry no annotation structure
    fn skip_any_declarations(&mut self) {
        while matches!(
            self.current().map(|token| &token.kind),
            Some(AnnotationToken::AnyDeclaration | AnnotationToken::EndOfAnyDeclaration)
        ) {
            self.pos += 1;
        }
    }

    // === Productions ===

    fn parse_file(&mut self) -> Result<FileExpr, ParserError> {
        let mut types = Vec::new();
        let mut imports = BTreeSet::new();

        loop {
            self.skip_any_declarations();

            let Some(token) = self.current() else {
                return Ok(FileExpr {
                    name: self.file_name.clone(),
                    types,
                    imports: imports.into_iter().collect(),
                });
            };

            match &token.kind {
                AnnotationToken::InjectableType(_) => {
                    if let Some(declaration) = self.parse_type_declaration()? {
                        types.push(Expr::TypeDeclaration(declaration));
                    }
                }
                AnnotationToken::Import(module) => {
                    imports.insert(module.clone());
                    self.pos += 1;
                }
                // Stray end tokens left by an unbalanced provider
                AnnotationToken::EndOfInjectableType => self.pos += 1,
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_type_declaration(&mut self) -> Result<Option<TypeDeclaration>, ParserError> {
        let header = match self.advance() {
            Some(Token {
                kind: AnnotationToken::InjectableType(header),
                span,
            }) => Spanned::new(header, span),
            Some(_) => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
            None => return Err(self.eof()),
        };
        let mut frame = Frame::new(header);

        loop {
            self.skip_any_declarations();
            let Some(Token { kind, span }) = self.current().cloned() else {
                return Err(self.eof());
            };

            match kind {
                AnnotationToken::Register(annotation) => {
                    self.check_double_declaration(&frame, &annotation.name, span)?;
                    frame.registrations.insert(annotation.name.clone());
                    frame.children.push(Expr::Register(Spanned::new(annotation, span)));
                    self.pos += 1;
                }
                AnnotationToken::Reference(annotation) => {
                    self.check_double_declaration(&frame, &annotation.name, span)?;
                    frame.references.insert(annotation.name.clone());
                    frame.children.push(Expr::Reference(Spanned::new(annotation, span)));
                    self.pos += 1;
                }
                AnnotationToken::Parameter(annotation) => {
                    self.check_double_declaration(&frame, &annotation.name, span)?;
                    frame.parameters.insert(annotation.name.clone());
                    frame.children.push(Expr::Parameter(Spanned::new(annotation, span)));
                    self.pos += 1;
                }
                AnnotationToken::Configuration(annotation) => {
                    self.check_configuration(&mut frame, &annotation, span)?;
                    frame.config.push(Spanned::new(annotation, span));
                    self.pos += 1;
                }
                AnnotationToken::InjectableType(_) => {
                    if let Some(nested) = self.parse_type_declaration()? {
                        frame.children.push(Expr::TypeDeclaration(nested));
                    }
                }
                AnnotationToken::EndOfInjectableType => {
                    self.pos += 1;
                    return Ok(frame.into_declaration());
                }
                AnnotationToken::Import(_)
                | AnnotationToken::AnyDeclaration
                | AnnotationToken::EndOfAnyDeclaration => return Err(self.unexpected()),
            }
        }
    }

    fn check_double_declaration(&self, frame: &Frame, name: &str, span: Span) -> Result<(), ParserError> {
        if frame.declares(name) {
            return Err(ParserError::DependencyDoubleDeclaration {
                name: name.to_string(),
                location: self.location(span),
                span,
            });
        }
        Ok(())
    }

    fn check_configuration(
        &self,
        frame: &mut Frame,
        annotation: &ConfigurationAnnotation,
        span: Span,
    ) -> Result<(), ParserError> {
        if let AttributeTarget::Dependency(name) = &annotation.target {
            let known = match annotation.attribute.name() {
                // Scopes only make sense on owned dependencies
                AttributeName::Scope => frame.registrations.contains(name),
                _ => frame.registrations.contains(name) || frame.references.contains(name),
            };
            if !known {
                return Err(ParserError::UnknownDependency {
                    name: name.clone(),
                    location: self.location(span),
                    span,
                });
            }
        }

        let key = (annotation.target.clone(), annotation.attribute.name());
        if !frame.assigned.insert(key) {
            return Err(ParserError::ConfigurationAttributeDoubleAssignation {
                attribute: annotation.attribute.name(),
                location: self.location(span),
                span,
            });
        }
        Ok(())
    }
}
