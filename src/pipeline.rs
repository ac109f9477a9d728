//! Multi-file analysis: parallel front end, serial back end

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use weft_ast::{Diagnostic, Expr, FileLocation};
use weft_graph::{filter_files, link, DependencyGraph, InspectorError, LinkerConfig};
use weft_lexer::{LexerConfig, LexerError};
use weft_parser::ParserError;

/// A file's name and contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub lexer: LexerConfig,
    pub linker: LinkerConfig,
}

/// A validated graph and the warnings collected on the way
#[derive(Debug, Clone)]
pub struct Analysis {
    pub graph: DependencyGraph,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Inspector(#[from] InspectorError),
}

impl PipelineError {
    pub fn location(&self) -> FileLocation {
        match self {
            PipelineError::Lexer(error) => error.location().clone(),
            PipelineError::Parser(error) => error.location().clone(),
            PipelineError::Inspector(error) => error.location(),
        }
    }

    /// Byte range of the offending text, when the error points into a file
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        match self {
            PipelineError::Lexer(error) => Some(error.offset..error.offset + 1),
            PipelineError::Parser(error) => error.span().map(|span| span.offset..span.end().max(span.offset + 1)),
            PipelineError::Inspector(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PipelineError::Lexer(error) => error.to_diagnostic(),
            PipelineError::Parser(error) => error.to_diagnostic(),
            PipelineError::Inspector(error) => error.to_diagnostic(),
        }
    }
}

/// Tokenize and parse a single file
pub fn parse_file(file: &SourceFile, config: &LexerConfig) -> Result<Expr, PipelineError> {
    let tokens = weft_lexer::tokenize(&file.source, &file.name, config)?;
    Ok(weft_parser::parse(tokens, &file.name)?)
}

/// Parse every file in parallel.
///
/// Results come back sorted by file name; when several files fail, the error
/// of the first one in that order is returned.
pub fn parse_files(files: &[SourceFile], config: &LexerConfig) -> Result<Vec<Expr>, PipelineError> {
    let mut results: Vec<(&str, Result<Expr, PipelineError>)> = files
        .par_iter()
        .map(|file| (file.name.as_str(), parse_file(file, config)))
        .collect();
    results.sort_by(|(a, _), (b, _)| a.cmp(b));

    debug!(files = results.len(); "Files parsed");
    results.into_iter().map(|(_, result)| result).collect()
}

/// Filter the forest for the active target and link it
pub fn link_files(files: Vec<Expr>, config: &LinkerConfig) -> Result<DependencyGraph, PipelineError> {
    let files = filter_files(files, config);
    Ok(link(&files)?)
}

/// Run the whole pipeline over `files`
pub fn analyze(files: &[SourceFile], config: &PipelineConfig) -> Result<Analysis, PipelineError> {
    let trees = parse_files(files, &config.lexer)?;
    let graph = link_files(trees, &config.linker)?;
    let warnings = weft_checker::validate(&graph)?;
    Ok(Analysis { graph, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_sorted_by_file_name() {
        let files = vec![
            SourceFile::new("b.swift", "class B {\n    // weaver: c = C\n}\n"),
            SourceFile::new("a.swift", "class A {\n    // weaver: b = B\n}\n"),
        ];
        let trees = parse_files(&files, &LexerConfig::default()).unwrap();
        let names: Vec<&str> = trees
            .iter()
            .filter_map(|tree| match tree {
                Expr::File(file) => Some(file.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a.swift", "b.swift"]);
    }

    #[test]
    fn test_first_error_in_name_order() {
        let files = vec![
            SourceFile::new("z.swift", "class Z {\n    // weaver: ???\n}\n"),
            SourceFile::new("m.swift", "class M {\n    // weaver: a = A\n    // weaver: a = A\n}\n"),
        ];
        let error = parse_files(&files, &LexerConfig::default()).unwrap_err();
        assert_eq!(error.location().file.as_deref(), Some("m.swift"));
        assert!(matches!(error, PipelineError::Parser(_)));
    }
}
