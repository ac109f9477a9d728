//! Shared helpers for the integration tests

#![allow(dead_code)]

use weft::graph::{InspectorAnalysisError, InspectorError};
use weft::{analyze, Analysis, PipelineConfig, PipelineError, SourceFile};

/// Build one source file per `(name, source)` pair
pub fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
    files
        .iter()
        .map(|(name, source)| SourceFile::new(*name, *source))
        .collect()
}

/// Analyze files with the default configuration
pub fn check(files: &[(&str, &str)]) -> Result<Analysis, PipelineError> {
    analyze(&sources(files), &PipelineConfig::default())
}

/// Analyze files that must be valid
pub fn assert_valid(files: &[(&str, &str)]) -> Analysis {
    match check(files) {
        Ok(analysis) => analysis,
        Err(error) => panic!("expected a valid graph, got:\n{}", error.to_diagnostic()),
    }
}

/// Analyze files that must fail inspection, returning the analysis error
pub fn assert_invalid(files: &[(&str, &str)]) -> (String, InspectorAnalysisError) {
    match check(files) {
        Ok(_) => panic!("expected an invalid graph"),
        Err(PipelineError::Inspector(InspectorError::InvalidGraph { dependency, error })) => {
            (dependency.name, error)
        }
        Err(other) => panic!("expected an invalid graph error, got {:?}", other),
    }
}
