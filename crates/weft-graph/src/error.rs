//! Semantic error types raised by the linker and the inspectors

use std::fmt;

use thiserror::Error;
use weft_ast::{Diagnostic, FileLocation, TypeIdentity};

/// A named dependency as shown in diagnostics: `name: Type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintableDependency {
    pub name: String,
    pub ty: Option<TypeIdentity>,
    pub location: FileLocation,
}

impl PrintableDependency {
    pub fn new(name: impl Into<String>, ty: Option<TypeIdentity>, location: FileLocation) -> Self {
        Self {
            name: name.into(),
            ty,
            location,
        }
    }
}

impl fmt::Display for PrintableDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}: {}", self.name, ty),
            None => write!(f, "{}: _", self.name),
        }
    }
}

/// A container as shown in diagnostics; untyped containers print as `_`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintableResolver {
    pub ty: Option<TypeIdentity>,
    pub location: FileLocation,
}

impl PrintableResolver {
    pub fn new(ty: Option<TypeIdentity>, location: FileLocation) -> Self {
        Self { ty, location }
    }
}

impl fmt::Display for PrintableResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}", ty),
            None => f.write_str("_"),
        }
    }
}

/// One step of a graph search, printed as a warning note
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisRecord {
    #[error("Could not find the dependency '{name}' in '{resolver}'. You may want to register it here to solve this issue")]
    DependencyNotFound {
        name: String,
        resolver: PrintableResolver,
    },

    #[error("Found unaccessible dependency '{name}' in '{resolver}'. You may want to set its scope to '.container' or '.weak' to solve this issue")]
    FoundUnaccessibleDependency {
        name: String,
        resolver: PrintableResolver,
    },

    #[error("Step {step}: Tried to build type '{resolver}'")]
    TriedToBuildType {
        resolver: PrintableResolver,
        step: usize,
    },

    #[error("Step {step}: Tried to resolve dependency '{name}' in type '{resolver}'")]
    TriedToResolveDependencyInType {
        name: String,
        resolver: PrintableResolver,
        step: usize,
    },

    #[error("'{resolver}' registers '{name}' which needs parameters. You may want to declare them as parameters of '{resolver}' or change the scope of '{name}' to solve this issue")]
    InvalidContainerScope {
        name: String,
        resolver: PrintableResolver,
    },
}

impl AnalysisRecord {
    pub fn location(&self) -> &FileLocation {
        match self {
            AnalysisRecord::DependencyNotFound { resolver, .. }
            | AnalysisRecord::FoundUnaccessibleDependency { resolver, .. }
            | AnalysisRecord::TriedToBuildType { resolver, .. }
            | AnalysisRecord::TriedToResolveDependencyInType { resolver, .. }
            | AnalysisRecord::InvalidContainerScope { resolver, .. } => &resolver.location,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(self.location().clone(), self.to_string())
    }

    fn is_lookup(&self) -> bool {
        matches!(
            self,
            AnalysisRecord::DependencyNotFound { .. } | AnalysisRecord::FoundUnaccessibleDependency { .. }
        )
    }

    fn is_build_step(&self) -> bool {
        matches!(self, AnalysisRecord::TriedToBuildType { .. })
    }

    fn is_resolution_step(&self) -> bool {
        matches!(self, AnalysisRecord::TriedToResolveDependencyInType { .. })
    }
}

/// Keep the records explaining why a lookup failed
pub fn unresolvable_history(history: &[AnalysisRecord]) -> Vec<AnalysisRecord> {
    history.iter().filter(|r| r.is_lookup()).cloned().collect()
}

/// Keep the build steps, then the resolution steps
pub fn cyclic_history(history: &[AnalysisRecord]) -> Vec<AnalysisRecord> {
    let builds = history.iter().filter(|r| r.is_build_step());
    let resolutions = history.iter().filter(|r| r.is_resolution_step());
    builds.chain(resolutions).cloned().collect()
}

/// Why a dependency makes the graph invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorAnalysisError {
    #[error("Detected a cyclic dependency")]
    CyclicDependency { history: Vec<AnalysisRecord> },

    #[error("Dependency cannot be resolved")]
    UnresolvableDependency { history: Vec<AnalysisRecord> },

    #[error("This type is flagged as isolated. It cannot have any connected referent")]
    IsolatedResolverCannotHaveReferents {
        ty: Option<TypeIdentity>,
        referents: Vec<PrintableResolver>,
    },

    #[error("Dependency needs parameters which cannot be supplied to a shared instance")]
    InvalidContainerScope { history: Vec<AnalysisRecord> },

    #[error("Weak dependency with parameters has to be optional")]
    WeakParameterHasToBeOptional,
}

impl InspectorAnalysisError {
    pub fn history(&self) -> &[AnalysisRecord] {
        match self {
            InspectorAnalysisError::CyclicDependency { history }
            | InspectorAnalysisError::UnresolvableDependency { history }
            | InspectorAnalysisError::InvalidContainerScope { history } => history,
            InspectorAnalysisError::IsolatedResolverCannotHaveReferents { .. }
            | InspectorAnalysisError::WeakParameterHasToBeOptional => &[],
        }
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self, InspectorAnalysisError::CyclicDependency { .. })
    }

    fn notes(&self) -> Vec<Diagnostic> {
        match self {
            InspectorAnalysisError::IsolatedResolverCannotHaveReferents { ty, referents } => {
                let isolated = PrintableResolver::new(ty.clone(), FileLocation::unknown());
                referents
                    .iter()
                    .map(|referent| {
                        Diagnostic::error(
                            referent.location.clone(),
                            format!(
                                "'{}' cannot depend on '{}' because it is flagged as 'isolated'. \
                                 You may want to set '{}.isIsolated' to 'false'",
                                referent, isolated, isolated
                            ),
                        )
                    })
                    .collect()
            }
            other => other.history().iter().map(AnalysisRecord::to_diagnostic).collect(),
        }
    }
}

/// Errors raised while linking or inspecting a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorError {
    #[error("Invalid AST because of token: {unexpected}")]
    InvalidAst {
        location: FileLocation,
        unexpected: String,
    },

    #[error("Detected invalid dependency graph starting with '{dependency}'. {error}")]
    InvalidGraph {
        dependency: PrintableDependency,
        error: InspectorAnalysisError,
    },

    /// A graph invariant did not hold; this is a bug in weft, not in the input
    #[error("Internal inconsistency: {0}")]
    Internal(String),
}

impl InspectorError {
    pub fn invalid_graph(dependency: PrintableDependency, error: InspectorAnalysisError) -> Self {
        InspectorError::InvalidGraph { dependency, error }
    }

    pub fn location(&self) -> FileLocation {
        match self {
            InspectorError::InvalidAst { location, .. } => location.clone(),
            InspectorError::InvalidGraph { dependency, .. } => dependency.location.clone(),
            InspectorError::Internal(_) => FileLocation::unknown(),
        }
    }

    /// The underlying analysis error, if the graph itself is invalid
    pub fn analysis(&self) -> Option<&InspectorAnalysisError> {
        match self {
            InspectorError::InvalidGraph { error, .. } => Some(error),
            InspectorError::InvalidAst { .. } | InspectorError::Internal(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.location(), self.to_string());
        match self {
            InspectorError::InvalidGraph { error, .. } => diagnostic.with_notes(error.notes()),
            InspectorError::InvalidAst { .. } | InspectorError::Internal(_) => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(ty: &str, line: usize) -> PrintableResolver {
        PrintableResolver::new(Some(TypeIdentity::new(ty)), FileLocation::new("test.swift", line))
    }

    #[test]
    fn test_unresolvable_message_with_history() {
        let error = InspectorError::invalid_graph(
            PrintableDependency::new(
                "sessionManager",
                Some(TypeIdentity::new("SessionManagerProtocol")),
                FileLocation::new("test.swift", 1),
            ),
            InspectorAnalysisError::UnresolvableDependency {
                history: vec![AnalysisRecord::DependencyNotFound {
                    name: "sessionManager".to_string(),
                    resolver: resolver("App", 4),
                }],
            },
        );

        assert_eq!(
            error.to_diagnostic().to_string(),
            "test.swift:2: error: Detected invalid dependency graph starting with \
             'sessionManager: SessionManagerProtocol'. Dependency cannot be resolved.\n\
             test.swift:5: warning: Could not find the dependency 'sessionManager' in 'App'. \
             You may want to register it here to solve this issue."
        );
    }

    #[test]
    fn test_isolation_notes_are_errors() {
        let error = InspectorError::invalid_graph(
            PrintableDependency::new("movieManager", None, FileLocation::new("test.swift", 3)),
            InspectorAnalysisError::IsolatedResolverCannotHaveReferents {
                ty: Some(TypeIdentity::new("Home")),
                referents: vec![resolver("AppDelegate", 0)],
            },
        );

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.notes.len(), 1);
        assert_eq!(
            diagnostic.notes[0].to_string(),
            "test.swift:1: error: 'AppDelegate' cannot depend on 'Home' because it is flagged as \
             'isolated'. You may want to set 'Home.isIsolated' to 'false'."
        );
    }

    #[test]
    fn test_history_filters() {
        let history = vec![
            AnalysisRecord::TriedToResolveDependencyInType {
                name: "api".to_string(),
                resolver: resolver("A", 0),
                step: 0,
            },
            AnalysisRecord::DependencyNotFound {
                name: "api".to_string(),
                resolver: resolver("A", 0),
            },
            AnalysisRecord::TriedToBuildType {
                resolver: resolver("B", 1),
                step: 0,
            },
            AnalysisRecord::FoundUnaccessibleDependency {
                name: "api".to_string(),
                resolver: resolver("B", 1),
            },
        ];

        let unresolvable = unresolvable_history(&history);
        assert_eq!(unresolvable.len(), 2);
        assert!(unresolvable.iter().all(AnalysisRecord::is_lookup));

        let cyclic = cyclic_history(&history);
        assert_eq!(cyclic.len(), 2);
        assert!(cyclic[0].is_build_step());
        assert!(cyclic[1].is_resolution_step());
    }

    #[test]
    fn test_untyped_dependency_prints_underscore() {
        let dependency = PrintableDependency::new("logger", None, FileLocation::unknown());
        assert_eq!(dependency.to_string(), "logger: _");
    }
}
