//! Two-pass linker: AST forest -> dependency graph
//!
//! The first pass creates a container per registered concrete type and binds
//! every dependency name to a container, creating untyped placeholders for
//! names that are only ever referenced. The second pass walks the type
//! declarations and builds the edges.

use log::{debug, trace};
use weft_ast::{Expr, FileExpr, FileLocation, TypeDeclaration, TypeIdentity};

use crate::{
    ContainerConfiguration, Dependency, DependencyConfiguration, DependencyGraph, DependencyKind,
    InspectorAnalysisError, InspectorError, PrintableDependency,
};

/// Link the syntax trees of every file into a single graph.
///
/// Every element of `files` must be an [`Expr::File`].
pub fn link(files: &[Expr]) -> Result<DependencyGraph, InspectorError> {
    let mut linker = Linker::new();
    linker.collect(files)?;
    linker.link_files(files)?;

    debug!(
        containers = linker.graph.len(),
        dependencies = linker.graph.dependencies().count();
        "Graph linked"
    );
    Ok(linker.graph)
}

struct Linker {
    graph: DependencyGraph,
}

fn as_file(expr: &Expr) -> Result<&FileExpr, InspectorError> {
    match expr {
        Expr::File(file) => Ok(file),
        other => Err(InspectorError::InvalidAst {
            location: FileLocation::unknown(),
            unexpected: other.kind_name().to_string(),
        }),
    }
}

impl Linker {
    fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
        }
    }

    /// Pass 1: containers for registered types and name bindings
    fn collect(&mut self, files: &[Expr]) -> Result<(), InspectorError> {
        for expr in files {
            let file = as_file(expr)?;
            self.graph.add_imports(&file.name, &file.imports);
            for node in expr.walk() {
                if let Expr::Register(register) = node {
                    let id = self.graph.insert_typed(&register.node.concrete_type);
                    self.graph.bind_name(&register.node.name, id);
                }
            }
        }

        for expr in files {
            for node in expr.walk() {
                if let Expr::Reference(reference) = node {
                    let id = match self.graph.id_of_name(&reference.node.name) {
                        Some(id) => id,
                        None => {
                            let placeholder = self.graph.insert_placeholder();
                            self.graph.bind_name(&reference.node.name, placeholder)
                        }
                    };
                    if let Some(ty) = reference.node.primary_type() {
                        self.graph.add_referenced_type(id, ty);
                    }
                }
            }
        }
        Ok(())
    }

    /// Pass 2: edges
    fn link_files(&mut self, files: &[Expr]) -> Result<(), InspectorError> {
        for expr in files {
            let file = as_file(expr)?;
            for ty in &file.types {
                match ty {
                    Expr::TypeDeclaration(decl) => self.link_declaration(decl, &file.name, &[])?,
                    other => {
                        return Err(InspectorError::InvalidAst {
                            location: location(&file.name, other.line()),
                            unexpected: other.kind_name().to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    fn link_declaration(
        &mut self,
        decl: &TypeDeclaration,
        file: &str,
        embedding_types: &[TypeIdentity],
    ) -> Result<(), InspectorError> {
        let id = self.graph.insert_typed(decl.ty());
        {
            let container = self
                .graph
                .get_mut(id)
                .ok_or_else(|| InspectorError::Internal(format!("container for '{}' vanished", decl.ty())))?;
            let mut configuration = ContainerConfiguration::from_attributes(decl.self_config());
            configuration.objc |= decl.header.node.supports_objc;

            container.access_level = decl.header.node.access_level;
            container.configuration = configuration;
            container.embedding_types = embedding_types.to_vec();
            container.location = FileLocation::new(file, decl.header.line());
        }

        for child in &decl.children {
            let dependency = match child {
                Expr::TypeDeclaration(nested) => {
                    let mut embedding = embedding_types.to_vec();
                    embedding.push(decl.ty().clone());
                    self.link_declaration(nested, file, &embedding)?;
                    continue;
                }
                Expr::Register(register) => {
                    let annotation = &register.node;
                    let location = FileLocation::new(file, register.line());
                    let target = self.graph.id_of_type(&annotation.concrete_type).ok_or_else(|| {
                        unresolvable(&annotation.name, Some(annotation.concrete_type.clone()), location.clone())
                    })?;
                    Dependency {
                        kind: DependencyKind::Registration,
                        name: annotation.name.clone(),
                        ty: annotation.concrete_type.clone(),
                        abstract_types: annotation.abstract_type.iter().cloned().collect(),
                        source: id,
                        target: Some(target),
                        configuration: DependencyConfiguration::from_attributes(
                            decl.dependency_config(&annotation.name),
                        ),
                        location,
                    }
                }
                Expr::Reference(reference) => {
                    let annotation = &reference.node;
                    let location = FileLocation::new(file, reference.line());
                    let ty = annotation.primary_type().cloned().ok_or_else(|| InspectorError::InvalidAst {
                        location: location.clone(),
                        unexpected: child.kind_name().to_string(),
                    })?;
                    let target = self
                        .graph
                        .id_of_name(&annotation.name)
                        .ok_or_else(|| unresolvable(&annotation.name, Some(ty.clone()), location.clone()))?;
                    Dependency {
                        kind: DependencyKind::Reference,
                        name: annotation.name.clone(),
                        ty,
                        abstract_types: annotation.types.clone(),
                        source: id,
                        target: Some(target),
                        configuration: DependencyConfiguration::from_attributes(
                            decl.dependency_config(&annotation.name),
                        ),
                        location,
                    }
                }
                Expr::Parameter(parameter) => Dependency {
                    kind: DependencyKind::Parameter,
                    name: parameter.node.name.clone(),
                    ty: parameter.node.ty.clone(),
                    abstract_types: Vec::new(),
                    source: id,
                    target: None,
                    configuration: DependencyConfiguration::from_attributes(
                        decl.dependency_config(&parameter.node.name),
                    ),
                    location: FileLocation::new(file, parameter.line()),
                },
                Expr::File(_) => {
                    return Err(InspectorError::InvalidAst {
                        location: FileLocation::file(file),
                        unexpected: child.kind_name().to_string(),
                    })
                }
            };

            trace!(
                name = dependency.name.as_str(),
                kind:? = dependency.kind,
                source:% = decl.ty();
                "Edge linked"
            );
            self.graph.attach(dependency)?;
        }
        Ok(())
    }
}

fn location(file: &str, line: Option<usize>) -> FileLocation {
    match line {
        Some(line) => FileLocation::new(file, line),
        None => FileLocation::file(file),
    }
}

fn unresolvable(name: &str, ty: Option<TypeIdentity>, location: FileLocation) -> InspectorError {
    InspectorError::invalid_graph(
        PrintableDependency::new(name, ty, location),
        InspectorAnalysisError::UnresolvableDependency { history: Vec::new() },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DependencyIndex;
    use weft_ast::{AccessLevel, Scope};
    use weft_lexer::LexerConfig;

    fn parse(file_name: &str, source: &str) -> Expr {
        let tokens = weft_lexer::tokenize(source, file_name, &LexerConfig::default()).unwrap();
        weft_parser::parse(tokens, file_name).unwrap()
    }

    fn ty(name: &str) -> TypeIdentity {
        TypeIdentity::new(name)
    }

    #[test]
    fn test_registration_links_source_and_target() {
        let files = vec![parse(
            "App.swift",
            "\
public final class App {
    // weaver: api = API <- APIProtocol
    // weaver: api.scope = .container
}
",
        )];
        let graph = link(&files).unwrap();

        let app = graph.id_of_type(&ty("App")).unwrap();
        let api = graph.id_of_type(&ty("API")).unwrap();
        let app_container = graph.get(app).unwrap();
        assert_eq!(app_container.access_level, AccessLevel::Public);
        assert_eq!(app_container.location, FileLocation::new("App.swift", 0));
        assert_eq!(graph.get(api).unwrap().sources, vec![app]);

        let (_, registration) = graph
            .find(app, &DependencyIndex::new("api", Some(ty("API"))))
            .unwrap();
        assert_eq!(registration.abstract_type(), &ty("APIProtocol"));
        assert_eq!(registration.configuration.scope, Scope::Container);
        assert_eq!(registration.location, FileLocation::new("App.swift", 1));
    }

    #[test]
    fn test_reference_only_name_gets_placeholder() {
        let files = vec![
            parse("A.swift", "class A {\n    // weaver: logger <- Logging\n}\n"),
            parse("B.swift", "class B {\n    // weaver: logger <- OtherLogging\n}\n"),
        ];
        let graph = link(&files).unwrap();

        let placeholder = graph.id_of_name("logger").unwrap();
        let container = graph.get(placeholder).unwrap();
        assert_eq!(container.ty, None);
        assert_eq!(container.referenced_types, vec![ty("Logging"), ty("OtherLogging")]);
        assert_eq!(container.sources.len(), 2);
    }

    #[test]
    fn test_reference_to_registered_name_targets_concrete_container() {
        let files = vec![
            parse("Home.swift", "class Home {\n    // weaver: api <- APIProtocol\n}\n"),
            parse("App.swift", "class App {\n    // weaver: api = API <- APIProtocol\n    // weaver: home = Home\n}\n"),
        ];
        let graph = link(&files).unwrap();

        let home = graph.id_of_type(&ty("Home")).unwrap();
        let api = graph.id_of_type(&ty("API")).unwrap();
        let (_, reference) = graph
            .find(home, &DependencyIndex::new("api", Some(ty("API"))))
            .unwrap();
        assert_eq!(reference.target, Some(api));
        assert!(graph.get(api).unwrap().sources.contains(&home));
    }

    #[test]
    fn test_nested_types_record_embedding() {
        let source = "\
class Outer {
    // weaver: a = A
    class Inner {
        // weaver: b = B
    }
}
";
        let graph = link(&[parse("test.swift", source)]).unwrap();
        let inner = graph.get(graph.id_of_type(&ty("Inner")).unwrap()).unwrap();
        assert_eq!(inner.embedding_types, vec![ty("Outer")]);
        assert_eq!(inner.location, FileLocation::new("test.swift", 2));
    }

    #[test]
    fn test_parameters_and_imports() {
        let source = "\
// weaver: import Foundation
class Movie {
    // weaver: id <= Int
}
";
        let graph = link(&[parse("Movie.swift", source)]).unwrap();
        let movie = graph.get(graph.id_of_type(&ty("Movie")).unwrap()).unwrap();
        assert_eq!(movie.parameters.len(), 1);
        assert!(movie.registrations.is_empty());
        assert_eq!(graph.imports("Movie.swift"), &["Foundation".to_string()]);
    }

    #[test]
    fn test_non_file_expression_is_invalid_ast() {
        let files = vec![parse("A.swift", "class A {\n    // weaver: b = B\n}\n")];
        let Expr::File(file) = &files[0] else {
            panic!("expected a file");
        };
        let error = link(&file.types).unwrap_err();
        assert!(matches!(error, InspectorError::InvalidAst { .. }));
    }

    #[test]
    fn test_linking_is_idempotent() {
        let files = vec![
            parse("A.swift", "class A {\n    // weaver: b = B\n    // weaver: c <- C\n}\n"),
            parse("B.swift", "class B {\n    // weaver: c = C\n    // weaver: c.scope = .weak\n}\n"),
        ];
        assert_eq!(link(&files).unwrap(), link(&files).unwrap());
    }
}
