//! The annotation AST

use serde::{Deserialize, Serialize};

use crate::{AccessLevel, AttributeTarget, ConfigurationAttribute, Spanned, TypeIdentity};

/// `name = Concrete` or `name = Concrete <- Abstract`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterAnnotation {
    pub name: String,
    pub concrete_type: TypeIdentity,
    pub abstract_type: Option<TypeIdentity>,
}

impl RegisterAnnotation {
    /// The type exposed to descendants
    pub fn exposed_type(&self) -> &TypeIdentity {
        self.abstract_type.as_ref().unwrap_or(&self.concrete_type)
    }
}

/// `name <- Abstract` or `name <- A & B`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceAnnotation {
    pub name: String,
    /// Never empty
    pub types: Vec<TypeIdentity>,
}

impl ReferenceAnnotation {
    /// First declared abstract type
    pub fn primary_type(&self) -> Option<&TypeIdentity> {
        self.types.first()
    }
}

/// `name <= Type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterAnnotation {
    pub name: String,
    pub ty: TypeIdentity,
}

/// `target.attribute = value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationAnnotation {
    pub attribute: ConfigurationAttribute,
    pub target: AttributeTarget,
}

/// Header of an injectable type declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectableType {
    pub ty: TypeIdentity,
    pub access_level: AccessLevel,
    /// Set on extensions conforming to the legacy-bridging marker
    pub supports_objc: bool,
}

impl InjectableType {
    pub fn new(ty: TypeIdentity) -> Self {
        Self {
            ty,
            access_level: AccessLevel::default(),
            supports_objc: false,
        }
    }
}

/// A type declaration with its annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub header: Spanned<InjectableType>,
    pub config: Vec<Spanned<ConfigurationAnnotation>>,
    /// Dependency annotations and nested type declarations, in source order
    pub children: Vec<Expr>,
}

impl TypeDeclaration {
    pub fn ty(&self) -> &TypeIdentity {
        &self.header.node.ty
    }

    /// Configuration annotations aimed at the type itself
    pub fn self_config(&self) -> impl Iterator<Item = &ConfigurationAttribute> {
        self.config
            .iter()
            .filter(|c| c.node.target == AttributeTarget::SelfType)
            .map(|c| &c.node.attribute)
    }

    /// Configuration annotations aimed at the dependency `name`
    pub fn dependency_config<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ConfigurationAttribute> + 'a {
        self.config
            .iter()
            .filter(move |c| c.node.target.dependency_name() == Some(name))
            .map(|c| &c.node.attribute)
    }
}

/// One parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileExpr {
    pub name: String,
    /// Top-level type declarations
    pub types: Vec<Expr>,
    /// Sorted, deduplicated module imports
    pub imports: Vec<String>,
}

/// A node of the annotation AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    File(FileExpr),
    TypeDeclaration(TypeDeclaration),
    Register(Spanned<RegisterAnnotation>),
    Reference(Spanned<ReferenceAnnotation>),
    Parameter(Spanned<ParameterAnnotation>),
}

impl Expr {
    /// Short label used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::File(_) => "file",
            Expr::TypeDeclaration(_) => "type declaration",
            Expr::Register(_) => "registration",
            Expr::Reference(_) => "reference",
            Expr::Parameter(_) => "parameter",
        }
    }

    /// Line of the node, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            Expr::File(_) => None,
            Expr::TypeDeclaration(decl) => Some(decl.header.line()),
            Expr::Register(annotation) => Some(annotation.line()),
            Expr::Reference(annotation) => Some(annotation.line()),
            Expr::Parameter(annotation) => Some(annotation.line()),
        }
    }

    /// Name of the dependency this node declares
    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            Expr::Register(annotation) => Some(&annotation.node.name),
            Expr::Reference(annotation) => Some(&annotation.node.name),
            Expr::Parameter(annotation) => Some(&annotation.node.name),
            Expr::File(_) | Expr::TypeDeclaration(_) => None,
        }
    }

    fn children(&self) -> &[Expr] {
        match self {
            Expr::File(file) => &file.types,
            Expr::TypeDeclaration(decl) => &decl.children,
            Expr::Register(_) | Expr::Reference(_) | Expr::Parameter(_) => &[],
        }
    }

    /// Depth-first, pre-order traversal starting with `self`
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Iterator returned by [`Expr::walk`]
pub struct Walk<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.stack.pop()?;
        self.stack.extend(expr.children().iter().rev());
        Some(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn make_span(line: usize) -> Span {
        Span::new(line * 10, 5, line)
    }

    fn register(name: &str, ty: &str, line: usize) -> Expr {
        Expr::Register(Spanned::new(
            RegisterAnnotation {
                name: name.to_string(),
                concrete_type: TypeIdentity::new(ty),
                abstract_type: None,
            },
            make_span(line),
        ))
    }

    fn declaration(ty: &str, children: Vec<Expr>) -> Expr {
        Expr::TypeDeclaration(TypeDeclaration {
            header: Spanned::new(InjectableType::new(TypeIdentity::new(ty)), make_span(0)),
            config: Vec::new(),
            children,
        })
    }

    #[test]
    fn test_walk_is_pre_order() {
        let file = Expr::File(FileExpr {
            name: "a.swift".to_string(),
            types: vec![
                declaration("App", vec![register("api", "API", 1), declaration("Inner", vec![register("x", "X", 3)])]),
                declaration("Other", vec![register("y", "Y", 5)]),
            ],
            imports: Vec::new(),
        });

        let order: Vec<&str> = file
            .walk()
            .map(|expr| match expr {
                Expr::File(_) => "file",
                Expr::TypeDeclaration(decl) => decl.ty().name.as_str(),
                other => other.dependency_name().unwrap_or("?"),
            })
            .collect();
        assert_eq!(order, vec!["file", "App", "api", "Inner", "x", "Other", "y"]);
    }

    #[test]
    fn test_dependency_config_filters_by_target() {
        let decl = TypeDeclaration {
            header: Spanned::new(InjectableType::new(TypeIdentity::new("App")), make_span(0)),
            config: vec![
                Spanned::new(
                    ConfigurationAnnotation {
                        attribute: ConfigurationAttribute::IsIsolated(true),
                        target: AttributeTarget::SelfType,
                    },
                    make_span(1),
                ),
                Spanned::new(
                    ConfigurationAnnotation {
                        attribute: ConfigurationAttribute::CustomRef(true),
                        target: AttributeTarget::from_name("api"),
                    },
                    make_span(2),
                ),
            ],
            children: vec![register("api", "API", 3)],
        };

        assert_eq!(decl.self_config().count(), 1);
        assert_eq!(
            decl.dependency_config("api").collect::<Vec<_>>(),
            vec![&ConfigurationAttribute::CustomRef(true)]
        );
        assert_eq!(decl.dependency_config("other").count(), 0);
    }

    #[test]
    fn test_exposed_type_defaults_to_concrete() {
        let annotation = RegisterAnnotation {
            name: "api".to_string(),
            concrete_type: TypeIdentity::new("API"),
            abstract_type: None,
        };
        assert_eq!(annotation.exposed_type(), &TypeIdentity::new("API"));
    }
}
