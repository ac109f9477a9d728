//! Platform and project filtering, applied to the AST forest before linking

use log::debug;
use serde::{Deserialize, Serialize};
use weft_ast::{AttributeTarget, ConfigurationAttribute, Expr, FileExpr, Platform, TypeDeclaration};

/// The build target the graph is linked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerConfig {
    pub platform: Option<Platform>,
    pub project: Option<String>,
}

impl LinkerConfig {
    pub fn new(platform: Option<Platform>, project: Option<String>) -> Self {
        Self { platform, project }
    }

    fn is_unrestricted(&self) -> bool {
        self.platform.is_none() && self.project.is_none()
    }

    /// Whether a set of `platforms`/`projects` attributes keeps its target
    pub fn allows<'a>(&self, attributes: impl IntoIterator<Item = &'a ConfigurationAttribute>) -> bool {
        attributes.into_iter().all(|attribute| match attribute {
            ConfigurationAttribute::Platforms(platforms) => match self.platform {
                Some(platform) => platforms.is_empty() || platforms.contains(&platform),
                None => true,
            },
            ConfigurationAttribute::Projects(projects) => match &self.project {
                Some(project) => projects.is_empty() || projects.contains(project),
                None => true,
            },
            _ => true,
        })
    }
}

/// Drop the declarations and dependencies excluded by `config`.
///
/// A file whose every top-level type was dropped is removed as well.
pub fn filter_files(files: Vec<Expr>, config: &LinkerConfig) -> Vec<Expr> {
    if config.is_unrestricted() {
        return files;
    }

    files
        .into_iter()
        .filter_map(|expr| match expr {
            Expr::File(file) => filter_file(file, config).map(Expr::File),
            other => Some(other),
        })
        .collect()
}

fn filter_file(file: FileExpr, config: &LinkerConfig) -> Option<FileExpr> {
    let had_types = !file.types.is_empty();
    let types = filter_children(file.types, config);
    if had_types && types.is_empty() {
        debug!(file = file.name.as_str(); "File filtered out");
        return None;
    }
    Some(FileExpr { types, ..file })
}

fn filter_children(children: Vec<Expr>, config: &LinkerConfig) -> Vec<Expr> {
    children
        .into_iter()
        .filter_map(|child| match child {
            Expr::TypeDeclaration(decl) => filter_declaration(decl, config).map(Expr::TypeDeclaration),
            other => Some(other),
        })
        .collect()
}

fn filter_declaration(decl: TypeDeclaration, config: &LinkerConfig) -> Option<TypeDeclaration> {
    if !config.allows(decl.self_config()) {
        debug!(ty:% = decl.ty(); "Type filtered out");
        return None;
    }

    let excluded: Vec<String> = decl
        .children
        .iter()
        .filter_map(Expr::dependency_name)
        .filter(|name| !config.allows(decl.dependency_config(name)))
        .map(str::to_string)
        .collect();

    let TypeDeclaration {
        header,
        config: annotations,
        children,
    } = decl;

    let children: Vec<_> = children
        .into_iter()
        .filter(|child| child.dependency_name().map_or(true, |name| !excluded.iter().any(|e| e == name)))
        .collect();
    let annotations = annotations
        .into_iter()
        .filter(|annotation| match &annotation.node.target {
            AttributeTarget::SelfType => true,
            AttributeTarget::Dependency(name) => !excluded.contains(name),
        })
        .collect();

    let had_children = !children.is_empty();
    let children = filter_children(children, config);
    if had_children && children.is_empty() {
        debug!(ty:% = header.node.ty; "Type emptied by filtering");
        return None;
    }

    Some(TypeDeclaration {
        header,
        config: annotations,
        children,
    })
}
