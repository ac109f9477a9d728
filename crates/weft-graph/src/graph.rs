//! Dependency graph arena
//!
//! Containers and edges live in two vectors and point at each other through
//! [`ContainerId`] and [`DependencyId`]. Dependents are stored as ids, so the
//! back-references between a container and the containers that use it never
//! form an ownership cycle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_ast::{AccessLevel, ConfigurationAttribute, FileLocation, Platform, Scope, TypeIdentity};

use crate::{InspectorError, PrintableDependency, PrintableResolver};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Unique identifier for a container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u32);

impl ContainerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(pub u32);

impl DependencyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Key of a registration or reference inside its container.
///
/// The type is the one of the target container, absent for placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyIndex {
    pub name: String,
    pub ty: Option<TypeIdentity>,
}

impl DependencyIndex {
    pub fn new(name: impl Into<String>, ty: Option<TypeIdentity>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    #[serde(rename = "r")]
    Registration,
    #[serde(rename = "f")]
    Reference,
    #[serde(rename = "p")]
    Parameter,
}

impl DependencyKind {
    /// Registrations and references point at a container; parameters don't
    pub fn is_resolvable(&self) -> bool {
        !matches!(self, DependencyKind::Parameter)
    }
}

/// Per-edge configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConfiguration {
    #[serde(rename = "s", default)]
    pub scope: Scope,
    #[serde(rename = "b", default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    #[serde(rename = "cr", default, skip_serializing_if = "is_false")]
    pub custom_ref: bool,
    #[serde(rename = "st", default, skip_serializing_if = "is_false")]
    pub setter: bool,
    #[serde(rename = "o", default, skip_serializing_if = "is_false")]
    pub objc: bool,
    #[serde(rename = "pl", default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(rename = "pj", default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
}

impl DependencyConfiguration {
    pub fn from_attributes<'a>(attributes: impl IntoIterator<Item = &'a ConfigurationAttribute>) -> Self {
        let mut configuration = Self::default();
        for attribute in attributes {
            match attribute {
                ConfigurationAttribute::Scope(scope) => configuration.scope = *scope,
                ConfigurationAttribute::Builder(expr) => configuration.builder = Some(expr.clone()),
                ConfigurationAttribute::CustomRef(value) => configuration.custom_ref = *value,
                ConfigurationAttribute::Setter(value) => configuration.setter = *value,
                ConfigurationAttribute::Objc(value) => configuration.objc = *value,
                ConfigurationAttribute::Platforms(platforms) => configuration.platforms = platforms.clone(),
                ConfigurationAttribute::Projects(projects) => configuration.projects = projects.clone(),
                ConfigurationAttribute::IsIsolated(_) | ConfigurationAttribute::AllowsCycles(_) => {}
            }
        }
        configuration
    }

    /// The value is supplied by a custom builder or reference, not looked up
    pub fn has_override(&self) -> bool {
        self.builder.is_some() || self.custom_ref
    }
}

/// Per-container configuration, taken from `self.` annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfiguration {
    #[serde(rename = "i", default, skip_serializing_if = "is_false")]
    pub is_isolated: bool,
    #[serde(rename = "ac", default, skip_serializing_if = "is_false")]
    pub allows_cycles: bool,
    #[serde(rename = "o", default, skip_serializing_if = "is_false")]
    pub objc: bool,
    #[serde(rename = "pl", default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(rename = "pj", default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
}

impl ContainerConfiguration {
    pub fn from_attributes<'a>(attributes: impl IntoIterator<Item = &'a ConfigurationAttribute>) -> Self {
        let mut configuration = Self::default();
        for attribute in attributes {
            match attribute {
                ConfigurationAttribute::IsIsolated(value) => configuration.is_isolated = *value,
                ConfigurationAttribute::AllowsCycles(value) => configuration.allows_cycles = *value,
                ConfigurationAttribute::Objc(value) => configuration.objc = *value,
                ConfigurationAttribute::Platforms(platforms) => configuration.platforms = platforms.clone(),
                ConfigurationAttribute::Projects(projects) => configuration.projects = projects.clone(),
                ConfigurationAttribute::Scope(_)
                | ConfigurationAttribute::Builder(_)
                | ConfigurationAttribute::CustomRef(_)
                | ConfigurationAttribute::Setter(_) => {}
            }
        }
        configuration
    }
}

/// A registration, reference or parameter edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "k")]
    pub kind: DependencyKind,
    #[serde(rename = "n")]
    pub name: String,
    /// Concrete type of a registration, first declared type of a reference,
    /// type of a parameter
    #[serde(rename = "t")]
    pub ty: TypeIdentity,
    /// Every type the dependency is exposed as, in declaration order
    #[serde(rename = "at", default, skip_serializing_if = "Vec::is_empty")]
    pub abstract_types: Vec<TypeIdentity>,
    #[serde(rename = "sr")]
    pub source: ContainerId,
    #[serde(rename = "tg", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ContainerId>,
    #[serde(rename = "c", default)]
    pub configuration: DependencyConfiguration,
    #[serde(rename = "l", default)]
    pub location: FileLocation,
}

impl Dependency {
    pub fn abstract_type(&self) -> &TypeIdentity {
        self.abstract_types.first().unwrap_or(&self.ty)
    }

    pub fn is_registration(&self) -> bool {
        self.kind == DependencyKind::Registration
    }

    pub fn is_reference(&self) -> bool {
        self.kind == DependencyKind::Reference
    }

    pub fn printable(&self) -> PrintableDependency {
        let ty = match self.kind {
            DependencyKind::Registration | DependencyKind::Parameter => self.ty.clone(),
            DependencyKind::Reference => self.abstract_type().clone(),
        };
        PrintableDependency::new(self.name.clone(), Some(ty), self.location.clone())
    }
}

/// A node of the graph: a type declaring or receiving dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyContainer {
    #[serde(skip)]
    pub id: ContainerId,
    /// Absent for containers only known through references
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeIdentity>,
    #[serde(rename = "a", default)]
    pub access_level: AccessLevel,
    #[serde(flatten)]
    pub configuration: ContainerConfiguration,
    #[serde(rename = "r", default, skip_serializing_if = "Vec::is_empty")]
    pub registrations: Vec<DependencyId>,
    #[serde(rename = "f", default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<DependencyId>,
    #[serde(rename = "p", default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<DependencyId>,
    /// Containers registering or referencing this one
    #[serde(rename = "d", default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ContainerId>,
    /// Abstract types this container was referenced as
    #[serde(rename = "rt", default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_types: Vec<TypeIdentity>,
    /// Types this container's declaration is nested in, outermost first
    #[serde(rename = "e", default, skip_serializing_if = "Vec::is_empty")]
    pub embedding_types: Vec<TypeIdentity>,
    #[serde(rename = "l", default)]
    pub location: FileLocation,
}

impl DependencyContainer {
    pub fn new(id: ContainerId, ty: Option<TypeIdentity>) -> Self {
        Self {
            id,
            ty,
            access_level: AccessLevel::default(),
            configuration: ContainerConfiguration::default(),
            registrations: Vec::new(),
            references: Vec::new(),
            parameters: Vec::new(),
            sources: Vec::new(),
            referenced_types: Vec::new(),
            embedding_types: Vec::new(),
            location: FileLocation::unknown(),
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.configuration.is_isolated
    }

    pub fn allows_cycles(&self) -> bool {
        self.configuration.allows_cycles
    }

    pub fn is_public(&self) -> bool {
        self.access_level == AccessLevel::Public
    }

    /// Registrations then references, in declaration order
    pub fn ordered_dependencies(&self) -> impl Iterator<Item = DependencyId> + '_ {
        self.registrations.iter().chain(self.references.iter()).copied()
    }

    /// Registrations, references then parameters
    pub fn all_dependencies(&self) -> impl Iterator<Item = DependencyId> + '_ {
        self.ordered_dependencies().chain(self.parameters.iter().copied())
    }

    pub fn printable(&self) -> PrintableResolver {
        PrintableResolver::new(self.ty.clone(), self.location.clone())
    }

    fn add_source(&mut self, source: ContainerId) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    fn add_referenced_type(&mut self, ty: &TypeIdentity) {
        if !self.referenced_types.contains(ty) {
            self.referenced_types.push(ty.clone());
        }
    }
}

/// The dependency graph of a whole project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(rename = "c")]
    containers: Vec<DependencyContainer>,
    #[serde(rename = "e")]
    dependencies: Vec<Dependency>,
    /// Container a dependency name resolves to
    #[serde(rename = "nm")]
    by_name: IndexMap<String, ContainerId>,
    #[serde(rename = "im", default, skip_serializing_if = "IndexMap::is_empty")]
    imports_by_file: IndexMap<String, Vec<String>>,
    #[serde(skip)]
    by_type: IndexMap<TypeIdentity, ContainerId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ContainerId) -> Option<&DependencyContainer> {
        self.containers.get(id.index())
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut DependencyContainer> {
        self.containers.get_mut(id.index())
    }

    pub fn dependency(&self, id: DependencyId) -> Option<&Dependency> {
        self.dependencies.get(id.index())
    }

    /// Like [`Self::get`], for ids that must exist
    pub fn container(&self, id: ContainerId) -> Result<&DependencyContainer, InspectorError> {
        self.get(id)
            .ok_or_else(|| InspectorError::Internal(format!("unknown container id {}", id.0)))
    }

    /// Like [`Self::dependency`], for ids that must exist
    pub fn edge(&self, id: DependencyId) -> Result<&Dependency, InspectorError> {
        self.dependency(id)
            .ok_or_else(|| InspectorError::Internal(format!("unknown dependency id {}", id.0)))
    }

    pub fn id_of_type(&self, ty: &TypeIdentity) -> Option<ContainerId> {
        self.by_type.get(&ty.non_optional()).copied()
    }

    pub fn id_of_name(&self, name: &str) -> Option<ContainerId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyContainer> {
        self.containers.iter()
    }

    /// Every edge, in the order it was linked
    pub fn dependencies(&self) -> impl Iterator<Item = (DependencyId, &Dependency)> {
        self.dependencies
            .iter()
            .enumerate()
            .map(|(index, dependency)| (DependencyId(index as u32), dependency))
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn imports(&self, file: &str) -> &[String] {
        self.imports_by_file.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files declaring at least one container, in order of appearance
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for file in self.containers.iter().filter_map(|c| c.location.file.as_deref()) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    pub fn containers_in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a DependencyContainer> + 'a {
        self.containers
            .iter()
            .filter(move |c| c.location.file.as_deref() == Some(file))
    }

    /// Find the registration or reference of `container` with `index`
    pub fn find(&self, container: ContainerId, index: &DependencyIndex) -> Option<(DependencyId, &Dependency)> {
        let container = self.get(container)?;
        container.ordered_dependencies().find_map(|id| {
            let dependency = self.dependency(id)?;
            (self.index_of(dependency).as_ref() == Some(index)).then_some((id, dependency))
        })
    }

    /// Any dependency of `container` named `name`, parameters included
    pub fn find_named(&self, container: ContainerId, name: &str) -> Option<&Dependency> {
        let container = self.get(container)?;
        container
            .all_dependencies()
            .filter_map(|id| self.dependency(id))
            .find(|dependency| dependency.name == name)
    }

    /// The index an edge is stored under; parameters have none
    pub fn index_of(&self, dependency: &Dependency) -> Option<DependencyIndex> {
        let target = self.get(dependency.target?)?;
        Some(DependencyIndex::new(dependency.name.clone(), target.ty.clone()))
    }

    pub(crate) fn insert_typed(&mut self, ty: &TypeIdentity) -> ContainerId {
        let key = ty.non_optional();
        if let Some(id) = self.by_type.get(&key) {
            return *id;
        }
        let id = self.push(Some(key.clone()));
        self.by_type.insert(key, id);
        id
    }

    pub(crate) fn insert_placeholder(&mut self) -> ContainerId {
        self.push(None)
    }

    fn push(&mut self, ty: Option<TypeIdentity>) -> ContainerId {
        let id = ContainerId(self.containers.len() as u32);
        self.containers.push(DependencyContainer::new(id, ty));
        id
    }

    /// Bind a dependency name to a container; the first binding wins
    pub(crate) fn bind_name(&mut self, name: &str, id: ContainerId) -> ContainerId {
        *self.by_name.entry(name.to_string()).or_insert(id)
    }

    pub(crate) fn add_referenced_type(&mut self, id: ContainerId, ty: &TypeIdentity) {
        if let Some(container) = self.get_mut(id) {
            container.add_referenced_type(ty);
        }
    }

    pub(crate) fn add_imports(&mut self, file: &str, imports: &[String]) {
        self.imports_by_file
            .entry(file.to_string())
            .or_default()
            .extend(imports.iter().cloned());
    }

    /// Attach an edge to its source container, replacing an edge stored
    /// under the same index, and record the source as a dependent of the target.
    pub(crate) fn attach(&mut self, dependency: Dependency) -> Result<DependencyId, InspectorError> {
        let source = dependency.source;
        let target = dependency.target;
        let existing = match dependency.kind {
            DependencyKind::Parameter => None,
            DependencyKind::Registration | DependencyKind::Reference => {
                let index = self.index_of(&dependency);
                index.and_then(|index| self.find(source, &index).map(|(id, _)| id))
            }
        };

        let id = match existing {
            Some(id) => {
                self.dependencies[id.index()] = dependency;
                id
            }
            None => {
                let id = DependencyId(self.dependencies.len() as u32);
                let kind = dependency.kind;
                self.dependencies.push(dependency);
                let container = self
                    .get_mut(source)
                    .ok_or_else(|| InspectorError::Internal(format!("unknown container id {}", source.0)))?;
                match kind {
                    DependencyKind::Registration => container.registrations.push(id),
                    DependencyKind::Reference => container.references.push(id),
                    DependencyKind::Parameter => container.parameters.push(id),
                }
                id
            }
        };

        if let Some(target) = target {
            self.get_mut(target)
                .ok_or_else(|| InspectorError::Internal(format!("unknown container id {}", target.0)))?
                .add_source(source);
        }
        Ok(id)
    }

    /// Rebuild the lookup tables that are not serialized
    pub(crate) fn reindex(&mut self) {
        self.by_type.clear();
        for (index, container) in self.containers.iter_mut().enumerate() {
            container.id = ContainerId(index as u32);
            if let Some(ty) = &container.ty {
                self.by_type.entry(ty.clone()).or_insert(container.id);
            }
        }
    }
}
