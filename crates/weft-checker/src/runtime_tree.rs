//! Parameter propagation along the instantiation tree
//!
//! The instantiation tree starts at every typed container nobody depends on
//! and expands each registration into the container it builds. A shared
//! (`container` or `weak`) registration whose target takes parameters can
//! only be built if an ancestor on that path threads the value through as one
//! of its own parameters.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};
use weft_ast::Scope;
use weft_graph::{
    AnalysisRecord, ContainerId, Dependency, DependencyGraph, DependencyKind, InspectorAnalysisError,
    InspectorError,
};

/// Name bindings visible from a node: the kind of the nearest ancestor
/// declaration for each dependency name
type Bindings = BTreeMap<String, DependencyKind>;

pub struct RuntimeTreeInspector<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<(ContainerId, Bindings)>,
}

impl<'g> RuntimeTreeInspector<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
        }
    }

    pub fn validate(&mut self) -> Result<(), InspectorError> {
        let graph = self.graph;
        let roots: Vec<ContainerId> = graph
            .iter()
            .filter(|container| container.ty.is_some() && container.sources.is_empty())
            .map(|container| container.id)
            .collect();

        for root in &roots {
            self.visit(*root, &mut Vec::new())?;
        }

        debug!(roots = roots.len(), nodes = self.visited.len(); "Runtime tree validated");
        Ok(())
    }

    fn visit(&mut self, id: ContainerId, path: &mut Vec<ContainerId>) -> Result<(), InspectorError> {
        let graph = self.graph;
        let bindings = self.bindings(path);
        if !self.visited.insert((id, bindings)) {
            return Ok(());
        }
        let container = graph.container(id)?;
        trace!(depth = path.len(), ty:? = container.ty; "Inspecting node");

        for registration in &container.registrations {
            let dependency = graph.edge(*registration)?;
            self.check(id, dependency, path)?;
        }

        path.push(id);
        for registration in &container.registrations {
            let Some(target) = graph.edge(*registration)?.target else {
                continue;
            };
            if target == id || path.contains(&target) {
                continue;
            }
            self.visit(target, path)?;
        }
        path.pop();
        Ok(())
    }

    fn bindings(&self, path: &[ContainerId]) -> Bindings {
        let mut bindings = Bindings::new();
        for ancestor in path.iter().filter_map(|id| self.graph.get(*id)) {
            for dependency in ancestor.all_dependencies().filter_map(|id| self.graph.dependency(id)) {
                bindings.insert(dependency.name.clone(), dependency.kind);
            }
        }
        bindings
    }

    /// Check one registration of `node`, whose strict ancestors are `path`
    fn check(&self, node: ContainerId, dependency: &Dependency, path: &[ContainerId]) -> Result<(), InspectorError> {
        let scope = dependency.configuration.scope;
        if !matches!(scope, Scope::Container | Scope::Weak) {
            return Ok(());
        }
        let Some(target) = dependency.target else {
            return Ok(());
        };
        if self.graph.container(target)?.parameters.is_empty() {
            return Ok(());
        }

        if scope.is_weak() && !dependency.ty.is_optional && !dependency.abstract_type().is_optional {
            return Err(InspectorError::invalid_graph(
                dependency.printable(),
                InspectorAnalysisError::WeakParameterHasToBeOptional,
            ));
        }

        match self.parameter_history(node, dependency, path)? {
            Some(history) => Err(InspectorError::invalid_graph(
                dependency.printable(),
                InspectorAnalysisError::InvalidContainerScope { history },
            )),
            None => Ok(()),
        }
    }

    /// Walk up the instantiation path looking for the declaration of the
    /// dependency's name. Returns the failure history, or `None` if a
    /// parameter binds it.
    fn parameter_history(
        &self,
        node: ContainerId,
        dependency: &Dependency,
        path: &[ContainerId],
    ) -> Result<Option<Vec<AnalysisRecord>>, InspectorError> {
        let name = &dependency.name;
        let mut history = vec![AnalysisRecord::TriedToResolveDependencyInType {
            name: name.clone(),
            resolver: self.graph.container(node)?.printable(),
            step: 0,
        }];

        for (step, ancestor) in path.iter().rev().enumerate() {
            let container = self.graph.container(*ancestor)?;
            history.push(AnalysisRecord::TriedToResolveDependencyInType {
                name: name.clone(),
                resolver: container.printable(),
                step: step + 1,
            });

            match self.graph.find_named(*ancestor, name).map(|found| found.kind) {
                Some(DependencyKind::Parameter) => return Ok(None),
                Some(DependencyKind::Registration) => {
                    history.push(AnalysisRecord::InvalidContainerScope {
                        name: name.clone(),
                        resolver: container.printable(),
                    });
                    return Ok(Some(history));
                }
                Some(DependencyKind::Reference) | None => {}
            }
        }

        let root = self.graph.container(path.first().copied().unwrap_or(node))?;
        history.push(AnalysisRecord::DependencyNotFound {
            name: name.clone(),
            resolver: root.printable(),
        });
        Ok(Some(history))
    }
}
