//! Static soundness checks over a linked dependency graph
//!
//! Two checks run over every edge, in link order, and the first failure aborts
//! the validation:
//! - resolution: every reference is satisfied by an accessible registration in
//!   some ancestor, for every container depending on its source
//! - build: eagerly built registrations never require building themselves again

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use weft_ast::{Diagnostic, Scope};
use weft_graph::{
    cyclic_history, unresolvable_history, AnalysisRecord, ContainerId, Dependency, DependencyGraph, DependencyIndex,
    InspectorAnalysisError, InspectorError,
};

/// Visit state for DFS cycle detection
#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Completed,
}

/// Validates a [`DependencyGraph`].
///
/// Caches are owned by the inspector, so each instance starts from scratch.
pub struct Inspector<'g> {
    graph: &'g DependencyGraph,
    /// Successful searches, keyed by (reference source, resolver, index)
    resolution_cache: HashSet<(ContainerId, ContainerId, DependencyIndex)>,
    build_cache: HashSet<(ContainerId, Scope)>,
    warnings: Vec<Diagnostic>,
}

impl<'g> Inspector<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            resolution_cache: HashSet::new(),
            build_cache: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Check every edge; stops at the first invalid one
    pub fn validate(&mut self) -> Result<(), InspectorError> {
        let graph = self.graph;
        for (_, dependency) in graph.dependencies() {
            self.check_isolation(dependency)?;
            if dependency.is_reference() {
                self.lint_reference(dependency);
                self.resolve(dependency)?;
            } else if dependency.is_registration() {
                self.build(dependency)?;
            }
        }

        debug!(
            dependencies = graph.dependencies().count(),
            warnings = self.warnings.len();
            "Graph validated"
        );
        Ok(())
    }

    /// Lints collected while validating
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    fn lint_reference(&mut self, dependency: &Dependency) {
        if dependency.abstract_types.len() > 1 {
            self.warnings.push(Diagnostic::warning(
                dependency.location.clone(),
                format!(
                    "Dependency '{}' is referenced with {} types. Only the first one, '{}', is used to resolve it",
                    dependency.name,
                    dependency.abstract_types.len(),
                    dependency.abstract_type()
                ),
            ));
        }
    }

    /// Both ends of an edge: an isolated type without dependencies of its
    /// own is still reached through the edges pointing at it
    fn check_isolation(&self, dependency: &Dependency) -> Result<(), InspectorError> {
        for id in [Some(dependency.source), dependency.target].into_iter().flatten() {
            if !self.graph.container(id)?.is_isolated() {
                continue;
            }
            self.isolation_error(id)
                .map_err(|error| InspectorError::invalid_graph(dependency.printable(), error))?;
        }
        Ok(())
    }

    /// Fails when an isolated container has non-isolated dependents
    fn isolation_error(&self, id: ContainerId) -> Result<(), InspectorAnalysisError> {
        let Some(container) = self.graph.get(id) else {
            return Ok(());
        };
        if !container.is_isolated() {
            return Ok(());
        }

        let referents: Vec<_> = container
            .sources
            .iter()
            .filter_map(|source| self.graph.get(*source))
            .filter(|source| !source.is_isolated())
            .map(|source| source.printable())
            .collect();

        if referents.is_empty() {
            Ok(())
        } else {
            Err(InspectorAnalysisError::IsolatedResolverCannotHaveReferents {
                ty: container.ty.clone(),
                referents,
            })
        }
    }

    // =========================================================================
    // Resolution check
    // =========================================================================

    fn resolve(&mut self, dependency: &Dependency) -> Result<(), InspectorError> {
        if dependency.configuration.has_override() {
            return Ok(());
        }

        let graph = self.graph;
        let source = graph.container(dependency.source)?;
        let index = graph
            .index_of(dependency)
            .ok_or_else(|| InspectorError::Internal(format!("reference '{}' has no target", dependency.name)))?;

        if source.sources.is_empty() {
            let failure = if source.is_public() {
                let target = dependency
                    .target
                    .map(|target| graph.container(target))
                    .transpose()?;
                let ambiguous = target.map_or(false, |target| target.referenced_types.len() > 1);
                ambiguous.then(|| InspectorAnalysisError::UnresolvableDependency { history: Vec::new() })
            } else if source.is_isolated() {
                None
            } else {
                Some(InspectorAnalysisError::UnresolvableDependency {
                    history: vec![AnalysisRecord::DependencyNotFound {
                        name: dependency.name.clone(),
                        resolver: source.printable(),
                    }],
                })
            };
            return match failure {
                Some(error) => Err(InspectorError::invalid_graph(dependency.printable(), error)),
                None => Ok(()),
            };
        }

        for dependent in &source.sources {
            self.resolve_in(dependency.source, *dependent, &index)
                .map_err(|error| InspectorError::invalid_graph(dependency.printable(), error))?;
        }
        Ok(())
    }

    /// Search upward from `resolver`, a dependent of `source`. Coming back
    /// to `source` is a cycle, never a match on the reference being checked.
    fn resolve_in(
        &mut self,
        source: ContainerId,
        resolver: ContainerId,
        index: &DependencyIndex,
    ) -> Result<(), InspectorAnalysisError> {
        let key = (source, resolver, index.clone());
        if self.resolution_cache.contains(&key) {
            return Ok(());
        }

        let mut visited = HashSet::from([source]);
        let mut history = Vec::new();
        self.resolve_from(resolver, index, &mut visited, &mut history)?;

        self.resolution_cache.insert(key);
        Ok(())
    }

    fn resolve_from(
        &self,
        id: ContainerId,
        index: &DependencyIndex,
        visited: &mut HashSet<ContainerId>,
        history: &mut Vec<AnalysisRecord>,
    ) -> Result<(), InspectorAnalysisError> {
        if !visited.insert(id) {
            return Err(InspectorAnalysisError::CyclicDependency {
                history: cyclic_history(history),
            });
        }
        let Some(container) = self.graph.get(id) else {
            return Err(InspectorAnalysisError::UnresolvableDependency {
                history: unresolvable_history(history),
            });
        };

        let step = history
            .iter()
            .filter(|record| matches!(record, AnalysisRecord::TriedToResolveDependencyInType { .. }))
            .count();
        history.push(AnalysisRecord::TriedToResolveDependencyInType {
            name: index.name.clone(),
            resolver: container.printable(),
            step,
        });
        trace!(name = index.name.as_str(), step = step; "Resolving");

        match self.graph.find(id, index) {
            Some((_, found))
                if found.is_reference()
                    || found.configuration.scope.allows_access_from_children()
                    || found.configuration.has_override() =>
            {
                return Ok(());
            }
            Some(_) => history.push(AnalysisRecord::FoundUnaccessibleDependency {
                name: index.name.clone(),
                resolver: container.printable(),
            }),
            None => history.push(AnalysisRecord::DependencyNotFound {
                name: index.name.clone(),
                resolver: container.printable(),
            }),
        }

        if container.sources.is_empty() {
            return if container.is_isolated() {
                Ok(())
            } else {
                Err(InspectorAnalysisError::UnresolvableDependency {
                    history: unresolvable_history(history),
                })
            };
        }
        self.isolation_error(id)?;

        let mut cycle = None;
        for source in &container.sources {
            let mut branch = visited.clone();
            match self.resolve_from(*source, index, &mut branch, history) {
                Ok(()) => return Ok(()),
                Err(error) if error.is_cyclic() => cycle = Some(error),
                Err(_) => {}
            }
        }

        Err(cycle.unwrap_or_else(|| InspectorAnalysisError::UnresolvableDependency {
            history: unresolvable_history(history),
        }))
    }

    // =========================================================================
    // Build check
    // =========================================================================

    fn build(&mut self, dependency: &Dependency) -> Result<(), InspectorError> {
        let scope = dependency.configuration.scope;
        if scope.allows_access_from_children() || dependency.configuration.has_override() {
            return Ok(());
        }
        let Some(target) = dependency.target else {
            return Ok(());
        };
        if !self.build_cache.insert((target, scope)) {
            return Ok(());
        }

        let mut state = HashMap::new();
        let mut stack = Vec::new();
        let mut path = Vec::new();
        self.visit(target, &mut state, &mut stack, &mut path)
            .map_err(|error| InspectorError::invalid_graph(dependency.printable(), error))
    }

    /// DFS over the registrations that force construction.
    ///
    /// `stack` holds the containers being built, in the same order as `path`.
    fn visit(
        &self,
        id: ContainerId,
        state: &mut HashMap<ContainerId, VisitState>,
        stack: &mut Vec<ContainerId>,
        path: &mut Vec<AnalysisRecord>,
    ) -> Result<(), InspectorAnalysisError> {
        match state.get(&id) {
            Some(VisitState::InProgress) if self.cycle_allowed(id, stack) => return Ok(()),
            Some(VisitState::InProgress) => {
                return Err(InspectorAnalysisError::CyclicDependency {
                    history: cyclic_history(path),
                })
            }
            Some(VisitState::Completed) => return Ok(()),
            None => {}
        }
        let Some(container) = self.graph.get(id) else {
            return Ok(());
        };

        state.insert(id, VisitState::InProgress);
        stack.push(id);
        path.push(AnalysisRecord::TriedToBuildType {
            resolver: container.printable(),
            step: path.len(),
        });

        for registration in container.registrations.iter().filter_map(|id| self.graph.dependency(*id)) {
            let configuration = &registration.configuration;
            if configuration.scope.is_weak() || configuration.has_override() {
                continue;
            }
            if let Some(target) = registration.target {
                self.visit(target, state, stack, path)?;
            }
        }

        stack.pop();
        path.pop();
        state.insert(id, VisitState::Completed);
        Ok(())
    }

    /// A cycle closing on `id` is tolerated when one of its members sets
    /// `allowsCycles`
    fn cycle_allowed(&self, id: ContainerId, stack: &[ContainerId]) -> bool {
        let start = stack.iter().position(|member| *member == id).unwrap_or(stack.len());
        stack[start..]
            .iter()
            .filter_map(|member| self.graph.get(*member))
            .any(|container| container.allows_cycles())
    }
}
