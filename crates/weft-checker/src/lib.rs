//! weft-checker: soundness checks over a linked dependency graph
//!
//! - [`Inspector`]: every reference resolves, eager construction is acyclic,
//!   isolated containers stay isolated
//! - [`RuntimeTreeInspector`]: shared registrations needing parameters get
//!   them from the instantiation path

mod inspector;
mod runtime_tree;

pub use inspector::Inspector;
pub use runtime_tree::RuntimeTreeInspector;

use weft_ast::Diagnostic;
use weft_graph::{DependencyGraph, InspectorError};

/// Run every check over `graph`, returning the lint warnings on success
pub fn validate(graph: &DependencyGraph) -> Result<Vec<Diagnostic>, InspectorError> {
    let mut inspector = Inspector::new(graph);
    inspector.validate()?;
    RuntimeTreeInspector::new(graph).validate()?;
    Ok(inspector.into_warnings())
}
