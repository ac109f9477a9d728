//! weft-graph: dependency graph construction
//!
//! Filters the AST forest for the active platform and project, then links it
//! into a [`DependencyGraph`]: one container per injectable type, one edge per
//! registration, reference and parameter.
//!
//! # Example
//!
//! ```ignore
//! let files = filter_files(files, &LinkerConfig::default());
//! let graph = link(&files)?;
//! println!("{}", graph.to_json()?);
//! ```

mod error;
mod filter;
mod graph;
mod json;
mod linker;

pub use error::*;
pub use filter::*;
pub use graph::*;
pub use linker::link;
