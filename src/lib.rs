//! weft: static analyzer for dependency-injection annotations
//!
//! The root crate re-exports the phase crates and drives them over a whole
//! project: tokenizing and parsing run per file in parallel, linking and
//! inspection run once over the whole forest.

pub use weft_ast as ast;
pub use weft_checker as checker;
pub use weft_graph as graph;
pub use weft_lexer as lexer;
pub use weft_parser as parser;

mod pipeline;

pub use pipeline::*;
