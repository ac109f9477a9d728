//! Weft AST - shared data model for the annotation pipeline
//!
//! Holds source locations, diagnostics, type identities, configuration
//! attributes and the annotation tree produced by the parser.

mod config;
mod diagnostic;
mod expr;
mod span;
mod types;

pub use config::*;
pub use diagnostic::*;
pub use expr::*;
pub use span::*;
pub use types::*;
