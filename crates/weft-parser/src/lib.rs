//! Weft Parser - builds the annotation AST of one file
//!
//! Each injectable type opens a frame; annotation tokens attach to the
//! innermost open frame. Checks run eagerly:
//! - a dependency name is declared once per type
//! - configuration must target a dependency declared above it
//! - a type without dependencies is dropped

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use log::debug;
use weft_ast::Expr;
use weft_lexer::Token;

/// Parse one file's token stream into an `Expr::File`
pub fn parse(tokens: Vec<Token>, file_name: &str) -> Result<Expr, ParserError> {
    let mut parser = Parser::new(tokens, file_name);
    let expr = parser.parse()?;
    debug!(file = file_name; "AST built");
    Ok(expr)
}
