//! GraphQL schema-definition-language ingestion.
//!
//! Type definitions become named IR types, root-type fields and executable
//! operations become IR operations.
//!
//! ## Module Structure
//!
//! - `lexer`: source text → tokens with line/column positions
//! - `ast`: syntax tree for type-system and executable definitions
//! - `parser`: tokens → syntax tree
//! - `convert`: syntax tree → IR

mod ast;
mod convert;
mod lexer;
mod parser;

use std::path::Path;

pub use convert::GraphQlParser;

use crate::error::Result;
use crate::ir::IrSchema;

/// Parse the GraphQL document at `path` from the filesystem with default options.
pub fn parse(path: &Path) -> Result<IrSchema> {
    GraphQlParser::default().parse(path)
}
