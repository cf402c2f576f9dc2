//! OpenAPI 3.x ingestion.
//!
//! This module turns a JSON or YAML OpenAPI document into an [`IrSchema`]:
//! - Component schemas become named types
//! - Paths and their operations become endpoints
//! - Security schemes are carried over by name
//!
//! ## Module Structure
//!
//! - `spec`: serde models of the document and of schema nodes
//! - `convert`: schema node → IR type conversion
//! - `parser`: whole-document walk and IR assembly

mod convert;
mod parser;
mod spec;

use std::path::Path;

pub use convert::SchemaConverter;
pub use parser::OpenApiParser;

use crate::error::Result;
use crate::ir::IrSchema;

/// Parse the OpenAPI document at `path` from the filesystem with default options.
pub fn parse(path: &Path) -> Result<IrSchema> {
    OpenApiParser::default().parse(path)
}
