//! Normalizes API descriptions into one typed intermediate representation.
//!
//! Two input formats are supported:
//! - OpenAPI 3.x documents in JSON or YAML ([`OpenApiParser`])
//! - GraphQL schema-definition-language documents ([`GraphQlParser`])
//!
//! Both produce an [`IrSchema`]: named types in an arena addressed by name,
//! REST endpoints and RPC-style operations. [`validate`] checks a finished
//! schema for dangling references and malformed types without failing.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use apir_core::{ParserOptions, parse_file, validate};
//!
//! let schema = parse_file(Path::new("petstore.yaml"), &ParserOptions::default())?;
//! let report = validate(&schema);
//! assert!(report.valid);
//! # Ok::<(), apir_core::Error>(())
//! ```

pub mod document;
pub mod error;
pub mod graphql;
pub mod ir;
pub mod openapi;
pub mod options;
pub mod resolver;
pub mod validate;

use std::path::Path;

use tracing::debug;

pub use error::{Error, FormatError, ResolutionError, ResolutionErrorKind, Result};
pub use graphql::GraphQlParser;
pub use ir::IrSchema;
pub use openapi::OpenApiParser;
pub use options::ParserOptions;
pub use validate::{ValidationError, ValidationResult, validate};

use document::{DocumentFormat, FsReader};

/// Parse the document at `path`, choosing the parser by file extension.
///
/// `.json`, `.yaml` and `.yml` are read as OpenAPI; `.graphql`, `.graphqls`
/// and `.gql` as GraphQL.
pub fn parse_file(path: &Path, options: &ParserOptions) -> Result<IrSchema> {
    let Some(format) = DocumentFormat::from_path(path) else {
        return Err(FormatError::UnsupportedExtension {
            path: path.to_path_buf(),
        }
        .into());
    };
    debug!(path = %path.display(), format = format.as_str(), "Parsing document.");
    if format.is_structured() {
        OpenApiParser::new(&FsReader)
            .with_options(options.clone())
            .parse(path)
    } else {
        GraphQlParser::new(&FsReader)
            .with_options(options.clone())
            .parse(path)
    }
}
