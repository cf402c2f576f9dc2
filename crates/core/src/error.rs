//! Error taxonomy for the ingestion pipeline.
//!
//! Two classes of failure abort a parse:
//! - [`FormatError`]: the source (or a node inside it) cannot be read or
//!   does not have the shape the parser expects.
//! - [`ResolutionError`]: a `$ref` pointer does not lead anywhere.
//!
//! Circular references are not errors; the resolver hands back a
//! placeholder instead. Validation findings are plain data, see
//! [`crate::validate`].

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any fatal failure raised while parsing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document could not be read or is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// A reference could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Unreadable file, unsupported extension or malformed syntax.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Reading the source failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file extension does not name a supported format.
    #[error("unsupported document extension: {}", path.display())]
    UnsupportedExtension {
        /// Offending path.
        path: PathBuf,
    },
    /// Malformed JSON.
    #[error("failed to parse JSON in {}: {source}", path.display())]
    Json {
        /// Offending path.
        path: PathBuf,
        /// Underlying parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// Malformed YAML.
    #[error("failed to parse YAML in {}: {source}", path.display())]
    Yaml {
        /// Offending path.
        path: PathBuf,
        /// Underlying parser failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// A node inside an otherwise well-formed document has the wrong shape.
    #[error("invalid document node at {location} in {}: {message}", path.display())]
    Schema {
        /// Document the node belongs to.
        path: PathBuf,
        /// Pointer-style location of the node.
        location: String,
        /// What was wrong with it.
        message: String,
    },
    /// The document declares a version this crate does not ingest.
    #[error("unsupported API description version `{version}` in {}", path.display())]
    UnsupportedVersion {
        /// Offending path.
        path: PathBuf,
        /// Declared version string.
        version: String,
    },
    /// Malformed GraphQL schema-definition-language text.
    #[error("GraphQL syntax error in {} at {line}:{column}: {message}", path.display())]
    GraphQl {
        /// Offending path.
        path: PathBuf,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Description of the problem.
        message: String,
    },
}

/// A pointer that could not be followed.
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve `{pointer}` from {}: {kind}", document.display())]
pub struct ResolutionError {
    /// The full pointer string as written in the document.
    pub pointer: String,
    /// The document that contained the reference.
    pub document: PathBuf,
    /// Why resolution failed.
    pub kind: ResolutionErrorKind,
}

/// The reason a pointer could not be followed.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionErrorKind {
    /// A path segment does not exist in the target value.
    #[error("segment `{0}` not found")]
    MissingSegment(String),
    /// An intermediate value is a scalar and cannot be walked into.
    #[error("cannot traverse into a scalar at segment `{0}`")]
    NotTraversable(String),
    /// The external document could not be read or parsed.
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),
    /// The external document's extension is neither JSON nor YAML.
    #[error("unsupported document extension")]
    UnsupportedExtension,
}

impl FormatError {
    /// Build a [`FormatError::Schema`] for a node at `location`.
    pub(crate) fn schema(
        path: impl Into<PathBuf>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Schema {
            path: path.into(),
            location: location.into(),
            message: message.into(),
        }
    }
}
