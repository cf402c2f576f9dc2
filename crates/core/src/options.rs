//! Parser options, deserializable from the `[parser]` table of a config file.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ir::PrimitiveKind;

/// Built-in scalar mapping applied before any configured overrides.
const BUILTIN_SCALARS: [(&str, PrimitiveKind); 9] = [
    ("ID", PrimitiveKind::String),
    ("String", PrimitiveKind::String),
    ("Int", PrimitiveKind::Integer),
    ("Float", PrimitiveKind::Number),
    ("Boolean", PrimitiveKind::Boolean),
    ("Date", PrimitiveKind::Date),
    ("DateTime", PrimitiveKind::DateTime),
    ("Upload", PrimitiveKind::Binary),
    ("JSON", PrimitiveKind::Any),
];

/// The five scalars every GraphQL schema has without declaring them.
pub const STANDARD_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

/// Options shared by both document parsers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Metadata title for formats without a metadata block. Defaults to the file stem.
    pub title: Option<String>,
    /// Metadata version for formats without a metadata block. Defaults to `1.0.0`.
    pub version: Option<String>,
    /// Scalar name → primitive kind, layered over the built-in table.
    pub scalars: IndexMap<String, PrimitiveKind>,
}

impl ParserOptions {
    /// Default version when none is configured.
    pub const DEFAULT_VERSION: &'static str = "1.0.0";

    /// Add or replace one scalar mapping.
    pub fn with_scalar(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.scalars.insert(name.into(), kind);
        self
    }

    /// Primitive kind for scalar `name`, if configured or built in.
    pub fn scalar_kind(&self, name: &str) -> Option<PrimitiveKind> {
        self.scalars.get(name).copied().or_else(|| {
            BUILTIN_SCALARS
                .iter()
                .find(|(builtin, _)| *builtin == name)
                .map(|(_, kind)| *kind)
        })
    }
}

/// Whether `name` is one of the five standard scalars.
pub fn is_standard_scalar(name: &str) -> bool {
    STANDARD_SCALARS.contains(&name)
}
