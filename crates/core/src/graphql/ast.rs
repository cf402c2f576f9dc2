//! Syntax tree for GraphQL type-system and executable documents.

use serde_json::Value;

use crate::ir::OperationKind;

/// A whole document: definitions in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// `schema { query: Q }` or `extend schema { ... }`.
    Schema(SchemaDefinition),
    Type(TypeDefinition),
    /// `extend type|interface|input|enum|union|scalar ...`
    Extension(TypeDefinition),
    /// `directive @name(...) on ...`; only the name is kept.
    Directive(String),
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub roots: Vec<(OperationKind, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<Directive>,
    pub kind: TypeDefinitionKind,
    /// 1-based source line of the name, for diagnostics.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinitionKind {
    Object {
        interfaces: Vec<String>,
        fields: Vec<FieldDefinition>,
    },
    Interface {
        interfaces: Vec<String>,
        fields: Vec<FieldDefinition>,
    },
    InputObject {
        fields: Vec<InputValueDefinition>,
    },
    Enum {
        values: Vec<EnumValueDefinition>,
    },
    Union {
        members: Vec<String>,
    },
    Scalar,
}

impl TypeDefinitionKind {
    /// Keyword introducing this kind of definition.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Object { .. } => "type",
            Self::Interface { .. } => "interface",
            Self::InputObject { .. } => "input",
            Self::Enum { .. } => "enum",
            Self::Union { .. } => "union",
            Self::Scalar => "scalar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: TypeAnnotation,
    pub directives: Vec<Directive>,
}

/// An argument, input field or variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeAnnotation,
    pub default: Option<Value>,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<Directive>,
}

/// A type as written at a use site: `Pet`, `[Pet]`, `Pet!`, `[Pet!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    Named(String),
    List(Box<TypeAnnotation>),
    NonNull(Box<TypeAnnotation>),
}

/// `@name(arg: value, ...)`; arguments are checked for syntax, only the name is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
}

/// Whether `directives` carries `@deprecated`.
pub fn is_deprecated(directives: &[Directive]) -> bool {
    directives.iter().any(|d| d.name == "deprecated")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<InputValueDefinition>,
    pub selections: Vec<Selection>,
    /// Byte range of the whole definition in the source.
    pub span: (usize, usize),
}

/// `fragment Name on Type { ... }`; the type condition is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDefinition {
    pub name: String,
    pub selections: Vec<Selection>,
}

/// One entry of a selection set. Only the shape needed to find the
/// root fields an operation selects is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Field(FieldSelection),
    FragmentSpread(String),
    InlineFragment(Vec<Selection>),
}

/// A selected field. Its arguments and sub-selections are parsed and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub alias: Option<String>,
    pub name: String,
}

impl FieldSelection {
    /// Key the field appears under in a response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}
