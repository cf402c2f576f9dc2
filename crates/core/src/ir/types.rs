//! Type-level IR: named type definitions and the references that point at them.
//!
//! Every cross-type edge is a [`IrTypeRef::Reference`] by name into
//! [`IrSchema::types`](super::IrSchema::types), so cyclic schema graphs are
//! plain data with no ownership cycles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar kinds that need no named definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Text.
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// Only `null`.
    Null,
    /// Any value; also the kind of circular-reference placeholders.
    Any,
    /// A value whose shape the source does not describe.
    Unknown,
    /// No value, e.g. an operation without a result.
    Void,
    /// Calendar date (`format: date`).
    Date,
    /// Timestamp (`format: date-time`).
    #[serde(rename = "datetime")]
    DateTime,
    /// Raw bytes (`format: binary`).
    Binary,
}

impl PrimitiveKind {
    /// Lowercase tag, as used in serialized IR and validator paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Void => "void",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Binary => "binary",
        }
    }

    /// Parse a lowercase tag. Accepts `date-time` and `file` as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            "void" => Self::Void,
            "date" => Self::Date,
            "datetime" | "date-time" => Self::DateTime,
            "binary" | "file" => Self::Binary,
            _ => return None,
        };
        Some(kind)
    }
}

/// A named type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrType {
    /// Unique within the owning schema's `types` map (or synthesized for inline types).
    pub name: String,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind tag plus the payload relevant to that kind.
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Validation constraints; omitted from the output when empty.
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    /// Default value, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl IrType {
    /// A type of `kind` with no description, constraints or default.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            constraints: Constraints::default(),
            default: None,
            deprecated: false,
        }
    }

    /// A primitive-kind type.
    pub fn primitive(name: impl Into<String>, primitive: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive { primitive })
    }

    /// An `any`-kind placeholder carrying a human-readable note.
    pub fn placeholder(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveKind::Any).with_description(Some(note.into()))
    }

    /// Replace the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// The kind tag: `object`, `array`, `enum`, ... or the primitive's own name.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Kind-specific payload of an [`IrType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeKind {
    /// A record with named properties.
    Object {
        /// Properties in declaration order.
        properties: Vec<IrProperty>,
        /// Extra keys beyond `properties`; `None` when the source is silent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_properties: Option<AdditionalProperties>,
        /// Interfaces the type declares it implements (GraphQL).
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        implements: Vec<String>,
    },
    /// A homogeneous list.
    Array {
        /// Element type.
        items: Box<IrTypeRef>,
    },
    /// A named alias of a primitive kind.
    Primitive {
        /// The aliased kind.
        primitive: PrimitiveKind,
    },
    /// A closed set of values.
    Enum {
        /// Members in declaration order.
        values: Vec<EnumMember>,
    },
    /// Exactly one of several types.
    Union {
        /// Variant types in declaration order.
        variants: Vec<IrTypeRef>,
        /// How to tell the variants apart, when the source says.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminator: Option<Discriminator>,
    },
    /// All of several types at once.
    Intersection {
        /// Member types in declaration order.
        members: Vec<IrTypeRef>,
    },
    /// Exactly one constant value.
    Literal {
        /// The constant, verbatim.
        value: Value,
    },
}

impl TypeKind {
    /// An object with `properties` and nothing else.
    pub fn object(properties: Vec<IrProperty>) -> Self {
        Self::Object {
            properties,
            additional_properties: None,
            implements: Vec::new(),
        }
    }

    /// Kind tag for this payload.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Primitive { primitive } => primitive.as_str(),
            Self::Enum { .. } => "enum",
            Self::Union { .. } => "union",
            Self::Intersection { .. } => "intersection",
            Self::Literal { .. } => "literal",
        }
    }
}

/// One property of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrProperty {
    /// Key as written in the source.
    pub name: String,
    /// Value type; its `nullable` flag says whether `null` is accepted here.
    #[serde(rename = "type")]
    pub ty: IrTypeRef,
    /// Whether the key must be present.
    pub required: bool,
    /// Only ever sent by the server.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// Only ever sent by the client.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Default value, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IrProperty {
    /// A property with only name, type and required flag set.
    pub fn new(name: impl Into<String>, ty: IrTypeRef, required: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            required,
            read_only: false,
            write_only: false,
            deprecated: false,
            default: None,
            description: None,
        }
    }
}

/// `additionalProperties` of an object: a flag or a value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// Extra keys of any type are allowed (`true`) or forbidden (`false`).
    Allowed(bool),
    /// Extra keys are allowed and their values have this type.
    Typed(Box<IrTypeRef>),
}

/// Which property selects a union variant, and how its values map to type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// Property whose value names the variant.
    pub property_name: String,
    /// Discriminator value → type name, in declaration order.
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

impl Discriminator {
    /// Type name selected by discriminator `value`.
    pub fn type_for_value(&self, value: &str) -> Option<&str> {
        self.mapping.get(value).map(String::as_str)
    }

    /// Discriminator value that selects `type_name`.
    pub fn value_for_type(&self, type_name: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, target)| *target == type_name)
            .map(|(value, _)| value.as_str())
    }
}

/// One member of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Identifier derived from the value, unique within the enum.
    pub name: String,
    /// The value itself: string, number, boolean or null.
    pub value: Value,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// Format, range and length constraints carried over from the source schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Format hint such as `uuid` or `int64`, kept even when it refines the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Exclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    /// Exclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Regular expression strings must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Array elements must be distinct.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
}

impl Constraints {
    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A use of a type in context: property, item, variant, parameter, body...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ref", rename_all = "camelCase")]
pub enum IrTypeRef {
    /// By name into the schema's `types` map.
    Reference {
        /// Key into the `types` map.
        name: String,
        /// Whether this usage admits `null`.
        #[serde(default)]
        nullable: bool,
    },
    /// An anonymous type carried directly.
    Inline {
        /// The type, named with a synthesized `<Context>_<n>` name.
        #[serde(rename = "type")]
        ty: Box<IrType>,
        /// Whether this usage admits `null`.
        #[serde(default)]
        nullable: bool,
    },
    /// A primitive kind carried directly.
    Primitive {
        /// The kind.
        primitive: PrimitiveKind,
        /// Whether this usage admits `null`.
        #[serde(default)]
        nullable: bool,
    },
}

impl IrTypeRef {
    /// Non-nullable reference to the named type.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference {
            name: name.into(),
            nullable: false,
        }
    }

    /// Non-nullable inline type.
    pub fn inline(ty: IrType) -> Self {
        Self::Inline {
            ty: Box::new(ty),
            nullable: false,
        }
    }

    /// Non-nullable primitive.
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        Self::Primitive {
            primitive,
            nullable: false,
        }
    }

    /// Whether the usage site admits `null`.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Reference { nullable, .. }
            | Self::Inline { nullable, .. }
            | Self::Primitive { nullable, .. } => *nullable,
        }
    }

    /// Return the same ref with `nullable` replaced.
    pub fn with_nullable(mut self, value: bool) -> Self {
        match &mut self {
            Self::Reference { nullable, .. }
            | Self::Inline { nullable, .. }
            | Self::Primitive { nullable, .. } => *nullable = value,
        }
        self
    }

    /// Name of the referenced type, for `reference` refs.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Self::Reference { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The inline type, for `inline` refs.
    pub fn inline_type(&self) -> Option<&IrType> {
        match self {
            Self::Inline { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// The primitive kind, for `primitive` refs.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive { primitive, .. } => Some(*primitive),
            _ => None,
        }
    }

    /// Variant tag: `reference`, `inline` or `primitive`.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Reference { .. } => "reference",
            Self::Inline { .. } => "inline",
            Self::Primitive { .. } => "primitive",
        }
    }
}
