//! OpenAPI document structs for serde deserialization.
//!
//! Only the parts of OpenAPI 3.x the parser reads are modeled. Nodes that
//! may be `$ref`s (path items, parameters, bodies, responses, schemas at the
//! top level) stay as raw [`Value`]s so the resolver can follow them first.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::ir::HttpMethod;

/// Root OpenAPI document.
#[derive(Debug, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default, deserialize_with = "optional_version_text")]
    pub openapi: Option<String>,
    /// Set by Swagger 2 documents, which are rejected.
    #[serde(default, deserialize_with = "optional_version_text")]
    pub swagger: Option<String>,
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: IndexMap<String, Value>,
    #[serde(default)]
    pub components: Components,
    /// Document-wide security requirements.
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Security requirement: scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Info block.
#[derive(Debug, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "version_text")]
    pub version: String,
    pub description: Option<String>,
}

/// Version fields that YAML reads as numbers when unquoted (`version: 1.0`).
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionText {
    Text(String),
    Number(Number),
}

impl From<VersionText> for String {
    fn from(version: VersionText) -> Self {
        match version {
            VersionText::Text(text) => text,
            VersionText::Number(number) => number.to_string(),
        }
    }
}

fn version_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    VersionText::deserialize(deserializer).map(String::from)
}

fn optional_version_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<VersionText>::deserialize(deserializer)?.map(String::from))
}

/// One server entry.
#[derive(Debug, Deserialize)]
pub struct Server {
    pub url: String,
}

/// Components section containing reusable definitions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
    #[serde(default)]
    pub security_schemes: IndexMap<String, Value>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl PathItem {
    /// The operation declared for `method`, if any.
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }
}

/// An API operation (endpoint).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Value>,
    pub request_body: Option<Value>,
    #[serde(default)]
    pub responses: IndexMap<String, Value>,
    #[serde(default)]
    pub deprecated: bool,
    /// `None` inherits the document-wide requirements; `Some([])` clears them.
    pub security: Option<Vec<SecurityRequirement>>,
}

/// A parameter (path, query, header or cookie).
#[derive(Debug, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Value>,
    /// Alternative to `schema`: a single-entry media type map.
    pub content: Option<IndexMap<String, MediaType>>,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// A request body definition.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: Option<Value>,
}

/// A security scheme, flattened over all scheme types.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub description: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub flows: Option<IndexMap<String, OAuthFlow>>,
    pub open_id_connect_url: Option<String>,
}

/// One OAuth2 flow; only its scopes are kept.
#[derive(Debug, Deserialize)]
pub struct OAuthFlow {
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// JSON Schema definition used in OpenAPI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, number, integer, boolean, object, array).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    pub description: Option<String>,

    /// Properties for object types, in declaration order.
    pub properties: Option<IndexMap<String, Schema>>,

    /// Required property names for object types.
    #[serde(default)]
    pub required: Vec<String>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    /// Enum values (strings, numbers, booleans or null).
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,

    /// Union type (any of these schemas).
    pub any_of: Option<Vec<Schema>>,

    /// Union type (exactly one of these schemas).
    pub one_of: Option<Vec<Schema>>,

    /// Intersection type (all of these schemas combined).
    pub all_of: Option<Vec<Schema>>,

    /// Additional properties for map-like objects.
    pub additional_properties: Option<AdditionalProperties>,

    /// Discriminator for polymorphic oneOf schemas.
    pub discriminator: Option<Discriminator>,

    /// Format hint (e.g., date-time, uuid).
    pub format: Option<String>,

    /// Constant value - schema matches only this exact value.
    #[serde(rename = "const")]
    pub const_value: Option<Value>,

    pub default: Option<Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub write_only: bool,
    #[serde(default)]
    pub deprecated: bool,

    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    #[serde(default)]
    pub unique_items: bool,
}

/// Discriminator for polymorphic schemas.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// The property name that contains the discriminator value.
    pub property_name: String,
    /// Optional mapping from discriminator values to schema refs or names.
    pub mapping: Option<IndexMap<String, String>>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// `exclusiveMinimum`/`exclusiveMaximum`: a flag on the inclusive bound (3.0)
/// or the bound itself (3.1).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Value(f64),
}

/// Structural kind of a schema node without combinators or references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// No type information, or a type name this parser does not know.
    Any,
}

impl SchemaKind {
    fn from_type_name(name: &str) -> Self {
        match name {
            "object" => Self::Object,
            "array" => Self::Array,
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Any,
        }
    }
}

/// The normalized shape of a schema node.
///
/// Computed once by [`Schema::shape`]; the converter matches on this instead
/// of probing optional fields again.
#[derive(Debug, Clone, Copy)]
pub enum SchemaShape<'a> {
    Reference(&'a str),
    OneOf(&'a [Schema]),
    AnyOf(&'a [Schema]),
    AllOf(&'a [Schema]),
    Const(&'a Value),
    Kind(SchemaKind),
}

impl Schema {
    /// Classify the node. Earlier checks win: reference, `oneOf`, `anyOf`,
    /// `allOf`, `const`, then the declared or inferred kind.
    pub fn shape(&self) -> SchemaShape<'_> {
        if let Some(pointer) = &self.ref_path {
            return SchemaShape::Reference(pointer);
        }
        if let Some(branches) = &self.one_of {
            return SchemaShape::OneOf(branches);
        }
        if let Some(branches) = &self.any_of {
            return SchemaShape::AnyOf(branches);
        }
        if let Some(members) = &self.all_of {
            return SchemaShape::AllOf(members);
        }
        if let Some(value) = &self.const_value {
            return SchemaShape::Const(value);
        }
        SchemaShape::Kind(self.kind())
    }

    /// Declared kind, or the kind implied by which fields are present.
    pub fn kind(&self) -> SchemaKind {
        if let Some(name) = self.primary_type() {
            return SchemaKind::from_type_name(name);
        }
        if self.properties.is_some() || self.additional_properties.is_some() {
            SchemaKind::Object
        } else if self.items.is_some() {
            SchemaKind::Array
        } else if self.enum_values.is_some() {
            SchemaKind::String
        } else {
            SchemaKind::Any
        }
    }

    /// The declared type, with `null` dropped from type arrays.
    ///
    /// A type array holding only `null` yields `null`.
    pub fn primary_type(&self) -> Option<&str> {
        match &self.schema_type {
            Some(SchemaType::Single(name)) => Some(name),
            Some(SchemaType::Multiple(names)) => names
                .iter()
                .find(|name| *name != "null")
                .or_else(|| names.first())
                .map(String::as_str),
            None => None,
        }
    }

    /// Check the 3.0 `nullable` flag and `null` membership in a type array.
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }
        matches!(&self.schema_type, Some(SchemaType::Multiple(names)) if names.iter().any(|n| n == "null"))
    }

    /// True for a bare `{type: null}` branch.
    pub fn is_null_only(&self) -> bool {
        self.ref_path.is_none()
            && self.one_of.is_none()
            && self.any_of.is_none()
            && self.all_of.is_none()
            && self.primary_type() == Some("null")
    }

    /// The non-null branch of a two-branch `oneOf`/`anyOf` whose other
    /// branch is `{type: null}`.
    pub fn nullable_branch(&self) -> Option<&Schema> {
        let branches = match self.shape() {
            SchemaShape::OneOf(branches) | SchemaShape::AnyOf(branches) => branches,
            _ => return None,
        };
        if self.discriminator.is_some() {
            return None;
        }
        match branches {
            [a, b] if b.is_null_only() && !a.is_null_only() => Some(a),
            [a, b] if a.is_null_only() && !b.is_null_only() => Some(b),
            _ => None,
        }
    }
}
