//! Schema-level IR: the root artifact plus endpoints and operations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{IrType, IrTypeRef};

/// Which input format produced the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Structured API description (OpenAPI 3.x).
    OpenApi,
    /// Schema definition language (GraphQL SDL).
    GraphQl,
}

impl SourceFormat {
    /// Lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::OpenApi => "openapi",
            SourceFormat::GraphQl => "graphql",
        }
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrMetadata {
    /// Document title, or the file stem when the source has none.
    pub title: String,
    /// Document version.
    pub version: String,
    /// Document description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First server URL, when the source declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Input format.
    pub source: SourceFormat,
}

/// The root IR artifact produced by one parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrSchema {
    /// Title, version and origin of the document.
    pub metadata: IrMetadata,
    /// Named types by globally unique name.
    pub types: IndexMap<String, IrType>,
    /// REST-style operations, in declaration order.
    #[serde(default)]
    pub endpoints: Vec<IrEndpoint>,
    /// RPC/query-style operations, in declaration order.
    #[serde(default)]
    pub operations: Vec<IrOperation>,
    /// Security schemes by declared name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, IrSecurityScheme>,
}

impl IrSchema {
    /// An empty schema with the given metadata.
    pub fn new(metadata: IrMetadata) -> Self {
        Self {
            metadata,
            types: IndexMap::new(),
            endpoints: Vec::new(),
            operations: Vec::new(),
            security_schemes: IndexMap::new(),
        }
    }

    /// Look up a named type.
    pub fn get_type(&self, name: &str) -> Option<&IrType> {
        self.types.get(name)
    }

    /// Look up an endpoint by operation identifier.
    pub fn endpoint(&self, operation_id: &str) -> Option<&IrEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.operation_id == operation_id)
    }

    /// Look up an RPC-style operation by name.
    pub fn operation(&self, name: &str) -> Option<&IrOperation> {
        self.operations.iter().find(|o| o.name == name)
    }
}

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Every verb, in the order path items list them.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Uppercase verb.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lowercase key used in path items.
    pub fn key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// A `{name}` segment of the path template.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParamLocation {
    /// Parse the `in` field of a parameter.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }
}

/// One parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrParameter {
    /// Parameter name; unique per location within an endpoint.
    pub name: String,
    /// Where the parameter is sent.
    pub location: ParamLocation,
    /// Always true for path parameters.
    pub required: bool,
    /// Value type.
    #[serde(rename = "type")]
    pub ty: IrTypeRef,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// One media-type entry of a body or response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrMediaType {
    /// Media type, e.g. `application/json`.
    pub content_type: String,
    /// Payload type; `any` when the source gives no schema.
    #[serde(rename = "type")]
    pub ty: IrTypeRef,
}

/// Request body of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrRequestBody {
    /// Whether the body must be sent.
    pub required: bool,
    /// Every declared media type, in declaration order.
    pub content: Vec<IrMediaType>,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One response of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrResponse {
    /// Status code, `default`, or a wildcard such as `2XX`.
    pub status: String,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Empty when the response has no body.
    #[serde(default)]
    pub content: Vec<IrMediaType>,
}

/// A REST-style operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrEndpoint {
    /// Declared `operationId`, or one synthesized from method and path.
    pub operation_id: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path template, e.g. `/pets/{petId}`.
    pub path: String,
    /// Path-level parameters merged with operation-level ones.
    pub parameters: Vec<IrParameter>,
    /// Request body, when the operation declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<IrRequestBody>,
    /// Responses in declaration order.
    pub responses: Vec<IrResponse>,
    /// One-line summary from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Names of the security schemes the endpoint requires.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<String>,
}

/// Operation kind of an RPC-style operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read-only fetch.
    Query,
    /// Write.
    Mutation,
    /// Event stream.
    Subscription,
}

impl OperationKind {
    /// Lowercase keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// One variable (argument) of an RPC-style operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrVariable {
    /// Name without the `$` sigil.
    pub name: String,
    /// Variable type.
    #[serde(rename = "type")]
    pub ty: IrTypeRef,
    /// Default value, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// An RPC/query-style operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOperation {
    /// Field or operation name; anonymous operations get `<kind><n>`.
    pub name: String,
    /// Query, mutation or subscription.
    pub kind: OperationKind,
    /// Arguments in declaration order.
    pub variables: Vec<IrVariable>,
    /// Result type.
    pub return_type: IrTypeRef,
    /// Source text the operation was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Human-readable description from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// A security scheme declared by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IrSecurityScheme {
    /// A key sent in a header, query parameter or cookie.
    ApiKey {
        /// Header, parameter or cookie name.
        name: String,
        /// Where the key is sent.
        location: ParamLocation,
        /// Human-readable description from the source.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// HTTP authentication (`basic`, `bearer`, ...).
    Http {
        /// Authorization scheme name.
        scheme: String,
        /// Token format hint for bearer auth.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        /// Human-readable description from the source.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// OAuth 2 flows.
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Flow name → scope names.
        flows: IndexMap<String, Vec<String>>,
        /// Human-readable description from the source.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// OpenID Connect discovery.
    OpenIdConnect {
        /// Discovery document URL.
        url: String,
        /// Human-readable description from the source.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}
