//! Whole-document parsing: OpenAPI 3.x → [`IrSchema`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{self, FileReader, FsReader};
use crate::error::{FormatError, Result};
use crate::ir::naming::synthesize_operation_id;
use crate::ir::{
    HttpMethod, IrEndpoint, IrMediaType, IrMetadata, IrParameter, IrRequestBody, IrResponse,
    IrSchema, IrSecurityScheme, IrTypeRef, ParamLocation, PrimitiveKind, SourceFormat,
};
use crate::options::ParserOptions;
use crate::resolver::Resolver;

use super::convert::{SchemaConverter, escape_segment};
use super::spec::{
    MediaType, OpenApiDocument, Operation, Parameter, PathItem, RequestBody, Response,
    SecurityRequirement, SecurityScheme,
};

/// Parses OpenAPI 3.x documents (JSON or YAML) into the IR.
#[derive(Debug)]
pub struct OpenApiParser<'r> {
    reader: &'r dyn FileReader,
    options: ParserOptions,
}

impl Default for OpenApiParser<'static> {
    fn default() -> Self {
        Self::new(&FsReader)
    }
}

impl<'r> OpenApiParser<'r> {
    /// A parser reading documents through `reader`.
    pub fn new(reader: &'r dyn FileReader) -> Self {
        Self {
            reader,
            options: ParserOptions::default(),
        }
    }

    /// Replace the parser options.
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Load and parse the document at `path`.
    pub fn parse(&self, path: &Path) -> Result<IrSchema> {
        let root = document::load_structured(self.reader, path)?;
        self.parse_value(path, root)
    }

    /// Parse document text as if it had been read from `path`.
    ///
    /// The extension of `path` selects JSON or YAML; relative external
    /// references resolve against its directory.
    pub fn parse_str(&self, text: &str, path: &Path) -> Result<IrSchema> {
        let root = document::parse_structured(text, path)?;
        self.parse_value(path, root)
    }

    fn parse_value(&self, path: &Path, root: Value) -> Result<IrSchema> {
        let doc: OpenApiDocument = from_node(&root, path, "#")?;
        check_version(&doc, path)?;

        let metadata = self.metadata(&doc, path);
        debug!(title = %metadata.title, version = %metadata.version, "Parsing OpenAPI document.");

        let resolver = Resolver::new(self.reader, path, root);
        let root_path = resolver.root_path().to_path_buf();
        let mut builder = Builder {
            converter: SchemaConverter::new(resolver),
            root: root_path,
        };

        let mut schema = IrSchema::new(metadata);
        builder.component_schemas(&doc, &mut schema)?;
        builder.paths(&doc, &mut schema)?;
        builder.security_schemes(&doc, &mut schema)?;

        debug!(
            types = schema.types.len(),
            endpoints = schema.endpoints.len(),
            documents = builder.converter.resolver().document_count(),
            "Parsed OpenAPI document."
        );
        Ok(schema)
    }

    fn metadata(&self, doc: &OpenApiDocument, path: &Path) -> IrMetadata {
        let title = non_empty(&doc.info.title)
            .or_else(|| self.options.title.clone())
            .unwrap_or_else(|| document::file_stem(path));
        let version = non_empty(&doc.info.version)
            .or_else(|| self.options.version.clone())
            .unwrap_or_else(|| ParserOptions::DEFAULT_VERSION.to_string());
        IrMetadata {
            title,
            version,
            description: doc.info.description.clone(),
            base_url: doc.servers.first().map(|s| s.url.clone()),
            source: SourceFormat::OpenApi,
        }
    }
}

fn check_version(doc: &OpenApiDocument, path: &Path) -> Result<()> {
    match (&doc.openapi, &doc.swagger) {
        (Some(version), _) if version.starts_with("3.") => Ok(()),
        (Some(version), _) | (None, Some(version)) => Err(FormatError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: version.clone(),
        }
        .into()),
        (None, None) => Err(FormatError::schema(path, "#/openapi", "missing `openapi` version field").into()),
    }
}

/// Per-parse state: the converter (which owns the resolver) and the root path.
struct Builder<'r> {
    converter: SchemaConverter<'r>,
    root: PathBuf,
}

impl Builder<'_> {
    fn component_schemas(&mut self, doc: &OpenApiDocument, schema: &mut IrSchema) -> Result<()> {
        let mut processed = HashSet::new();
        for (name, raw) in &doc.components.schemas {
            if !processed.insert(name.as_str()) {
                continue;
            }
            let key = self.converter.component_target(name).key();
            self.converter.resolver().enter(&key);
            let converted = self.converter.convert_to_type(raw, name);
            self.converter.resolver().leave(&key);
            let ty = converted?;
            debug!(name = %name, kind = ty.kind_name(), "Converted component schema.");
            schema.types.insert(name.clone(), ty);
        }
        Ok(())
    }

    fn paths(&mut self, doc: &OpenApiDocument, schema: &mut IrSchema) -> Result<()> {
        for (path, raw_item) in &doc.paths {
            let location = format!("#/paths/{}", escape_segment(path));
            let resolved = self.converter.resolver().resolve_if_ref(raw_item, &self.root)?;
            let item: PathItem = from_node(&resolved.value, &resolved.document, &location)?;
            let document = resolved.document;

            let shared = self.parameters(&item.parameters, &document, &location, path)?;

            for method in HttpMethod::ALL {
                let Some(operation) = item.operation(method) else {
                    continue;
                };
                let op_location = format!("{location}/{}", method.key());
                let endpoint = self.endpoint(
                    EndpointSite {
                        path,
                        method,
                        location: &op_location,
                        document: &document,
                        default_security: doc.security.as_deref(),
                    },
                    operation,
                    &shared,
                )?;
                debug!(
                    operation_id = %endpoint.operation_id,
                    method = method.as_str(),
                    path = %path,
                    "Assembled endpoint."
                );
                schema.endpoints.push(endpoint);
            }
        }
        Ok(())
    }

    fn endpoint(
        &mut self,
        site: EndpointSite<'_>,
        operation: &Operation,
        shared: &[IrParameter],
    ) -> Result<IrEndpoint> {
        let operation_id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| synthesize_operation_id(site.method, site.path));

        let own = self.parameters(
            &operation.parameters,
            site.document,
            site.location,
            &operation_id,
        )?;
        let parameters = merge_parameters(shared, own);

        let request_body = match &operation.request_body {
            Some(raw) => Some(self.request_body(raw, &site, &operation_id)?),
            None => None,
        };

        let mut responses = Vec::with_capacity(operation.responses.len());
        for (status, raw) in &operation.responses {
            responses.push(self.response(status, raw, &site, &operation_id)?);
        }

        let requirements = operation
            .security
            .as_deref()
            .or(site.default_security)
            .unwrap_or_default();

        Ok(IrEndpoint {
            operation_id,
            method: site.method,
            path: site.path.to_string(),
            parameters,
            request_body,
            responses,
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            security: requirement_names(requirements),
        })
    }

    fn parameters(
        &mut self,
        raw: &[Value],
        document: &Path,
        location: &str,
        context: &str,
    ) -> Result<Vec<IrParameter>> {
        let mut parameters = Vec::with_capacity(raw.len());
        for (index, raw_param) in raw.iter().enumerate() {
            let param_location = format!("{location}/parameters/{index}");
            let resolved = self.converter.resolver().resolve_if_ref(raw_param, document)?;
            let param: Parameter = from_node(&resolved.value, &resolved.document, &param_location)?;
            let Some(param_in) = ParamLocation::from_name(&param.location) else {
                return Err(FormatError::schema(
                    &resolved.document,
                    param_location,
                    format!("unknown parameter location `{}`", param.location),
                )
                .into());
            };

            let type_context = format!("{context} {}", param.name);
            let schema_node = param.schema.as_ref().or_else(|| {
                param
                    .content
                    .as_ref()
                    .and_then(|content| content.values().find_map(|m| m.schema.as_ref()))
            });
            let ty = match schema_node {
                Some(node) => {
                    self.converter
                        .convert_to_type_ref_in(node, &resolved.document, &type_context)?
                }
                None => IrTypeRef::primitive(PrimitiveKind::String),
            };

            parameters.push(IrParameter {
                required: param.required || param_in == ParamLocation::Path,
                name: param.name,
                location: param_in,
                ty,
                description: param.description,
                deprecated: param.deprecated,
            });
        }
        Ok(parameters)
    }

    fn request_body(
        &mut self,
        raw: &Value,
        site: &EndpointSite<'_>,
        operation_id: &str,
    ) -> Result<IrRequestBody> {
        let location = format!("{}/requestBody", site.location);
        let resolved = self.converter.resolver().resolve_if_ref(raw, site.document)?;
        let body: RequestBody = from_node(&resolved.value, &resolved.document, &location)?;
        let content = self.media_types(
            &body.content,
            &resolved.document,
            &format!("{operation_id} body"),
        )?;
        Ok(IrRequestBody {
            required: body.required,
            content,
            description: body.description,
        })
    }

    fn response(
        &mut self,
        status: &str,
        raw: &Value,
        site: &EndpointSite<'_>,
        operation_id: &str,
    ) -> Result<IrResponse> {
        let location = format!("{}/responses/{status}", site.location);
        let resolved = self.converter.resolver().resolve_if_ref(raw, site.document)?;
        let response: Response = from_node(&resolved.value, &resolved.document, &location)?;
        let content = self.media_types(
            &response.content,
            &resolved.document,
            &format!("{operation_id} response {status}"),
        )?;
        Ok(IrResponse {
            status: status.to_string(),
            description: response.description,
            content,
        })
    }

    /// Every declared media type, each converted on its own.
    fn media_types(
        &mut self,
        content: &IndexMap<String, MediaType>,
        document: &Path,
        context: &str,
    ) -> Result<Vec<IrMediaType>> {
        let mut out = Vec::with_capacity(content.len());
        for (content_type, media) in content {
            let ty = match &media.schema {
                Some(node) => self
                    .converter
                    .convert_to_type_ref_in(node, document, context)?,
                None => IrTypeRef::primitive(PrimitiveKind::Any),
            };
            out.push(IrMediaType {
                content_type: content_type.clone(),
                ty,
            });
        }
        Ok(out)
    }

    fn security_schemes(&mut self, doc: &OpenApiDocument, schema: &mut IrSchema) -> Result<()> {
        for (name, raw) in &doc.components.security_schemes {
            let location = format!("#/components/securitySchemes/{}", escape_segment(name));
            let resolved = self.converter.resolver().resolve_if_ref(raw, &self.root)?;
            let scheme: SecurityScheme = from_node(&resolved.value, &resolved.document, &location)?;
            match convert_security_scheme(scheme, &resolved.document, &location)? {
                Some(converted) => {
                    schema.security_schemes.insert(name.clone(), converted);
                }
                None => warn!(name = %name, "Skipping security scheme of unsupported type."),
            }
        }
        Ok(())
    }
}

/// Where an operation sits in the document.
struct EndpointSite<'a> {
    path: &'a str,
    method: HttpMethod,
    location: &'a str,
    document: &'a Path,
    default_security: Option<&'a [SecurityRequirement]>,
}

/// Path-level parameters first; an operation-level parameter with the same
/// `(location, name)` replaces the shared one in place.
fn merge_parameters(shared: &[IrParameter], own: Vec<IrParameter>) -> Vec<IrParameter> {
    let mut merged = shared.to_vec();
    for param in own {
        match merged
            .iter()
            .position(|p| p.location == param.location && p.name == param.name)
        {
            Some(index) => merged[index] = param,
            None => merged.push(param),
        }
    }
    merged
}

fn requirement_names(requirements: &[SecurityRequirement]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for requirement in requirements {
        for name in requirement.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

fn convert_security_scheme(
    scheme: SecurityScheme,
    document: &Path,
    location: &str,
) -> Result<Option<IrSecurityScheme>> {
    let missing = |field: &str| -> crate::error::Error {
        FormatError::schema(document, location, format!("missing `{field}`")).into()
    };
    let converted = match scheme.scheme_type.as_str() {
        "apiKey" => {
            let name = scheme.name.ok_or_else(|| missing("name"))?;
            let raw_in = scheme.location.ok_or_else(|| missing("in"))?;
            let location = ParamLocation::from_name(&raw_in).ok_or_else(|| missing("in"))?;
            IrSecurityScheme::ApiKey {
                name,
                location,
                description: scheme.description,
            }
        }
        "http" => IrSecurityScheme::Http {
            scheme: scheme.scheme.ok_or_else(|| missing("scheme"))?,
            bearer_format: scheme.bearer_format,
            description: scheme.description,
        },
        "oauth2" => IrSecurityScheme::OAuth2 {
            flows: scheme
                .flows
                .unwrap_or_default()
                .into_iter()
                .map(|(flow, spec)| (flow, spec.scopes.into_keys().collect()))
                .collect(),
            description: scheme.description,
        },
        "openIdConnect" => IrSecurityScheme::OpenIdConnect {
            url: scheme
                .open_id_connect_url
                .ok_or_else(|| missing("openIdConnectUrl"))?,
            description: scheme.description,
        },
        _ => return Ok(None),
    };
    Ok(Some(converted))
}

fn from_node<T: DeserializeOwned>(value: &Value, document: &Path, location: &str) -> Result<T> {
    <T as Deserialize<'_>>::deserialize(value).map_err(|e| FormatError::schema(document, location, e.to_string()).into())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::document::MemoryReader;
    use crate::error::Error;
    use crate::ir::TypeKind;

    fn parse_yaml(text: &str) -> Result<IrSchema> {
        let reader = MemoryReader::new();
        OpenApiParser::new(&reader).parse_str(text, Path::new("api.yaml"))
    }

    const PETSTORE: &str = r##"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.2.0
  description: Sample store
servers:
  - url: https://petstore.example.com/v1
security:
  - apiKey: []
paths:
  /pets:
    parameters:
      - name: limit
        in: query
        required: true
        schema:
          type: integer
      - name: X-Trace
        in: header
        schema:
          type: string
    get:
      operationId: listPets
      tags: [pets]
      parameters:
        - name: limit
          in: query
          required: false
          schema:
            type: integer
            maximum: 100
      responses:
        "200":
          description: A page of pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
            application/xml:
              schema:
                type: string
        default:
          $ref: '#/components/responses/Error'
    post:
      security: []
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
      responses:
        "201":
          description: Created
  /pets/{petId}:
    get:
      parameters:
        - $ref: '#/components/parameters/PetId'
      responses:
        "200":
          description: One pet
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
components:
  parameters:
    PetId:
      name: petId
      in: path
      schema:
        type: string
  responses:
    Error:
      description: Unexpected error
      content:
        application/json:
          schema:
            type: object
            properties:
              message:
                type: string
  securitySchemes:
    apiKey:
      type: apiKey
      name: X-API-Key
      in: header
    oauth:
      type: oauth2
      flows:
        implicit:
          authorizationUrl: https://example.com/auth
          scopes:
            read:pets: read your pets
            write:pets: modify pets
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id:
          type: integer
          format: int64
        name:
          type: string
        tag:
          type: string
          nullable: true
        owner:
          $ref: '#/components/schemas/Owner'
    Owner:
      type: object
      properties:
        name:
          type: string
"##;

    #[test]
    fn test_parse_metadata() {
        let schema = parse_yaml(PETSTORE).unwrap();
        assert_eq!(schema.metadata.title, "Petstore");
        assert_eq!(schema.metadata.version, "1.2.0");
        assert_eq!(schema.metadata.description.as_deref(), Some("Sample store"));
        assert_eq!(
            schema.metadata.base_url.as_deref(),
            Some("https://petstore.example.com/v1")
        );
        assert_eq!(schema.metadata.source, SourceFormat::OpenApi);
    }

    #[test]
    fn test_component_schemas_in_declaration_order() {
        let schema = parse_yaml(PETSTORE).unwrap();
        let names: Vec<_> = schema.types.keys().cloned().collect();
        assert_eq!(names, vec!["Pet", "Owner"]);

        let pet = schema.get_type("Pet").unwrap();
        let TypeKind::Object { properties, .. } = &pet.kind else {
            panic!("expected object");
        };
        assert_eq!(properties[3].ty.reference_name(), Some("Owner"));
        assert!(properties[2].ty.is_nullable());
        assert_eq!(
            properties[0].ty.inline_type().unwrap().constraints.format.as_deref(),
            Some("int64")
        );
    }

    #[test]
    fn test_endpoints_in_declaration_order() {
        let schema = parse_yaml(PETSTORE).unwrap();
        let ids: Vec<_> = schema
            .endpoints
            .iter()
            .map(|e| (e.method, e.operation_id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (HttpMethod::Get, "listPets"),
                (HttpMethod::Post, "postPets"),
                (HttpMethod::Get, "getPetsByPetId"),
            ]
        );
    }

    #[test]
    fn test_operation_parameter_overrides_path_parameter() {
        let schema = parse_yaml(PETSTORE).unwrap();
        let list = schema.endpoint("listPets").unwrap();
        let limits: Vec<_> = list.parameters.iter().filter(|p| p.name == "limit").collect();
        assert_eq!(limits.len(), 1);
        assert!(!limits[0].required);
        assert_eq!(list.parameters[0].name, "limit");
        assert_eq!(list.parameters[1].location, ParamLocation::Header);

        let post = schema.endpoint("postPets").unwrap();
        assert_eq!(post.parameters.len(), 2);
        assert!(post.parameters[0].required);
    }

    #[test]
    fn test_referenced_parameter_and_response() {
        let schema = parse_yaml(PETSTORE).unwrap();
        let get = schema.endpoint("getPetsByPetId").unwrap();
        assert_eq!(get.parameters[0].name, "petId");
        assert_eq!(get.parameters[0].location, ParamLocation::Path);
        assert!(get.parameters[0].required);

        let list = schema.endpoint("listPets").unwrap();
        let default = list.responses.iter().find(|r| r.status == "default").unwrap();
        assert_eq!(default.description.as_deref(), Some("Unexpected error"));
        assert_eq!(default.content[0].ty.variant_name(), "inline");
    }

    #[test]
    fn test_all_media_types_kept() {
        let schema = parse_yaml(PETSTORE).unwrap();
        let list = schema.endpoint("listPets").unwrap();
        let ok = &list.responses[0];
        let types: Vec<_> = ok.content.iter().map(|m| m.content_type.as_str()).collect();
        assert_eq!(types, vec!["application/json", "application/xml"]);

        let post = schema.endpoint("postPets").unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.content[0].ty.reference_name(), Some("Pet"));
        assert!(post.responses[0].content.is_empty());
    }

    #[test]
    fn test_security() {
        let schema = parse_yaml(PETSTORE).unwrap();
        assert_eq!(schema.endpoint("listPets").unwrap().security, vec!["apiKey"]);
        assert!(schema.endpoint("postPets").unwrap().security.is_empty());

        let Some(IrSecurityScheme::OAuth2 { flows, .. }) = schema.security_schemes.get("oauth") else {
            panic!("expected oauth2 scheme");
        };
        assert_eq!(flows["implicit"], vec!["read:pets", "write:pets"]);
        assert!(matches!(
            schema.security_schemes.get("apiKey"),
            Some(IrSecurityScheme::ApiKey { location: ParamLocation::Header, .. })
        ));
    }

    #[test]
    fn test_swagger_two_is_rejected() {
        let err = parse_yaml("swagger: '2.0'\ninfo: {title: Old, version: '1'}\npaths: {}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::UnsupportedVersion { ref version, .. }) if version == "2.0"
        ));
    }

    #[test]
    fn test_unquoted_yaml_versions() {
        let schema = parse_yaml("openapi: 3.1\ninfo: {title: Petstore, version: 1.0}\npaths: {}\n").unwrap();
        assert_eq!(schema.metadata.version, "1.0");

        let schema = parse_yaml("openapi: 3.0.3\ninfo: {title: Petstore, version: 2}\npaths: {}\n").unwrap();
        assert_eq!(schema.metadata.version, "2");

        let err = parse_yaml("swagger: 2.0\ninfo: {title: Old, version: 1}\npaths: {}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::UnsupportedVersion { ref version, .. }) if version == "2.0"
        ));
    }

    #[test]
    fn test_missing_reference_target_is_resolution_error() {
        let err = parse_yaml(
            r##"
openapi: 3.1.0
info: {title: T, version: '1'}
paths:
  /x:
    get:
      parameters:
        - $ref: '#/components/parameters/Missing'
      responses: {}
"##,
        )
        .unwrap_err();
        match err {
            Error::Resolution(err) => assert_eq!(err.pointer, "#/components/parameters/Missing"),
            other => panic!("expected resolution error, got {other}"),
        }
    }

    #[test]
    fn test_unknown_parameter_location_is_format_error() {
        let err = parse_yaml(
            r##"
openapi: 3.0.0
info: {title: T, version: '1'}
paths:
  /x:
    get:
      parameters:
        - {name: q, in: body}
      responses: {}
"##,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown parameter location `body`"));
    }

    #[test]
    fn test_parameter_content_and_default_string() {
        let schema = parse_yaml(
            r##"
openapi: 3.0.0
info: {title: T, version: '1'}
paths:
  /search:
    get:
      operationId: search
      parameters:
        - name: filter
          in: query
          content:
            application/json:
              schema:
                type: object
                properties:
                  q: {type: string}
        - name: raw
          in: query
      responses: {}
"##,
        )
        .unwrap();
        let search = schema.endpoint("search").unwrap();
        assert_eq!(search.parameters[0].ty.variant_name(), "inline");
        assert_eq!(
            search.parameters[1].ty.primitive_kind(),
            Some(PrimitiveKind::String)
        );
    }

    #[test]
    fn test_external_schema_reference() {
        let reader = MemoryReader::new().with_file(
            "specs/models/owner.yaml",
            "Owner:\n  type: object\n  properties:\n    email:\n      type: string\n",
        );
        let text = r##"
openapi: 3.0.0
info: {title: T, version: '1'}
paths: {}
components:
  schemas:
    Pet:
      type: object
      properties:
        owner:
          $ref: 'models/owner.yaml#/Owner'
"##;
        let schema = OpenApiParser::new(&reader)
            .parse_str(text, Path::new("specs/api.yaml"))
            .unwrap();
        let pet = schema.get_type("Pet").unwrap();
        let TypeKind::Object { properties, .. } = &pet.kind else {
            panic!("expected object");
        };
        let owner = properties[0].ty.inline_type().unwrap();
        assert_eq!(owner.kind_name(), "object");
    }

    #[test]
    fn test_metadata_falls_back_to_options() {
        let reader = MemoryReader::new();
        let schema = OpenApiParser::new(&reader)
            .with_options(ParserOptions {
                version: Some("9.9.9".to_string()),
                ..ParserOptions::default()
            })
            .parse_str(
                r#"{"openapi": "3.1.0", "info": {}, "paths": {}}"#,
                Path::new("inventory.json"),
            )
            .unwrap();
        assert_eq!(schema.metadata.title, "inventory");
        assert_eq!(schema.metadata.version, "9.9.9");
    }
}
