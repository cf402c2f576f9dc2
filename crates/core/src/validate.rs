//! Structural validation of a finished [`IrSchema`].
//!
//! [`validate`] never fails: every finding is collected with a locator
//! path (`types.Pet.properties[2].type.name`) and returned together.
//! Descending into an inline type adds an `inline` segment
//! (`types.Owner.properties[0].type.inline.items.name`).

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::ir::{
    AdditionalProperties, IrEndpoint, IrOperation, IrSchema, IrType, IrTypeRef, TypeKind,
};

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Locator mirroring the IR structure.
    pub path: String,
    /// What is wrong at `path`.
    pub message: String,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// True when `errors` is empty.
    pub valid: bool,
    /// Every finding, in walk order.
    pub errors: Vec<ValidationError>,
}

/// Check `schema` for dangling references and malformed types.
///
/// Walks the `types` map, every endpoint and every operation, descending
/// into inline types, and reports each problem found.
pub fn validate(schema: &IrSchema) -> ValidationResult {
    let mut validator = Validator {
        schema,
        errors: Vec::new(),
    };
    validator.metadata();
    for (key, ty) in &schema.types {
        let path = format!("types.{key}");
        if !ty.name.is_empty() && ty.name != *key {
            validator.report(
                format!("{path}.name"),
                format!("Type name \"{}\" does not match its key \"{key}\"", ty.name),
            );
        }
        validator.check_type(ty, &path);
    }
    validator.endpoints(&schema.endpoints);
    validator.operations(&schema.operations);

    let errors = validator.errors;
    debug!(
        types = schema.types.len(),
        endpoints = schema.endpoints.len(),
        operations = schema.operations.len(),
        errors = errors.len(),
        "Validated schema."
    );
    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

struct Validator<'s> {
    schema: &'s IrSchema,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn report(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path,
            message: message.into(),
        });
    }

    fn metadata(&mut self) {
        let metadata = &self.schema.metadata;
        if metadata.title.trim().is_empty() {
            self.report("metadata.title".to_string(), "Missing metadata title");
        }
        if metadata.version.trim().is_empty() {
            self.report("metadata.version".to_string(), "Missing metadata version");
        }
    }

    fn check_type(&mut self, ty: &IrType, path: &str) {
        if ty.name.is_empty() {
            self.report(format!("{path}.name"), "Type name must not be empty");
        }
        match &ty.kind {
            TypeKind::Object {
                properties,
                additional_properties,
                ..
            } => {
                for (i, property) in properties.iter().enumerate() {
                    let property_path = format!("{path}.properties[{i}]");
                    if property.name.is_empty() {
                        self.report(
                            format!("{property_path}.name"),
                            "Property name must not be empty",
                        );
                    }
                    self.check_ref(&property.ty, &format!("{property_path}.type"));
                }
                if let Some(AdditionalProperties::Typed(value)) = additional_properties {
                    self.check_ref(value, &format!("{path}.additionalProperties"));
                }
            }
            TypeKind::Array { items } => self.check_ref(items, &format!("{path}.items")),
            TypeKind::Enum { values } => {
                if values.is_empty() {
                    self.report(format!("{path}.values"), "Enum must have at least one value");
                }
            }
            TypeKind::Union {
                variants,
                discriminator,
            } => {
                if variants.is_empty() {
                    self.report(
                        format!("{path}.variants"),
                        "Union must have at least one variant",
                    );
                }
                for (i, variant) in variants.iter().enumerate() {
                    self.check_ref(variant, &format!("{path}.variants[{i}]"));
                }
                if let Some(discriminator) = discriminator {
                    for (value, target) in &discriminator.mapping {
                        if self.schema.get_type(target).is_none() {
                            self.report(
                                format!("{path}.discriminator.mapping.{value}"),
                                format!(
                                    "Discriminator value \"{value}\" maps to unknown type \"{target}\""
                                ),
                            );
                        }
                    }
                }
            }
            TypeKind::Intersection { members } => {
                if members.is_empty() {
                    self.report(
                        format!("{path}.members"),
                        "Intersection must have at least one member",
                    );
                }
                for (i, member) in members.iter().enumerate() {
                    self.check_ref(member, &format!("{path}.members[{i}]"));
                }
            }
            TypeKind::Primitive { .. } | TypeKind::Literal { .. } => {}
        }
    }

    fn check_ref(&mut self, ty: &IrTypeRef, path: &str) {
        match ty {
            IrTypeRef::Reference { name, .. } if name.is_empty() => {
                self.report(format!("{path}.name"), "Reference name must not be empty");
            }
            IrTypeRef::Reference { name, .. } => {
                if self.schema.get_type(name).is_none() {
                    self.report(
                        format!("{path}.name"),
                        format!("Referenced type \"{name}\" not found"),
                    );
                }
            }
            IrTypeRef::Inline { ty, .. } => self.check_type(ty, &format!("{path}.inline")),
            // The primitive kind is carried by the enum itself.
            IrTypeRef::Primitive { .. } => {}
        }
    }

    fn endpoints(&mut self, endpoints: &[IrEndpoint]) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, endpoint) in endpoints.iter().enumerate() {
            let path = format!("endpoints[{i}]");
            if endpoint.operation_id.is_empty() {
                self.report(format!("{path}.operationId"), "Missing operation id");
            } else if let Some(&first) = seen.get(endpoint.operation_id.as_str()) {
                self.report(
                    format!("{path}.operationId"),
                    format!(
                        "Duplicate operation id \"{}\" (first declared at endpoints[{first}])",
                        endpoint.operation_id
                    ),
                );
            } else {
                seen.insert(&endpoint.operation_id, i);
            }
            if endpoint.path.is_empty() {
                self.report(format!("{path}.path"), "Missing endpoint path");
            }

            for (j, parameter) in endpoint.parameters.iter().enumerate() {
                self.check_ref(&parameter.ty, &format!("{path}.parameters[{j}].type"));
            }
            if let Some(body) = &endpoint.request_body {
                for (j, media) in body.content.iter().enumerate() {
                    self.check_ref(&media.ty, &format!("{path}.requestBody.content[{j}].type"));
                }
            }
            for (j, response) in endpoint.responses.iter().enumerate() {
                for (k, media) in response.content.iter().enumerate() {
                    self.check_ref(
                        &media.ty,
                        &format!("{path}.responses[{j}].content[{k}].type"),
                    );
                }
            }
        }
    }

    fn operations(&mut self, operations: &[IrOperation]) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, operation) in operations.iter().enumerate() {
            let path = format!("operations[{i}]");
            if operation.name.is_empty() {
                self.report(format!("{path}.name"), "Missing operation name");
            } else if let Some(&first) = seen.get(operation.name.as_str()) {
                self.report(
                    format!("{path}.name"),
                    format!(
                        "Duplicate operation name \"{}\" (first declared at operations[{first}])",
                        operation.name
                    ),
                );
            } else {
                seen.insert(&operation.name, i);
            }
            for (j, variable) in operation.variables.iter().enumerate() {
                self.check_ref(&variable.ty, &format!("{path}.variables[{j}].type"));
            }
            self.check_ref(&operation.return_type, &format!("{path}.returnType"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::{
        Discriminator, HttpMethod, IrMetadata, IrParameter, IrProperty, IrVariable,
        OperationKind, ParamLocation, PrimitiveKind, SourceFormat,
    };

    fn schema() -> IrSchema {
        IrSchema::new(IrMetadata {
            title: "Test".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            base_url: None,
            source: SourceFormat::OpenApi,
        })
    }

    fn object(name: &str, properties: Vec<IrProperty>) -> IrType {
        IrType::new(name, TypeKind::object(properties))
    }

    fn messages(result: &ValidationResult) -> Vec<(&str, &str)> {
        result
            .errors
            .iter()
            .map(|e| (e.path.as_str(), e.message.as_str()))
            .collect()
    }

    #[test]
    fn test_valid_schema() {
        let mut schema = schema();
        schema.types.insert(
            "Pet".to_string(),
            object(
                "Pet",
                vec![IrProperty::new(
                    "id",
                    IrTypeRef::primitive(PrimitiveKind::Integer),
                    true,
                )],
            ),
        );
        schema.types.insert(
            "Owner".to_string(),
            object("Owner", vec![IrProperty::new("pet", IrTypeRef::reference("Pet"), false)]),
        );
        let result = validate(&schema);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_reference_path() {
        let mut schema = schema();
        schema.types.insert(
            "Owner".to_string(),
            object(
                "Owner",
                vec![
                    IrProperty::new("name", IrTypeRef::primitive(PrimitiveKind::String), true),
                    IrProperty::new("pet", IrTypeRef::reference("Pet"), false),
                ],
            ),
        );
        let result = validate(&schema);
        assert!(!result.valid);
        assert_eq!(
            messages(&result),
            vec![("types.Owner.properties[1].type.name", "Referenced type \"Pet\" not found")]
        );
    }

    #[test]
    fn test_inline_types_are_walked() {
        let mut schema = schema();
        let array = IrType::new(
            "OwnerPets_1",
            TypeKind::Array {
                items: Box::new(IrTypeRef::reference("Pet")),
            },
        );
        schema.types.insert(
            "Owner".to_string(),
            object("Owner", vec![IrProperty::new("pets", IrTypeRef::inline(array), true)]),
        );
        let result = validate(&schema);
        assert_eq!(
            result.errors[0].path,
            "types.Owner.properties[0].type.inline.items.name"
        );
    }

    #[test]
    fn test_empty_kinds_and_metadata() {
        let mut schema = schema();
        schema.metadata.title = String::new();
        schema.types.insert(
            "E".to_string(),
            IrType::new("E", TypeKind::Enum { values: Vec::new() }),
        );
        schema.types.insert(
            "U".to_string(),
            IrType::new(
                "U",
                TypeKind::Union {
                    variants: Vec::new(),
                    discriminator: None,
                },
            ),
        );
        schema.types.insert(
            "I".to_string(),
            IrType::new("I", TypeKind::Intersection { members: Vec::new() }),
        );
        schema
            .types
            .insert("Wrong".to_string(), IrType::primitive("", PrimitiveKind::Any));

        let result = validate(&schema);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "metadata.title",
                "types.E.values",
                "types.U.variants",
                "types.I.members",
                "types.Wrong.name",
            ]
        );
    }

    #[test]
    fn test_discriminator_targets() {
        let mut schema = schema();
        schema
            .types
            .insert("Dog".to_string(), object("Dog", Vec::new()));
        let mut mapping = indexmap::IndexMap::new();
        mapping.insert("dog".to_string(), "Dog".to_string());
        mapping.insert("cat".to_string(), "Cat".to_string());
        schema.types.insert(
            "Pet".to_string(),
            IrType::new(
                "Pet",
                TypeKind::Union {
                    variants: vec![IrTypeRef::reference("Dog")],
                    discriminator: Some(Discriminator {
                        property_name: "type".to_string(),
                        mapping,
                    }),
                },
            ),
        );
        let result = validate(&schema);
        assert_eq!(
            messages(&result),
            vec![(
                "types.Pet.discriminator.mapping.cat",
                "Discriminator value \"cat\" maps to unknown type \"Cat\""
            )]
        );
    }

    #[test]
    fn test_endpoints_and_operations() {
        let mut schema = schema();
        let endpoint = IrEndpoint {
            operation_id: "listPets".to_string(),
            method: HttpMethod::Get,
            path: "/pets".to_string(),
            parameters: vec![IrParameter {
                name: "filter".to_string(),
                location: ParamLocation::Query,
                required: false,
                ty: IrTypeRef::reference("Filter"),
                description: None,
                deprecated: false,
            }],
            request_body: None,
            responses: Vec::new(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            security: Vec::new(),
        };
        schema.endpoints.push(endpoint.clone());
        schema.endpoints.push(endpoint);
        schema.operations.push(IrOperation {
            name: "pet".to_string(),
            kind: OperationKind::Query,
            variables: vec![IrVariable {
                name: "id".to_string(),
                ty: IrTypeRef::primitive(PrimitiveKind::String),
                default: None,
            }],
            return_type: IrTypeRef::reference("Pet"),
            source: None,
            description: None,
            deprecated: false,
        });

        let result = validate(&schema);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "endpoints[0].parameters[0].type.name",
                "endpoints[1].operationId",
                "endpoints[1].parameters[0].type.name",
                "operations[0].returnType.name",
            ]
        );
        assert_eq!(
            result.errors[1].message,
            "Duplicate operation id \"listPets\" (first declared at endpoints[0])"
        );
    }

    #[test]
    fn test_result_serializes() {
        let result = validate(&schema());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true, "errors": []}));
    }
}
