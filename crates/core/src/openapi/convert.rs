//! Conversion of single schema nodes into IR types.
//!
//! The converter only shapes one node at a time. Whether a result becomes a
//! named entry of the schema's `types` map is the caller's decision.
//!
//! References are handled in three ways:
//! - a pointer already in flight becomes an inline `any` placeholder;
//! - `#/components/schemas/<Name>` in the root document becomes a by-name
//!   reference, without dereferencing;
//! - anything else (external files, deep pointers) is dereferenced and
//!   converted in place.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{FormatError, Result};
use crate::ir::naming::{InlineNamer, enum_member_names, pointer_type_name};
use crate::ir::{
    AdditionalProperties as IrAdditionalProperties, Constraints, Discriminator, EnumMember,
    IrProperty, IrType, IrTypeRef, PrimitiveKind, TypeKind,
};
use crate::resolver::{PointerTarget, Resolver, ref_pointer};

use super::spec::{
    AdditionalProperties, Discriminator as SchemaDiscriminator, ExclusiveBound, Schema, SchemaKind,
    SchemaShape,
};

const COMPONENT_SCHEMAS: &str = "/components/schemas/";

/// Converts raw schema nodes to [`IrType`]s and [`IrTypeRef`]s.
///
/// One converter is created per parse. It owns the [`Resolver`] and the
/// inline-name counter, so nothing leaks between parses.
#[derive(Debug)]
pub struct SchemaConverter<'r> {
    resolver: Resolver<'r>,
    namer: InlineNamer,
    /// Documents whose nodes are being converted, innermost last.
    bases: Vec<PathBuf>,
}

impl<'r> SchemaConverter<'r> {
    /// Create a converter resolving through `resolver`.
    pub fn new(resolver: Resolver<'r>) -> Self {
        Self {
            resolver,
            namer: InlineNamer::new(),
            bases: Vec::new(),
        }
    }

    /// The underlying resolver.
    pub fn resolver(&mut self) -> &mut Resolver<'r> {
        &mut self.resolver
    }

    /// Pointer target of the root-document component schema `name`.
    pub fn component_target(&self, name: &str) -> PointerTarget {
        let pointer = format!("#{COMPONENT_SCHEMAS}{}", escape_segment(name));
        self.resolver.target(&pointer, self.resolver.root_path())
    }

    /// Convert `raw` into a type named `name`.
    ///
    /// A `$ref` node is dereferenced and its target converted under `name`;
    /// a circular one yields an `any` placeholder.
    pub fn convert_to_type(&mut self, raw: &Value, name: &str) -> Result<IrType> {
        let base = self.current_base();
        self.convert_to_type_in(raw, &base, name)
    }

    /// [`convert_to_type`](Self::convert_to_type) for a node that lives in `document`.
    pub fn convert_to_type_in(&mut self, raw: &Value, document: &Path, name: &str) -> Result<IrType> {
        if let Some(pointer) = ref_pointer(raw) {
            return self.with_base(document, |this| this.type_from_ref(pointer, name));
        }
        let schema = parse_schema(raw, document, name)?;
        self.with_base(document, |this| this.schema_type(&schema, name, name))
    }

    /// Convert `raw` into a type use. `context` seeds inline type names.
    pub fn convert_to_type_ref(&mut self, raw: &Value, context: &str) -> Result<IrTypeRef> {
        let base = self.current_base();
        self.convert_to_type_ref_in(raw, &base, context)
    }

    /// [`convert_to_type_ref`](Self::convert_to_type_ref) for a node that lives in `document`.
    pub fn convert_to_type_ref_in(
        &mut self,
        raw: &Value,
        document: &Path,
        context: &str,
    ) -> Result<IrTypeRef> {
        let schema = parse_schema(raw, document, context)?;
        self.with_base(document, |this| this.schema_ref(&schema, context))
    }

    fn current_base(&self) -> PathBuf {
        self.bases
            .last()
            .cloned()
            .unwrap_or_else(|| self.resolver.root_path().to_path_buf())
    }

    fn with_base<T>(
        &mut self,
        document: &Path,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.bases.push(document.to_path_buf());
        let result = f(self);
        self.bases.pop();
        result
    }

    /// Run `f` with `key` marked in flight and `document` as the base.
    fn within<T>(
        &mut self,
        key: &str,
        document: &Path,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let entered = self.resolver.enter(key);
        let result = self.with_base(document, f);
        if entered {
            self.resolver.leave(key);
        }
        result
    }

    /// Name of the root component a pointer target designates, if any.
    fn component_name(&self, target: &PointerTarget) -> Option<String> {
        if target.document != self.resolver.root_path() {
            return None;
        }
        let name = target.fragment.strip_prefix(COMPONENT_SCHEMAS)?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(unescape_segment(name))
    }

    fn type_from_ref(&mut self, pointer: &str, name: &str) -> Result<IrType> {
        let base = self.current_base();
        let key = self.resolver.target(pointer, &base).key();
        let resolved = self.resolver.resolve(pointer, &base)?;
        if resolved.is_circular {
            debug!(pointer, name, "Circular alias, using placeholder.");
            return Ok(circular_placeholder(name, pointer));
        }
        let schema = parse_schema(&resolved.value, &resolved.document, pointer)?;
        self.within(&key, &resolved.document, |this| {
            this.schema_type(&schema, name, name)
        })
    }

    fn reference_ref(&mut self, pointer: &str) -> Result<IrTypeRef> {
        let base = self.current_base();
        let target = self.resolver.target(pointer, &base);
        let key = target.key();

        if self.resolver.is_in_flight(&key) {
            debug!(pointer, "Circular reference, using placeholder.");
            let name = pointer_type_name(pointer);
            return Ok(IrTypeRef::inline(circular_placeholder(&name, pointer)));
        }
        if let Some(name) = self.component_name(&target) {
            return Ok(IrTypeRef::reference(name));
        }

        let resolved = self.resolver.resolve(pointer, &base)?;
        if resolved.is_circular {
            let name = pointer_type_name(pointer);
            return Ok(IrTypeRef::inline(circular_placeholder(&name, pointer)));
        }
        let schema = parse_schema(&resolved.value, &resolved.document, pointer)?;
        let context = pointer_type_name(pointer);
        trace!(pointer, document = %resolved.document.display(), "Inlining dereferenced schema.");
        self.within(&key, &resolved.document, |this| this.schema_ref(&schema, &context))
    }

    fn schema_ref(&mut self, schema: &Schema, context: &str) -> Result<IrTypeRef> {
        if let Some(pointer) = &schema.ref_path {
            return self.reference_ref(pointer);
        }
        if let Some(branch) = schema.nullable_branch() {
            return Ok(self.schema_ref(branch, context)?.with_nullable(true));
        }
        let nullable = schema.is_nullable();
        if let Some(primitive) = bare_primitive(schema) {
            return Ok(IrTypeRef::primitive(primitive).with_nullable(nullable));
        }
        let name = self.namer.next_name(context);
        trace!(name = %name, "Synthesized inline type.");
        let ty = self.schema_type(schema, &name, context)?;
        Ok(IrTypeRef::inline(ty).with_nullable(nullable))
    }

    fn schema_type(&mut self, schema: &Schema, name: &str, context: &str) -> Result<IrType> {
        let kind = match schema.shape() {
            SchemaShape::Reference(pointer) => return self.type_from_ref(pointer, name),
            SchemaShape::OneOf(branches) => {
                self.union_kind(branches, schema.discriminator.as_ref(), context)?
            }
            SchemaShape::AnyOf(branches) => self.union_kind(branches, None, context)?,
            SchemaShape::AllOf(members) => TypeKind::Intersection {
                members: self.branch_refs(members, &format!("{context} part"))?,
            },
            SchemaShape::Const(value) => TypeKind::Literal {
                value: value.clone(),
            },
            SchemaShape::Kind(kind) => self.kind_payload(schema, kind, context)?,
        };

        let mut ty = IrType::new(name, kind);
        ty.description = schema.description.clone();
        ty.constraints = constraints(schema);
        ty.default = schema.default.clone();
        ty.deprecated = schema.deprecated;
        Ok(ty)
    }

    fn branch_refs(&mut self, branches: &[Schema], context: &str) -> Result<Vec<IrTypeRef>> {
        branches
            .iter()
            .map(|branch| self.schema_ref(branch, context))
            .collect()
    }

    fn union_kind(
        &mut self,
        branches: &[Schema],
        discriminator: Option<&SchemaDiscriminator>,
        context: &str,
    ) -> Result<TypeKind> {
        let variants = self.branch_refs(branches, &format!("{context} variant"))?;
        let discriminator = discriminator.map(|d| {
            let mapping = match &d.mapping {
                Some(explicit) => explicit
                    .iter()
                    .map(|(value, target)| (value.clone(), mapping_type_name(target)))
                    .collect(),
                None => variants
                    .iter()
                    .filter_map(IrTypeRef::reference_name)
                    .map(|name| (name.to_string(), name.to_string()))
                    .collect::<IndexMap<_, _>>(),
            };
            Discriminator {
                property_name: d.property_name.clone(),
                mapping,
            }
        });
        Ok(TypeKind::Union {
            variants,
            discriminator,
        })
    }

    fn kind_payload(&mut self, schema: &Schema, kind: SchemaKind, context: &str) -> Result<TypeKind> {
        let payload = match kind {
            SchemaKind::Object => self.object_kind(schema, context)?,
            SchemaKind::Array => {
                let items = match &schema.items {
                    Some(items) => self.schema_ref(items, &format!("{context} item"))?,
                    None => IrTypeRef::primitive(PrimitiveKind::Any),
                };
                TypeKind::Array {
                    items: Box::new(items),
                }
            }
            SchemaKind::String | SchemaKind::Number | SchemaKind::Integer
                if schema.enum_values.is_some() =>
            {
                let values = schema.enum_values.as_deref().unwrap_or_default();
                TypeKind::Enum {
                    values: enum_members(values),
                }
            }
            SchemaKind::String => TypeKind::Primitive {
                primitive: string_primitive(schema.format.as_deref()),
            },
            SchemaKind::Number => TypeKind::Primitive {
                primitive: PrimitiveKind::Number,
            },
            SchemaKind::Integer => TypeKind::Primitive {
                primitive: PrimitiveKind::Integer,
            },
            SchemaKind::Boolean => TypeKind::Primitive {
                primitive: PrimitiveKind::Boolean,
            },
            SchemaKind::Null => TypeKind::Primitive {
                primitive: PrimitiveKind::Null,
            },
            SchemaKind::Any => TypeKind::Primitive {
                primitive: PrimitiveKind::Any,
            },
        };
        Ok(payload)
    }

    fn object_kind(&mut self, schema: &Schema, context: &str) -> Result<TypeKind> {
        let required: HashSet<&str> = schema.required.iter().map(String::as_str).collect();
        let mut properties = Vec::new();
        if let Some(declared) = &schema.properties {
            for (prop_name, prop_schema) in declared {
                let ty = self.schema_ref(prop_schema, &format!("{context} {prop_name}"))?;
                properties.push(IrProperty {
                    name: prop_name.clone(),
                    ty,
                    required: required.contains(prop_name.as_str()),
                    read_only: prop_schema.read_only,
                    write_only: prop_schema.write_only,
                    deprecated: prop_schema.deprecated,
                    default: prop_schema.default.clone(),
                    description: prop_schema.description.clone(),
                });
            }
        }

        let additional_properties = match &schema.additional_properties {
            None => None,
            Some(AdditionalProperties::Bool(allowed)) => {
                Some(IrAdditionalProperties::Allowed(*allowed))
            }
            Some(AdditionalProperties::Schema(value)) => {
                let ty = self.schema_ref(value, &format!("{context} value"))?;
                Some(IrAdditionalProperties::Typed(Box::new(ty)))
            }
        };

        Ok(TypeKind::Object {
            properties,
            additional_properties,
            implements: Vec::new(),
        })
    }
}

fn parse_schema(value: &Value, document: &Path, location: &str) -> Result<Schema> {
    Schema::deserialize(value)
        .map_err(|e| FormatError::schema(document, location, format!("invalid schema: {e}")).into())
}

fn circular_placeholder(name: &str, pointer: &str) -> IrType {
    IrType::placeholder(name, format!("Circular reference to {pointer}"))
}

/// Primitive kind of a schema simple enough to need no type of its own.
fn bare_primitive(schema: &Schema) -> Option<PrimitiveKind> {
    let SchemaShape::Kind(kind) = schema.shape() else {
        return None;
    };
    if schema.enum_values.is_some()
        || schema.description.is_some()
        || schema.default.is_some()
        || schema.deprecated
    {
        return None;
    }
    let refined_format = matches!(
        schema.format.as_deref(),
        None | Some("date" | "date-time" | "binary")
    );
    let mut rest = constraints(schema);
    rest.format = None;
    if !refined_format || !rest.is_empty() {
        return None;
    }
    match kind {
        SchemaKind::String => Some(string_primitive(schema.format.as_deref())),
        SchemaKind::Number => Some(PrimitiveKind::Number),
        SchemaKind::Integer => Some(PrimitiveKind::Integer),
        SchemaKind::Boolean => Some(PrimitiveKind::Boolean),
        SchemaKind::Null => Some(PrimitiveKind::Null),
        SchemaKind::Any if schema.properties.is_none() && schema.items.is_none() => {
            Some(PrimitiveKind::Any)
        }
        SchemaKind::Object | SchemaKind::Array | SchemaKind::Any => None,
    }
}

fn string_primitive(format: Option<&str>) -> PrimitiveKind {
    match format {
        Some("date") => PrimitiveKind::Date,
        Some("date-time") => PrimitiveKind::DateTime,
        Some("binary") => PrimitiveKind::Binary,
        _ => PrimitiveKind::String,
    }
}

fn constraints(schema: &Schema) -> Constraints {
    let (minimum, exclusive_minimum) = split_bound(schema.minimum, schema.exclusive_minimum);
    let (maximum, exclusive_maximum) = split_bound(schema.maximum, schema.exclusive_maximum);
    Constraints {
        format: schema.format.clone(),
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
        min_length: schema.min_length,
        max_length: schema.max_length,
        pattern: schema.pattern.clone(),
        min_items: schema.min_items,
        max_items: schema.max_items,
        unique_items: schema.unique_items,
    }
}

/// Split an inclusive bound and its exclusive marker into `(inclusive, exclusive)`.
fn split_bound(bound: Option<f64>, exclusive: Option<ExclusiveBound>) -> (Option<f64>, Option<f64>) {
    match exclusive {
        Some(ExclusiveBound::Flag(true)) => (None, bound),
        Some(ExclusiveBound::Value(value)) => (bound, Some(value)),
        Some(ExclusiveBound::Flag(false)) | None => (bound, None),
    }
}

fn enum_members(values: &[Value]) -> Vec<EnumMember> {
    enum_member_names(values)
        .into_iter()
        .zip(values)
        .map(|(name, value)| EnumMember {
            name,
            value: value.clone(),
            description: None,
            deprecated: false,
        })
        .collect()
}

/// Discriminator mapping targets may be pointers or bare schema names.
fn mapping_type_name(target: &str) -> String {
    if target.contains('#') || target.contains('/') {
        pointer_type_name(target)
    } else {
        target.to_string()
    }
}

/// Escape a pointer segment (`~` → `~0`, `/` → `~1`).
pub(crate) fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::document::MemoryReader;
    use serde_json::json;

    fn with_converter<T>(root: Value, reader: &MemoryReader, f: impl FnOnce(&mut SchemaConverter<'_>) -> T) -> T {
        let resolver = Resolver::new(reader, Path::new("api.yaml"), root);
        let mut converter = SchemaConverter::new(resolver);
        f(&mut converter)
    }

    fn empty_root() -> Value {
        json!({"components": {"schemas": {}}})
    }

    #[test]
    fn test_object_properties() {
        let reader = MemoryReader::new();
        let raw = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "integer", "readOnly": true},
                "name": {"type": "string", "description": "Display name"},
                "owner": {"$ref": "#/components/schemas/Owner"}
            }
        });
        let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Pet")).unwrap();
        let TypeKind::Object { properties, .. } = &ty.kind else {
            panic!("expected object, got {}", ty.kind_name());
        };
        assert_eq!(properties.len(), 3);
        assert!(properties[0].required);
        assert!(properties[0].read_only);
        assert_eq!(
            properties[0].ty.primitive_kind(),
            Some(PrimitiveKind::Integer)
        );
        assert!(!properties[1].required);
        assert_eq!(properties[1].description.as_deref(), Some("Display name"));
        assert_eq!(properties[2].ty.reference_name(), Some("Owner"));
    }

    #[test]
    fn test_self_reference_becomes_placeholder() {
        let reader = MemoryReader::new();
        let raw = json!({
            "type": "object",
            "properties": {"next": {"$ref": "#/components/schemas/Node"}}
        });
        let ty = with_converter(empty_root(), &reader, |c| {
            let key = c.component_target("Node").key();
            c.resolver().enter(&key);
            c.convert_to_type(&raw, "Node")
        })
        .unwrap();
        let TypeKind::Object { properties, .. } = &ty.kind else {
            panic!("expected object");
        };
        let placeholder = properties[0].ty.inline_type().unwrap();
        assert_eq!(placeholder.kind_name(), "any");
        assert!(
            placeholder
                .description
                .as_deref()
                .unwrap()
                .contains("#/components/schemas/Node")
        );
    }

    #[test]
    fn test_combinator_precedence() {
        let reader = MemoryReader::new();
        let raw = json!({
            "anyOf": [{"type": "string"}, {"type": "integer"}],
            "allOf": [{"type": "object"}]
        });
        let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Mixed")).unwrap();
        let TypeKind::Union { variants, discriminator } = &ty.kind else {
            panic!("expected union");
        };
        assert_eq!(variants.len(), 2);
        assert!(discriminator.is_none());
    }

    #[test]
    fn test_discriminator_mapping_normalized() {
        let reader = MemoryReader::new();
        let raw = json!({
            "oneOf": [
                {"$ref": "#/components/schemas/Dog"},
                {"$ref": "#/components/schemas/Cat"}
            ],
            "discriminator": {
                "propertyName": "type",
                "mapping": {"dog": "#/components/schemas/Dog", "cat": "Cat"}
            }
        });
        let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Pet")).unwrap();
        let TypeKind::Union { discriminator, .. } = &ty.kind else {
            panic!("expected union");
        };
        let discriminator = discriminator.as_ref().unwrap();
        assert_eq!(discriminator.property_name, "type");
        assert_eq!(discriminator.type_for_value("dog"), Some("Dog"));
        assert_eq!(discriminator.value_for_type("Cat"), Some("cat"));
    }

    #[test]
    fn test_implicit_discriminator_mapping() {
        let reader = MemoryReader::new();
        let raw = json!({
            "oneOf": [{"$ref": "#/components/schemas/Dog"}, {"type": "object"}],
            "discriminator": {"propertyName": "kind"}
        });
        let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Pet")).unwrap();
        let TypeKind::Union { discriminator, .. } = &ty.kind else {
            panic!("expected union");
        };
        let mapping = &discriminator.as_ref().unwrap().mapping;
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("Dog").map(String::as_str), Some("Dog"));
    }

    #[test]
    fn test_nullable_forms() {
        let reader = MemoryReader::new();
        with_converter(empty_root(), &reader, |c| {
            let r = c
                .convert_to_type_ref(&json!({"type": ["string", "null"]}), "x")
                .unwrap();
            assert_eq!(r.primitive_kind(), Some(PrimitiveKind::String));
            assert!(r.is_nullable());

            let r = c
                .convert_to_type_ref(&json!({"type": "integer", "nullable": true}), "x")
                .unwrap();
            assert!(r.is_nullable());

            let r = c
                .convert_to_type_ref(
                    &json!({"anyOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "null"}]}),
                    "x",
                )
                .unwrap();
            assert_eq!(r.reference_name(), Some("Pet"));
            assert!(r.is_nullable());

            let r = c
                .convert_to_type_ref(
                    &json!({"$ref": "#/components/schemas/Pet", "nullable": true}),
                    "x",
                )
                .unwrap();
            assert!(!r.is_nullable());
        });
    }

    #[test]
    fn test_enum_members_disambiguated() {
        let reader = MemoryReader::new();
        let raw = json!({"type": "string", "enum": ["in-progress", "in_progress", "done"]});
        let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Status")).unwrap();
        let TypeKind::Enum { values } = &ty.kind else {
            panic!("expected enum");
        };
        let names: Vec<_> = values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["IN_PROGRESS", "IN_PROGRESS_2", "DONE"]);
        assert_eq!(values[1].value, json!("in_progress"));
    }

    #[test]
    fn test_primitives_and_constraints() {
        let reader = MemoryReader::new();
        with_converter(empty_root(), &reader, |c| {
            let r = c
                .convert_to_type_ref(&json!({"type": "string", "format": "date-time"}), "x")
                .unwrap();
            assert_eq!(r.primitive_kind(), Some(PrimitiveKind::DateTime));

            let r = c
                .convert_to_type_ref(&json!({"type": "string", "format": "uuid"}), "Pet id")
                .unwrap();
            let ty = r.inline_type().unwrap();
            assert_eq!(ty.name, "PetId_1");
            assert_eq!(ty.constraints.format.as_deref(), Some("uuid"));

            let ty = c
                .convert_to_type(
                    &json!({"type": "integer", "minimum": 1, "exclusiveMinimum": true, "maximum": 10}),
                    "Count",
                )
                .unwrap();
            assert_eq!(ty.constraints.exclusive_minimum, Some(1.0));
            assert_eq!(ty.constraints.minimum, None);
            assert_eq!(ty.constraints.maximum, Some(10.0));

            let ty = c.convert_to_type(&json!({"const": "v1"}), "Version").unwrap();
            assert_eq!(ty.kind, TypeKind::Literal { value: json!("v1") });

            let ty = c
                .convert_to_type(&json!({"description": "Opaque blob"}), "Blob")
                .unwrap();
            assert_eq!(ty.kind_name(), "any");
            assert_eq!(ty.description.as_deref(), Some("Opaque blob"));
        });
    }

    #[test]
    fn test_array_and_map() {
        let reader = MemoryReader::new();
        with_converter(empty_root(), &reader, |c| {
            let ty = c.convert_to_type(&json!({"type": "array"}), "Anything").unwrap();
            let TypeKind::Array { items } = &ty.kind else {
                panic!("expected array");
            };
            assert_eq!(items.primitive_kind(), Some(PrimitiveKind::Any));

            let ty = c
                .convert_to_type(&json!({"additionalProperties": {"type": "integer"}}), "Counts")
                .unwrap();
            let TypeKind::Object {
                additional_properties: Some(IrAdditionalProperties::Typed(value)),
                ..
            } = &ty.kind
            else {
                panic!("expected typed map");
            };
            assert_eq!(value.primitive_kind(), Some(PrimitiveKind::Integer));
        });
    }

    #[test]
    fn test_external_reference_is_inlined() {
        let reader = MemoryReader::new()
            .with_file(
                "models/pet.yaml",
                "Pet:\n  type: object\n  properties:\n    tag:\n      $ref: '#/Tag'\nTag:\n  type: string\n  maxLength: 8\n",
            );
        let raw = json!({"$ref": "models/pet.yaml#/Pet"});
        let r = with_converter(empty_root(), &reader, |c| c.convert_to_type_ref(&raw, "owner pet")).unwrap();
        let ty = r.inline_type().unwrap();
        let TypeKind::Object { properties, .. } = &ty.kind else {
            panic!("expected object");
        };
        let tag = properties[0].ty.inline_type().unwrap();
        assert_eq!(tag.constraints.max_length, Some(8));
    }

    #[test]
    fn test_inline_names_are_deterministic() {
        let raw = json!({
            "type": "object",
            "properties": {
                "address": {"type": "object", "properties": {"street": {"type": "string"}}},
                "tags": {"type": "array", "items": {"type": "object"}}
            }
        });
        let names = || {
            let reader = MemoryReader::new();
            let ty = with_converter(empty_root(), &reader, |c| c.convert_to_type(&raw, "Pet")).unwrap();
            let TypeKind::Object { properties, .. } = ty.kind else {
                panic!("expected object");
            };
            properties
                .iter()
                .filter_map(|p| p.ty.inline_type().map(|t| t.name.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(), vec!["PetAddress_1", "PetTags_2"]);
        assert_eq!(names(), names());
    }

    #[test]
    fn test_malformed_schema_is_format_error() {
        let reader = MemoryReader::new();
        let err = with_converter(empty_root(), &reader, |c| {
            c.convert_to_type(&json!({"properties": "nope"}), "Broken")
        })
        .unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_escape_segment() {
        assert_eq!(escape_segment("a/b~c"), "a~1b~0c");
        assert_eq!(unescape_segment("a~1b~0c"), "a/b~c");
    }
}
