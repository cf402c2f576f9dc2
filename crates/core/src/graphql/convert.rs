//! GraphQL document → [`IrSchema`].

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::document::{self, DocumentFormat, FileReader, FsReader};
use crate::error::{FormatError, Result};
use crate::ir::naming::{InlineNamer, enum_member_names};
use crate::ir::{
    Discriminator, EnumMember, IrMetadata, IrOperation, IrProperty, IrSchema, IrType, IrTypeRef,
    IrVariable, OperationKind, PrimitiveKind, SourceFormat, TypeKind,
};
use crate::options::{ParserOptions, is_standard_scalar};

use super::ast::{
    Definition, Document, FieldDefinition, FieldSelection, FragmentDefinition,
    InputValueDefinition, OperationDefinition, Selection, TypeAnnotation, TypeDefinition,
    TypeDefinitionKind, is_deprecated,
};
use super::parser::parse_document;

/// Property every union member can be told apart by.
const TYPENAME_FIELD: &str = "__typename";

/// Parses GraphQL schema and operation documents into the IR.
#[derive(Debug)]
pub struct GraphQlParser<'r> {
    reader: &'r dyn FileReader,
    options: ParserOptions,
}

impl Default for GraphQlParser<'static> {
    fn default() -> Self {
        Self::new(&FsReader)
    }
}

impl<'r> GraphQlParser<'r> {
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
        check_extension(path)?;
        let text = document::read_text(self.reader, path)?;
        self.parse_str(&text, path)
    }

    /// Parse document text as if it had been read from `path`.
    pub fn parse_str(&self, text: &str, path: &Path) -> Result<IrSchema> {
        check_extension(path)?;
        let doc = parse_document(text).map_err(|err| FormatError::GraphQl {
            path: path.to_path_buf(),
            line: err.line,
            column: err.column,
            message: err.message,
        })?;
        debug!(path = %path.display(), definitions = doc.definitions.len(), "Parsed GraphQL syntax.");

        let collected = Collected::from_document(doc, path)?;
        let metadata = IrMetadata {
            title: self
                .options
                .title
                .clone()
                .unwrap_or_else(|| document::file_stem(path)),
            version: self
                .options
                .version
                .clone()
                .unwrap_or_else(|| ParserOptions::DEFAULT_VERSION.to_string()),
            description: collected.description.clone(),
            base_url: None,
            source: SourceFormat::GraphQl,
        };

        let mut builder = Builder {
            options: &self.options,
            definitions: &collected.definitions,
            namer: InlineNamer::new(),
        };
        let mut schema = IrSchema::new(metadata);
        for (name, definition) in &collected.definitions {
            let ty = builder.convert_definition(definition);
            trace!(name = %name, kind = ty.kind_name(), "Converted type.");
            schema.types.insert(name.clone(), ty);
        }
        for (kind, root) in collected.roots.iter() {
            schema.operations.extend(builder.root_operations(kind, root));
        }
        let mut anonymous = 0;
        for op in &collected.operations {
            let name = op.name.clone().unwrap_or_else(|| {
                anonymous += 1;
                format!("{}{anonymous}", op.kind.as_str())
            });
            let operation = builder.executable_operation(op, name, text, &collected);
            debug!(name = %operation.name, kind = operation.kind.as_str(), "Assembled operation.");
            schema.operations.push(operation);
        }

        debug!(
            types = schema.types.len(),
            operations = schema.operations.len(),
            "Parsed GraphQL document."
        );
        Ok(schema)
    }
}

fn check_extension(path: &Path) -> Result<(), FormatError> {
    if DocumentFormat::from_path(path) == Some(DocumentFormat::GraphQl) {
        Ok(())
    } else {
        Err(FormatError::UnsupportedExtension {
            path: path.to_path_buf(),
        })
    }
}

/// Root type name per operation kind.
#[derive(Debug)]
struct RootTypes {
    query: String,
    mutation: String,
    subscription: String,
}

impl Default for RootTypes {
    fn default() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: "Mutation".to_string(),
            subscription: "Subscription".to_string(),
        }
    }
}

impl RootTypes {
    fn get(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query,
            OperationKind::Mutation => &self.mutation,
            OperationKind::Subscription => &self.subscription,
        }
    }

    fn set(&mut self, kind: OperationKind, name: String) {
        match kind {
            OperationKind::Query => self.query = name,
            OperationKind::Mutation => self.mutation = name,
            OperationKind::Subscription => self.subscription = name,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (OperationKind, &str)> {
        [
            OperationKind::Query,
            OperationKind::Mutation,
            OperationKind::Subscription,
        ]
        .into_iter()
        .map(|kind| (kind, self.get(kind)))
    }
}

/// Definitions sorted by role, with extensions already merged.
#[derive(Debug, Default)]
struct Collected {
    definitions: IndexMap<String, TypeDefinition>,
    operations: Vec<OperationDefinition>,
    fragments: HashMap<String, FragmentDefinition>,
    roots: RootTypes,
    description: Option<String>,
}

impl Collected {
    fn from_document(doc: Document, path: &Path) -> Result<Self, FormatError> {
        let mut collected = Self::default();
        let mut extensions = Vec::new();
        for definition in doc.definitions {
            match definition {
                Definition::Schema(schema) => {
                    for (kind, name) in schema.roots {
                        collected.roots.set(kind, name);
                    }
                    if collected.description.is_none() {
                        collected.description = schema.description;
                    }
                }
                Definition::Type(ty) => {
                    if collected.definitions.contains_key(&ty.name) {
                        return Err(FormatError::schema(
                            path,
                            format!("{} {} (line {})", ty.kind.keyword(), ty.name, ty.line),
                            "duplicate type definition",
                        ));
                    }
                    collected.definitions.insert(ty.name.clone(), ty);
                }
                Definition::Extension(ty) => extensions.push(ty),
                Definition::Directive(name) => {
                    trace!(name = %name, "Skipping directive definition.");
                }
                Definition::Operation(op) => collected.operations.push(op),
                Definition::Fragment(fragment) => {
                    collected.fragments.insert(fragment.name.clone(), fragment);
                }
            }
        }

        for extension in extensions {
            match collected.definitions.get_mut(&extension.name) {
                Some(base) => merge_extension(base, extension, path)?,
                None => {
                    collected.definitions.insert(extension.name.clone(), extension);
                }
            }
        }
        Ok(collected)
    }
}

fn merge_extension(
    base: &mut TypeDefinition,
    extension: TypeDefinition,
    path: &Path,
) -> Result<(), FormatError> {
    let TypeDefinition {
        name,
        kind,
        directives,
        line,
        ..
    } = extension;
    let declared = base.kind.keyword();
    let location = format!("extend {} {name} (line {line})", kind.keyword());
    match (&mut base.kind, kind) {
        (
            TypeDefinitionKind::Object { interfaces, fields },
            TypeDefinitionKind::Object {
                interfaces: more_interfaces,
                fields: more_fields,
            },
        )
        | (
            TypeDefinitionKind::Interface { interfaces, fields },
            TypeDefinitionKind::Interface {
                interfaces: more_interfaces,
                fields: more_fields,
            },
        ) => {
            interfaces.extend(more_interfaces);
            fields.extend(more_fields);
        }
        (
            TypeDefinitionKind::InputObject { fields },
            TypeDefinitionKind::InputObject { fields: more },
        ) => fields.extend(more),
        (TypeDefinitionKind::Enum { values }, TypeDefinitionKind::Enum { values: more }) => {
            values.extend(more);
        }
        (TypeDefinitionKind::Union { members }, TypeDefinitionKind::Union { members: more }) => {
            members.extend(more);
        }
        (TypeDefinitionKind::Scalar, TypeDefinitionKind::Scalar) => {}
        _ => {
            return Err(FormatError::schema(
                path,
                location,
                format!("`{name}` is declared as `{declared}`"),
            ));
        }
    }
    base.directives.extend(directives);
    Ok(())
}

/// Converts collected definitions to IR, naming inline list types as it goes.
struct Builder<'a> {
    options: &'a ParserOptions,
    definitions: &'a IndexMap<String, TypeDefinition>,
    namer: InlineNamer,
}

impl Builder<'_> {
    fn convert_definition(&mut self, definition: &TypeDefinition) -> IrType {
        let name = definition.name.as_str();
        let kind = match &definition.kind {
            TypeDefinitionKind::Object { interfaces, fields }
            | TypeDefinitionKind::Interface { interfaces, fields } => TypeKind::Object {
                properties: fields
                    .iter()
                    .map(|field| self.field_property(name, field))
                    .collect(),
                additional_properties: None,
                implements: interfaces.clone(),
            },
            TypeDefinitionKind::InputObject { fields } => TypeKind::object(
                fields
                    .iter()
                    .map(|field| self.input_property(name, field))
                    .collect(),
            ),
            TypeDefinitionKind::Enum { values } => {
                let raw: Vec<Value> = values
                    .iter()
                    .map(|v| Value::String(v.name.clone()))
                    .collect();
                let names = enum_member_names(&raw);
                TypeKind::Enum {
                    values: values
                        .iter()
                        .zip(names)
                        .zip(raw)
                        .map(|((value, member_name), raw)| EnumMember {
                            name: member_name,
                            value: raw,
                            description: value.description.clone(),
                            deprecated: is_deprecated(&value.directives),
                        })
                        .collect(),
                }
            }
            TypeDefinitionKind::Union { members } => TypeKind::Union {
                variants: members.iter().map(IrTypeRef::reference).collect(),
                discriminator: Some(Discriminator {
                    property_name: TYPENAME_FIELD.to_string(),
                    mapping: members.iter().map(|m| (m.clone(), m.clone())).collect(),
                }),
            },
            TypeDefinitionKind::Scalar => match self.options.scalar_kind(name) {
                Some(primitive) => TypeKind::Primitive { primitive },
                None => {
                    let note = format!("Custom scalar `{name}` has no primitive mapping");
                    let description = definition
                        .description
                        .as_ref()
                        .map_or_else(|| note.clone(), |d| format!("{d}\n\n{note}"));
                    let mut ty = IrType::placeholder(name, description);
                    ty.deprecated = is_deprecated(&definition.directives);
                    return ty;
                }
            },
        };

        let mut ty = IrType::new(name, kind).with_description(definition.description.clone());
        ty.deprecated = is_deprecated(&definition.directives);
        ty
    }

    fn field_property(&mut self, owner: &str, field: &FieldDefinition) -> IrProperty {
        let ty = self.type_ref(&field.ty, &format!("{owner} {}", field.name));
        let mut property = IrProperty::new(&field.name, ty, is_non_null(&field.ty));
        property.deprecated = is_deprecated(&field.directives);
        property.description.clone_from(&field.description);
        property
    }

    fn input_property(&mut self, owner: &str, field: &InputValueDefinition) -> IrProperty {
        let ty = self.type_ref(&field.ty, &format!("{owner} {}", field.name));
        let mut property = IrProperty::new(&field.name, ty, is_non_null(&field.ty));
        property.deprecated = is_deprecated(&field.directives);
        property.default.clone_from(&field.default);
        property.description.clone_from(&field.description);
        property
    }

    fn variable(&mut self, owner: &str, input: &InputValueDefinition) -> IrVariable {
        IrVariable {
            name: input.name.clone(),
            ty: self.type_ref(&input.ty, &format!("{owner} {}", input.name)),
            default: input.default.clone(),
        }
    }

    /// Convert a use-site annotation. `!` clears nullability on its
    /// immediate contents; everything else is nullable.
    fn type_ref(&mut self, annotation: &TypeAnnotation, context: &str) -> IrTypeRef {
        match annotation {
            TypeAnnotation::NonNull(inner) => self.type_ref(inner, context).with_nullable(false),
            TypeAnnotation::List(inner) => {
                let name = self.namer.next_name(context);
                let items = self.type_ref(inner, &format!("{context} item"));
                IrTypeRef::inline(IrType::new(
                    name,
                    TypeKind::Array {
                        items: Box::new(items),
                    },
                ))
                .with_nullable(true)
            }
            TypeAnnotation::Named(name) => self.named_ref(name).with_nullable(true),
        }
    }

    fn named_ref(&self, name: &str) -> IrTypeRef {
        if is_standard_scalar(name) || !self.definitions.contains_key(name) {
            if let Some(primitive) = self.options.scalar_kind(name) {
                return IrTypeRef::primitive(primitive);
            }
        }
        IrTypeRef::reference(name)
    }

    fn root_operations(&mut self, kind: OperationKind, root: &str) -> Vec<IrOperation> {
        let definitions = self.definitions;
        let Some(TypeDefinitionKind::Object { fields, .. }) =
            definitions.get(root).map(|d| &d.kind)
        else {
            return Vec::new();
        };
        fields
            .iter()
            .map(|field| {
                let context = format!("{root} {}", field.name);
                IrOperation {
                    name: field.name.clone(),
                    kind,
                    variables: field
                        .arguments
                        .iter()
                        .map(|arg| self.variable(&context, arg))
                        .collect(),
                    return_type: self.type_ref(&field.ty, &context),
                    source: None,
                    description: field.description.clone(),
                    deprecated: is_deprecated(&field.directives),
                }
            })
            .collect()
    }

    fn executable_operation(
        &mut self,
        op: &OperationDefinition,
        name: String,
        source: &str,
        collected: &Collected,
    ) -> IrOperation {
        let variables = op
            .variables
            .iter()
            .map(|var| self.variable(&name, var))
            .collect();

        let mut fields = Vec::new();
        collect_fields(&op.selections, &collected.fragments, &mut Vec::new(), &mut fields);
        let root = collected.roots.get(op.kind);
        let return_type = match fields.len() {
            1 => self.selected_type(root, fields[0], &name),
            _ => {
                let type_name = self.namer.next_name(&format!("{name} result"));
                let mut seen = IndexMap::new();
                for field in fields {
                    seen.entry(field.response_key()).or_insert(field);
                }
                let properties = seen
                    .into_iter()
                    .map(|(key, field)| {
                        let ty = self.selected_type(root, field, &name);
                        let required = !ty.is_nullable();
                        IrProperty::new(key, ty, required)
                    })
                    .collect();
                IrTypeRef::inline(IrType::new(type_name, TypeKind::object(properties)))
            }
        };

        IrOperation {
            name,
            kind: op.kind,
            variables,
            return_type,
            source: source.get(op.span.0..op.span.1).map(str::to_string),
            description: None,
            deprecated: false,
        }
    }

    /// Declared type of `field` on `parent`; `unknown` when nothing declares it.
    fn selected_type(&mut self, parent: &str, field: &FieldSelection, operation: &str) -> IrTypeRef {
        if field.name == TYPENAME_FIELD {
            return IrTypeRef::primitive(PrimitiveKind::String);
        }
        let definitions = self.definitions;
        let declared = definitions.get(parent).and_then(|d| match &d.kind {
            TypeDefinitionKind::Object { fields, .. }
            | TypeDefinitionKind::Interface { fields, .. } => {
                fields.iter().find(|f| f.name == field.name)
            }
            _ => None,
        });
        match declared {
            Some(definition) => {
                self.type_ref(&definition.ty, &format!("{operation} {}", field.response_key()))
            }
            None => IrTypeRef::primitive(PrimitiveKind::Unknown),
        }
    }
}

fn is_non_null(annotation: &TypeAnnotation) -> bool {
    matches!(annotation, TypeAnnotation::NonNull(_))
}

/// Flatten the top level of a selection set, expanding fragments.
fn collect_fields<'d>(
    selections: &'d [Selection],
    fragments: &'d HashMap<String, FragmentDefinition>,
    visiting: &mut Vec<&'d str>,
    out: &mut Vec<&'d FieldSelection>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => out.push(field),
            Selection::InlineFragment(selections) => {
                collect_fields(selections, fragments, visiting, out);
            }
            Selection::FragmentSpread(name) => {
                if visiting.contains(&name.as_str()) {
                    continue;
                }
                if let Some(fragment) = fragments.get(name) {
                    visiting.push(name);
                    collect_fields(&fragment.selections, fragments, visiting, out);
                    visiting.pop();
                }
            }
        }
    }
}
