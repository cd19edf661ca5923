//! SDL text to [`Document`] adapter.
//!
//! Syntax is handled by `async-graphql-parser`; this module only converts its
//! positioned service document into the schema AST. No semantic checks are
//! performed here.

use async_graphql_parser::types::{
    BaseType, ConstDirective, FieldDefinition as ParsedField, InputValueDefinition as ParsedInput,
    SchemaDefinition as ParsedSchema, Type, TypeDefinition as ParsedType, TypeKind,
    TypeSystemDefinition,
};
use async_graphql_parser::Positioned;
use tracing::trace;

use super::ast::{
    Definition, DirectiveDefinition, DirectiveUsage, Document, EnumTypeDefinition,
    EnumValueDefinition, FieldDefinition, InputObjectTypeDefinition, InputValueDefinition,
    InterfaceTypeDefinition, ObjectTypeDefinition, ScalarTypeDefinition, SchemaDefinition,
    TypeDefinition, TypeRef, UnionTypeDefinition,
};
use super::error::SchemaError;

/// Parses SDL text into a schema [`Document`].
///
/// # Errors
///
/// Returns [`SchemaError::Parse`] when the text is not valid SDL.
pub fn parse_document(sdl: &str) -> Result<Document, SchemaError> {
    let parsed =
        async_graphql_parser::parse_schema(sdl).map_err(|e| SchemaError::Parse(e.to_string()))?;

    let definitions: Vec<Definition> = parsed
        .definitions
        .into_iter()
        .map(convert_definition)
        .collect();

    trace!(definitions = definitions.len(), "Parsed schema document");
    Ok(Document::new(definitions))
}

fn convert_definition(definition: TypeSystemDefinition) -> Definition {
    match definition {
        TypeSystemDefinition::Schema(schema) => {
            let extend = schema.node.extend;
            let converted = convert_schema(schema.node);
            if extend {
                Definition::SchemaExtension(converted)
            } else {
                Definition::Schema(converted)
            }
        }
        TypeSystemDefinition::Type(ty) => {
            let extend = ty.node.extend;
            let converted = convert_type(ty.node);
            if extend {
                Definition::TypeExtension(converted)
            } else {
                Definition::Type(converted)
            }
        }
        TypeSystemDefinition::Directive(directive) => {
            let directive = directive.node;
            Definition::Directive(DirectiveDefinition {
                name: directive.name.node.to_string(),
                description: description(directive.description),
                arguments: directive.arguments.into_iter().map(convert_input).collect(),
                repeatable: directive.is_repeatable,
                locations: directive.locations.into_iter().map(|l| l.node).collect(),
            })
        }
    }
}

fn convert_schema(schema: ParsedSchema) -> SchemaDefinition {
    SchemaDefinition {
        query: schema.query.map(|n| n.node.to_string()),
        mutation: schema.mutation.map(|n| n.node.to_string()),
        subscription: schema.subscription.map(|n| n.node.to_string()),
    }
}

fn convert_type(ty: ParsedType) -> TypeDefinition {
    let name = ty.name.node.to_string();
    let description = description(ty.description);

    match ty.kind {
        TypeKind::Scalar => TypeDefinition::Scalar(ScalarTypeDefinition { name, description }),
        TypeKind::Object(object) => TypeDefinition::Object(ObjectTypeDefinition {
            name,
            description,
            implements: object.implements.into_iter().map(|n| n.node.to_string()).collect(),
            fields: object.fields.into_iter().map(convert_field).collect(),
        }),
        TypeKind::Interface(interface) => TypeDefinition::Interface(InterfaceTypeDefinition {
            name,
            description,
            implements: interface
                .implements
                .into_iter()
                .map(|n| n.node.to_string())
                .collect(),
            fields: interface.fields.into_iter().map(convert_field).collect(),
        }),
        TypeKind::Union(union) => TypeDefinition::Union(UnionTypeDefinition {
            name,
            description,
            members: union.members.into_iter().map(|n| n.node.to_string()).collect(),
        }),
        TypeKind::Enum(enum_type) => TypeDefinition::Enum(EnumTypeDefinition {
            name,
            description,
            values: enum_type
                .values
                .into_iter()
                .map(|v| EnumValueDefinition {
                    name: v.node.value.node.to_string(),
                    description: description_of(&v.node.description),
                })
                .collect(),
        }),
        TypeKind::InputObject(input) => TypeDefinition::InputObject(InputObjectTypeDefinition {
            name,
            description,
            fields: input.fields.into_iter().map(convert_input).collect(),
        }),
    }
}

fn convert_field(field: Positioned<ParsedField>) -> FieldDefinition {
    let field = field.node;
    FieldDefinition {
        name: field.name.node.to_string(),
        description: description(field.description),
        arguments: field.arguments.into_iter().map(convert_input).collect(),
        ty: convert_type_ref(&field.ty.node),
        directives: field.directives.into_iter().map(convert_directive).collect(),
    }
}

fn convert_input(input: Positioned<ParsedInput>) -> InputValueDefinition {
    let input = input.node;
    InputValueDefinition {
        name: input.name.node.to_string(),
        description: description(input.description),
        ty: convert_type_ref(&input.ty.node),
        default_value: input.default_value.map(|v| v.node),
    }
}

fn convert_directive(directive: Positioned<ConstDirective>) -> DirectiveUsage {
    let directive = directive.node;
    DirectiveUsage {
        name: directive.name.node.to_string(),
        arguments: directive
            .arguments
            .into_iter()
            .map(|(name, value)| (name.node.to_string(), value.node))
            .collect(),
    }
}

/// Converts the parser's `{base, nullable}` representation into nested wrappers.
fn convert_type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string()),
        BaseType::List(inner) => TypeRef::list(convert_type_ref(inner)),
    };

    if ty.nullable {
        base
    } else {
        TypeRef::non_null(base)
    }
}

fn description(description: Option<Positioned<String>>) -> Option<String> {
    description.map(|d| d.node)
}

fn description_of(description: &Option<Positioned<String>>) -> Option<String> {
    description.as_ref().map(|d| d.node.clone())
}
