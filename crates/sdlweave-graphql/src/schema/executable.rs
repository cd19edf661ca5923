//! Executable schema builder.
//!
//! Turns a finished [`TypeRegistry`] plus a [`RuntimeWiring`] into an
//! `async-graphql` dynamic [`Schema`]. Type extensions are merged into their
//! base definitions here; the registry keeps them apart.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
    Schema, SchemaBuilder, TypeRef as DynTypeRef, Union,
};
use async_graphql::extensions::ApolloTracing;
use tracing::{debug, trace};

use super::ast::{
    FieldDefinition, InputValueDefinition, InterfaceTypeDefinition, ObjectTypeDefinition,
    TypeDefinition, TypeRef,
};
use super::error::SchemaError;
use super::registry::TypeRegistry;
use super::wiring::{RootValue, RuntimeWiring};
use crate::cache::ValidationGate;
use crate::config::ScalarConfig;
use crate::types::{TemporalFormats, extended_scalar, is_built_in};

/// Configuration for the schema builder.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed; 0 disables the check.
    pub max_depth: usize,

    /// Maximum query complexity allowed; 0 disables the check.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// Whether to attach Apollo tracing data to responses.
    pub tracing_enabled: bool,
}

/// Builds an executable schema from a type registry.
pub struct ExecutableSchemaBuilder<'a> {
    registry: &'a TypeRegistry,
    wiring: RuntimeWiring,
    config: SchemaBuilderConfig,
    formats: Option<Arc<TemporalFormats>>,
}

impl<'a> ExecutableSchemaBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry, wiring: RuntimeWiring, config: SchemaBuilderConfig) -> Self {
        Self {
            registry,
            wiring,
            config,
            formats: None,
        }
    }

    /// Uses `formats` for the temporal scalars instead of the default patterns.
    #[must_use]
    pub fn with_formats(mut self, formats: Arc<TemporalFormats>) -> Self {
        self.formats = Some(formats);
        self
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Executable`] when the registry cannot be served:
    /// a missing query root, a subscription root, an extension of an unknown
    /// type, or a type graph `async-graphql` rejects.
    pub fn build(self) -> Result<Schema, SchemaError> {
        debug!(types = self.registry.len(), "Starting executable schema build");

        let formats = match &self.formats {
            Some(formats) => Arc::clone(formats),
            None => Arc::new(
                TemporalFormats::from_config(&ScalarConfig::default())
                    .map_err(|e| SchemaError::Executable(e.to_string()))?,
            ),
        };

        let roots = self.resolve_roots()?;
        let mut schema_builder = Schema::build(&roots.query, roots.mutation.as_deref(), None);

        for name in self.registry.extended_types() {
            if !self.registry.contains(name) {
                return Err(SchemaError::Executable(format!(
                    "extension of undefined type '{name}'"
                )));
            }
        }

        let abstract_types: HashSet<&str> = self
            .registry
            .types()
            .filter(|ty| matches!(ty, TypeDefinition::Interface(_) | TypeDefinition::Union(_)))
            .map(TypeDefinition::name)
            .collect();

        for definition in self.registry.types() {
            let merged = merge_extensions(definition, self.registry.extensions_of(definition.name()))?;
            schema_builder = self.register(schema_builder, merged, &abstract_types, &formats);
        }

        schema_builder = self.configure(schema_builder);
        schema_builder = schema_builder.data(formats);
        if let Some(root) = self.wiring.root_value() {
            schema_builder = schema_builder.data(RootValue(root.clone()));
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| SchemaError::Executable(e.to_string()))?;

        debug!(query = %roots.query, mutation = ?roots.mutation, "Executable schema build complete");
        Ok(schema)
    }

    fn resolve_roots(&self) -> Result<Roots, SchemaError> {
        let declared = self.registry.schema_definition().cloned().unwrap_or_default();

        let query = declared.query.unwrap_or_else(|| "Query".to_string());
        if self.registry.object(&query).is_none() {
            return Err(SchemaError::Executable(format!(
                "query root type '{query}' is not defined"
            )));
        }

        let mutation = match declared.mutation {
            Some(name) if self.registry.object(&name).is_none() => {
                return Err(SchemaError::Executable(format!(
                    "mutation root type '{name}' is not defined"
                )));
            }
            Some(name) => Some(name),
            None => self
                .registry
                .object("Mutation")
                .map(|object| object.name.clone()),
        };

        let subscription = declared
            .subscription
            .or_else(|| self.registry.object("Subscription").map(|o| o.name.clone()));
        if let Some(name) = subscription {
            return Err(SchemaError::Executable(format!(
                "subscription root '{name}' is not supported"
            )));
        }

        Ok(Roots { query, mutation })
    }

    fn register(
        &self,
        builder: SchemaBuilder,
        definition: TypeDefinition,
        abstract_types: &HashSet<&str>,
        formats: &Arc<TemporalFormats>,
    ) -> SchemaBuilder {
        trace!(type_name = definition.name(), kind = definition.kind(), "Registering type");

        match definition {
            TypeDefinition::Scalar(scalar) => {
                if is_built_in(&scalar.name) {
                    return builder;
                }
                let dynamic = match extended_scalar(&scalar.name, formats) {
                    Some(dynamic) => dynamic,
                    None => with_description(Scalar::new(&scalar.name), scalar.description, Scalar::description),
                };
                builder.register(dynamic)
            }
            TypeDefinition::Object(object) => {
                builder.register(self.build_object(object, abstract_types))
            }
            TypeDefinition::Interface(interface) => builder.register(build_interface(interface)),
            TypeDefinition::Union(union) => {
                let mut dynamic = Union::new(&union.name);
                for member in &union.members {
                    dynamic = dynamic.possible_type(member);
                }
                builder.register(with_description(dynamic, union.description, Union::description))
            }
            TypeDefinition::Enum(enum_type) => {
                let mut dynamic = Enum::new(&enum_type.name);
                for value in enum_type.values {
                    dynamic = dynamic.item(with_description(
                        EnumItem::new(value.name),
                        value.description,
                        EnumItem::description,
                    ));
                }
                builder.register(with_description(dynamic, enum_type.description, Enum::description))
            }
            TypeDefinition::InputObject(input) => {
                let mut dynamic = InputObject::new(&input.name);
                for field in input.fields {
                    dynamic = dynamic.field(build_input_value(field));
                }
                builder.register(with_description(dynamic, input.description, InputObject::description))
            }
        }
    }

    fn build_object(&self, object: ObjectTypeDefinition, abstract_types: &HashSet<&str>) -> Object {
        let mut dynamic = Object::new(&object.name);

        for interface in &object.implements {
            dynamic = dynamic.implement(interface);
        }

        for field in object.fields {
            let abstract_type = abstract_types.contains(field.ty.base_name());
            let resolver = self
                .wiring
                .field_resolver(&object.name, &field.name, abstract_type);
            dynamic = dynamic.field(build_field(field, move |ctx| (resolver)(ctx)));
        }

        with_description(dynamic, object.description, Object::description)
    }

    fn configure(&self, mut builder: SchemaBuilder) -> SchemaBuilder {
        builder = builder.extension(ValidationGate);
        if self.config.max_depth > 0 {
            builder = builder.limit_depth(self.config.max_depth);
        }
        if self.config.max_complexity > 0 {
            builder = builder.limit_complexity(self.config.max_complexity);
        }
        if !self.config.introspection_enabled {
            builder = builder.disable_introspection();
        }
        if self.config.tracing_enabled {
            builder = builder.extension(ApolloTracing);
        }
        builder
    }
}

struct Roots {
    query: String,
    mutation: Option<String>,
}

fn build_field<F>(field: FieldDefinition, resolver: F) -> Field
where
    F: for<'r> Fn(async_graphql::dynamic::ResolverContext<'r>) -> async_graphql::dynamic::FieldFuture<'r>
        + Send
        + Sync
        + 'static,
{
    let mut dynamic = Field::new(&field.name, to_dynamic_type(&field.ty), resolver);
    for argument in field.arguments {
        dynamic = dynamic.argument(build_input_value(argument));
    }
    with_description(dynamic, field.description, Field::description)
}

fn build_interface(interface: InterfaceTypeDefinition) -> Interface {
    let mut dynamic = Interface::new(&interface.name);

    for parent in &interface.implements {
        dynamic = dynamic.implement(parent);
    }

    for field in interface.fields {
        let mut dynamic_field = InterfaceField::new(&field.name, to_dynamic_type(&field.ty));
        for argument in field.arguments {
            dynamic_field = dynamic_field.argument(build_input_value(argument));
        }
        dynamic = dynamic.field(with_description(
            dynamic_field,
            field.description,
            InterfaceField::description,
        ));
    }

    with_description(dynamic, interface.description, Interface::description)
}

fn build_input_value(input: InputValueDefinition) -> InputValue {
    let mut dynamic = InputValue::new(&input.name, to_dynamic_type(&input.ty));
    if let Some(default) = input.default_value {
        dynamic = dynamic.default_value(default);
    }
    with_description(dynamic, input.description, InputValue::description)
}

fn with_description<T, S>(value: T, description: Option<String>, set: S) -> T
where
    S: FnOnce(T, String) -> T,
{
    match description {
        Some(description) => set(value, description),
        None => value,
    }
}

/// Converts an SDL type reference into its dynamic-schema counterpart.
pub fn to_dynamic_type(ty: &TypeRef) -> DynTypeRef {
    match ty {
        TypeRef::Named(name) => DynTypeRef::named(name.clone()),
        TypeRef::List(inner) => DynTypeRef::List(Box::new(to_dynamic_type(inner))),
        TypeRef::NonNull(inner) => DynTypeRef::NonNull(Box::new(to_dynamic_type(inner))),
    }
}

/// Folds `extensions` into a copy of `base`.
///
/// # Errors
///
/// Fails when an extension is of a different kind than its base type or
/// redeclares a field or value the type already has.
pub fn merge_extensions(
    base: &TypeDefinition,
    extensions: &[TypeDefinition],
) -> Result<TypeDefinition, SchemaError> {
    let mut merged = base.clone();

    for extension in extensions {
        match (&mut merged, extension) {
            (TypeDefinition::Object(target), TypeDefinition::Object(ext)) => {
                append_unique(&mut target.fields, &ext.fields, |f| &f.name, &target.name)?;
                extend_names(&mut target.implements, &ext.implements);
            }
            (TypeDefinition::Interface(target), TypeDefinition::Interface(ext)) => {
                append_unique(&mut target.fields, &ext.fields, |f| &f.name, &target.name)?;
                extend_names(&mut target.implements, &ext.implements);
            }
            (TypeDefinition::Union(target), TypeDefinition::Union(ext)) => {
                extend_names(&mut target.members, &ext.members);
            }
            (TypeDefinition::Enum(target), TypeDefinition::Enum(ext)) => {
                append_unique(&mut target.values, &ext.values, |v| &v.name, &target.name)?;
            }
            (TypeDefinition::InputObject(target), TypeDefinition::InputObject(ext)) => {
                append_unique(&mut target.fields, &ext.fields, |f| &f.name, &target.name)?;
            }
            (TypeDefinition::Scalar(_), TypeDefinition::Scalar(_)) => {}
            (target, ext) => {
                return Err(SchemaError::Executable(format!(
                    "cannot extend {} '{}' with an {} extension",
                    target.kind(),
                    target.name(),
                    ext.kind()
                )));
            }
        }
    }

    Ok(merged)
}

fn append_unique<T: Clone>(
    target: &mut Vec<T>,
    additions: &[T],
    name: impl Fn(&T) -> &String,
    type_name: &str,
) -> Result<(), SchemaError> {
    for addition in additions {
        if target.iter().any(|existing| name(existing) == name(addition)) {
            return Err(SchemaError::Executable(format!(
                "'{type_name}.{}' is declared more than once",
                name(addition)
            )));
        }
        target.push(addition.clone());
    }
    Ok(())
}

fn extend_names(target: &mut Vec<String>, additions: &[String]) {
    for addition in additions {
        if !target.contains(addition) {
            target.push(addition.clone());
        }
    }
}
