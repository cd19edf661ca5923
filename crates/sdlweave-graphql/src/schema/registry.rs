//! Type registry and its builder.
//!
//! The registry is an index of every named definition that makes up one
//! schema. Names are unique: the builder keeps the first definition it sees
//! for a name and records a conflict for any later hand-written one.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use super::ast::{
    Definition, DirectiveDefinition, ObjectTypeDefinition, SchemaDefinition, TypeDefinition,
};
use super::error::{AggregatedSchemaError, SchemaError};

/// Finished, read-only index of named schema definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDefinition>,
    directives: IndexMap<String, DirectiveDefinition>,
    schema: Option<SchemaDefinition>,
    extensions: IndexMap<String, Vec<TypeDefinition>>,
}

impl TypeRegistry {
    /// Looks up a type definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Looks up an object type definition by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectTypeDefinition> {
        self.get(name).and_then(TypeDefinition::as_object)
    }

    /// All type definitions; hand-written ones in source order, synthesized ones after.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directives.values()
    }

    #[must_use]
    pub fn schema_definition(&self) -> Option<&SchemaDefinition> {
        self.schema.as_ref()
    }

    /// Extensions declared for `name`, in source order.
    #[must_use]
    pub fn extensions_of(&self, name: &str) -> &[TypeDefinition] {
        self.extensions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of every type that has at least one extension.
    pub fn extended_types(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    /// Number of type definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Accumulates definitions and errors for one registry build.
///
/// Errors never stop the build: every definition is looked at and
/// [`finish`](Self::finish) reports the whole list at once.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: TypeRegistry,
    errors: Vec<SchemaError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hand-written definition.
    ///
    /// A name collision records a [`SchemaError::SchemaConflict`] and keeps the
    /// definition registered first.
    pub fn add(&mut self, definition: Definition) {
        match definition {
            Definition::Type(ty) => {
                let kind = ty.kind();
                match self.registry.types.entry(ty.name().to_string()) {
                    Entry::Occupied(entry) => {
                        let name = entry.key().clone();
                        self.record(SchemaError::SchemaConflict { name, kind });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(ty);
                    }
                }
            }
            Definition::TypeExtension(ty) => {
                self.registry
                    .extensions
                    .entry(ty.name().to_string())
                    .or_default()
                    .push(ty);
            }
            Definition::Directive(directive) => {
                match self.registry.directives.entry(directive.name.clone()) {
                    Entry::Occupied(entry) => {
                        let name = entry.key().clone();
                        self.record(SchemaError::SchemaConflict {
                            name,
                            kind: "directive",
                        });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(directive);
                    }
                }
            }
            Definition::Schema(schema) => {
                if self.registry.schema.is_some() {
                    self.record(SchemaError::SchemaConflict {
                        name: "schema".into(),
                        kind: "schema definition",
                    });
                } else {
                    self.registry.schema = Some(schema);
                }
            }
            Definition::SchemaExtension(extension) => self.extend_schema(extension),
        }
    }

    /// Registers a type only if no definition with the same name exists yet.
    ///
    /// Returns `true` if the definition was inserted. An existing definition is
    /// never replaced and no error is recorded.
    pub fn add_if_absent(&mut self, definition: TypeDefinition) -> bool {
        match self.registry.types.entry(definition.name().to_string()) {
            Entry::Occupied(entry) => {
                debug!(type_name = %entry.key(), "Keeping existing definition, synthesized one discarded");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(definition);
                true
            }
        }
    }

    /// Records an error without touching the registry.
    pub fn record(&mut self, error: SchemaError) {
        self.errors.push(error);
    }

    /// Returns `true` if a type with `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Finishes the build.
    ///
    /// # Errors
    ///
    /// Returns every recorded error if there was at least one.
    pub fn finish(self) -> Result<TypeRegistry, AggregatedSchemaError> {
        if self.errors.is_empty() {
            Ok(self.registry)
        } else {
            Err(AggregatedSchemaError::new(self.errors))
        }
    }

    fn extend_schema(&mut self, extension: SchemaDefinition) {
        let schema = self.registry.schema.get_or_insert_with(SchemaDefinition::default);
        let mut conflicts = Vec::new();

        for (slot, value, root) in [
            (&mut schema.query, extension.query, "query"),
            (&mut schema.mutation, extension.mutation, "mutation"),
            (&mut schema.subscription, extension.subscription, "subscription"),
        ] {
            if let Some(value) = value {
                if slot.is_some() {
                    conflicts.push(root);
                } else {
                    *slot = Some(value);
                }
            }
        }

        for root in conflicts {
            self.record(SchemaError::SchemaConflict {
                name: root.into(),
                kind: "schema root operation",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ast::{FieldDefinition, TypeRef};

    fn object(name: &str, field: &str) -> TypeDefinition {
        ObjectTypeDefinition::new(name)
            .field(FieldDefinition::new(field, TypeRef::named("String")))
            .into()
    }

    #[test]
    fn test_duplicate_type_keeps_first() {
        let mut builder = RegistryBuilder::new();
        builder.add(Definition::Type(object("Item", "first")));
        builder.add(Definition::Type(object("Item", "second")));

        let err = builder.finish().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert!(matches!(
            &err.errors()[0],
            SchemaError::SchemaConflict { name, .. } if name == "Item"
        ));
    }

    #[test]
    fn test_add_if_absent_never_overwrites() {
        let mut builder = RegistryBuilder::new();
        builder.add(Definition::Type(object("PageInfo", "handWritten")));

        assert!(!builder.add_if_absent(object("PageInfo", "synthesized")));
        assert!(builder.add_if_absent(object("ItemEdge", "cursor")));

        let registry = builder.finish().unwrap();
        let page_info = registry.object("PageInfo").unwrap();
        assert_eq!(page_info.fields[0].name, "handWritten");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_second_schema_definition_conflicts() {
        let mut builder = RegistryBuilder::new();
        builder.add(Definition::Schema(SchemaDefinition {
            query: Some("Query".into()),
            ..Default::default()
        }));
        builder.add(Definition::Schema(SchemaDefinition::default()));

        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_schema_extension_fills_missing_roots() {
        let mut builder = RegistryBuilder::new();
        builder.add(Definition::Schema(SchemaDefinition {
            query: Some("Query".into()),
            ..Default::default()
        }));
        builder.add(Definition::SchemaExtension(SchemaDefinition {
            mutation: Some("Mutation".into()),
            ..Default::default()
        }));

        let registry = builder.finish().unwrap();
        let schema = registry.schema_definition().unwrap();
        assert_eq!(schema.query.as_deref(), Some("Query"));
        assert_eq!(schema.mutation.as_deref(), Some("Mutation"));
    }

    #[test]
    fn test_extensions_are_kept_apart() {
        let mut builder = RegistryBuilder::new();
        builder.add(Definition::Type(object("Query", "a")));
        builder.add(Definition::TypeExtension(object("Query", "b")));

        let registry = builder.finish().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.extensions_of("Query").len(), 1);
        assert!(registry.extensions_of("Item").is_empty());
    }
}
