//! Directive-driven schema augmentation.
//!
//! Builds a [`TypeRegistry`] from a schema [`Document`], expanding every
//! `@connection` usage into its connection/edge/page-info definitions.

use tracing::{debug, info};

use super::ast::{Document, TypeDefinition};
use super::connection::ConnectionUsage;
use super::error::{AggregatedSchemaError, SchemaError};
use super::parse::parse_document;
use super::registry::{RegistryBuilder, TypeRegistry};

/// Builds the type registry for `document`.
///
/// 1. Every top-level definition is registered in source order; duplicate
///    names are recorded as conflicts and the first definition is kept.
/// 2. Every `@connection` usage on an object field is validated; a bad `for`
///    argument is recorded and the usage skipped.
/// 3. The definitions synthesized for each valid usage are added only when no
///    definition with the same name exists, so hand-written types always win
///    and repeated usages deduplicate silently.
///
/// The synthesized family is named after the declaring field's return type,
/// not after the node type: two usages that share a return type name but name
/// different `for` targets keep the first usage's `node` type.
///
/// # Errors
///
/// Returns every recorded error if at least one was found; no registry is
/// produced in that case.
pub fn build_registry(document: &Document) -> Result<TypeRegistry, AggregatedSchemaError> {
    let mut builder = RegistryBuilder::new();

    for definition in &document.definitions {
        builder.add(definition.clone());
    }

    let usages = connection_usages(document, &mut builder);

    let mut synthesized = 0usize;
    for usage in &usages {
        for definition in usage.synthesize() {
            if builder.add_if_absent(TypeDefinition::Object(definition)) {
                synthesized += 1;
            }
        }
    }

    debug!(
        usages = usages.len(),
        synthesized, "Expanded @connection directives"
    );

    let registry = builder.finish()?;
    info!(types = registry.len(), "Type registry built");
    Ok(registry)
}

/// Parses SDL text and builds its registry.
///
/// # Errors
///
/// A parse failure is reported as an aggregated error holding a single
/// [`SchemaError::Parse`].
pub fn parse_and_build(sdl: &str) -> Result<TypeRegistry, AggregatedSchemaError> {
    let document = parse_document(sdl)?;
    build_registry(&document)
}

/// Collects the valid `@connection` usages of every object field, recording
/// argument errors on `builder`.
fn connection_usages(document: &Document, builder: &mut RegistryBuilder) -> Vec<ConnectionUsage> {
    let mut usages = Vec::new();

    for object in document.object_types() {
        for field in &object.fields {
            for directive in &field.directives {
                match ConnectionUsage::from_directive(field, directive) {
                    Ok(Some(usage)) => usages.push(usage),
                    Ok(None) => {}
                    Err(message) => builder.record(SchemaError::DirectiveArgument {
                        type_name: object.name.clone(),
                        field: field.name.clone(),
                        message,
                    }),
                }
            }
        }
    }

    usages
}
