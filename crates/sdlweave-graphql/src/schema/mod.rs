//! GraphQL schema loading and augmentation.
//!
//! ## Components
//!
//! - [`parse_document`] - SDL text to schema AST
//! - [`build_registry`] - Registers definitions and expands `@connection`
//! - [`ExecutableSchemaBuilder`] - Registry + wiring to an executable schema
//! - [`SchemaSource`] - Where the SDL text comes from
//!
//! ## Pipeline
//!
//! 1. A [`SchemaSource`] supplies the SDL text
//! 2. The text is parsed into a [`Document`]
//! 3. [`build_registry`] registers every definition, synthesizing connection
//!    types; all errors are reported together
//! 4. [`ExecutableSchemaBuilder`] merges extensions and attaches resolvers

pub mod ast;
mod augment;
mod connection;
mod error;
mod executable;
mod parse;
mod registry;
mod source;
mod wiring;

pub use ast::{Definition, Document, TypeDefinition, TypeRef};
pub use augment::{build_registry, parse_and_build};
pub use connection::{
    CONNECTION_DIRECTIVE, CONNECTION_DIRECTIVE_SDL, ConnectionUsage, EDGE_SUFFIX, FOR_ARGUMENT,
    PAGE_INFO, page_info_definition,
};
pub use error::{AggregatedSchemaError, SchemaError};
pub use executable::{ExecutableSchemaBuilder, SchemaBuilderConfig, merge_extensions, to_dynamic_type};
pub use parse::parse_document;
pub use registry::{RegistryBuilder, TypeRegistry};
pub use source::{FilePatternSource, SchemaSource, StaticSource};
pub use wiring::{ResolverFn, RootValue, RuntimeWiring, TYPENAME_KEY, property_resolver, to_field_value};
