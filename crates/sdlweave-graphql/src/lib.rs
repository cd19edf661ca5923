//! # sdlweave-graphql
//!
//! Schema-first GraphQL layer: SDL files in, an executable schema and HTTP
//! handlers out.
//!
//! It provides:
//!
//! - SDL loading from a glob pattern
//! - `@connection` augmentation, which synthesizes Relay-style connection
//!   and edge types plus a shared `PageInfo`
//! - Type extension merging and resolver wiring onto a dynamic schema
//! - Extended scalars (`LocalDate`, `OffsetDateTime`, `Long`, ...)
//! - A list-backed connection resolver with opaque cursors
//! - A preparsed-query cache keyed by query text or projection name
//!
//! ## Endpoints
//!
//! - `POST /graphql` - Query in a JSON body
//! - `GET /graphql` - Query via URL params
//! - `GET /graphql/projection/{name}` - Registered query by name
//!
//! ## Configuration
//!
//! Add to `sdlweave.toml`:
//!
//! ```toml
//! [graphql]
//! enabled = true
//! schema_location_pattern = "**/*.graphqls"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`schema`] - Parsing, augmentation and executable schema building
//! - [`types`] - Extended scalar types
//! - [`resolvers`] - Connection resolver and helpers
//! - [`cache`] - Preparsed-query cache
//! - [`projection`] - Named queries
//! - [`context`] - Per-request context
//! - [`handler`] - Axum HTTP handlers
//! - [`error`] - Error types for the HTTP layer

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod projection;
pub mod resolvers;
pub mod schema;
pub mod types;

// Re-export main types
pub use cache::{
    CacheEntry, PreparsedDocument, PreparsedQueryCache, QueryCache, QueryError, ValidationGate,
};
pub use config::GraphQLConfig;
pub use context::{RequestContext, RequestContextBuilder};
pub use error::GraphQLError;
pub use handler::{GraphQLState, graphql_handler, graphql_handler_get, graphql_routes, projection_handler};
pub use projection::{ProjectionQueries, QueryNameResolver};
pub use resolvers::ListConnection;
pub use schema::{
    ExecutableSchemaBuilder, FilePatternSource, RuntimeWiring, SchemaBuilderConfig, SchemaSource,
    TypeRegistry, parse_and_build,
};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
