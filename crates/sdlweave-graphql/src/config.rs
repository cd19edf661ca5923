//! GraphQL configuration.
//!
//! Configuration is read from the `[graphql]` section of `sdlweave.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! schema_location_pattern = "schema/**/*.graphqls"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//!
//! [graphql.cache]
//! max_size = 1000
//!
//! [graphql.scalars]
//! date_format = "[year]-[month]-[day]"
//!
//! [graphql.projection]
//! directory = "queries"
//!
//! [graphql.projection.queries]
//! itemById = "query($id: Int!) { item(id: $id) { id name } }"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaBuilderConfig;
use crate::types::TemporalFormats;

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Serve the GraphQL endpoints.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Glob locating the schema file, relative to the working directory.
    /// Default: `**/*.graphqls`
    #[serde(default = "default_schema_location_pattern")]
    pub schema_location_pattern: String,

    /// Maximum query depth allowed; 0 disables the check.
    /// Default: 0
    #[serde(default)]
    pub max_depth: usize,

    /// Maximum query complexity allowed; 0 disables the check.
    /// Default: 0
    #[serde(default)]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Attach Apollo tracing data to the `extensions` of every response.
    /// Default: false
    #[serde(default)]
    pub tracing_enabled: bool,

    #[serde(default)]
    pub cache: QueryCacheConfig,

    #[serde(default)]
    pub scalars: ScalarConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_schema_location_pattern() -> String {
    "**/*.graphqls".to_string()
}

fn default_introspection() -> bool {
    true
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            schema_location_pattern: default_schema_location_pattern(),
            max_depth: 0,
            max_complexity: 0,
            introspection: default_introspection(),
            tracing_enabled: false,
            cache: QueryCacheConfig::default(),
            scalars: ScalarConfig::default(),
            projection: ProjectionConfig::default(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_location_pattern.trim().is_empty() {
            return Err("graphql.schema_location_pattern must not be empty".into());
        }
        if let Err(e) = glob::Pattern::new(&self.schema_location_pattern) {
            return Err(format!("graphql.schema_location_pattern is invalid: {e}"));
        }
        self.cache.validate()?;
        self.scalars.validate()?;
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            tracing_enabled: self.tracing_enabled,
        }
    }
}

/// Preparsed-query cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCacheConfig {
    /// Maximum number of cached documents.
    /// Default: 1000
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Bound the cache at `max_size` entries. An unbounded cache keeps every
    /// document it ever compiled.
    /// Default: true
    #[serde(default = "default_bounded")]
    pub bounded: bool,
}

fn default_max_size() -> u64 {
    1000
}

fn default_bounded() -> bool {
    true
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            bounded: default_bounded(),
        }
    }
}

impl QueryCacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bounded && self.max_size == 0 {
            return Err("graphql.cache.max_size must be > 0 when the cache is bounded".into());
        }
        Ok(())
    }
}

/// Patterns of the temporal scalars, as `time` format descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarConfig {
    /// Pattern of `LocalDate`.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Pattern of `OffsetDateTime` and `Date`.
    #[serde(default = "default_date_time_format")]
    pub date_time_format: String,

    /// Pattern of `OffsetTime`.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_date_format() -> String {
    "[year]-[month]-[day]".to_string()
}

fn default_date_time_format() -> String {
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory][offset_minute]"
        .to_string()
}

fn default_time_format() -> String {
    "[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory][offset_minute]"
        .to_string()
}

impl Default for ScalarConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            date_time_format: default_date_time_format(),
            time_format: default_time_format(),
        }
    }
}

impl ScalarConfig {
    pub fn validate(&self) -> Result<(), String> {
        TemporalFormats::from_config(self)
            .map(|_| ())
            .map_err(|e| format!("graphql.scalars: {e}"))
    }
}

/// Named queries served by the projection endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Logical name to query text.
    #[serde(default)]
    pub queries: HashMap<String, String>,

    /// Directory of `*.graphql` files; the file stem is the logical name.
    /// Inline `queries` win over files with the same name.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert!(config.enabled);
        assert_eq!(config.schema_location_pattern, "**/*.graphqls");
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.max_complexity, 0);
        assert!(config.introspection);
        assert!(!config.tracing_enabled);
        assert_eq!(config.cache.max_size, 1000);
        assert!(config.cache.bounded);
        assert!(config.projection.queries.is_empty());
    }

    #[test]
    fn test_valid_config() {
        let config = GraphQLConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_cache_size() {
        let mut config = GraphQLConfig::default();
        config.cache.max_size = 0;
        assert!(config.validate().is_err());

        config.cache.bounded = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_schema_pattern() {
        let mut config = GraphQLConfig::default();
        config.schema_location_pattern = "schema/[".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_scalar_pattern() {
        let mut config = GraphQLConfig::default();
        config.scalars.time_format = "[hour".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("time_format"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            max_depth = 20
            max_complexity = 1000
            introspection = false
            tracing_enabled = true

            [cache]
            max_size = 50

            [projection.queries]
            itemById = "query($id: Int!) { item(id: $id) { id } }"
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 1000);
        assert!(!config.introspection);
        assert!(config.tracing_enabled);
        assert_eq!(config.cache.max_size, 50);
        assert!(config.cache.bounded);
        assert!(config.projection.queries.contains_key("itemById"));

        let builder = config.to_schema_builder_config();
        assert_eq!(builder.max_depth, 20);
        assert!(builder.tracing_enabled);
    }
}
