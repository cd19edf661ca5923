//! Schema load errors.
//!
//! Errors found while building the type registry are accumulated and
//! reported together as an [`AggregatedSchemaError`]; a registry is never
//! handed out if any error was collected.

use std::fmt;

/// A single structural problem found while loading the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The SDL text could not be parsed.
    #[error("schema parse error: {0}")]
    Parse(String),

    /// Two hand-written definitions share a name.
    #[error("{kind} '{name}' tried to redefine an existing definition")]
    SchemaConflict {
        /// The conflicting name.
        name: String,
        /// What kind of definition was rejected.
        kind: &'static str,
    },

    /// A `@connection` usage with a missing or mistyped `for` argument.
    #[error("invalid @connection on {type_name}.{field}: {message}")]
    DirectiveArgument {
        /// Type declaring the field.
        type_name: String,
        /// Field carrying the directive.
        field: String,
        /// What is wrong with the argument.
        message: String,
    },

    /// The finished registry could not be turned into an executable schema.
    #[error("executable schema error: {0}")]
    Executable(String),

    /// The schema source could not be read.
    #[error("schema source error: {0}")]
    Source(String),
}

/// Every error collected during one registry build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSchemaError {
    errors: Vec<SchemaError>,
}

impl AggregatedSchemaError {
    pub fn new(errors: Vec<SchemaError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<SchemaError> {
        self.errors
    }

    /// Returns `true` if any collected error is a `@connection` argument error.
    #[must_use]
    pub fn has_directive_argument_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, SchemaError::DirectiveArgument { .. }))
    }
}

impl fmt::Display for AggregatedSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema has {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedSchemaError {}

impl From<SchemaError> for AggregatedSchemaError {
    fn from(error: SchemaError) -> Self {
        Self::new(vec![error])
    }
}
