//! Error types for the GraphQL HTTP layer.
//!
//! Errors raised before a query reaches the executor (a malformed request,
//! a schema that failed to load) are reported with an HTTP status and an
//! error code in the GraphQL error extensions. Errors produced while
//! executing a query travel in the response body instead.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::schema::{AggregatedSchemaError, SchemaError};

/// Errors that can occur at the GraphQL HTTP boundary.
#[derive(Debug)]
pub enum GraphQLError {
    /// Schema build failed.
    SchemaBuildFailed(String),

    /// The HTTP request does not carry a usable GraphQL request.
    InvalidRequest(String),

    /// Variables were not a JSON object.
    InvalidVariables(String),

    /// Internal server error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidRequest(msg) => {
                write!(f, "Invalid GraphQL request: {msg}")
            }
            Self::InvalidVariables(msg) => {
                write!(f, "Invalid variables: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaBuildFailed(_) => 500,
            Self::InvalidRequest(_) | Self::InvalidVariables(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidVariables(_) => "INVALID_VARIABLES",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Renders the error as a GraphQL response body without data.
    #[must_use]
    pub fn to_response_body(&self) -> serde_json::Value {
        serde_json::json!({
            "data": null,
            "errors": [{
                "message": self.to_string(),
                "extensions": { "code": self.error_code() }
            }]
        })
    }
}

impl IntoResponse for GraphQLError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response_body())).into_response()
    }
}

impl From<AggregatedSchemaError> for GraphQLError {
    fn from(err: AggregatedSchemaError) -> Self {
        Self::SchemaBuildFailed(err.to_string())
    }
}

impl From<SchemaError> for GraphQLError {
    fn from(err: SchemaError) -> Self {
        Self::SchemaBuildFailed(err.to_string())
    }
}
