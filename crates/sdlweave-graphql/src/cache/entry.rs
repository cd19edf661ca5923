//! Cache lookup results.

use std::fmt;
use std::sync::Arc;

use async_graphql::{ErrorExtensionValues, ServerError};

/// Extension key carrying the error classification.
pub const CLASSIFICATION_EXTENSION: &str = "classification";

/// Why a cache lookup produced no document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClassification {
    /// The query text failed to parse or validate.
    Validation,
    /// A projection name did not resolve to any query.
    NotFound,
}

impl ErrorClassification {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient, never cached, lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    pub classification: ErrorClassification,
}

impl QueryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            classification: ErrorClassification::Validation,
        }
    }

    /// The error for a projection name with no registered query.
    pub fn unknown_query_name(name: &str) -> Self {
        Self {
            message: format!("unknown query name: {name}"),
            classification: ErrorClassification::NotFound,
        }
    }

    /// Renders the error as a single GraphQL error without locations.
    #[must_use]
    pub fn to_graphql_error(&self) -> ServerError {
        let mut extensions = ErrorExtensionValues::default();
        extensions.set(CLASSIFICATION_EXTENSION, self.classification.as_str().to_string());

        let mut error = ServerError::new(self.message.clone(), None);
        error.extensions = Some(extensions);
        error
    }
}

/// Outcome of [`get_document`](super::PreparsedQueryCache::get_document).
#[derive(Debug)]
pub enum CacheEntry<D> {
    /// The stored (authoritative) document.
    Document(Arc<D>),
    /// A per-call failure.
    Error(QueryError),
}

impl<D> CacheEntry<D> {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn document(&self) -> Option<&Arc<D>> {
        match self {
            Self::Document(document) => Some(document),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Self::Document(_) => None,
            Self::Error(error) => Some(error),
        }
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<Arc<D>, QueryError> {
        match self {
            Self::Document(document) => Ok(document),
            Self::Error(error) => Err(error),
        }
    }
}

impl<D> Clone for CacheEntry<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Document(document) => Self::Document(Arc::clone(document)),
            Self::Error(error) => Self::Error(error.clone()),
        }
    }
}
