//! Per-request context.
//!
//! The context travels two ways: the query cache reads the projection flag
//! from it, and it is attached to the GraphQL request as data so resolvers
//! can reach the HTTP headers (e.g. for authentication).
//!
//! # Example
//!
//! ```ignore
//! use sdlweave_graphql::RequestContextBuilder;
//!
//! let context = RequestContextBuilder::new()
//!     .projection(true)
//!     .with_request_id("req-123")
//!     .with_headers(headers)
//!     .build()?;
//! ```

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Request-scoped state visible to the cache and to resolvers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Whether the cache key is a logical query name rather than query text.
    pub projection: bool,

    /// Request ID for tracing and correlation.
    pub request_id: String,

    /// Headers of the HTTP request.
    pub headers: HeaderMap,

    /// Source IP address of the request.
    pub source_ip: Option<IpAddr>,
}

impl RequestContext {
    #[must_use]
    pub fn is_projection(&self) -> bool {
        self.projection
    }

    /// Returns a header value if it is present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Creates a new builder for RequestContext.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }
}

/// Builder for constructing RequestContext.
#[derive(Default)]
pub struct RequestContextBuilder {
    projection: bool,
    request_id: Option<String>,
    headers: HeaderMap,
    source_ip: Option<IpAddr>,
}

impl RequestContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as a projection (named query) request.
    #[must_use]
    pub fn projection(mut self, projection: bool) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the source IP address.
    #[must_use]
    pub fn with_source_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.source_ip = ip;
        self
    }

    /// Builds the RequestContext.
    ///
    /// # Errors
    ///
    /// Returns an error if the request ID is missing.
    pub fn build(self) -> Result<RequestContext, ContextBuilderError> {
        let request_id = self
            .request_id
            .ok_or(ContextBuilderError::MissingField("request_id"))?;

        Ok(RequestContext {
            projection: self.projection,
            request_id,
            headers: self.headers,
            source_ip: self.source_ip,
        })
    }
}

/// Errors that can occur when building a RequestContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
