//! Axum HTTP handlers for GraphQL endpoints.
//!
//! - `POST /graphql` - Query in a JSON body
//! - `GET /graphql` - Query via URL params
//! - `GET /graphql/projection/{name}` - Named query; URL params become variables
//!
//! Every query goes through the preparsed-query cache before execution.
//! Responses carrying errors are sent with status 500.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response as GqlResponse, ServerError, Variables};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheEntry, PreparsedDocument, QueryCache};
use crate::context::{RequestContext, RequestContextBuilder};
use crate::error::GraphQLError;

/// Header carrying the caller's request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    /// The executable schema.
    pub schema: Schema,

    /// Compiled documents by query text or projection name.
    pub cache: QueryCache,
}

impl GraphQLState {
    pub fn new(schema: Schema, cache: QueryCache) -> Self {
        Self { schema, cache }
    }
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName", alias = "operation")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// Query parameters for GET requests.
#[derive(Debug, Deserialize)]
pub struct GraphQLQueryParams {
    /// The GraphQL query string.
    pub query: Option<String>,

    /// Optional operation name.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables (JSON string).
    pub variables: Option<String>,
}

/// GraphQL response body.
#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    pub data: serde_json::Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQLResponse {
    /// A response with no data and the given errors.
    pub fn from_errors(errors: &[ServerError]) -> Self {
        Self {
            data: serde_json::Value::Null,
            errors: errors.iter().map(error_to_json).collect(),
            extensions: None,
        }
    }

    /// HTTP status for this body: 200 without errors, 500 with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<GqlResponse> for GraphQLResponse {
    fn from(resp: GqlResponse) -> Self {
        let data = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);

        Self {
            data,
            errors: resp.errors.iter().map(error_to_json).collect(),
            extensions: if resp.extensions.is_empty() {
                None
            } else {
                Some(serde_json::to_value(&resp.extensions).unwrap_or(serde_json::Value::Null))
            },
        }
    }
}

impl IntoResponse for GraphQLResponse {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "application/json")],
            Json(self),
        )
            .into_response()
    }
}

fn error_to_json(error: &ServerError) -> serde_json::Value {
    serde_json::to_value(error).unwrap_or_else(|_| serde_json::json!({ "message": error.message }))
}

/// Routes for the GraphQL endpoints.
pub fn graphql_routes(state: GraphQLState) -> Router {
    Router::new()
        .route("/graphql", get(graphql_handler_get).post(graphql_handler))
        .route("/graphql/projection/{name}", get(projection_handler))
        .with_state(state)
}

/// Handles POST requests to /graphql.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Json(request): Json<GraphQLRequest>,
) -> Response {
    let variables = match request.variables {
        Some(vars) => match parse_variables(vars) {
            Ok(variables) => variables,
            Err(e) => return e.into_response(),
        },
        None => Variables::default(),
    };

    let context = match build_context(&headers, false) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    execute_open(&state, context, &request.query, request.operation_name, variables).await
}

/// Handles GET requests to /graphql.
pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Query(params): Query<GraphQLQueryParams>,
) -> Response {
    let request = match params_to_request(params) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    let variables = match request.variables {
        Some(vars) => match parse_variables(vars) {
            Ok(variables) => variables,
            Err(e) => return e.into_response(),
        },
        None => Variables::default(),
    };

    let context = match build_context(&headers, false) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    execute_open(&state, context, &request.query, request.operation_name, variables).await
}

/// Handles GET requests to /graphql/projection/{name}.
///
/// `name` is resolved to a registered query; every URL query parameter
/// becomes a variable, coerced to the type the query declares for it.
pub async fn projection_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let context = match build_context(&headers, true) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    debug!(request_id = %context.request_id, name = %name, "Processing projection request");

    let document = match compile(&state, &name, &context).await {
        Ok(document) => document,
        Err(response) => return response.into_response(),
    };

    let variables = document.coerce_parameters(None, &params);
    execute(&state, context, &document, None, variables)
        .await
        .into_response()
}

async fn execute_open(
    state: &GraphQLState,
    context: RequestContext,
    query: &str,
    operation_name: Option<String>,
    variables: Variables,
) -> Response {
    debug!(request_id = %context.request_id, "Processing GraphQL request");

    let document = match compile(state, query, &context).await {
        Ok(document) => document,
        Err(response) => return response.into_response(),
    };

    execute(state, context, &document, operation_name, variables)
        .await
        .into_response()
}

/// Looks `key` up in the query cache, compiling against the schema on a
/// miss; errors are rendered as a response.
async fn compile(
    state: &GraphQLState,
    key: &str,
    context: &RequestContext,
) -> Result<Arc<PreparsedDocument>, GraphQLResponse> {
    let schema = &state.schema;
    let entry = state
        .cache
        .get_document_async(key, context, |text| PreparsedDocument::compile(schema, text))
        .await;
    match entry {
        CacheEntry::Document(document) => Ok(document),
        CacheEntry::Error(error) => Err(GraphQLResponse::from_errors(&[error.to_graphql_error()])),
    }
}

/// Executes a compiled document.
async fn execute(
    state: &GraphQLState,
    context: RequestContext,
    document: &PreparsedDocument,
    operation_name: Option<String>,
    variables: Variables,
) -> GraphQLResponse {
    let request_id = context.request_id.clone();

    let mut request = Request::new(document.query.clone())
        .variables(variables)
        .data(context);
    if let Some(op_name) = operation_name {
        request = request.operation_name(op_name);
    }
    request.set_parsed_query(document.document.clone());

    let response = state.schema.execute(request).await;
    debug!(
        request_id = %request_id,
        errors = response.errors.len(),
        "GraphQL request executed"
    );

    GraphQLResponse::from(response)
}

/// Builds the request context from the HTTP headers.
fn build_context(headers: &HeaderMap, projection: bool) -> Result<RequestContext, GraphQLError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    RequestContextBuilder::new()
        .projection(projection)
        .with_request_id(request_id)
        .with_headers(headers.clone())
        .build()
        .map_err(|e| GraphQLError::Internal(e.to_string()))
}

fn parse_variables(vars: serde_json::Value) -> Result<Variables, GraphQLError> {
    match vars {
        serde_json::Value::Null => Ok(Variables::default()),
        serde_json::Value::Object(_) => Ok(Variables::from_json(vars)),
        other => Err(GraphQLError::InvalidVariables(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Converts GET query params to a GraphQL request.
fn params_to_request(params: GraphQLQueryParams) -> Result<GraphQLRequest, GraphQLError> {
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return Err(GraphQLError::InvalidRequest("missing 'query' parameter".into()));
    };

    let variables = match params.variables {
        Some(vars_str) => Some(
            serde_json::from_str(&vars_str)
                .map_err(|e| GraphQLError::InvalidVariables(e.to_string()))?,
        ),
        None => None,
    };

    Ok(GraphQLRequest {
        query,
        operation_name: params.operation_name,
        variables,
    })
}
