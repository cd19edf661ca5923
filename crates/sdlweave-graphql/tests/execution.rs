//! End-to-end execution tests.
//!
//! SDL is loaded through the augmentation pipeline, wired, built into an
//! executable schema and queried through the preparsed-query cache, the same
//! way the HTTP handlers do it.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, Schema};
use async_graphql::{Request, Variables};
use sdlweave_graphql::cache::{PreparsedDocument, QueryCache};
use sdlweave_graphql::projection::NoProjection;
use sdlweave_graphql::resolvers::{ListConnection, json_to_graphql_value, request_context};
use sdlweave_graphql::schema::{ExecutableSchemaBuilder, RuntimeWiring, SchemaBuilderConfig, parse_and_build};
use sdlweave_graphql::types::TemporalFormats;
use sdlweave_graphql::{RequestContext, RequestContextBuilder};
use serde_json::json;

// =============================================================================
// Fixture
// =============================================================================

const SDL: &str = r#"
    scalar LocalDate
    scalar Long

    interface Node { id: ID! }

    type Item implements Node {
        id: ID!
        name: String
        released: LocalDate
    }

    type Other {
        code: String
    }

    union SearchResult = Item | Other

    type Query {
        greeting: String
        items(first: Int, after: String, last: Int, before: String): ItemConnection @connection(for: "Item")
        node: Node
        search: [SearchResult]
        nextDay(on: LocalDate!): LocalDate
        caller: String
        total(delta: Long): Long
    }
"#;

fn items() -> Vec<serde_json::Value> {
    (1..=5)
        .map(|i| json!({ "id": i.to_string(), "name": format!("item-{i}") }))
        .collect()
}

fn wiring() -> RuntimeWiring {
    let connection = ListConnection::from_json(items());

    RuntimeWiring::new()
        .resolver("Query", "items", move |ctx| {
            let connection = connection.clone();
            FieldFuture::new(async move {
                let value = connection.resolve(&ctx)?;
                Ok(Some(FieldValue::value(value)))
            })
        })
        .resolver("Query", "nextDay", |ctx| {
            FieldFuture::new(async move {
                let formats = ctx.data::<Arc<TemporalFormats>>()?;
                let on = ctx.args.try_get("on")?;
                let date = formats.parse_date(on.string()?)?;
                let next = date.next_day().ok_or("no next day")?;
                Ok(Some(FieldValue::value(formats.format_date(next)?)))
            })
        })
        .resolver("Query", "caller", |ctx| {
            FieldFuture::new(async move {
                let request = request_context(&ctx)?;
                Ok(request
                    .header("x-caller")
                    .map(|caller| FieldValue::value(caller.to_string())))
            })
        })
        .resolver("Query", "total", |ctx| {
            FieldFuture::new(async move {
                let delta = match ctx.args.get("delta") {
                    Some(value) => value.string()?.parse::<i64>()?,
                    None => 0,
                };
                Ok(Some(FieldValue::value((10_000_000_000i64 + delta).to_string())))
            })
        })
        .with_root_value(json_to_graphql_value(json!({
            "greeting": "hello",
            "node": { "__typename": "Item", "id": "7", "name": "seven", "released": "2024-02-28" },
            "search": [
                { "__typename": "Item", "id": "1", "name": "item-1" },
                { "__typename": "Other", "code": "x" },
            ],
        })))
}

fn schema() -> Schema {
    let registry = parse_and_build(SDL).unwrap();
    ExecutableSchemaBuilder::new(&registry, wiring(), SchemaBuilderConfig::default())
        .build()
        .unwrap()
}

fn context() -> RequestContext {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert("x-caller", "tester".parse().unwrap());
    RequestContextBuilder::new()
        .with_request_id("exec-test")
        .with_headers(headers)
        .build()
        .unwrap()
}

async fn run(schema: &Schema, cache: &QueryCache, query: &str, variables: serde_json::Value) -> serde_json::Value {
    let context = context();
    let document = cache
        .get_document(query, &context, PreparsedDocument::parse)
        .into_result()
        .unwrap();

    let mut request = Request::new(document.query.clone())
        .variables(Variables::from_json(variables))
        .data(context);
    request.set_parsed_query(document.document.clone());

    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

fn cache() -> QueryCache {
    QueryCache::bounded(10, Arc::new(NoProjection))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_root_fields_read_root_value() {
    let data = run(&schema(), &cache(), "{ greeting }", json!({})).await;
    assert_eq!(data, json!({ "greeting": "hello" }));
}

#[tokio::test]
async fn test_connection_pages() {
    let schema = schema();
    let cache = cache();
    let query = r#"
        query($first: Int, $after: String) {
            items(first: $first, after: $after) {
                edges { cursor node { id name } }
                pageInfo { hasPreviousPage hasNextPage startCursor endCursor }
            }
        }
    "#;

    let first = run(&schema, &cache, query, json!({ "first": 2 })).await;
    let page = &first["items"];
    assert_eq!(page["edges"].as_array().unwrap().len(), 2);
    assert_eq!(page["edges"][0]["node"]["name"], "item-1");
    assert_eq!(page["pageInfo"]["hasNextPage"], true);
    assert_eq!(page["pageInfo"]["hasPreviousPage"], false);

    let end = page["pageInfo"]["endCursor"].as_str().unwrap().to_string();
    let second = run(&schema, &cache, query, json!({ "first": 10, "after": end })).await;
    let page = &second["items"];
    let ids: Vec<&str> = page["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["node"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["3", "4", "5"]);
    assert_eq!(page["pageInfo"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_invalid_cursor_is_a_field_error() {
    let schema = schema();
    let cache = cache();
    let query = r#"{ items(after: "bogus") { edges { cursor } } }"#;

    let context = context();
    let document = cache
        .get_document(query, &context, PreparsedDocument::parse)
        .into_result()
        .unwrap();
    let mut request = Request::new(document.query.clone()).data(context);
    request.set_parsed_query(document.document.clone());

    let response = schema.execute(request).await;
    assert_eq!(response.errors.len(), 1);
}

#[tokio::test]
async fn test_abstract_types_resolve_by_typename() {
    let data = run(
        &schema(),
        &cache(),
        r#"{
            node { id ... on Item { name } }
            search { __typename ... on Item { id } ... on Other { code } }
        }"#,
        json!({}),
    )
    .await;

    assert_eq!(data["node"], json!({ "id": "7", "name": "seven" }));
    assert_eq!(
        data["search"],
        json!([
            { "__typename": "Item", "id": "1" },
            { "__typename": "Other", "code": "x" },
        ])
    );
}

#[tokio::test]
async fn test_temporal_scalar_round_trip() {
    let data = run(
        &schema(),
        &cache(),
        "query($on: LocalDate!) { nextDay(on: $on) node { ... on Item { released } } }",
        json!({ "on": "2024-02-28" }),
    )
    .await;

    assert_eq!(data["nextDay"], "2024-02-29");
    assert_eq!(data["node"]["released"], "2024-02-28");
}

#[tokio::test]
async fn test_invalid_scalar_input_is_rejected() {
    let schema = schema();
    let response = schema
        .execute(Request::new(r#"{ nextDay(on: "28/02/2024") }"#).data(context()))
        .await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_long_scalar() {
    let data = run(&schema(), &cache(), r#"{ total(delta: "5") }"#, json!({})).await;
    assert_eq!(data["total"], "10000000005");
}

#[tokio::test]
async fn test_resolvers_see_request_headers() {
    let data = run(&schema(), &cache(), "{ caller }", json!({})).await;
    assert_eq!(data["caller"], "tester");
}

#[tokio::test]
async fn test_projection_variables_are_coerced() {
    let document = PreparsedDocument::parse(
        "query($first: Int) { items(first: $first) { edges { node { id } } } }",
    )
    .unwrap();
    let variables = document.coerce_parameters(None, &[("first".to_string(), "1".to_string())]);

    let mut request = Request::new(document.query.clone())
        .variables(variables)
        .data(context());
    request.set_parsed_query(document.document.clone());

    let response = schema().execute(request).await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["items"]["edges"].as_array().unwrap().len(), 1);
}
