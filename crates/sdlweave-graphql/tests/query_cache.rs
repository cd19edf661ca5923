//! Integration tests for the preparsed-query cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use async_graphql::dynamic::{FieldFuture, FieldValue, Schema};
use async_graphql::Value;
use sdlweave_graphql::cache::{ErrorClassification, PreparsedDocument, PreparsedQueryCache, QueryCache};
use sdlweave_graphql::config::{ProjectionConfig, QueryCacheConfig};
use sdlweave_graphql::projection::{NoProjection, ProjectionQueries};
use sdlweave_graphql::{
    ExecutableSchemaBuilder, RequestContext, RequestContextBuilder, RuntimeWiring,
    SchemaBuilderConfig, parse_and_build,
};

fn context(projection: bool) -> RequestContext {
    RequestContextBuilder::new()
        .projection(projection)
        .with_request_id("cache-test")
        .build()
        .unwrap()
}

fn open_cache() -> QueryCache {
    QueryCache::bounded(100, Arc::new(NoProjection))
}

/// `type Query { a: String }` whose resolver counts its calls.
fn counting_schema(resolved: Arc<AtomicUsize>) -> Schema {
    let registry = parse_and_build("type Query { a: String }").unwrap();
    let wiring = RuntimeWiring::new().resolver("Query", "a", move |_| {
        let resolved = Arc::clone(&resolved);
        FieldFuture::new(async move {
            resolved.fetch_add(1, Ordering::SeqCst);
            Ok(Some(FieldValue::value(Value::from("a"))))
        })
    });
    ExecutableSchemaBuilder::new(&registry, wiring, SchemaBuilderConfig::default())
        .build()
        .unwrap()
}

#[test]
fn test_parsed_document_is_reused() {
    let cache = open_cache();

    let first = cache
        .get_document("{ a }", &context(false), PreparsedDocument::parse)
        .into_result()
        .unwrap();
    let second = cache
        .get_document("{ a }", &context(false), |_| -> Result<PreparsedDocument, String> {
            panic!("compute must not run on a hit")
        })
        .into_result()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.query, "{ a }");
}

#[test]
fn test_syntax_error_is_retried() {
    let cache = open_cache();
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let entry = cache.get_document("{ a", &context(false), |text| {
            calls.fetch_add(1, Ordering::SeqCst);
            PreparsedDocument::parse(text)
        });
        assert_eq!(
            entry.error().map(|e| e.classification),
            Some(ErrorClassification::Validation)
        );
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(cache.get("{ a").is_none());
}

#[tokio::test]
async fn test_invalid_field_is_not_stored() {
    let schema = counting_schema(Arc::new(AtomicUsize::new(0)));
    let cache = open_cache();
    let calls = AtomicUsize::new(0);

    for _ in 0..2 {
        let entry = cache
            .get_document_async("{ nope }", &context(false), |text| {
                calls.fetch_add(1, Ordering::SeqCst);
                PreparsedDocument::compile(&schema, text)
            })
            .await;

        let error = entry.error().unwrap();
        assert_eq!(error.classification, ErrorClassification::Validation);
        assert!(error.message.contains("Unknown field"), "{}", error.message);

        let rendered = serde_json::to_value(error.to_graphql_error()).unwrap();
        assert_eq!(rendered["extensions"]["classification"], "ValidationError");
        assert!(rendered.get("locations").is_none());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.get("{ nope }").is_none());
}

#[tokio::test]
async fn test_valid_query_is_stored_without_executing() {
    let resolved = Arc::new(AtomicUsize::new(0));
    let schema = counting_schema(Arc::clone(&resolved));
    let cache = open_cache();

    let entry = cache
        .get_document_async("{ a }", &context(false), |text| {
            PreparsedDocument::compile(&schema, text)
        })
        .await;

    assert!(!entry.is_error());
    assert!(cache.get("{ a }").is_some());
    assert_eq!(resolved.load(Ordering::SeqCst), 0);

    // The schema still executes ordinary requests.
    let response = schema.execute("{ a }").await;
    assert!(response.errors.is_empty());
    assert_eq!(resolved.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_depth_limit_is_a_validation_error() {
    let registry = parse_and_build("type Query { item: Item } type Item { id: String }").unwrap();
    let config = SchemaBuilderConfig {
        max_depth: 1,
        ..SchemaBuilderConfig::default()
    };
    let schema = ExecutableSchemaBuilder::new(&registry, RuntimeWiring::new(), config)
        .build()
        .unwrap();
    let cache = open_cache();

    let query = "{ item { id } }";
    let entry = cache
        .get_document_async(query, &context(false), |text| {
            PreparsedDocument::compile(&schema, text)
        })
        .await;

    assert_eq!(
        entry.error().map(|e| e.classification),
        Some(ErrorClassification::Validation)
    );
    assert!(cache.get(query).is_none());
}

#[test]
fn test_projection_compiles_registered_text() {
    let mut queries = HashMap::new();
    queries.insert("byId".to_string(), "{ item(id: \"1\") }".to_string());
    let cache = QueryCache::bounded(10, Arc::new(ProjectionQueries::new(queries)));

    let seen = std::sync::Mutex::new(Vec::new());
    let entry = cache.get_document("byId", &context(true), |text| {
        seen.lock().unwrap().push(text.to_string());
        PreparsedDocument::parse(text)
    });

    assert!(!entry.is_error());
    assert_eq!(*seen.lock().unwrap(), vec!["{ item(id: \"1\") }".to_string()]);
    // Stored under the logical name, not the text.
    assert!(cache.get("byId").is_some());
    assert!(cache.get("{ item(id: \"1\") }").is_none());
}

#[test]
fn test_unknown_projection_name() {
    let cache = QueryCache::bounded(10, Arc::new(ProjectionQueries::default()));
    let calls = AtomicUsize::new(0);

    let entry = cache.get_document("unknown", &context(true), |text| {
        calls.fetch_add(1, Ordering::SeqCst);
        PreparsedDocument::parse(text)
    });

    let error = entry.error().unwrap();
    assert_eq!(error.classification, ErrorClassification::NotFound);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// A name used as open query text is compiled as text, not resolved.
#[test]
fn test_open_mode_never_resolves_names() {
    let mut queries = HashMap::new();
    queries.insert("byId".to_string(), "{ item }".to_string());
    let cache = QueryCache::bounded(10, Arc::new(ProjectionQueries::new(queries)));

    let entry = cache.get_document("byId", &context(false), PreparsedDocument::parse);
    assert!(entry.is_error());
}

/// Names and query text share one key space: once a projection is cached,
/// open text equal to its name hits that entry.
#[test]
fn test_cached_projection_is_shared_with_open_text() {
    let mut queries = HashMap::new();
    queries.insert("byId".to_string(), "{ item }".to_string());
    let cache = QueryCache::bounded(10, Arc::new(ProjectionQueries::new(queries)));

    let projected = cache
        .get_document("byId", &context(true), PreparsedDocument::parse)
        .into_result()
        .unwrap();
    let open = cache
        .get_document("byId", &context(false), PreparsedDocument::parse)
        .into_result()
        .unwrap();

    assert!(Arc::ptr_eq(&projected, &open));
    assert_eq!(open.query, "{ item }");
}

#[test]
fn test_projection_queries_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("allItems.graphql"), "{ items { id } }").unwrap();

    let config = ProjectionConfig {
        queries: HashMap::new(),
        directory: Some(dir.path().to_path_buf()),
    };
    let queries = ProjectionQueries::from_config(&config).unwrap();
    let cache = QueryCache::from_config(&QueryCacheConfig::default(), Arc::new(queries));

    let document = cache
        .get_document("allItems", &context(true), PreparsedDocument::parse)
        .into_result()
        .unwrap();
    assert_eq!(document.query, "{ items { id } }");
}

/// Concurrent misses on one key may each compute, but every caller gets the
/// single stored document.
#[test]
fn test_concurrent_misses_converge() {
    for cache in [
        PreparsedQueryCache::<String>::bounded(10, Arc::new(NoProjection)),
        PreparsedQueryCache::<String>::unbounded(Arc::new(NoProjection)),
    ] {
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cache = cache.clone();
                let barrier = Arc::clone(&barrier);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_document("{ a }", &context(false), |_| -> Result<String, String> {
                            let n = counter.fetch_add(1, Ordering::SeqCst);
                            Ok(format!("compiled-{n}"))
                        })
                        .into_result()
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.get("{ a }").unwrap();

        assert!(counter.load(Ordering::SeqCst) >= 1);
        for result in &results {
            assert_eq!(result.as_str(), stored.as_str());
        }
    }
}

/// Same convergence with the asynchronous compute step, each thread driving
/// its own future.
#[test]
fn test_concurrent_async_misses_converge() {
    let cache = PreparsedQueryCache::<String>::bounded(10, Arc::new(NoProjection));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let counter = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                barrier.wait();
                tokio_test::block_on(cache.get_document_async(
                    "{ b }",
                    &context(false),
                    |_| async move {
                        let n = counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(format!("compiled-{n}"))
                    },
                ))
                .into_result()
                .unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let stored = cache.get("{ b }").unwrap();

    for result in &results {
        assert!(Arc::ptr_eq(result, &stored));
    }
}
