use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use sdlweave_graphql::{
    ExecutableSchemaBuilder, FilePatternSource, GraphQLConfig, GraphQLError, GraphQLState,
    ProjectionQueries, QueryCache, RuntimeWiring, SchemaSource, graphql_routes, parse_and_build,
    types::TemporalFormats,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, middleware as app_middleware};

pub struct SdlweaveServer {
    addr: SocketAddr,
    app: Router,
}

/// Loads the schema described by `cfg` and builds the state the GraphQL
/// handlers share.
///
/// The SDL file is located with `schema_location_pattern`, augmented, wired
/// and built into an executable schema; the query cache is sized from
/// `cfg.cache` and resolves projection names from `cfg.projection`.
pub fn build_graphql_state(
    cfg: &GraphQLConfig,
    wiring: RuntimeWiring,
) -> Result<GraphQLState, GraphQLError> {
    let sdl = FilePatternSource::new(&cfg.schema_location_pattern).schema_string()?;
    let registry = parse_and_build(&sdl)?;

    let formats = TemporalFormats::from_config(&cfg.scalars)
        .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;
    let schema = ExecutableSchemaBuilder::new(&registry, wiring, cfg.to_schema_builder_config())
        .with_formats(Arc::new(formats))
        .build()?;

    let queries = ProjectionQueries::from_config(&cfg.projection)
        .map_err(|e| GraphQLError::Internal(e.to_string()))?;
    let cache = QueryCache::from_config(&cfg.cache, Arc::new(queries));

    tracing::info!(
        types = registry.len(),
        projection_queries = cfg.projection.queries.len(),
        cache_max_size = cfg.cache.max_size,
        "GraphQL schema ready"
    );

    Ok(GraphQLState::new(schema, cache))
}

/// Builds the router with no resolvers wired; every field reads the
/// same-named property of its parent value.
pub fn build_app(cfg: &AppConfig) -> Result<Router, GraphQLError> {
    build_app_with_wiring(cfg, RuntimeWiring::new())
}

pub fn build_app_with_wiring(cfg: &AppConfig, wiring: RuntimeWiring) -> Result<Router, GraphQLError> {
    let body_limit = cfg.server.body_limit_bytes;

    let mut router = Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz));

    if cfg.graphql.enabled {
        let state = build_graphql_state(&cfg.graphql, wiring)?;
        router = router.merge(graphql_routes(state));
    } else {
        tracing::info!("GraphQL endpoints disabled");
    }

    // Middleware stack (order: request id -> trace -> compression/cors -> body limit)
    let app = router
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit));

    Ok(app)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    wiring: RuntimeWiring,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            wiring: RuntimeWiring::new(),
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Resolvers served by the schema.
    pub fn with_wiring(mut self, wiring: RuntimeWiring) -> Self {
        self.wiring = wiring;
        self
    }

    pub fn build(self) -> Result<SdlweaveServer, GraphQLError> {
        let app = build_app_with_wiring(&self.config, self.wiring)?;

        Ok(SdlweaveServer {
            addr: self.addr,
            app,
        })
    }
}

impl SdlweaveServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
