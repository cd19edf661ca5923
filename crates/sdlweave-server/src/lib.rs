pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, ConfigError, LoggingConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{SdlweaveServer, ServerBuilder, build_app, build_app_with_wiring, build_graphql_state};
