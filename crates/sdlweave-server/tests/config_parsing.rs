use std::{env, fs};

use sdlweave_server::ConfigError;
use sdlweave_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sdlweave.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 1024

[logging]
level = "debug"

[graphql]
schema_location_pattern = "schema/*.graphqls"
max_depth = 10
introspection = false

[graphql.cache]
max_size = 50

[graphql.projection.queries]
item_by_id = "query($id: Int!) { item(id: $id) { id } }"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 1024);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");
    assert_eq!(cfg.graphql.schema_location_pattern, "schema/*.graphqls");
    assert_eq!(cfg.graphql.max_depth, 10);
    assert!(!cfg.graphql.introspection);
    assert_eq!(cfg.graphql.cache.max_size, 50);
    assert!(cfg.graphql.cache.bounded);
    assert!(cfg.graphql.projection.queries.contains_key("item_by_id"));

    // 2) Env override should win over file
    unsafe {
        env::set_var("SDLWEAVE__GRAPHQL__MAX_DEPTH", "3");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.graphql.max_depth, 3);
    // cleanup env var
    unsafe {
        env::remove_var("SDLWEAVE__GRAPHQL__MAX_DEPTH");
    }

    // 3) Invalid values are rejected by validation
    let invalid = toml_content.replace("port = 8081", "port = 0");
    fs::write(&path, invalid).expect("write invalid toml");
    let err = load_config(path.to_str()).expect_err("port 0 must be rejected");
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = load_config(path.to_str()).expect("defaults should load");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.graphql.schema_location_pattern, "**/*.graphqls");
    assert_eq!(cfg.graphql.cache.max_size, 1000);
}

#[test]
fn invalid_scalar_pattern_is_a_config_error() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sdlweave.toml");
    fs::write(
        &path,
        r#"
[graphql.scalars]
date_format = "[year]-[nonsense]"
"#,
    )
    .expect("write toml");

    let err = load_config(path.to_str()).expect_err("bad pattern must be rejected");
    assert!(err.to_string().contains("graphql.scalars"));
}

#[test]
fn wrong_type_is_a_deserialize_error() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sdlweave.toml");
    fs::write(&path, "[server]\nport = \"not a number\"\n").expect("write toml");

    let err = load_config(path.to_str()).expect_err("string port must be rejected");
    assert!(matches!(err, ConfigError::Deserialize(_)));
}
