//! Projection queries: logical query names mapped to query text.
//!
//! In projection mode clients send a name instead of a query; the cache asks
//! a [`QueryNameResolver`] for the text behind that name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ProjectionConfig;

/// Extension of query files in the projection directory.
pub const QUERY_FILE_EXTENSION: &str = "graphql";

/// Maps a logical query name to its query text.
pub trait QueryNameResolver: Send + Sync {
    /// Returns the query text for `name`, or `None` if the name is unknown.
    fn resolve(&self, name: &str) -> Option<String>;
}

impl QueryNameResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves nothing; every projection request is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProjection;

impl QueryNameResolver for NoProjection {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Errors loading projection queries.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("projection directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Named queries from configuration and from a directory of query files.
#[derive(Debug, Clone, Default)]
pub struct ProjectionQueries {
    queries: HashMap<String, String>,
}

impl ProjectionQueries {
    pub fn new(queries: HashMap<String, String>) -> Self {
        Self { queries }
    }

    /// Loads the queries named by `config`.
    ///
    /// Every `*.graphql` file of the configured directory is registered under
    /// its file stem, then the inline `queries` table is applied on top.
    ///
    /// # Errors
    ///
    /// Fails when the directory is missing or a file cannot be read.
    pub fn from_config(config: &ProjectionConfig) -> Result<Self, ProjectionError> {
        let mut queries = match &config.directory {
            Some(directory) => load_directory(directory)?,
            None => HashMap::new(),
        };

        for (name, query) in &config.queries {
            if queries.insert(name.clone(), query.clone()).is_some() {
                debug!(name = %name, "Inline projection query overrides file");
            }
        }

        info!(queries = queries.len(), "Projection queries loaded");
        Ok(Self { queries })
    }

    /// Registered names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl QueryNameResolver for ProjectionQueries {
    fn resolve(&self, name: &str) -> Option<String> {
        self.queries.get(name).cloned()
    }
}

fn load_directory(directory: &Path) -> Result<HashMap<String, String>, ProjectionError> {
    if !directory.is_dir() {
        return Err(ProjectionError::MissingDirectory(directory.to_path_buf()));
    }

    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ProjectionError::Io { path, source }
    };

    let mut queries = HashMap::new();
    for entry in std::fs::read_dir(directory).map_err(io_error(directory))? {
        let path = entry.map_err(io_error(directory))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(QUERY_FILE_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let text = std::fs::read_to_string(&path).map_err(io_error(&path))?;
        debug!(name, path = %path.display(), "Loaded projection query file");
        queries.insert(name.to_string(), text);
    }

    Ok(queries)
}
