//! Where schema SDL comes from.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::SchemaError;

/// Supplies the SDL text of the schema.
pub trait SchemaSource: Send + Sync {
    /// Returns the schema text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Source`] if the text cannot be obtained.
    fn schema_string(&self) -> Result<String, SchemaError>;
}

/// Reads the first file matching a glob pattern.
///
/// Matches are sorted so the choice is stable; more than one match is
/// logged as a warning and only the first file is used.
#[derive(Debug, Clone)]
pub struct FilePatternSource {
    pattern: String,
    root: Option<PathBuf>,
}

impl FilePatternSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            root: None,
        }
    }

    /// Resolves the pattern relative to `root` instead of the working directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn full_pattern(&self) -> String {
        match &self.root {
            Some(root) => root.join(&self.pattern).to_string_lossy().into_owned(),
            None => self.pattern.clone(),
        }
    }

    /// All files matching the pattern, sorted.
    ///
    /// # Errors
    ///
    /// Fails on an invalid pattern.
    pub fn matches(&self) -> Result<Vec<PathBuf>, SchemaError> {
        let pattern = self.full_pattern();
        let paths = glob::glob(&pattern)
            .map_err(|e| SchemaError::Source(format!("invalid schema pattern '{pattern}': {e}")))?;

        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable schema path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl SchemaSource for FilePatternSource {
    fn schema_string(&self) -> Result<String, SchemaError> {
        let files = self.matches()?;

        let Some(first) = files.first() else {
            return Err(SchemaError::Source(format!(
                "no schema file matches '{}'",
                self.full_pattern()
            )));
        };

        if files.len() > 1 {
            warn!(
                pattern = %self.full_pattern(),
                matched = files.len(),
                using = %first.display(),
                "More than one schema file matches, using the first"
            );
        }

        read(first)
    }
}

fn read(path: &Path) -> Result<String, SchemaError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SchemaError::Source(format!("failed to read {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = text.len(), "Loaded schema file");
    Ok(text)
}

/// Schema text held in memory.
#[derive(Debug, Clone)]
pub struct StaticSource(pub String);

impl StaticSource {
    pub fn new(sdl: impl Into<String>) -> Self {
        Self(sdl.into())
    }
}

impl SchemaSource for StaticSource {
    fn schema_string(&self) -> Result<String, SchemaError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sorted_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.graphqls"), "type Query { b: String }").unwrap();
        std::fs::write(dir.path().join("a.graphqls"), "type Query { a: String }").unwrap();
        std::fs::write(dir.path().join("nested/c.graphqls"), "type Query { c: String }").unwrap();

        let source = FilePatternSource::new("**/*.graphqls").with_root(dir.path());
        assert_eq!(source.matches().unwrap().len(), 3);
        assert_eq!(source.schema_string().unwrap(), "type Query { a: String }");
    }

    #[test]
    fn test_no_match_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilePatternSource::new("*.graphqls").with_root(dir.path());

        let err = source.schema_string().unwrap_err();
        assert!(matches!(err, SchemaError::Source(ref m) if m.contains("no schema file")));
    }

    #[test]
    fn test_static_source() {
        let source = StaticSource::new("type Query { a: String }");
        assert_eq!(source.schema_string().unwrap(), "type Query { a: String }");
    }
}
