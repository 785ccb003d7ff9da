//! Loading schema registries and query results.
//!
//! A registry can come from a directory holding one `<type>.json` file per
//! schema, a single JSON file mapping type names to schemas, a JSON string,
//! or an HTTP URL.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;
use crate::inflect::pluralize;
use crate::query::QueryResult;
use crate::schema::{Schema, SchemaRegistry};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a schema registry from a directory or a registry file.
///
/// In a directory every `*.json` file is one schema, registered under the
/// plural form of its file stem (`user.json` -> `users`). Other files are
/// skipped with a warning. A plain file must hold a `typeName -> schema`
/// object.
pub fn load_registry(path: &Path) -> Result<SchemaRegistry, LoadError> {
    if !path.is_dir() {
        return SchemaRegistry::from_value(&load_json(path)?);
    }

    let mut registry = SchemaRegistry::new();
    for file in schema_files(path)? {
        let Some(type_name) = schema_type_name(&file) else {
            tracing::warn!(file = %file.display(), "skipping non-JSON file in schema directory");
            continue;
        };

        let schema = Schema::from_value(&load_json(&file)?, &format!("/{}", type_name))?;
        tracing::debug!(type_name = %type_name, fields = schema.len(), "loaded schema");
        registry.insert(type_name, schema);
    }
    Ok(registry)
}

/// Load a schema registry from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON, or
/// `LoadError::InvalidSchema` if a field spec is malformed.
pub fn load_registry_str(content: &str) -> Result<SchemaRegistry, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    SchemaRegistry::from_value(&value)
}

/// Load a schema registry from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails, or
/// `LoadError::InvalidSchema` if the response isn't a registry object.
#[cfg(feature = "remote")]
pub fn load_registry_url(url: &str) -> Result<SchemaRegistry, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    // Check for HTTP errors before parsing
    let value: Value = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)?;

    SchemaRegistry::from_value(&value)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a registry from a URL, directory or file, auto-detecting which.
pub fn load_registry_auto(source: &str) -> Result<SchemaRegistry, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_registry_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: PathBuf::from(source),
            })
        }
    } else {
        load_registry(Path::new(source))
    }
}

/// Load a data-access query result for `resource_type` from a file.
pub fn load_query_result(path: &Path, resource_type: &str) -> Result<QueryResult, LoadError> {
    let value = load_json(path)?;
    Ok(QueryResult::from_value(resource_type, &value)?)
}

/// Type name a schema file registers under, or `None` for non-JSON files.
fn schema_type_name(file: &Path) -> Option<String> {
    if file.extension().map(|e| e == "json").unwrap_or(false) {
        file.file_stem()
            .and_then(|stem| stem.to_str())
            .map(pluralize)
    } else {
        None
    }
}

/// Files of a schema directory, sorted for a stable registry order.
fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::ReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, RelationshipSpec};
    use std::fs;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn load_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"data": []}}"#).unwrap();

        let value = load_json(file.path()).unwrap();
        assert_eq!(value["data"], serde_json::json!([]));
    }

    #[test]
    fn load_json_missing_file() {
        let result = load_json(Path::new("/nonexistent/schemas/users.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json }}").unwrap();
        assert!(matches!(
            load_json(file.path()),
            Err(LoadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn load_registry_directory_pluralizes_names() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("user.json"),
            r#"{ "name": "string", "articles": { "type": "articles", "relationship": "hasMany" } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("articles.json"), r#"{ "title": "string" }"#).unwrap();
        fs::write(dir.path().join("README.md"), "not a schema").unwrap();

        let registry = load_registry(dir.path()).unwrap();
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["articles", "users"]);
        assert_eq!(
            registry.get("users").unwrap().get("articles"),
            Some(&FieldSpec::from(RelationshipSpec::has_many("articles")))
        );
    }

    #[test]
    fn load_registry_directory_reports_bad_schema() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("things.json"), r#"{ "count": 3 }"#).unwrap();

        let err = load_registry(dir.path()).unwrap_err();
        match err {
            LoadError::InvalidSchema { path, .. } => assert_eq!(path, "/things/count"),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn load_registry_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "things": {{ "name": "string" }}, "stuffs": {{ "title": null }} }}"#
        )
        .unwrap();

        let registry = load_registry(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("stuffs"));
    }

    #[test]
    fn load_registry_from_str() {
        let registry = load_registry_str(r#"{ "things": {} }"#).unwrap();
        assert!(registry.contains("things"));
        assert!(matches!(
            load_registry_str("[1, 2]"),
            Err(LoadError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn load_query_result_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "data": {{ "id": 1, "name": "foo" }}, "included": {{ "stuffs": [] }} }}"#
        )
        .unwrap();

        let result = load_query_result(file.path(), "things").unwrap();
        assert_eq!(result.data.len(), 1);
        assert!(result.included.is_some());
    }

    #[test]
    fn load_query_result_bad_record() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "data": {{ "name": "no id" }} }}"#).unwrap();

        let err = load_query_result(file.path(), "things").unwrap_err();
        assert!(matches!(err, LoadError::Record(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("http://example.com/schemas.json"));
        assert!(is_url("https://example.com/schemas.json"));
        assert!(!is_url("/path/to/schemas"));
        assert!(!is_url("schemas.json"));
    }

    #[test]
    fn load_registry_auto_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("thing.json"), r#"{ "name": "string" }"#).unwrap();

        let registry = load_registry_auto(dir.path().to_str().unwrap()).unwrap();
        assert!(registry.contains("things"));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_registry_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/schemas.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{ "things": { "name": "string" } }"#)
                .create();

            let registry = load_registry_url(&format!("{}/schemas.json", server.url())).unwrap();
            assert!(registry.contains("things"));
            mock.assert();
        }

        #[test]
        fn load_registry_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_registry_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_registry_auto_url() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/schemas.json")
                .with_status(200)
                .with_body(r#"{ "stuffs": {} }"#)
                .create();

            let registry = load_registry_auto(&format!("{}/schemas.json", server.url())).unwrap();
            assert!(registry.contains("stuffs"));
        }
    }
}
