//! Schema linting - static analysis of schema files.
//!
//! Validates schema files for:
//! - JSON syntax errors
//! - Malformed field specs
//! - Relationships pointing at unregistered types
//! - Broken `through` configuration

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{AssembleError, LoadError};
use crate::inflect::pluralize;
use crate::loader::load_json;
use crate::relationships::join_type;
use crate::schema::{FieldSpec, RelationshipKind, Schema, SchemaRegistry};
use crate::types::json_type_name;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/articles/authors")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a schema directory or registry file.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Schemas parsed from one file, plus the diagnostics found while parsing.
struct ParsedFile {
    file: PathBuf,
    /// `(type name, JSON path prefix, schema)`
    schemas: Vec<(String, String, Schema)>,
    diagnostics: Vec<Diagnostic>,
}

/// Lint a schema directory or a single registry file.
///
/// In a directory every `*.json` file is one schema named after its plural
/// file stem; a file must map type names to schemas. Cross-schema checks
/// run against every schema that parsed. If `strict` is true, warnings are
/// treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let (base, parsed): (&Path, Vec<ParsedFile>) = if path.is_dir() {
        (
            path,
            collect_schema_files(path)
                .iter()
                .map(|file| parse_schema_file(file))
                .collect(),
        )
    } else {
        (
            path.parent().unwrap_or(Path::new(".")),
            vec![parse_registry_file(path)],
        )
    };

    let mut registry = SchemaRegistry::new();
    for file in &parsed {
        for (type_name, _, schema) in &file.schemas {
            registry.insert(type_name.clone(), schema.clone());
        }
    }

    let mut results = Vec::with_capacity(parsed.len());
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in parsed {
        let ParsedFile {
            file,
            schemas,
            mut diagnostics,
        } = file;
        for (type_name, prefix, schema) in &schemas {
            check_schema(type_name, prefix, schema, &registry, &file, &mut diagnostics);
        }

        let file_errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let file_warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        total_errors += file_errors;
        total_warnings += file_warnings;

        let status = if file_errors > 0 {
            FileStatus::Error
        } else if file_warnings > 0 {
            FileStatus::Warning
        } else {
            FileStatus::Ok
        };

        results.push(FileResult {
            file: file.strip_prefix(base).unwrap_or(&file).to_path_buf(),
            status,
            diagnostics,
        });
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

fn diagnostic(
    severity: Severity,
    code: &str,
    file: &Path,
    path: &str,
    message: String,
) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: path.to_string(),
        message,
    }
}

/// Parse one `<type>.json` file from a schema directory.
fn parse_schema_file(file: &Path) -> ParsedFile {
    let type_name = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(pluralize)
        .unwrap_or_default();

    let mut parsed = ParsedFile {
        file: file.to_path_buf(),
        schemas: Vec::new(),
        diagnostics: Vec::new(),
    };
    match load_json(file) {
        Ok(value) => match Schema::from_value(&value, "") {
            Ok(schema) => parsed.schemas.push((type_name, String::new(), schema)),
            Err(e) => parsed.diagnostics.push(schema_diagnostic(file, e)),
        },
        Err(e) => parsed.diagnostics.push(syntax_diagnostic(file, e)),
    }
    parsed
}

/// Parse a registry file holding `typeName -> schema`.
fn parse_registry_file(file: &Path) -> ParsedFile {
    let mut parsed = ParsedFile {
        file: file.to_path_buf(),
        schemas: Vec::new(),
        diagnostics: Vec::new(),
    };

    let value = match load_json(file) {
        Ok(value) => value,
        Err(e) => {
            parsed.diagnostics.push(syntax_diagnostic(file, e));
            return parsed;
        }
    };
    let types = match value {
        Value::Object(types) => types,
        other => {
            parsed.diagnostics.push(diagnostic(
                Severity::Error,
                "E002",
                file,
                "/",
                format!("expected object of schemas, got {}", json_type_name(&other)),
            ));
            return parsed;
        }
    };

    for (type_name, schema) in &types {
        let prefix = format!("/{}", type_name);
        match Schema::from_value(schema, &prefix) {
            Ok(schema) => parsed.schemas.push((type_name.clone(), prefix, schema)),
            Err(e) => parsed.diagnostics.push(schema_diagnostic(file, e)),
        }
    }
    parsed
}

fn syntax_diagnostic(file: &Path, error: LoadError) -> Diagnostic {
    diagnostic(
        Severity::Error,
        "E001",
        file,
        "/",
        format!("syntax error: {}", error),
    )
}

fn schema_diagnostic(file: &Path, error: LoadError) -> Diagnostic {
    match error {
        LoadError::InvalidSchema { path, message } => {
            let path = if path.is_empty() { "/".to_string() } else { path };
            diagnostic(Severity::Error, "E002", file, &path, message)
        }
        other => diagnostic(Severity::Error, "E002", file, "/", other.to_string()),
    }
}

/// Cross-schema checks for one parsed schema.
fn check_schema(
    type_name: &str,
    prefix: &str,
    schema: &Schema,
    registry: &SchemaRegistry,
    file: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, spec) in schema.fields() {
        let field_path = format!("{}/{}", prefix, name);

        if name == "id" {
            diagnostics.push(diagnostic(
                Severity::Warning,
                "W002",
                file,
                &field_path,
                "id is implicit and should not be declared".to_string(),
            ));
        }

        let FieldSpec::Relationship(rel) = spec else {
            continue;
        };

        if !registry.contains(&rel.target_type) {
            diagnostics.push(diagnostic(
                Severity::Error,
                "E003",
                file,
                &field_path,
                format!("relationship targets unregistered type {}", rel.target_type),
            ));
        }

        match (rel.kind, rel.through.as_deref()) {
            (RelationshipKind::BelongsTo, Some(through)) => diagnostics.push(diagnostic(
                Severity::Warning,
                "W001",
                file,
                &field_path,
                format!("through {} is ignored on a belongsTo relationship", through),
            )),
            (RelationshipKind::HasMany, Some(_)) => {
                match join_type(type_name, name, rel, registry) {
                    Ok(_) => {}
                    Err(e @ AssembleError::MissingSchema { .. }) => diagnostics.push(diagnostic(
                        Severity::Error,
                        "E004",
                        file,
                        &field_path,
                        format!("through schema not registered: {}", e),
                    )),
                    Err(e) => diagnostics.push(diagnostic(
                        Severity::Error,
                        "E005",
                        file,
                        &field_path,
                        e.to_string(),
                    )),
                }
            }
            _ => {}
        }
    }
}

/// Collect the .json files of a schema directory, sorted.
fn collect_schema_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    files.sort();
    files
}
