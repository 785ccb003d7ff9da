//! JSON:API Schema CLI
//!
//! Command-line interface for assembling documents and checking schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsonapi_schema::{
    lint, load_json, load_query_result, load_registry_auto, validate, AssembleError,
    AssembleOptions, Diagnostic, Document, Endpoint, FileStatus, Id, JsonApi, LintResult,
    RelatedQuery, SchemaRegistry, Severity, ValidateError,
};

#[derive(Parser)]
#[command(name = "jsonapi-schema")]
#[command(about = "Assemble JSON:API documents from records and type schemas")]
#[command(version)]
struct Cli {
    /// Log assembly details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a document from a query result ({ data, included?, defaults? })
    Assemble {
        /// Query result file
        input: PathBuf,

        /// Primary resource type
        #[arg(long = "type", short = 't')]
        resource_type: String,

        #[command(flatten)]
        target: Target,
    },

    /// Assemble a relationship endpoint document for an owner resource
    Related {
        /// Query result file holding the related records
        input: PathBuf,

        /// Owner resource type
        #[arg(long)]
        owner: String,

        /// Owner resource id
        #[arg(long)]
        id: String,

        /// Relationship field on the owner
        #[arg(long)]
        field: String,

        /// Serve /relationships/{field} instead of the related resources
        #[arg(long)]
        linkage: bool,

        #[command(flatten)]
        target: Target,
    },

    /// Lint schema files for errors (syntax, bad field specs, broken relationships)
    Lint {
        /// Schema directory or registry file
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate raw records against a type's schema
    Validate {
        /// Record or array of records
        records: PathBuf,

        /// Resource type of the records
        #[arg(long = "type", short = 't')]
        resource_type: String,

        /// Schema source: directory, registry file or URL
        #[arg(long, env = "JSONAPI_SCHEMAS")]
        schemas: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

/// Registry and output settings shared by the assembling commands.
#[derive(clap::Args)]
struct Target {
    /// Schema source: directory, registry file or URL
    #[arg(long, env = "JSONAPI_SCHEMAS")]
    schemas: String,

    /// Prefix for every emitted link
    #[arg(long, env = "JSONAPI_BASE_URL", default_value = "")]
    base_url: String,

    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Assemble {
            input,
            resource_type,
            target,
        } => run_assemble(&input, &resource_type, &target),

        Commands::Related {
            input,
            owner,
            id,
            field,
            linkage,
            target,
        } => run_related(&input, &owner, &Id::parse(&id), &field, linkage, &target),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Validate {
            records,
            resource_type,
            schemas,
            json,
        } => run_validate(&records, &resource_type, &schemas, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(source: &str) -> Result<SchemaRegistry, u8> {
    load_registry_auto(source).map_err(|e| {
        eprintln!("Error loading schemas: {}", e);
        e.exit_code() as u8
    })
}

fn run_assemble(input: &Path, resource_type: &str, target: &Target) -> Result<(), u8> {
    let api = JsonApi::new(load_registry(&target.schemas)?, &target.base_url);

    let result = load_query_result(input, resource_type).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = match result.included {
        Some(included) => AssembleOptions::new().with_included(included),
        None => AssembleOptions::new(),
    };
    let document = api
        .assemble(resource_type, result.data, options, result.defaults.as_ref())
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    write_document(&document, target)
}

fn run_related(
    input: &Path,
    owner: &str,
    id: &Id,
    field: &str,
    linkage: bool,
    target: &Target,
) -> Result<(), u8> {
    let api = JsonApi::new(load_registry(&target.schemas)?, &target.base_url);
    let endpoint = if linkage {
        Endpoint::Linkage
    } else {
        Endpoint::Related
    };

    let report = |e: AssembleError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    };
    let query = RelatedQuery::new(api.registry(), owner, field, id, endpoint).map_err(report)?;
    tracing::debug!(
        target_type = %query.target_type,
        params = %serde_json::Value::Object(query.params.clone()),
        "related query"
    );

    let result = load_query_result(input, &query.target_type).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let data = query.normalize(result.data).map_err(report)?;
    let document = api
        .assemble(
            &query.target_type,
            data,
            query.options(result.included),
            result.defaults.as_ref(),
        )
        .map_err(report)?;

    write_document(&document, target)
}

fn write_document(document: &Document, target: &Target) -> Result<(), u8> {
    let json_output = if target.pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &target.output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(
    records_path: &Path,
    resource_type: &str,
    schemas: &str,
    json_output: bool,
) -> Result<(), u8> {
    let payload = load_json(records_path).map_err(|e| {
        report_error(json_output, &format!("loading records: {}", e));
        e.exit_code() as u8
    })?;

    let registry = load_registry_auto(schemas).map_err(|e| {
        report_error(json_output, &format!("loading schemas: {}", e));
        e.exit_code() as u8
    })?;

    match validate(&registry, resource_type, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);
    let passed = result.is_ok() && (!strict || result.warnings == 0);

    if format == "json" {
        let json = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else {
        print_lint_report(&result, passed, quiet);
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}

const RED: &str = "31";
const YELLOW: &str = "33";
const GREEN: &str = "32";

fn paint(color: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", color, text)
}

fn file_marker(status: FileStatus) -> String {
    match status {
        FileStatus::Ok => paint(GREEN, "✓"),
        FileStatus::Warning => paint(YELLOW, "⚠"),
        FileStatus::Error => paint(RED, "✗"),
    }
}

fn severity_tag(diag: &Diagnostic) -> String {
    let (color, label) = match diag.severity {
        Severity::Error => (RED, "error"),
        Severity::Warning => (YELLOW, "warning"),
    };
    paint(color, &format!("{}[{}]", label, diag.code))
}

/// Human-readable lint output. Quiet mode keeps only failing files and errors.
fn print_lint_report(result: &LintResult, passed: bool, quiet: bool) {
    if !quiet {
        println!("Linting {} ...\n", result.path.display());
    }

    for file_result in &result.results {
        if !quiet || file_result.status != FileStatus::Ok {
            println!("  {} {}", file_marker(file_result.status), file_result.file.display());
        }
        for diag in &file_result.diagnostics {
            if !quiet || diag.severity == Severity::Error {
                println!("    {}: {} - {}", severity_tag(diag), diag.path, diag.message);
            }
        }
    }

    println!();
    let summary = if passed {
        paint(
            GREEN,
            &format!("✓ {} files checked, all passed", result.files_checked),
        )
    } else {
        paint(
            RED,
            &format!(
                "✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            ),
        )
    };
    println!("{}", summary);
}
