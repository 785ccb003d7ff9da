//! JSON:API Document Assembly
//!
//! Turns plain records plus a per-type schema registry into JSON:API
//! documents: typed resource objects, relationship linkage with links, and
//! an `included` list of sideloaded resources.
//!
//! # Example
//!
//! ```
//! use jsonapi_schema::{
//!     AssembleOptions, FieldSpec, JsonApi, Record, RelationshipSpec, Schema, SchemaRegistry,
//! };
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::new()
//!     .with_schema(
//!         "articles",
//!         Schema::new()
//!             .field("title", FieldSpec::attribute("string"))
//!             .field("author", RelationshipSpec::belongs_to("users")),
//!     )
//!     .with_schema("users", Schema::new().field("name", FieldSpec::attribute("string")));
//!
//! let api = JsonApi::new(registry, "https://api.example.com/v1");
//! let article = Record::new(1).with("title", "Hello").with("author_id", 7);
//!
//! let document = api
//!     .assemble("articles", article, AssembleOptions::new(), None)
//!     .unwrap();
//! let document = serde_json::to_value(&document).unwrap();
//!
//! assert_eq!(document["links"]["self"], "https://api.example.com/v1/articles");
//! assert_eq!(
//!     document["data"]["relationships"]["author"]["data"],
//!     json!({ "type": "users", "id": 7 })
//! );
//! ```
//!
//! # Relationships
//!
//! | Declaration | Linkage |
//! |-------------|---------|
//! | `belongsTo` | `{type, id}` from `<field>_id` (or `foreignKey`); `data` omitted when unset or `null` |
//! | `hasMany` | identifiers of sideloaded targets whose `<owner>_id` matches |
//! | `hasMany` + `through` | targets reached via the join records' keys |
//!
//! Without sideloaded records of the target type, only `links` are emitted.
//!
//! # Schema Format
//!
//! A field spec is a primitive tag, `null`, or an object:
//! ```json
//! { "title": "string", "author": { "type": "users", "relationship": "belongsTo" } }
//! ```

mod document;
mod error;
mod included;
mod inflect;
mod linter;
mod links;
mod loader;
mod query;
mod relationships;
mod resource;
mod schema;
mod types;
mod validator;

pub use document::{JsonApi, TypedJsonApi};
pub use error::{AssembleError, LoadError, RecordError, ValidateError};
pub use included::aggregate;
pub use inflect::{pluralize, singularize};
pub use linter::{lint, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use links::{join_path, BaseUrl};
pub use loader::{
    is_url, load_json, load_query_result, load_registry, load_registry_auto, load_registry_str,
};
pub use query::{normalize_related_data, Endpoint, Fields, QueryResult, RelatedQuery};
pub use relationships::{join_type, owner_foreign_key, resolve, Relationships};
pub use resource::{build, full_resource, identifier};
pub use schema::{FieldSpec, RelationshipKind, RelationshipSpec, Schema, SchemaRegistry};
pub use types::{
    AssembleOptions, Document, DocumentData, Id, IncludedMap, Linkage, Links, Overrides,
    PrimaryData, Record, RelationshipLinkage, RelationshipLinks, ResourceIdentifier,
    ResourceLinks, ResourceObject,
};
pub use validator::{record_schema, validate, validate_against_schema};

#[cfg(feature = "remote")]
pub use loader::load_registry_url;
