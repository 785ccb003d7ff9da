//! Record validation at the data-access boundary.
//!
//! Assembly trusts its records; this is where raw payloads are checked
//! against the shape their schema implies before they get that far.

use serde_json::{json, Map, Value};

use crate::error::{LoadError, RecordError, ValidateError};
use crate::schema::{FieldSpec, RelationshipKind, Schema, SchemaRegistry};

/// JSON types a record field may take.
const SCALAR_TYPES: &[&str] = &["string", "number", "boolean", "null"];

/// JSON Schema describing one raw record of a type.
///
/// `id` is required and must be an integer or string. Typed attributes are
/// constrained to their primitive type (or null); `belongsTo` foreign keys
/// must hold an id or null. Undeclared fields are allowed but must be
/// scalars.
pub fn record_schema(schema: &Schema) -> Value {
    let mut properties = Map::new();
    properties.insert("id".to_string(), json!({ "type": ["integer", "string"] }));

    for (name, spec) in schema.fields() {
        match spec {
            FieldSpec::Attribute { primitive_type } => {
                let property = match primitive_type.as_deref().and_then(json_type_for) {
                    Some(json_type) => json!({ "type": [json_type, "null"] }),
                    None => json!({ "type": SCALAR_TYPES }),
                };
                properties.insert(name.to_string(), property);
            }
            FieldSpec::Relationship(rel) if rel.kind == RelationshipKind::BelongsTo => {
                let key = rel
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", name));
                properties.insert(key, json!({ "type": ["integer", "string", "null"] }));
            }
            FieldSpec::Relationship(_) => {}
        }
    }

    json!({
        "type": "object",
        "required": ["id"],
        "properties": properties,
        "additionalProperties": { "type": SCALAR_TYPES }
    })
}

/// JSON type for a schema primitive tag, if it maps to one.
fn json_type_for(primitive: &str) -> Option<&'static str> {
    match primitive {
        "string" | "date" => Some("string"),
        "number" => Some("number"),
        "integer" => Some("integer"),
        "boolean" => Some("boolean"),
        _ => None,
    }
}

/// Validate a record or an array of records of `resource_type`.
///
/// # Errors
///
/// Returns `ValidateError::Assemble` if the type is unregistered, or
/// `ValidateError::Invalid` listing every violation.
pub fn validate(
    registry: &SchemaRegistry,
    resource_type: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let schema = record_schema(registry.require(resource_type)?);
    let schema = if payload.is_array() {
        json!({ "type": "array", "items": schema })
    } else {
        schema
    };

    validate_against_schema(&schema, payload)
}

/// Validate a payload against an already-built JSON Schema.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        ValidateError::Load(LoadError::InvalidSchema {
            path: "/".to_string(),
            message: e.to_string(),
        })
    })?;

    let errors: Vec<RecordError> = validator
        .iter_errors(payload)
        .map(|e| RecordError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RelationshipSpec;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with_schema(
            "stuffs",
            Schema::new()
                .field("title", FieldSpec::attribute("string"))
                .field("count", FieldSpec::attribute("number"))
                .field("notes", FieldSpec::untyped())
                .field("thing", RelationshipSpec::belongs_to("things")),
        )
    }

    #[test]
    fn validate_valid_record() {
        let payload = json!({ "id": 1, "title": "foo", "count": 2, "thing_id": 1 });
        assert!(validate(&registry(), "stuffs", &payload).is_ok());
    }

    #[test]
    fn validate_allows_nulls() {
        let payload = json!({ "id": "1", "title": null, "thing_id": null, "notes": null });
        assert!(validate(&registry(), "stuffs", &payload).is_ok());
    }

    #[test]
    fn validate_missing_id() {
        let payload = json!({ "title": "foo" });
        let result = validate(&registry(), "stuffs", &payload);
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn validate_wrong_type() {
        let payload = json!({ "id": 1, "title": 42 });
        let result = validate(&registry(), "stuffs", &payload);
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn validate_rejects_nested_values() {
        let payload = json!({ "id": 1, "extra": { "nested": true } });
        assert!(validate(&registry(), "stuffs", &payload).is_err());
    }

    #[test]
    fn validate_collects_errors_across_records() {
        let payload = json!([
            { "id": 1, "title": 1 },
            { "id": 2, "title": "ok" },
            { "id": 3, "count": "many" }
        ]);
        match validate(&registry(), "stuffs", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].path, "/0/title");
                assert_eq!(errors[1].path, "/2/count");
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn validate_unknown_type() {
        let result = validate(&registry(), "widgets", &json!({ "id": 1 }));
        assert!(matches!(result, Err(ValidateError::Assemble(_))));
    }
}
