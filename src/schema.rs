//! Schema model: field specs, per-type schemas and the schema registry.
//!
//! Schemas are plain JSON objects mapping a field name to one of:
//!
//! - a primitive type tag (`"string"`, `"number"`, ...)
//! - `null` for an untyped attribute
//! - `{ "type": "users" }` for an attribute with a declared type
//! - `{ "type": "users", "relationship": "belongsTo" | "hasMany", "foreignKey"?, "through"? }`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AssembleError, LoadError};
use crate::types::json_type_name;

/// Cardinality of a relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    BelongsTo,
    HasMany,
}

impl RelationshipKind {
    /// Parse a relationship kind as written in schema files.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "belongsTo" => Some(RelationshipKind::BelongsTo),
            "hasMany" => Some(RelationshipKind::HasMany),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::BelongsTo => "belongsTo",
            RelationshipKind::HasMany => "hasMany",
        }
    }
}

/// Declaration of a relationship field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSpec {
    pub kind: RelationshipKind,
    /// Plural type name of the related resource.
    pub target_type: String,
    pub foreign_key: Option<String>,
    /// Join schema mediating a many-to-many relationship.
    pub through: Option<String>,
}

impl RelationshipSpec {
    pub fn belongs_to(target_type: impl Into<String>) -> Self {
        Self::new(RelationshipKind::BelongsTo, target_type)
    }

    pub fn has_many(target_type: impl Into<String>) -> Self {
        Self::new(RelationshipKind::HasMany, target_type)
    }

    fn new(kind: RelationshipKind, target_type: impl Into<String>) -> Self {
        Self {
            kind,
            target_type: target_type.into(),
            foreign_key: None,
            through: None,
        }
    }

    /// Override the derived foreign-key name.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Route the relationship through a join schema.
    pub fn through(mut self, schema: impl Into<String>) -> Self {
        self.through = Some(schema.into());
        self
    }
}

/// Specification of a single schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Plain scalar field, optionally carrying a type tag.
    Attribute { primitive_type: Option<String> },
    Relationship(RelationshipSpec),
}

impl FieldSpec {
    pub fn attribute(primitive_type: impl Into<String>) -> Self {
        FieldSpec::Attribute {
            primitive_type: Some(primitive_type.into()),
        }
    }

    pub fn untyped() -> Self {
        FieldSpec::Attribute {
            primitive_type: None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipSpec> {
        match self {
            FieldSpec::Relationship(spec) => Some(spec),
            FieldSpec::Attribute { .. } => None,
        }
    }

    /// The type this field declares, if any.
    ///
    /// Used to discover the join type of `through` relationships.
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            FieldSpec::Attribute { primitive_type } => primitive_type.as_deref(),
            FieldSpec::Relationship(spec) => Some(&spec.target_type),
        }
    }

    /// Parse a field spec from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidSchema` for values that are not a string,
    /// `null`, or a well-formed field object.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, LoadError> {
        match value {
            Value::String(s) => Ok(FieldSpec::attribute(s.as_str())),
            Value::Null => Ok(FieldSpec::untyped()),
            Value::Object(map) => {
                let declared = optional_str(map.get("type"), &format!("{}/type", path))?;
                let Some(relationship) = map.get("relationship") else {
                    return Ok(FieldSpec::Attribute {
                        primitive_type: declared,
                    });
                };

                let kind = relationship
                    .as_str()
                    .and_then(RelationshipKind::parse)
                    .ok_or_else(|| LoadError::InvalidSchema {
                        path: format!("{}/relationship", path),
                        message: format!(
                            "unknown relationship {}: expected belongsTo or hasMany",
                            relationship
                        ),
                    })?;
                let target_type = declared.ok_or_else(|| LoadError::InvalidSchema {
                    path: path.to_string(),
                    message: "relationship does not declare a type".to_string(),
                })?;

                Ok(FieldSpec::Relationship(RelationshipSpec {
                    kind,
                    target_type,
                    foreign_key: optional_str(
                        map.get("foreignKey"),
                        &format!("{}/foreignKey", path),
                    )?,
                    through: optional_str(map.get("through"), &format!("{}/through", path))?,
                }))
            }
            other => Err(LoadError::InvalidSchema {
                path: path.to_string(),
                message: format!(
                    "expected string, null or object, got {}",
                    json_type_name(other)
                ),
            }),
        }
    }
}

impl From<RelationshipSpec> for FieldSpec {
    fn from(spec: RelationshipSpec) -> Self {
        FieldSpec::Relationship(spec)
    }
}

fn optional_str(value: Option<&Value>, path: &str) -> Result<Option<String>, LoadError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(LoadError::InvalidSchema {
            path: path.to_string(),
            message: format!("expected string, got {}", json_type_name(other)),
        }),
    }
}

/// Ordered field declarations of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, keeping declaration order.
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.insert(name.into(), spec.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Relationship fields in declaration order.
    pub fn relationships(&self) -> impl Iterator<Item = (&str, &RelationshipSpec)> {
        self.fields
            .iter()
            .filter_map(|(name, spec)| spec.as_relationship().map(|rel| (name.as_str(), rel)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a schema from a JSON object of field specs.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, LoadError> {
        let map = value.as_object().ok_or_else(|| LoadError::InvalidSchema {
            path: path.to_string(),
            message: format!("expected object, got {}", json_type_name(value)),
        })?;

        let mut fields = IndexMap::with_capacity(map.len());
        for (name, spec) in map {
            let field_path = format!("{}/{}", path, name);
            fields.insert(name.clone(), FieldSpec::from_value(spec, &field_path)?);
        }
        Ok(Self { fields })
    }
}

/// Immutable lookup from plural type name to schema.
///
/// Built once at startup; assembly only ever reads from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, type_name: impl Into<String>, schema: Schema) -> Self {
        self.insert(type_name, schema);
        self
    }

    pub fn insert(&mut self, type_name: impl Into<String>, schema: Schema) {
        self.schemas.insert(type_name.into(), schema);
    }

    pub fn get(&self, type_name: &str) -> Option<&Schema> {
        self.schemas.get(type_name)
    }

    /// Look up a schema, failing when the type is not registered.
    pub fn require(&self, type_name: &str) -> Result<&Schema, AssembleError> {
        self.get(type_name)
            .ok_or_else(|| AssembleError::missing_schema(type_name))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Parse a registry from a JSON object of `typeName -> schema`.
    pub fn from_value(value: &Value) -> Result<Self, LoadError> {
        let map = value.as_object().ok_or_else(|| LoadError::InvalidSchema {
            path: "/".to_string(),
            message: format!("expected object, got {}", json_type_name(value)),
        })?;

        let mut registry = Self::new();
        for (type_name, schema) in map {
            let schema = Schema::from_value(schema, &format!("/{}", type_name))?;
            registry.insert(type_name.clone(), schema);
        }
        Ok(registry)
    }
}
