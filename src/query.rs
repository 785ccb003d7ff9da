//! The data-access side of assembly.
//!
//! [`QueryResult`] is what a data-access layer hands back for a read:
//! primary records, optional sideloads and optional attribute overrides.
//! [`RelatedQuery`] describes what a relationship endpoint needs to ask
//! that layer for, and how the answer is shaped before assembly.
//!
//! Writes are expected to return the full written record as a
//! `QueryResult`, which is then assembled exactly like a read.

use serde_json::{Map, Value};

use crate::error::AssembleError;
use crate::inflect::singularize;
use crate::schema::{RelationshipKind, SchemaRegistry};
use crate::types::{
    json_type_name, AssembleOptions, Id, IncludedMap, Overrides, PrimaryData, Record,
};

/// Records returned by the data-access layer for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub data: PrimaryData,
    pub included: Option<IncludedMap>,
    /// Attribute values that take precedence when resolving foreign keys.
    pub defaults: Option<Overrides>,
}

impl QueryResult {
    pub fn new(data: impl Into<PrimaryData>) -> Self {
        Self {
            data: data.into(),
            included: None,
            defaults: None,
        }
    }

    pub fn with_included(mut self, included: IncludedMap) -> Self {
        self.included = Some(included);
        self
    }

    pub fn with_defaults(mut self, defaults: Overrides) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Ingest `{ data, included?, defaults? }`.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::InvalidRecord` for a missing `data` key or
    /// any malformed record.
    pub fn from_value(resource_type: &str, value: &Value) -> Result<Self, AssembleError> {
        let map = value.as_object().ok_or_else(|| {
            AssembleError::invalid_record(
                resource_type,
                format!("expected query result object, got {}", json_type_name(value)),
            )
        })?;

        let data = map.get("data").ok_or_else(|| {
            AssembleError::invalid_record(resource_type, "query result has no data")
        })?;
        let data = PrimaryData::from_value(resource_type, data)?;

        let included = match map.get("included") {
            None | Some(Value::Null) => None,
            Some(value) => Some(IncludedMap::from_value(value)?),
        };

        let defaults = match map.get("defaults") {
            None | Some(Value::Null) => None,
            Some(Value::Object(defaults)) => Some(defaults.clone()),
            Some(other) => {
                return Err(AssembleError::invalid_record(
                    resource_type,
                    format!("defaults must be an object, got {}", json_type_name(other)),
                ))
            }
        };

        Ok(Self {
            data,
            included,
            defaults,
        })
    }
}

/// Which relationship endpoint is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/{type}/{id}/relationships/{field}` - linkage only.
    Linkage,
    /// `/{type}/{id}/{field}` - the related resources themselves.
    Related,
}

/// Fields requested from the data-access layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    All,
    Only(Vec<String>),
}

/// What a relationship endpoint asks the data-access layer for.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedQuery {
    pub owner_type: String,
    pub field: String,
    pub kind: RelationshipKind,
    /// Type of the records to fetch.
    pub target_type: String,
    pub fields: Fields,
    /// Filter criteria, keyed by field name.
    pub params: Map<String, Value>,
    pub through: Option<String>,
    pub endpoint: Endpoint,
    self_link: String,
    related_link: Option<String>,
}

impl RelatedQuery {
    /// Describe the query behind a relationship endpoint.
    ///
    /// The filter key is the relationship's `foreignKey` when declared,
    /// otherwise `id` for `belongsTo` and `{singular owner}_id` for
    /// `hasMany`; its value is the owner's id.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::MissingSchema` for an unregistered owner and
    /// `AssembleError::UnknownRelationship` if `field` is not a relationship.
    pub fn new(
        registry: &SchemaRegistry,
        owner_type: &str,
        field: &str,
        owner_id: &Id,
        endpoint: Endpoint,
    ) -> Result<Self, AssembleError> {
        let schema = registry.require(owner_type)?;
        let spec = schema
            .get(field)
            .and_then(|spec| spec.as_relationship())
            .ok_or_else(|| AssembleError::UnknownRelationship {
                type_name: owner_type.to_string(),
                field: field.to_string(),
            })?;

        let filter_key = match (&spec.foreign_key, spec.kind) {
            (Some(key), _) => key.clone(),
            (None, RelationshipKind::BelongsTo) => "id".to_string(),
            (None, RelationshipKind::HasMany) => format!("{}_id", singularize(owner_type)),
        };
        let mut params = Map::new();
        params.insert(filter_key, Value::from(owner_id.clone()));

        let related = format!("{}/{}/{}", owner_type, owner_id, field);
        let (fields, self_link, related_link) = match endpoint {
            Endpoint::Linkage => (
                Fields::Only(vec!["id".to_string()]),
                format!("{}/{}/relationships/{}", owner_type, owner_id, field),
                Some(related),
            ),
            Endpoint::Related => (Fields::All, related, None),
        };

        Ok(Self {
            owner_type: owner_type.to_string(),
            field: field.to_string(),
            kind: spec.kind,
            target_type: spec.target_type.clone(),
            fields,
            params,
            through: spec.through.clone(),
            endpoint,
            self_link,
            related_link,
        })
    }

    /// Assembly options carrying this endpoint's document links.
    ///
    /// Only the related endpoint forwards sideloaded records.
    pub fn options(&self, included: Option<IncludedMap>) -> AssembleOptions {
        let mut options = AssembleOptions::new().with_self_link(self.self_link.as_str());
        if let Some(related) = &self.related_link {
            options = options.with_related_link(related.as_str());
        }
        match (self.endpoint, included) {
            (Endpoint::Related, Some(included)) => options.with_included(included),
            _ => options,
        }
    }

    /// Shape fetched records to this relationship's cardinality.
    pub fn normalize(&self, data: PrimaryData) -> Result<PrimaryData, AssembleError> {
        normalize_related_data(&self.owner_type, &self.field, self.kind, data)
    }
}

/// Shape related records to the relationship's cardinality.
///
/// `belongsTo` collapses a list to its single element; `hasMany` wraps a
/// single record in a list.
///
/// # Errors
///
/// Returns `AssembleError::AmbiguousCardinality` when a `belongsTo`
/// relationship yields more than one record.
pub fn normalize_related_data(
    owner_type: &str,
    field: &str,
    kind: RelationshipKind,
    data: PrimaryData,
) -> Result<PrimaryData, AssembleError> {
    match (kind, data) {
        (RelationshipKind::BelongsTo, PrimaryData::Collection(records)) => {
            if records.len() > 1 {
                return Err(AssembleError::AmbiguousCardinality {
                    type_name: owner_type.to_string(),
                    field: field.to_string(),
                    count: records.len(),
                });
            }
            Ok(PrimaryData::Single(records.into_iter().next()))
        }
        (RelationshipKind::HasMany, PrimaryData::Single(record)) => Ok(PrimaryData::Collection(
            record.into_iter().collect::<Vec<Record>>(),
        )),
        (_, data) => Ok(data),
    }
}
