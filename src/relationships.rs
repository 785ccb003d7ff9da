//! Relationship resolution for built resources.
//!
//! Every relationship field of the resource's schema yields an entry with
//! `self`/`related` links. Linkage `data` is only attached when it can be
//! resolved: from the foreign-key attribute for `belongsTo`, or from the
//! sideloaded records for `hasMany`.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::AssembleError;
use crate::inflect::singularize;
use crate::links::BaseUrl;
use crate::resource;
use crate::schema::{RelationshipKind, RelationshipSpec, SchemaRegistry};
use crate::types::{
    Id, IncludedMap, Linkage, Overrides, Record, RelationshipLinkage, RelationshipLinks,
    ResourceIdentifier, ResourceObject,
};

/// Relationship name to linkage, in schema declaration order.
pub type Relationships = IndexMap<String, RelationshipLinkage>;

/// Compute the `relationships` block for a built resource.
///
/// `overrides` take precedence over the resource's own attributes when
/// reading `belongsTo` foreign keys; they never change emitted attributes.
///
/// # Errors
///
/// Returns `AssembleError::MissingSchema` if `resource_type` (or a `through`
/// schema) is not registered, `AssembleError::RelationshipConfig` if a
/// `through` schema lacks the expected typed field, and
/// `AssembleError::InvalidRecord` for a `belongsTo` foreign key that is
/// neither an integer nor a string.
pub fn resolve(
    resource_type: &str,
    resource: &ResourceObject,
    included: Option<&IncludedMap>,
    registry: &SchemaRegistry,
    base_url: &BaseUrl,
    overrides: Option<&Overrides>,
) -> Result<Relationships, AssembleError> {
    let schema = registry.require(resource_type)?;
    let id = resource.id.to_string();

    let mut relationships = Relationships::new();
    for (name, spec) in schema.relationships() {
        let links = RelationshipLinks {
            self_link: base_url.rooted([resource_type, &id, "relationships", name]),
            related: base_url.rooted([resource_type, &id, name]),
        };
        let data = match spec.kind {
            RelationshipKind::BelongsTo => {
                belongs_to_linkage(resource_type, name, spec, resource, overrides)?
            }
            RelationshipKind::HasMany => {
                has_many_linkage(resource_type, name, spec, resource, included, registry)?
            }
        };

        tracing::trace!(
            resource_type,
            id = %resource.id,
            relationship = name,
            linked = data.is_some(),
            "resolved relationship"
        );
        relationships.insert(name.to_string(), RelationshipLinkage { links, data });
    }

    Ok(relationships)
}

/// Effective type holding the rows of a `hasMany` relationship.
///
/// For `through` relationships this is the declared type of the join
/// schema's field named by the foreign key (or the singular relationship
/// name).
pub fn join_type<'a>(
    owner_type: &str,
    name: &str,
    spec: &'a RelationshipSpec,
    registry: &'a SchemaRegistry,
) -> Result<&'a str, AssembleError> {
    let Some(through) = spec.through.as_deref() else {
        return Ok(&spec.target_type);
    };

    let through_schema = registry.require(through)?;
    let key = spec
        .foreign_key
        .clone()
        .unwrap_or_else(|| singularize(name));
    let config_error = |message: String| AssembleError::RelationshipConfig {
        type_name: owner_type.to_string(),
        field: name.to_string(),
        through: through.to_string(),
        message,
    };

    let sibling = through_schema.get(&key).ok_or_else(|| {
        config_error(format!(
            "the {} schema does not define a {} field",
            through, key
        ))
    })?;
    sibling
        .declared_type()
        .ok_or_else(|| config_error(format!("the {} field does not declare a type", key)))
}

/// Foreign-key field that points from a related row back to its owner.
pub fn owner_foreign_key(owner_type: &str, spec: &RelationshipSpec) -> String {
    spec.foreign_key
        .clone()
        .unwrap_or_else(|| format!("{}_id", singularize(owner_type)))
}

fn belongs_to_linkage(
    owner_type: &str,
    name: &str,
    spec: &RelationshipSpec,
    resource: &ResourceObject,
    overrides: Option<&Overrides>,
) -> Result<Option<Linkage>, AssembleError> {
    let key = spec
        .foreign_key
        .clone()
        .unwrap_or_else(|| format!("{}_id", name));
    let value = overrides
        .and_then(|o| o.get(&key))
        .or_else(|| resource.attributes.as_ref().and_then(|a| a.get(&key)));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match Id::from_value(value) {
            Some(id) => Ok(resource::identifier(&spec.target_type, Some(&id)).map(Linkage::One)),
            None => Err(AssembleError::invalid_record(
                owner_type,
                format!(
                    "foreign key {} must be an integer or string, got {}",
                    key, value
                ),
            )),
        },
    }
}

fn has_many_linkage(
    owner_type: &str,
    name: &str,
    spec: &RelationshipSpec,
    resource: &ResourceObject,
    included: Option<&IncludedMap>,
    registry: &SchemaRegistry,
) -> Result<Option<Linkage>, AssembleError> {
    let join_type = join_type(owner_type, name, spec, registry)?;
    let Some(rows) = included.and_then(|m| m.get(join_type)) else {
        return Ok(None);
    };

    let foreign_key = owner_foreign_key(owner_type, spec);
    let identifiers = rows
        .iter()
        .filter(|row| references(row, &foreign_key, &resource.id))
        .map(|row| ResourceIdentifier::new(spec.target_type.clone(), row.id().clone()))
        .collect();

    Ok(Some(Linkage::Many(identifiers)))
}

fn references(row: &Record, foreign_key: &str, id: &Id) -> bool {
    row.get(foreign_key)
        .and_then(Id::from_value)
        .is_some_and(|value| &value == id)
}

/// Build a full resource and attach its resolved relationships.
pub(crate) fn linked_resource(
    resource_type: &str,
    record: Option<&Record>,
    included: Option<&IncludedMap>,
    registry: &SchemaRegistry,
    base_url: &BaseUrl,
    overrides: Option<&Overrides>,
) -> Result<ResourceObject, AssembleError> {
    let mut resource = resource::full_resource(resource_type, record, base_url)?;
    let relationships = resolve(
        resource_type,
        &resource,
        included,
        registry,
        base_url,
        overrides,
    )?;
    if !relationships.is_empty() {
        resource.relationships = Some(relationships);
    }
    Ok(resource)
}
