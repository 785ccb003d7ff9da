//! Building resource objects from single records.
//!
//! This layer never looks at relationship fields; see
//! [`relationships`](crate::relationships) for that.

use crate::error::AssembleError;
use crate::links::BaseUrl;
use crate::types::{Id, Record, ResourceIdentifier, ResourceLinks, ResourceObject};

/// Build a resource object for `record`.
///
/// A full object gets a `self` link and every record field except `id` as
/// attributes. A sparse object carries only `type` and `id`; for a missing
/// record the sparse form is `None` rather than an error.
///
/// # Errors
///
/// Returns `AssembleError::InvalidRecord` when a full object is requested
/// for a missing record.
pub fn build(
    resource_type: &str,
    record: Option<&Record>,
    base_url: &BaseUrl,
    sparse: bool,
) -> Result<Option<ResourceObject>, AssembleError> {
    if sparse {
        return Ok(record.map(|r| sparse_resource(resource_type, r.id().clone())));
    }
    full_resource(resource_type, record, base_url).map(Some)
}

/// Build the full form of a resource object.
pub fn full_resource(
    resource_type: &str,
    record: Option<&Record>,
    base_url: &BaseUrl,
) -> Result<ResourceObject, AssembleError> {
    let record = record.ok_or_else(|| {
        AssembleError::invalid_record(resource_type, "expected a record, got null")
    })?;
    let id = record.id().clone();
    let attributes = record.attributes();

    Ok(ResourceObject {
        links: Some(ResourceLinks {
            self_link: base_url.rooted([resource_type, &id.to_string()]),
        }),
        attributes: (!attributes.is_empty()).then(|| attributes.clone()),
        relationships: None,
        resource_type: resource_type.to_string(),
        id,
    })
}

fn sparse_resource(resource_type: &str, id: Id) -> ResourceObject {
    ResourceObject {
        resource_type: resource_type.to_string(),
        id,
        links: None,
        attributes: None,
        relationships: None,
    }
}

/// Identifier for a possibly unresolved reference.
pub fn identifier(resource_type: &str, id: Option<&Id>) -> Option<ResourceIdentifier> {
    id.map(|id| ResourceIdentifier::new(resource_type, id.clone()))
}
