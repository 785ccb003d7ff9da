//! Flattening sideloaded records into the document's `included` list.

use crate::error::AssembleError;
use crate::links::BaseUrl;
use crate::relationships::linked_resource;
use crate::schema::SchemaRegistry;
use crate::types::{IncludedMap, Overrides, ResourceObject};

/// Build full resource objects for every sideloaded record.
///
/// Order is type-group order, then record order within each group.
/// Relationships of included resources resolve against the same
/// `included` snapshot; nothing is fetched or followed beyond it, and
/// duplicates are emitted as given.
///
/// # Errors
///
/// Returns `AssembleError::MissingSchema` for a sideloaded type without a
/// registered schema.
pub fn aggregate(
    included: &IncludedMap,
    registry: &SchemaRegistry,
    base_url: &BaseUrl,
    overrides: Option<&Overrides>,
) -> Result<Vec<ResourceObject>, AssembleError> {
    let mut resources = Vec::with_capacity(included.record_count());
    for (resource_type, records) in included.iter() {
        for record in records {
            resources.push(linked_resource(
                resource_type,
                Some(record),
                Some(included),
                registry,
                base_url,
                overrides,
            )?);
        }
    }
    Ok(resources)
}
