//! Document assembly - the top-level entry point.

use std::sync::Arc;

use crate::error::AssembleError;
use crate::included::aggregate;
use crate::links::BaseUrl;
use crate::relationships::linked_resource;
use crate::schema::SchemaRegistry;
use crate::types::{
    AssembleOptions, Document, DocumentData, Links, Overrides, PrimaryData, Record,
    ResourceObject,
};

/// Stateless JSON:API document assembler.
///
/// Holds the schema registry and base URL fixed at construction. Every
/// [`assemble`](JsonApi::assemble) call is a pure function of its
/// arguments, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct JsonApi {
    registry: Arc<SchemaRegistry>,
    base_url: BaseUrl,
}

impl JsonApi {
    pub fn new(registry: impl Into<Arc<SchemaRegistry>>, base_url: impl AsRef<str>) -> Self {
        Self {
            registry: registry.into(),
            base_url: BaseUrl::new(base_url),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Bind the assembler to one registered type.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::MissingSchema` if the type is not registered.
    pub fn for_type<'a>(&'a self, resource_type: &'a str) -> Result<TypedJsonApi<'a>, AssembleError> {
        self.registry.require(resource_type)?;
        Ok(TypedJsonApi {
            api: self,
            resource_type,
        })
    }

    /// Assemble a JSON:API document for `data` of `resource_type`.
    ///
    /// A single record yields a single resource object and a collection
    /// yields a list; the shape is never changed.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::MissingSchema` if `resource_type` (or any
    /// sideloaded type) is unregistered, `AssembleError::InvalidRecord` for
    /// a missing single record, and `AssembleError::RelationshipConfig` for
    /// a broken `through` declaration.
    pub fn assemble(
        &self,
        resource_type: &str,
        data: impl Into<PrimaryData>,
        options: AssembleOptions,
        overrides: Option<&Overrides>,
    ) -> Result<Document, AssembleError> {
        self.registry.require(resource_type)?;

        let data = data.into();
        let included = options.included.as_ref();
        tracing::debug!(
            resource_type,
            records = data.len(),
            included_groups = included.map_or(0, |m| m.len()),
            "assembling document"
        );

        let build = |record: Option<&Record>| {
            linked_resource(
                resource_type,
                record,
                included,
                &self.registry,
                &self.base_url,
                overrides,
            )
        };
        let data = match data {
            PrimaryData::Single(record) => DocumentData::Single(build(record.as_ref())?),
            PrimaryData::Collection(records) => DocumentData::Collection(
                records
                    .iter()
                    .map(|record| build(Some(record)))
                    .collect::<Result<Vec<ResourceObject>, _>>()?,
            ),
        };

        let links = Links {
            self_link: self
                .base_url
                .join([options.self_link.as_deref().unwrap_or(resource_type)]),
            related: options
                .related_link
                .as_deref()
                .map(|related| self.base_url.join([related])),
        };

        let included = included
            .map(|m| aggregate(m, &self.registry, &self.base_url, overrides))
            .transpose()?;

        Ok(Document {
            links,
            data,
            included,
            meta: options.meta,
        })
    }
}

/// A [`JsonApi`] bound to one registered type.
#[derive(Debug, Clone, Copy)]
pub struct TypedJsonApi<'a> {
    api: &'a JsonApi,
    resource_type: &'a str,
}

impl TypedJsonApi<'_> {
    pub fn resource_type(&self) -> &str {
        self.resource_type
    }

    pub fn assemble(
        &self,
        data: impl Into<PrimaryData>,
        options: AssembleOptions,
        overrides: Option<&Overrides>,
    ) -> Result<Document, AssembleError> {
        self.api
            .assemble(self.resource_type, data, options, overrides)
    }
}
