//! Core types: records coming in, JSON:API resources and documents going out.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AssembleError;

/// Per-call attribute overrides supplied by the data-access layer.
pub type Overrides = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical record identifier.
///
/// Integers and strings holding the canonical decimal form of an integer
/// both become `Int`, so `1` and `"1"` identify the same record. Any other
/// string is kept as `Str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl Id {
    /// Normalize a string id.
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Id::Int(n),
            _ => Id::Str(s.to_string()),
        }
    }

    /// Normalize a JSON scalar into an id.
    ///
    /// Integers beyond `i64` keep their decimal form as `Str`. Returns
    /// `None` for null, booleans, floats and containers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Some(Id::Int(i)),
                (None, Some(u)) => Some(Id::Str(u.to_string())),
                (None, None) => None,
            },
            Value::String(s) => Some(Id::parse(s)),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{}", n),
            Id::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Int(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Int(i64::from(n))
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::parse(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::parse(&s)
    }
}

impl From<Id> for Value {
    fn from(id: Id) -> Self {
        match id {
            Id::Int(n) => Value::from(n),
            Id::Str(s) => Value::String(s),
        }
    }
}

/// A flat data-layer record: an id plus ordered scalar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Id,
    attributes: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Append a field. An `id` key replaces the record id.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "id" {
            if let Some(id) = Id::from_value(&value) {
                self.id = id;
            }
        } else {
            self.attributes.insert(key, value);
        }
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Every field except `id`, in the record's own order.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Ingest a raw JSON record.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::InvalidRecord` unless the value is an object
    /// with a valid `id` whose other fields are all scalars.
    pub fn from_value(type_name: &str, value: &Value) -> Result<Self, AssembleError> {
        let map = value.as_object().ok_or_else(|| {
            AssembleError::invalid_record(
                type_name,
                format!("expected object, got {}", json_type_name(value)),
            )
        })?;

        let id = match map.get("id") {
            Some(raw) => Id::from_value(raw).ok_or_else(|| {
                AssembleError::invalid_record(
                    type_name,
                    format!("id must be an integer or string, got {}", raw),
                )
            })?,
            None => return Err(AssembleError::invalid_record(type_name, "missing id")),
        };

        let mut attributes = Map::new();
        for (key, field) in map {
            if key == "id" {
                continue;
            }
            if field.is_array() || field.is_object() {
                return Err(AssembleError::invalid_record(
                    type_name,
                    format!(
                        "field {} must be a scalar, got {}",
                        key,
                        json_type_name(field)
                    ),
                ));
            }
            attributes.insert(key.clone(), field.clone());
        }

        Ok(Self { id, attributes })
    }
}

/// Sideloaded records grouped by type, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncludedMap {
    groups: IndexMap<String, Vec<Record>>,
}

impl IncludedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, type_name: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(type_name, records);
        self
    }

    /// Append records to a type group, creating it at the end if new.
    pub fn insert(&mut self, type_name: impl Into<String>, records: Vec<Record>) {
        self.groups
            .entry(type_name.into())
            .or_default()
            .extend(records);
    }

    pub fn get(&self, type_name: &str) -> Option<&[Record]> {
        self.groups.get(type_name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.groups
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of type groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Ingest a JSON object of `typeName -> record | record[]`.
    pub fn from_value(value: &Value) -> Result<Self, AssembleError> {
        let map = value.as_object().ok_or_else(|| {
            AssembleError::invalid_record(
                "included",
                format!("expected object, got {}", json_type_name(value)),
            )
        })?;

        let mut included = Self::new();
        for (type_name, group) in map {
            let records = match group {
                Value::Array(items) => items
                    .iter()
                    .map(|item| Record::from_value(type_name, item))
                    .collect::<Result<Vec<_>, _>>()?,
                single => vec![Record::from_value(type_name, single)?],
            };
            included.insert(type_name.clone(), records);
        }
        Ok(included)
    }
}

/// Primary data handed to the assembler: one (possibly missing) record or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryData {
    Single(Option<Record>),
    Collection(Vec<Record>),
}

impl PrimaryData {
    pub fn len(&self) -> usize {
        match self {
            PrimaryData::Single(record) => usize::from(record.is_some()),
            PrimaryData::Collection(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ingest raw primary data: `null`, a record object, or an array of records.
    pub fn from_value(type_name: &str, value: &Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(PrimaryData::Single(None)),
            Value::Array(items) => items
                .iter()
                .map(|item| Record::from_value(type_name, item))
                .collect::<Result<Vec<_>, _>>()
                .map(PrimaryData::Collection),
            other => Record::from_value(type_name, other).map(|r| PrimaryData::Single(Some(r))),
        }
    }
}

impl From<Record> for PrimaryData {
    fn from(record: Record) -> Self {
        PrimaryData::Single(Some(record))
    }
}

impl From<Option<Record>> for PrimaryData {
    fn from(record: Option<Record>) -> Self {
        PrimaryData::Single(record)
    }
}

impl From<Vec<Record>> for PrimaryData {
    fn from(records: Vec<Record>) -> Self {
        PrimaryData::Collection(records)
    }
}

/// Options for a single assembly call.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Path of the document's self link, relative to the base URL.
    /// Defaults to the primary type name.
    pub self_link: Option<String>,
    pub related_link: Option<String>,
    /// Sideloaded records, emitted under `included`.
    pub included: Option<IncludedMap>,
    /// Copied verbatim onto the document.
    pub meta: Option<Value>,
}

impl AssembleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_self_link(mut self, path: impl Into<String>) -> Self {
        self.self_link = Some(path.into());
        self
    }

    pub fn with_related_link(mut self, path: impl Into<String>) -> Self {
        self.related_link = Some(path.into());
        self
    }

    pub fn with_included(mut self, included: IncludedMap) -> Self {
        self.included = Some(included);
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

// --- Output wire format ---

/// Minimal `{ type, id }` reference to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Id,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<Id>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// A resource object, full or sparse.
///
/// Sparse objects carry only `type` and `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<ResourceLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<IndexMap<String, RelationshipLinkage>>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.resource_type.clone(), self.id.clone())
    }

    pub fn is_sparse(&self) -> bool {
        self.links.is_none() && self.attributes.is_none() && self.relationships.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub related: String,
}

/// Linkage data of a relationship: one identifier or many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Linkage {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipLinkage {
    pub links: RelationshipLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,
}

/// Top-level document links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

/// Primary data of a document; mirrors the shape of the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentData {
    Single(ResourceObject),
    Collection(Vec<ResourceObject>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub links: Links,
    pub data: DocumentData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_normalizes_integer_strings() {
        assert_eq!(Id::parse("12"), Id::Int(12));
        assert_eq!(Id::parse("-3"), Id::Int(-3));
        assert_eq!(Id::parse("012"), Id::Str("012".into()));
        assert_eq!(Id::parse("abc"), Id::Str("abc".into()));
    }

    #[test]
    fn id_from_json_scalars() {
        assert_eq!(Id::from_value(&json!(7)), Some(Id::Int(7)));
        assert_eq!(Id::from_value(&json!("7")), Some(Id::Int(7)));
        assert_eq!(Id::from_value(&json!(null)), None);
        assert_eq!(Id::from_value(&json!(1.5)), None);
        assert_eq!(Id::from_value(&json!(true)), None);
        assert_eq!(
            Id::from_value(&json!(u64::MAX)),
            Some(Id::Str(u64::MAX.to_string()))
        );
    }

    #[test]
    fn id_serializes_as_scalar() {
        assert_eq!(serde_json::to_value(Id::Int(1)).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(Id::from("a-1")).unwrap(), json!("a-1"));
    }

    #[test]
    fn record_from_value_keeps_field_order() {
        let record = Record::from_value(
            "stuffs",
            &json!({ "title": "foo", "id": 1, "thing_id": 1, "count": null }),
        )
        .unwrap();

        assert_eq!(record.id(), &Id::Int(1));
        let keys: Vec<&str> = record.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "thing_id", "count"]);
    }

    #[test]
    fn record_from_value_rejects_bad_shapes() {
        assert!(matches!(
            Record::from_value("stuffs", &json!(null)),
            Err(AssembleError::InvalidRecord { .. })
        ));
        assert!(Record::from_value("stuffs", &json!({ "title": "no id" })).is_err());
        assert!(Record::from_value("stuffs", &json!({ "id": 1.5 })).is_err());
        assert!(Record::from_value("stuffs", &json!({ "id": 1, "tags": ["a"] })).is_err());
    }

    #[test]
    fn included_accepts_single_objects() {
        let included = IncludedMap::from_value(&json!({
            "foos": { "id": 2, "name": "bar" },
            "bars": [{ "id": 1 }, { "id": 2 }]
        }))
        .unwrap();

        assert_eq!(included.len(), 2);
        assert_eq!(included.get("foos").map(<[Record]>::len), Some(1));
        assert_eq!(included.record_count(), 3);
        let order: Vec<&str> = included.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["foos", "bars"]);
    }

    #[test]
    fn primary_data_shapes() {
        assert_eq!(
            PrimaryData::from_value("things", &Value::Null).unwrap(),
            PrimaryData::Single(None)
        );
        assert!(matches!(
            PrimaryData::from_value("things", &json!([{ "id": 1 }])).unwrap(),
            PrimaryData::Collection(records) if records.len() == 1
        ));
        assert!(matches!(
            PrimaryData::from_value("things", &json!({ "id": 1 })).unwrap(),
            PrimaryData::Single(Some(_))
        ));
    }

    #[test]
    fn sparse_resource_serializes_type_and_id_only() {
        let resource = ResourceObject {
            resource_type: "users".into(),
            id: Id::Int(3),
            links: None,
            attributes: None,
            relationships: None,
        };
        assert!(resource.is_sparse());
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({ "type": "users", "id": 3 })
        );
    }
}
