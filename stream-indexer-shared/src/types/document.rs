//! Plain documents decoded from change record images.
//!
//! A document keeps every attribute of the source item; the indexer only
//! interprets a handful of well-known fields (see [`fields`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names of the document fields the indexer reads or writes.
pub mod fields {
    pub const ENTITY_TYPE: &str = "entityType";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const URL: &str = "url";
    pub const IMAGE: &str = "image";
    pub const THIRD_PARTY_IMAGE: &str = "thirdPartyImage";
    pub const COMMENTS: &str = "comments";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    /// Older writers stored the update time under this name.
    pub const TIMESTAMP: &str = "timestamp";
    pub const ENRICHMENTS: &str = "enrichments";
    pub const IS_BROKEN: &str = "isBroken";
}

/// Entity kinds the indexer knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// A saved link; the primary content entity.
    Save,
    /// A curated discovery tag.
    DiscoverTag,
}

impl EntityType {
    /// Parse the `entityType` discriminator. Unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Save" => Some(Self::Save),
            "DiscoverTag" => Some(Self::DiscoverTag),
            _ => None,
        }
    }

    /// The discriminator text as stored in the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "Save",
            Self::DiscoverTag => "DiscoverTag",
        }
    }

    /// Whether documents of this type are sent to the enrichment service.
    pub fn is_enrichable(&self) -> bool {
        matches!(self, Self::Save)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded document, serialized as-is into the bulk request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wrap a plain mapping.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Read a field only when it holds a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The raw `entityType` discriminator, if it is a string.
    pub fn entity_type_name(&self) -> Option<&str> {
        self.get_str(fields::ENTITY_TYPE)
    }

    /// The recognized entity type of this document.
    pub fn entity_type(&self) -> Option<EntityType> {
        self.entity_type_name().and_then(EntityType::parse)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str(fields::TITLE)
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str(fields::DESCRIPTION)
    }

    pub fn url(&self) -> Option<&str> {
        self.get_str(fields::URL)
    }

    /// Preferred image for display: the stored image, else the third-party one.
    pub fn image(&self) -> Option<&str> {
        self.get_str(fields::IMAGE)
            .or_else(|| self.get_str(fields::THIRD_PARTY_IMAGE))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
