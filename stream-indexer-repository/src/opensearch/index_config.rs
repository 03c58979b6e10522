//! OpenSearch index configuration and mappings.
//!
//! This module defines the target index names and the fixed mapping applied
//! when an index is created.

use serde_json::{json, Value};

/// Default name of the primary (saves) index.
pub const DEFAULT_PRIMARY_INDEX: &str = "saves";

/// Default name of the discovery tag index.
pub const DEFAULT_TAG_INDEX: &str = "discovertags";

/// Names of the indices the indexer writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index receiving saves.
    pub primary_index: String,
    /// Index receiving discovery tags.
    pub tag_index: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `primary_index` - The primary index name
    /// * `tag_index` - The tag index name
    pub fn new(primary_index: impl Into<String>, tag_index: impl Into<String>) -> Self {
        Self {
            primary_index: primary_index.into(),
            tag_index: tag_index.into(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_INDEX, DEFAULT_TAG_INDEX)
    }
}

/// Get the settings and mappings applied when creating an index.
///
/// The configuration includes:
/// - **Dynamic template**: every otherwise unmapped string becomes `text`
///   with a `keyword` sub-field, so it is both searchable and filterable
/// - **Keyword fields**: identifiers, URLs and image references
/// - **Text fields**: title, description, comments and enrichment tags
/// - **Date fields**: audit timestamps
///
/// # Sharding Configuration
///
/// - 1 primary shard
pub fn index_mapping() -> Value {
    json!({
        "settings": {
            "index": {
                "number_of_shards": 1
            }
        },
        "mappings": {
            "dynamic": true,
            "dynamic_templates": [
                {
                    "strings_as_text_and_keyword": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "type": "text",
                            "fields": {
                                "keyword": {
                                    "type": "keyword",
                                    "ignore_above": 256
                                }
                            }
                        }
                    }
                }
            ],
            "properties": {
                "username": { "type": "keyword" },
                "url": { "type": "keyword" },
                "title": { "type": "text" },
                "description": { "type": "text" },
                "publisher": { "type": "keyword" },
                "image": { "type": "keyword" },
                "imageKey": { "type": "keyword" },
                "thirdPartyImage": { "type": "keyword" },
                "comments": { "type": "text" },
                "enrichments": {
                    "type": "text",
                    "fields": {
                        "keyword": { "type": "keyword", "ignore_above": 256 }
                    }
                },
                "isArchived": { "type": "boolean" },
                "isBroken": { "type": "boolean" },
                "createdAt": { "type": "date" },
                "updatedAt": { "type": "date" },
                "entityType": { "type": "keyword" },
                "id": { "type": "keyword" },
                "pk": { "type": "keyword" },
                "sk": { "type": "keyword" }
            }
        }
    })
}
