//! Bulk operations and their newline-delimited serialization.
//!
//! A bulk batch alternates action lines and document lines:
//!
//! ```text
//! {"index":{"_index":"saves","_id":"user1#save1","version":1718000000000,"version_type":"external_gte"}}
//! {"entityType":"Save","title":"..."}
//! {"delete":{"_index":"saves","_id":"user1#save2"}}
//! ```
//!
//! Deletes carry no document line and the batch ends with a single newline.

use serde::Serialize;
use serde_json::json;

use super::document::Document;

/// Concurrency policy attached to versioned writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    /// Apply the write only if its version is greater than or equal to the stored one.
    ExternalGte,
}

/// The action half of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
    Index,
    Delete,
}

/// A single operation inside a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Write the full document under an external version.
    Index {
        index: String,
        id: String,
        version: i64,
        version_type: VersionType,
        document: Document,
    },
    /// Remove the document.
    Delete { index: String, id: String },
}

impl BulkOperation {
    /// Create a versioned index operation using the `external_gte` policy.
    pub fn index(
        index: impl Into<String>,
        id: impl Into<String>,
        version: i64,
        document: Document,
    ) -> Self {
        Self::Index {
            index: index.into(),
            id: id.into(),
            version,
            version_type: VersionType::ExternalGte,
            document,
        }
    }

    /// Create a delete operation.
    pub fn delete(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Delete {
            index: index.into(),
            id: id.into(),
        }
    }

    pub fn action(&self) -> BulkAction {
        match self {
            Self::Index { .. } => BulkAction::Index,
            Self::Delete { .. } => BulkAction::Delete,
        }
    }

    pub fn index_name(&self) -> &str {
        match self {
            Self::Index { index, .. } | Self::Delete { index, .. } => index,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    /// The action descriptor line.
    pub fn action_line(&self) -> serde_json::Value {
        match self {
            Self::Index {
                index,
                id,
                version,
                version_type,
                ..
            } => json!({
                "index": {
                    "_index": index,
                    "_id": id,
                    "version": version,
                    "version_type": version_type,
                }
            }),
            Self::Delete { index, id } => json!({
                "delete": {
                    "_index": index,
                    "_id": id,
                }
            }),
        }
    }

    /// The document line, present only for index operations.
    pub fn body(&self) -> Option<&Document> {
        match self {
            Self::Index { document, .. } => Some(document),
            Self::Delete { .. } => None,
        }
    }
}

/// An ordered set of bulk operations delivered as one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkBatch {
    operations: Vec<BulkOperation>,
}

impl BulkBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: BulkOperation) {
        self.operations.push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations (not lines) in the batch.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    /// Serialize the batch as newline-delimited JSON with a trailing newline.
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut lines = Vec::with_capacity(self.operations.len() * 2);
        for operation in &self.operations {
            lines.push(serde_json::to_string(&operation.action_line())?);
            if let Some(document) = operation.body() {
                lines.push(serde_json::to_string(document)?);
            }
        }

        let mut body = lines.join("\n");
        body.push('\n');
        Ok(body)
    }
}

impl FromIterator<BulkOperation> for BulkBatch {
    fn from_iter<I: IntoIterator<Item = BulkOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}
