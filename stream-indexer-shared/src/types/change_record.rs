//! Change records as delivered by the table's change stream.
//!
//! The wire shape follows the stream record format:
//!
//! ```json
//! {
//!   "eventName": "INSERT",
//!   "dynamodb": {
//!     "Keys": {"pk": {"S": "user1"}, "sk": {"S": "save1"}},
//!     "NewImage": {"entityType": {"S": "Save"}},
//!     "ApproximateCreationDateTime": 1718000000
//!   }
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use super::attribute_value::decode_image;

/// Separator placed between key values when deriving a document id.
pub const KEY_SEPARATOR: &str = "#";

/// Document id used when a record carries no keys at all.
pub const UNKNOWN_DOCUMENT_ID: &str = "unknown";

/// Kind of mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Modify,
    Remove,
    /// Any event name this indexer does not understand.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One mutation event from the change stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawChangeRecord")]
pub struct ChangeRecord {
    /// The type of mutation.
    pub event_kind: EventKind,
    /// Key attributes in stream order, still in typed-attribute form.
    pub keys: Map<String, Value>,
    /// Item image after the mutation (absent for removals).
    pub new_image: Option<Map<String, Value>>,
    /// Item image before the mutation, when the stream view includes it.
    pub old_image: Option<Map<String, Value>>,
    /// Approximate creation time of the record on the source side, in seconds.
    pub approximate_creation_time: Option<f64>,
}

impl ChangeRecord {
    /// Create an insert record.
    pub fn insert(keys: Map<String, Value>, new_image: Map<String, Value>) -> Self {
        Self::with_kind(EventKind::Insert, keys, Some(new_image))
    }

    /// Create a modify record.
    pub fn modify(keys: Map<String, Value>, new_image: Map<String, Value>) -> Self {
        Self::with_kind(EventKind::Modify, keys, Some(new_image))
    }

    /// Create a remove record.
    pub fn remove(keys: Map<String, Value>) -> Self {
        Self::with_kind(EventKind::Remove, keys, None)
    }

    fn with_kind(
        event_kind: EventKind,
        keys: Map<String, Value>,
        new_image: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            event_kind,
            keys,
            new_image,
            old_image: None,
            approximate_creation_time: None,
        }
    }

    /// Set the source-side creation time in seconds.
    pub fn with_approximate_creation_time(mut self, seconds: f64) -> Self {
        self.approximate_creation_time = Some(seconds);
        self
    }

    /// Set the image the item had before the mutation.
    pub fn with_old_image(mut self, old_image: Map<String, Value>) -> Self {
        self.old_image = Some(old_image);
        self
    }

    /// Derive the stable document id for this record.
    ///
    /// The key values are joined with `#` in the order the stream lists them,
    /// e.g. `{"pk": {"S": "user1"}, "sk": {"S": "save1"}}` becomes `user1#save1`.
    pub fn document_id(&self) -> String {
        if self.keys.is_empty() {
            return UNKNOWN_DOCUMENT_ID.to_string();
        }

        self.keys
            .values()
            .map(key_text)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// Decode the new image into a plain mapping.
    pub fn decoded_new_image(&self) -> Option<Map<String, Value>> {
        self.new_image.as_ref().map(decode_image)
    }

    /// Decode the old image into a plain mapping.
    pub fn decoded_old_image(&self) -> Option<Map<String, Value>> {
        self.old_image.as_ref().map(decode_image)
    }
}

/// Text of a key attribute: the payload under its type tag, verbatim.
fn key_text(wrapped: &Value) -> String {
    let payload = wrapped
        .as_object()
        .and_then(|object| object.values().next())
        .unwrap_or(wrapped);

    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A batch of change records handed over by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

impl StreamEvent {
    /// Create an event from a list of records.
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Self { records }
    }
}

#[derive(Deserialize)]
struct RawChangeRecord {
    #[serde(rename = "eventName", default)]
    event_name: EventKind,
    #[serde(default)]
    dynamodb: RawStreamRecord,
}

#[derive(Default, Deserialize)]
struct RawStreamRecord {
    #[serde(rename = "Keys", default)]
    keys: Map<String, Value>,
    #[serde(rename = "NewImage")]
    new_image: Option<Map<String, Value>>,
    #[serde(rename = "OldImage")]
    old_image: Option<Map<String, Value>>,
    #[serde(rename = "ApproximateCreationDateTime")]
    approximate_creation_date_time: Option<f64>,
}

impl From<RawChangeRecord> for ChangeRecord {
    fn from(raw: RawChangeRecord) -> Self {
        Self {
            event_kind: raw.event_name,
            keys: raw.dynamodb.keys,
            new_image: raw.dynamodb.new_image,
            old_image: raw.dynamodb.old_image,
            approximate_creation_time: raw.dynamodb.approximate_creation_date_time,
        }
    }
}
