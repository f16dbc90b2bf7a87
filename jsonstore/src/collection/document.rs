use crate::common::{FIELD_DIRTY, FIELD_ID, FIELD_JSON, FIELD_OPERATION};
use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

/// Sync operation tag tracked per document.
///
/// Records the kind of local mutation that made a document dirty, so sync
/// tooling can translate it to the right remote call. `Delete` documents are
/// soft-deleted: they stay in the table until marked clean, at which point
/// they are purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOperation {
    /// Document was created locally
    Insert,
    /// Document payload was replaced locally
    Update,
    /// Document was logically removed locally
    Delete,
    /// Document is in sync with the remote
    None,
}

impl DocumentOperation {
    /// Parses an operation tag from its wire form.
    ///
    /// Unknown tags map to `None` rather than failing; sync metadata written
    /// by older versions must not make a document unreadable.
    pub fn parse(value: &str) -> DocumentOperation {
        match value {
            "insert" => DocumentOperation::Insert,
            "update" => DocumentOperation::Update,
            "delete" => DocumentOperation::Delete,
            _ => DocumentOperation::None,
        }
    }

    /// Returns the wire form of the operation tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentOperation::Insert => "insert",
            DocumentOperation::Update => "update",
            DocumentOperation::Delete => "delete",
            DocumentOperation::None => "",
        }
    }
}

impl Display for DocumentOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A JSON document stored in a collection.
///
/// A document couples a caller-supplied JSON payload with system metadata: a
/// unique identifier assigned on first store (immutable afterwards), a dirty
/// flag, and a sync [`DocumentOperation`] tag. The wire form is the JSON
/// object `{"_id": .., "json": .., "_dirty": 0|1, "_operation": ".."}`.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::collection::Document;
/// use serde_json::json;
///
/// let doc = Document::new(json!({"name": "carlos", "age": 99}));
/// assert!(doc.id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: Option<i64>,
    json: Value,
    dirty: bool,
    operation: DocumentOperation,
}

impl Document {
    /// Creates a new unsaved document wrapping the given payload.
    pub fn new(json: Value) -> Document {
        Document {
            id: None,
            json,
            dirty: false,
            operation: DocumentOperation::None,
        }
    }

    /// Creates a document with full metadata. Used by store coordinators when
    /// materializing rows.
    pub fn with_metadata(
        id: i64,
        json: Value,
        dirty: bool,
        operation: DocumentOperation,
    ) -> Document {
        Document {
            id: Some(id),
            json,
            dirty,
            operation,
        }
    }

    /// Parses a document from its wire form.
    ///
    /// Accepts either a bare payload object (no `_id` field) or the full
    /// `{_id, json, ...}` envelope. Fails with `DocumentParseFailure` when the
    /// value is not a JSON object.
    pub fn from_value(value: &Value) -> JsonStoreResult<Document> {
        let object = match value.as_object() {
            Some(object) => object,
            None => {
                log::error!("Cannot parse document from non-object value: {}", value);
                return Err(JsonStoreError::new(
                    "Document must be a JSON object",
                    ErrorKind::DocumentParseFailure,
                ));
            }
        };

        let id = match object.get(FIELD_ID) {
            Some(id_value) => match id_value.as_i64() {
                Some(id) => Some(id),
                None => {
                    log::error!("Document carries a non-integer _id: {}", id_value);
                    return Err(JsonStoreError::new(
                        "Document _id must be an integer",
                        ErrorKind::DocumentParseFailure,
                    ));
                }
            },
            None => None,
        };

        // a bare payload has no envelope; the whole object is the json field
        let json = match object.get(FIELD_JSON) {
            Some(payload) => payload.clone(),
            None if id.is_none() => value.clone(),
            None => Value::Object(Default::default()),
        };

        let dirty = object
            .get(FIELD_DIRTY)
            .map(|v| v.as_i64().unwrap_or(0) != 0 || v.as_bool().unwrap_or(false))
            .unwrap_or(false);

        let operation = object
            .get(FIELD_OPERATION)
            .and_then(|v| v.as_str())
            .map(DocumentOperation::parse)
            .unwrap_or(DocumentOperation::None);

        Ok(Document {
            id,
            json,
            dirty,
            operation,
        })
    }

    /// Serializes the document to its wire form.
    ///
    /// Unsaved documents (no id yet) serialize as their bare payload.
    pub fn to_value(&self) -> Value {
        match self.id {
            Some(id) => json!({
                FIELD_ID: id,
                FIELD_JSON: self.json,
                FIELD_DIRTY: if self.dirty { 1 } else { 0 },
                FIELD_OPERATION: self.operation.as_str(),
            }),
            None => self.json.clone(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// The caller-supplied JSON payload.
    pub fn payload(&self) -> &Value {
        &self.json
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn operation(&self) -> DocumentOperation {
        self.operation
    }
}
