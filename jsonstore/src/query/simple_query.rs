use crate::common::FIELD_ID;
use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use indexmap::IndexMap;
use serde_json::Value;

/// A simple equality query against one collection.
///
/// One ordered `field -> values` map: values within one field are OR'd,
/// fields within the map are AND'd. A slice of `SimpleQuery` passed to
/// `find_with_queries` is OR'd across elements (with result deduplication).
///
/// Built from a JSON object where each field maps to a scalar or to an array
/// of scalars:
///
/// ```rust,ignore
/// use jsonstore::query::SimpleQuery;
/// use serde_json::json;
///
/// // name = "Bo" AND (age = 20 OR age = 21)
/// let query = SimpleQuery::from_value(&json!({"name": "Bo", "age": [20, 21]}))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleQuery {
    clauses: IndexMap<String, Vec<Value>>,
}

impl SimpleQuery {
    pub fn new() -> SimpleQuery {
        SimpleQuery::default()
    }

    /// Builds an exact-match query on the document identifier.
    pub fn with_id(id: &Value) -> SimpleQuery {
        let mut query = SimpleQuery::new();
        query.add_clause(FIELD_ID, id.clone());
        query
    }

    /// Parses a query from a JSON object. Field names are lowercased to match
    /// index paths; array values expand to OR'd alternatives.
    pub fn from_value(value: &Value) -> JsonStoreResult<SimpleQuery> {
        let object = match value.as_object() {
            Some(object) => object,
            None => {
                log::error!("Simple query must be a JSON object, got: {}", value);
                return Err(JsonStoreError::new(
                    "Simple query must be a JSON object",
                    ErrorKind::InvalidSearchField,
                ));
            }
        };

        let mut query = SimpleQuery::new();
        for (field, field_value) in object {
            match field_value {
                Value::Array(alternatives) => {
                    for alternative in alternatives {
                        query.add_clause(field, alternative.clone());
                    }
                }
                scalar => query.add_clause(field, scalar.clone()),
            }
        }
        Ok(query)
    }

    /// Adds one acceptable value for a field. Repeated calls on the same
    /// field OR the values together.
    pub fn add_clause(&mut self, field: &str, value: Value) {
        self.clauses
            .entry(field.to_lowercase())
            .or_default()
            .push(value);
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &IndexMap<String, Vec<Value>> {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
