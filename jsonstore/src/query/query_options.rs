use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};

/// Options controlling find and count operations.
///
/// `exact` disables the default substring matching; `limit`/`offset` paginate
/// results (an offset is only valid with a positive limit); `filter` is a
/// projection of search-field paths passed through to the store coordinator.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::query::QueryOptions;
///
/// let options = QueryOptions::new().exact().limit(10).offset(5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub(crate) exact: bool,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) filter: Vec<String>,
}

impl QueryOptions {
    /// Creates options with defaults: fuzzy matching, no pagination, no
    /// projection.
    pub fn new() -> QueryOptions {
        QueryOptions::default()
    }

    /// Requires exact value matches instead of substring matching.
    pub fn exact(mut self) -> QueryOptions {
        self.exact = true;
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: i64) -> QueryOptions {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of matching documents to skip. Only valid together
    /// with a positive limit.
    pub fn offset(mut self, offset: i64) -> QueryOptions {
        self.offset = Some(offset);
        self
    }

    /// Restricts returned documents to the given search-field paths.
    pub fn filter(mut self, fields: Vec<String>) -> QueryOptions {
        self.filter = fields;
        self
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn filter_fields(&self) -> &[String] {
        &self.filter
    }

    /// Validates the pagination contract: an offset requires a positive limit.
    pub(crate) fn validate_pagination(&self) -> JsonStoreResult<()> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(0);
        if offset > 0 && limit <= 0 {
            log::error!("Query offset {} given without a positive limit", offset);
            return Err(JsonStoreError::new(
                "Offset requires a positive limit",
                ErrorKind::InvalidOffset,
            ));
        }
        Ok(())
    }
}
