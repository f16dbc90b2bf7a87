use crate::index::{IndexSchema, SearchFieldType};
use indexmap::IndexMap;
use serde_json::Value;

/// Options for provisioning a collection.
///
/// Carries the collection name (case kept as provided), the declared search
/// fields, any additional search fields, and whether an existing table should
/// be dropped and recreated first.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::collection::ProvisionOptions;
///
/// let options = ProvisionOptions::new("people")
///     .search_field("name", "string")
///     .search_field("age", "integer");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    pub(crate) collection_name: String,
    pub(crate) schema: IndexSchema,
    pub(crate) drop_first: bool,
}

impl ProvisionOptions {
    pub fn new(collection_name: &str) -> ProvisionOptions {
        ProvisionOptions {
            collection_name: collection_name.to_string(),
            schema: IndexSchema::new(),
            drop_first: false,
        }
    }

    /// Declares a primary search field with its type name.
    pub fn search_field(mut self, path: &str, type_name: &str) -> ProvisionOptions {
        self.schema
            .add_search_field(path, SearchFieldType::parse(type_name));
        self
    }

    /// Declares an additional search field with its type name.
    pub fn additional_search_field(mut self, path: &str, type_name: &str) -> ProvisionOptions {
        self.schema
            .add_additional_search_field(path, SearchFieldType::parse(type_name));
        self
    }

    /// Drops any existing table for this collection before creating it.
    pub fn drop_first(mut self) -> ProvisionOptions {
        self.drop_first = true;
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }
}

/// Options for `add_data`.
///
/// `additional_search_fields` supplies values for additional search fields
/// that are not present in the document payload itself; they are indexed
/// alongside the extracted values.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub(crate) additional_search_fields: IndexMap<String, Value>,
}

impl AddOptions {
    pub fn new() -> AddOptions {
        AddOptions::default()
    }

    pub fn additional_search_field(mut self, path: &str, value: Value) -> AddOptions {
        self.additional_search_fields
            .insert(path.to_lowercase(), value);
        self
    }

    pub fn additional_search_fields(&self) -> &IndexMap<String, Value> {
        &self.additional_search_fields
    }
}

/// Options for `remove`.
///
/// By default removal is a dirty-tracked soft delete resolved with fuzzy
/// matching; `exact` switches to exact resolution and `erase` to permanent
/// deletion.
#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub(crate) exact: bool,
    pub(crate) is_erase: bool,
}

impl RemoveOptions {
    pub fn new() -> RemoveOptions {
        RemoveOptions::default()
    }

    pub fn exact(mut self) -> RemoveOptions {
        self.exact = true;
        self
    }

    pub fn erase(mut self) -> RemoveOptions {
        self.is_erase = true;
        self
    }
}

/// Options for `change_data`.
///
/// `replace_criteria` names the search fields used to locate existing
/// documents; `add_new` inserts inputs that match nothing; `mark_dirty`
/// controls change tracking for the resulting writes.
#[derive(Debug, Clone, Default)]
pub struct ChangeOptions {
    pub(crate) replace_criteria: Vec<String>,
    pub(crate) add_new: bool,
    pub(crate) mark_dirty: bool,
}

impl ChangeOptions {
    pub fn new() -> ChangeOptions {
        ChangeOptions::default()
    }

    pub fn replace_criteria(mut self, fields: Vec<String>) -> ChangeOptions {
        self.replace_criteria = fields;
        self
    }

    pub fn add_new(mut self) -> ChangeOptions {
        self.add_new = true;
        self
    }

    pub fn mark_dirty(mut self) -> ChangeOptions {
        self.mark_dirty = true;
        self
    }
}
