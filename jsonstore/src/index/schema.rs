use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// Declared type of a search field.
///
/// The type name is part of the provisioning contract; it decides the column
/// affinity the store coordinator materializes for the path. Unrecognized
/// names fall back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFieldType {
    String,
    Integer,
    Number,
    Boolean,
}

impl SearchFieldType {
    pub fn parse(value: &str) -> SearchFieldType {
        match value.to_lowercase().as_str() {
            "integer" => SearchFieldType::Integer,
            "number" => SearchFieldType::Number,
            "boolean" => SearchFieldType::Boolean,
            _ => SearchFieldType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchFieldType::String => "string",
            SearchFieldType::Integer => "integer",
            SearchFieldType::Number => "number",
            SearchFieldType::Boolean => "boolean",
        }
    }
}

impl Display for SearchFieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The indexing schema declared for a collection at provisioning time.
///
/// Maps dotted field paths (`address.city`) to declared types. Paths are
/// always lowercased on insertion; the extractor only recognizes declared
/// paths. A secondary map holds *additional* search fields: paths indexed for
/// querying but not part of the primary schema contract.
///
/// Declaration order is preserved (the coordinator materializes columns in
/// this order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSchema {
    search_fields: IndexMap<String, SearchFieldType>,
    additional_search_fields: IndexMap<String, SearchFieldType>,
}

impl IndexSchema {
    pub fn new() -> IndexSchema {
        IndexSchema::default()
    }

    /// Declares a primary search field. The path is lowercased.
    pub fn add_search_field(&mut self, path: &str, field_type: SearchFieldType) {
        self.search_fields.insert(path.to_lowercase(), field_type);
    }

    /// Declares an additional search field. The path is lowercased.
    pub fn add_additional_search_field(&mut self, path: &str, field_type: SearchFieldType) {
        self.additional_search_fields
            .insert(path.to_lowercase(), field_type);
    }

    /// Returns true if the path is declared, either as a primary or an
    /// additional search field. Lookup is case-insensitive.
    pub fn contains_path(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.search_fields.contains_key(&path)
            || self.additional_search_fields.contains_key(&path)
    }

    /// All declared paths, primary first, in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        self.search_fields
            .keys()
            .chain(self.additional_search_fields.keys())
            .map(|k| k.as_str())
            .collect()
    }

    pub fn search_fields(&self) -> &IndexMap<String, SearchFieldType> {
        &self.search_fields
    }

    pub fn additional_search_fields(&self) -> &IndexMap<String, SearchFieldType> {
        &self.additional_search_fields
    }

    pub fn is_empty(&self) -> bool {
        self.search_fields.is_empty() && self.additional_search_fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_lowercased() {
        let mut schema = IndexSchema::new();
        schema.add_search_field("Address.City", SearchFieldType::String);
        assert!(schema.contains_path("address.city"));
        assert!(schema.contains_path("ADDRESS.CITY"));
        assert_eq!(schema.paths(), vec!["address.city"]);
    }

    #[test]
    fn test_additional_fields_are_recognized() {
        let mut schema = IndexSchema::new();
        schema.add_search_field("name", SearchFieldType::String);
        schema.add_additional_search_field("Tag", SearchFieldType::String);
        assert!(schema.contains_path("tag"));
        assert_eq!(schema.paths(), vec!["name", "tag"]);
    }

    #[test]
    fn test_undeclared_path_not_contained() {
        let mut schema = IndexSchema::new();
        schema.add_search_field("name", SearchFieldType::String);
        assert!(!schema.contains_path("age"));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut schema = IndexSchema::new();
        schema.add_search_field("b", SearchFieldType::String);
        schema.add_search_field("a", SearchFieldType::Integer);
        schema.add_search_field("c", SearchFieldType::Boolean);
        assert_eq!(schema.paths(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!(SearchFieldType::parse("Integer"), SearchFieldType::Integer);
        assert_eq!(SearchFieldType::parse("BOOLEAN"), SearchFieldType::Boolean);
        assert_eq!(SearchFieldType::parse("number"), SearchFieldType::Number);
        assert_eq!(SearchFieldType::parse("whatever"), SearchFieldType::String);
    }

    #[test]
    fn test_is_empty() {
        let mut schema = IndexSchema::new();
        assert!(schema.is_empty());
        schema.add_search_field("name", SearchFieldType::String);
        assert!(!schema.is_empty());
    }
}
