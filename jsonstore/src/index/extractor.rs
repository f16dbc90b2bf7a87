use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use crate::index::IndexSchema;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Extracts the indexable values of one document under the given schema.
///
/// Pure function: given the declared dotted paths and a JSON document, it
/// walks the document and produces, for each declared path, the set of scalar
/// values found at that path. Every declared path gets an entry even when the
/// document has nothing at it, so callers can distinguish "declared but
/// absent" from "not declared".
///
/// Traversal rules:
/// - object fields recurse with the path extended by the lowercased field name
/// - arrays are transparent: object and array elements are recursed into
///   without extending the path; scalar elements are skipped (a bare scalar in
///   an array has no unambiguous position to index)
/// - boolean leaves normalize to `"1"`/`"0"`; other scalars use their natural
///   textual representation
/// - scalar leaves at undeclared paths are ignored, not an error
///
/// Fails only when `document` is not a JSON object.
pub fn extract_index_values(
    schema: &IndexSchema,
    document: &Value,
) -> JsonStoreResult<BTreeMap<String, BTreeSet<String>>> {
    let object = match document.as_object() {
        Some(object) => object,
        None => {
            log::error!("Cannot extract index values from non-object document");
            return Err(JsonStoreError::new(
                "Document must be a JSON object",
                ErrorKind::DocumentParseFailure,
            ));
        }
    };

    let mut index_values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for path in schema.paths() {
        index_values.insert(path.to_string(), BTreeSet::new());
    }

    for (name, value) in object {
        visit(&mut index_values, &name.to_lowercase(), value);
    }

    Ok(index_values)
}

fn visit(index_values: &mut BTreeMap<String, BTreeSet<String>>, path: &str, value: &Value) {
    match value {
        Value::Object(object) => {
            for (name, child) in object {
                let child_path = format!("{}.{}", path, name.to_lowercase());
                visit(index_values, &child_path, child);
            }
        }
        Value::Array(elements) => {
            for element in elements {
                match element {
                    // arrays are transparent for indexing purposes
                    Value::Object(_) | Value::Array(_) => visit(index_values, path, element),
                    // a scalar inside an array can't be indexed; e.g. the bare
                    // 3 in {"hobbies": [3, {"k": "v"}]} is dropped
                    _ => {}
                }
            }
        }
        scalar => {
            if let Some(values) = index_values.get_mut(path) {
                values.insert(index_text(scalar));
            }
        }
    }
}

/// Normalizes one scalar to the text form stored in index columns.
/// Booleans become `"1"`/`"0"`; query execution reuses the same
/// normalization so operands compare against indexed values consistently.
pub(crate) fn index_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        // visit() never forwards objects or arrays here
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchFieldType;
    use serde_json::json;

    fn schema_with(paths: &[&str]) -> IndexSchema {
        let mut schema = IndexSchema::new();
        for path in paths {
            schema.add_search_field(path, SearchFieldType::String);
        }
        schema
    }

    #[test]
    fn test_declared_but_absent_path_has_empty_set() {
        let schema = schema_with(&["name", "age"]);
        let values = extract_index_values(&schema, &json!({"name": "carlos"})).unwrap();
        assert_eq!(values["name"].len(), 1);
        assert!(values.contains_key("age"));
        assert!(values["age"].is_empty());
    }

    #[test]
    fn test_boolean_normalizes_to_one_and_zero() {
        let schema = schema_with(&["active", "banned"]);
        let values =
            extract_index_values(&schema, &json!({"active": true, "banned": false})).unwrap();
        assert!(values["active"].contains("1"));
        assert!(values["banned"].contains("0"));
        assert!(!values["active"].contains("true"));
        assert!(!values["banned"].contains("false"));
    }

    #[test]
    fn test_nested_object_extends_path_lowercased() {
        let schema = schema_with(&["address.city"]);
        let document = json!({"Address": {"City": "Porto"}});
        let values = extract_index_values(&schema, &document).unwrap();
        assert!(values["address.city"].contains("Porto"));
    }

    #[test]
    fn test_array_is_transparent_for_objects() {
        let schema = schema_with(&["orders.total"]);
        let document = json!({"orders": [{"total": 10}, {"total": 25}]});
        let values = extract_index_values(&schema, &document).unwrap();
        assert_eq!(values["orders.total"].len(), 2);
        assert!(values["orders.total"].contains("10"));
        assert!(values["orders.total"].contains("25"));
    }

    #[test]
    fn test_scalar_inside_array_is_skipped() {
        let schema = schema_with(&["hobbies", "hobbies.k"]);
        let document = json!({"hobbies": [3, {"k": "v"}]});
        let values = extract_index_values(&schema, &document).unwrap();
        // the bare 3 never contributes an index value
        assert!(values["hobbies"].is_empty());
        assert!(values["hobbies.k"].contains("v"));
    }

    #[test]
    fn test_nested_arrays_are_recursed() {
        let schema = schema_with(&["tags.name"]);
        let document = json!({"tags": [[{"name": "a"}], [{"name": "b"}]]});
        let values = extract_index_values(&schema, &document).unwrap();
        assert_eq!(values["tags.name"].len(), 2);
    }

    #[test]
    fn test_undeclared_leaves_are_ignored() {
        let schema = schema_with(&["name"]);
        let document = json!({"name": "carlos", "age": 99, "extra": {"deep": true}});
        let values = extract_index_values(&schema, &document).unwrap();
        assert_eq!(values.len(), 1);
        assert!(values["name"].contains("carlos"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let schema = schema_with(&["orders.total"]);
        let document = json!({"orders": [{"total": 10}, {"total": 10}]});
        let values = extract_index_values(&schema, &document).unwrap();
        assert_eq!(values["orders.total"].len(), 1);
    }

    #[test]
    fn test_number_uses_natural_text() {
        let schema = schema_with(&["age", "score"]);
        let values =
            extract_index_values(&schema, &json!({"age": 42, "score": 4.5})).unwrap();
        assert!(values["age"].contains("42"));
        assert!(values["score"].contains("4.5"));
    }

    #[test]
    fn test_non_object_document_fails() {
        let schema = schema_with(&["name"]);
        let result = extract_index_values(&schema, &json!(["not", "an", "object"]));
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::DocumentParseFailure
        );
    }

    #[test]
    fn test_top_level_field_name_lowercased() {
        let schema = schema_with(&["name"]);
        let values = extract_index_values(&schema, &json!({"Name": "carlos"})).unwrap();
        assert!(values["name"].contains("carlos"));
    }
}
