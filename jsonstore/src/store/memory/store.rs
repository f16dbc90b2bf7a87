use crate::collection::{AddOptions, Document, DocumentOperation, ProvisionOptions};
use crate::common::{FIELD_DIRTY, FIELD_ID, FIELD_JSON, FIELD_OPERATION};
use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use crate::index::extractor::{extract_index_values, index_text};
use crate::index::IndexSchema;
use crate::query::{Operand, Predicate, QueryOperator, QueryOptions, QueryPart, SimpleQuery};
use crate::store::StoreCoordinatorProvider;
use im::{HashMap as PersistentMap, OrdMap};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// One stored document row with its extracted index values.
#[derive(Debug, Clone)]
struct Row {
    json: Value,
    index_values: BTreeMap<String, BTreeSet<String>>,
    dirty: bool,
    operation: DocumentOperation,
}

impl Row {
    /// A soft-deleted row is invisible to queries but still listed as dirty
    /// until a sync marks it clean and purges it.
    fn is_live(&self) -> bool {
        self.operation != DocumentOperation::Delete
    }
}

/// The table backing one collection: its schema, its rows keyed by id in
/// ascending order, and the id sequence.
#[derive(Debug, Clone)]
struct Table {
    schema: IndexSchema,
    rows: OrdMap<i64, Row>,
    next_id: i64,
}

impl Table {
    fn new(schema: IndexSchema) -> Table {
        Table {
            schema,
            rows: OrdMap::new(),
            next_id: 1,
        }
    }
}

/// In-process storage backend.
///
/// Tables live in persistent (structurally shared) maps, which makes the
/// transaction primitives trivial: `begin_transaction` clones the whole table
/// map in O(1), `rollback_transaction` swaps the clone back in, and
/// `commit_transaction` drops it. Clones share unmodified structure, so an
/// open snapshot costs nothing until rows diverge.
///
/// Writers take the table map's write lock; a store-level [`crate::common::LockHandle`]
/// in the collection layer additionally serializes multi-step operations.
pub struct InMemoryCoordinator {
    tables: RwLock<PersistentMap<String, Table>>,
    snapshot: Mutex<Option<PersistentMap<String, Table>>>,
    open: AtomicBool,
}

impl InMemoryCoordinator {
    pub fn new() -> InMemoryCoordinator {
        InMemoryCoordinator {
            tables: RwLock::new(PersistentMap::new()),
            snapshot: Mutex::new(None),
            open: AtomicBool::new(true),
        }
    }

    fn ensure_open(&self) -> JsonStoreResult<()> {
        if !self.open.load(Ordering::Acquire) {
            log::error!("Operation attempted on a closed store");
            return Err(JsonStoreError::new(
                "The store is not open",
                ErrorKind::StoreNotOpen,
            ));
        }
        Ok(())
    }

    fn unknown_collection(collection: &str) -> JsonStoreError {
        log::error!("No table provisioned for collection: {}", collection);
        JsonStoreError::new(
            &format!("No table provisioned for collection: {}", collection),
            ErrorKind::PersistentStoreFailure,
        )
    }

    fn read_table<R>(
        &self,
        collection: &str,
        f: impl FnOnce(&Table) -> JsonStoreResult<R>,
    ) -> JsonStoreResult<R> {
        self.ensure_open()?;
        let tables = self.tables.read();
        match tables.get(collection) {
            Some(table) => f(table),
            None => Err(Self::unknown_collection(collection)),
        }
    }

    fn write_table<R>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Table) -> JsonStoreResult<R>,
    ) -> JsonStoreResult<R> {
        self.ensure_open()?;
        let mut tables = self.tables.write();
        match tables.get_mut(collection) {
            Some(table) => f(table),
            None => Err(Self::unknown_collection(collection)),
        }
    }

    /// Resolves the row ids a removal input refers to: by `_id` when the
    /// envelope carries one, otherwise by matching the input's fields as a
    /// simple query.
    fn resolve_removal_ids(
        table: &Table,
        document: &Value,
        exact: bool,
    ) -> JsonStoreResult<Vec<i64>> {
        if let Some(id) = document.get(FIELD_ID).and_then(Value::as_i64) {
            return Ok(if table.rows.contains_key(&id) {
                vec![id]
            } else {
                Vec::new()
            });
        }

        let query = SimpleQuery::from_value(document)?;
        let options = if exact {
            QueryOptions::new().exact()
        } else {
            QueryOptions::new()
        };
        let mut ids = Vec::new();
        for (id, row) in table.rows.iter() {
            if row.is_live() && matches_simple_query(table, *id, row, &query, &options)? {
                ids.push(*id);
            }
        }
        Ok(ids)
    }
}

impl Default for InMemoryCoordinator {
    fn default() -> Self {
        InMemoryCoordinator::new()
    }
}

impl StoreCoordinatorProvider for InMemoryCoordinator {
    fn provision(&self, options: &ProvisionOptions) -> JsonStoreResult<bool> {
        self.ensure_open()?;
        let mut tables = self.tables.write();
        let name = options.collection_name().to_string();
        if tables.contains_key(&name) {
            if options.drop_first {
                tables.insert(name, Table::new(options.schema().clone()));
                return Ok(false);
            }
            // reopened; the existing schema and rows stay authoritative
            return Ok(true);
        }
        tables.insert(name, Table::new(options.schema().clone()));
        Ok(false)
    }

    fn store_object(
        &self,
        collection: &str,
        data: &Value,
        mark_dirty: bool,
        additional: &AddOptions,
    ) -> JsonStoreResult<()> {
        self.write_table(collection, |table| {
            let mut index_values = extract_index_values(&table.schema, data)?;
            for (path, value) in additional.additional_search_fields() {
                index_values
                    .entry(path.clone())
                    .or_default()
                    .insert(index_text(value));
            }

            let id = table.next_id;
            table.next_id += 1;
            let (dirty, operation) = if mark_dirty {
                (true, DocumentOperation::Insert)
            } else {
                (false, DocumentOperation::None)
            };
            table.rows.insert(
                id,
                Row {
                    json: data.clone(),
                    index_values,
                    dirty,
                    operation,
                },
            );
            Ok(())
        })
    }

    fn remove(
        &self,
        collection: &str,
        document: &Value,
        soft: bool,
        exact: bool,
    ) -> JsonStoreResult<i64> {
        self.write_table(collection, |table| {
            let ids = Self::resolve_removal_ids(table, document, exact)?;
            let mut affected = 0;
            for id in ids {
                if soft {
                    if let Some(row) = table.rows.get_mut(&id) {
                        row.dirty = true;
                        row.operation = DocumentOperation::Delete;
                        affected += 1;
                    }
                } else if table.rows.remove(&id).is_some() {
                    affected += 1;
                }
            }
            Ok(affected)
        })
    }

    fn replace(
        &self,
        collection: &str,
        document: &Document,
        mark_dirty: bool,
    ) -> JsonStoreResult<()> {
        self.write_table(collection, |table| {
            let id = match document.id() {
                Some(id) => id,
                None => {
                    log::error!("Cannot replace a document without an _id");
                    return Err(JsonStoreError::new(
                        "Cannot replace a document without an _id",
                        ErrorKind::PersistentStoreFailure,
                    ));
                }
            };
            let index_values = extract_index_values(&table.schema, document.payload())?;
            match table.rows.get_mut(&id) {
                Some(row) => {
                    row.json = document.payload().clone();
                    row.index_values = index_values;
                    if mark_dirty {
                        row.dirty = true;
                        row.operation = DocumentOperation::Update;
                    } else {
                        row.dirty = false;
                        row.operation = DocumentOperation::None;
                    }
                    Ok(())
                }
                None => {
                    log::error!("No document with _id {} in collection {}", id, collection);
                    Err(JsonStoreError::new(
                        &format!("No document with _id {} in collection {}", id, collection),
                        ErrorKind::PersistentStoreFailure,
                    ))
                }
            }
        })
    }

    fn find(
        &self,
        collection: &str,
        query: &SimpleQuery,
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>> {
        self.read_table(collection, |table| {
            let mut results = Vec::new();
            for (id, row) in table.rows.iter() {
                if row.is_live() && matches_simple_query(table, *id, row, query, options)? {
                    results.push(render_row(*id, row, options));
                }
            }
            Ok(paginate(results, options))
        })
    }

    fn find_with_query_parts(
        &self,
        collection: &str,
        parts: &[QueryPart],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>> {
        self.read_table(collection, |table| {
            let mut results = Vec::new();
            for (id, row) in table.rows.iter() {
                if !row.is_live() {
                    continue;
                }
                let mut matched = true;
                for part in parts {
                    if !matches_query_part(table, *id, row, part)? {
                        matched = false;
                        break;
                    }
                }
                if matched {
                    results.push(render_row(*id, row, options));
                }
            }
            Ok(paginate(results, options))
        })
    }

    fn count(&self, collection: &str) -> JsonStoreResult<i64> {
        self.read_table(collection, |table| {
            Ok(table.rows.values().filter(|row| row.is_live()).count() as i64)
        })
    }

    fn count_with_query(
        &self,
        collection: &str,
        query: &SimpleQuery,
        exact: bool,
    ) -> JsonStoreResult<i64> {
        let options = if exact {
            QueryOptions::new().exact()
        } else {
            QueryOptions::new()
        };
        self.read_table(collection, |table| {
            let mut count = 0;
            for (id, row) in table.rows.iter() {
                if row.is_live() && matches_simple_query(table, *id, row, query, &options)? {
                    count += 1;
                }
            }
            Ok(count)
        })
    }

    fn dirty_count(&self, collection: &str) -> JsonStoreResult<i64> {
        self.read_table(collection, |table| {
            Ok(table.rows.values().filter(|row| row.dirty).count() as i64)
        })
    }

    fn is_dirty(&self, collection: &str, id: i64) -> JsonStoreResult<bool> {
        self.read_table(collection, |table| {
            Ok(table.rows.get(&id).map(|row| row.dirty).unwrap_or(false))
        })
    }

    fn all_dirty_in_collection(&self, collection: &str) -> JsonStoreResult<Vec<Value>> {
        self.read_table(collection, |table| {
            let mut results = Vec::new();
            for (id, row) in table.rows.iter() {
                if row.dirty {
                    results.push(json!({
                        FIELD_ID: *id,
                        FIELD_JSON: row.json,
                        FIELD_DIRTY: 1,
                        FIELD_OPERATION: row.operation.as_str(),
                    }));
                }
            }
            Ok(results)
        })
    }

    fn mark_clean(
        &self,
        collection: &str,
        id: i64,
        operation: DocumentOperation,
    ) -> JsonStoreResult<()> {
        self.write_table(collection, |table| {
            if operation == DocumentOperation::Delete {
                // the soft-deleted row has been pushed to the remote; purge it
                return match table.rows.remove(&id) {
                    Some(_) => Ok(()),
                    None => {
                        log::error!("No document with _id {} to purge", id);
                        Err(JsonStoreError::new(
                            &format!("No document with _id {} to purge", id),
                            ErrorKind::PersistentStoreFailure,
                        ))
                    }
                };
            }
            match table.rows.get_mut(&id) {
                Some(row) => {
                    row.dirty = false;
                    row.operation = DocumentOperation::None;
                    Ok(())
                }
                None => {
                    log::error!("No document with _id {} to mark clean", id);
                    Err(JsonStoreError::new(
                        &format!("No document with _id {} to mark clean", id),
                        ErrorKind::PersistentStoreFailure,
                    ))
                }
            }
        })
    }

    fn drop_table(&self, collection: &str) -> JsonStoreResult<()> {
        self.ensure_open()?;
        let mut tables = self.tables.write();
        match tables.remove(collection) {
            Some(_) => Ok(()),
            None => Err(Self::unknown_collection(collection)),
        }
    }

    fn clear_table(&self, collection: &str) -> JsonStoreResult<()> {
        self.write_table(collection, |table| {
            // the id sequence keeps advancing across a clear
            table.rows = OrdMap::new();
            Ok(())
        })
    }

    fn begin_transaction(&self) -> JsonStoreResult<()> {
        self.ensure_open()?;
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            log::error!("A transaction is already in progress");
            return Err(JsonStoreError::new(
                "A transaction is already in progress",
                ErrorKind::TransactionConflict,
            ));
        }
        *snapshot = Some(self.tables.read().clone());
        Ok(())
    }

    fn commit_transaction(&self) -> JsonStoreResult<()> {
        self.ensure_open()?;
        match self.snapshot.lock().take() {
            Some(_) => Ok(()),
            None => {
                log::error!("Commit requested with no transaction in progress");
                Err(JsonStoreError::new(
                    "No transaction in progress",
                    ErrorKind::NoTransactionInProgress,
                ))
            }
        }
    }

    fn rollback_transaction(&self) -> JsonStoreResult<()> {
        self.ensure_open()?;
        match self.snapshot.lock().take() {
            Some(saved) => {
                *self.tables.write() = saved;
                Ok(())
            }
            None => {
                log::error!("Rollback requested with no transaction in progress");
                Err(JsonStoreError::new(
                    "No transaction in progress",
                    ErrorKind::NoTransactionInProgress,
                ))
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) -> JsonStoreResult<()> {
        self.snapshot.lock().take();
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn destroy(&self) -> JsonStoreResult<()> {
        self.tables.write().clear();
        self.snapshot.lock().take();
        self.open.store(false, Ordering::Release);
        Ok(())
    }
}

/// Renders one row in wire form, or as the projection `options.filter` asks
/// for. Projections read from the indexed values, not the raw payload, so a
/// filtered find only ever surfaces declared search fields.
fn render_row(id: i64, row: &Row, options: &QueryOptions) -> Value {
    if options.filter_fields().is_empty() {
        return json!({ FIELD_ID: id, FIELD_JSON: row.json });
    }
    let mut projection = serde_json::Map::new();
    for field in options.filter_fields() {
        let field = field.to_lowercase();
        let value = if field == FIELD_ID {
            json!(id)
        } else if field == FIELD_JSON {
            row.json.clone()
        } else {
            row.index_values
                .get(&field)
                .and_then(|values| values.iter().next())
                .map(|text| Value::String(text.clone()))
                .unwrap_or(Value::Null)
        };
        projection.insert(field, value);
    }
    Value::Object(projection)
}

fn paginate(results: Vec<Value>, options: &QueryOptions) -> Vec<Value> {
    let offset = options.offset_value().unwrap_or(0).max(0) as usize;
    match options.limit_value() {
        Some(limit) if limit > 0 => results
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect(),
        _ => results,
    }
}

/// Evaluates one simple query against one row. Clauses across fields are
/// AND'd; values within one field are OR'd. Fails when a clause names an
/// undeclared search field, so callers can tell a bad query from an empty
/// result.
fn matches_simple_query(
    table: &Table,
    id: i64,
    row: &Row,
    query: &SimpleQuery,
    options: &QueryOptions,
) -> JsonStoreResult<bool> {
    for (field, alternatives) in query.clauses() {
        if field == FIELD_ID {
            let hit = alternatives
                .iter()
                .any(|alternative| alternative.as_i64() == Some(id));
            if !hit {
                return Ok(false);
            }
            continue;
        }

        if !table.schema.contains_path(field) {
            log::error!("Query references undeclared search field: {}", field);
            return Err(JsonStoreError::new(
                &format!("Query references undeclared search field: {}", field),
                ErrorKind::InvalidSearchField,
            ));
        }

        let candidates = row.index_values.get(field);
        let hit = alternatives.iter().any(|alternative| {
            let needle = index_text(alternative);
            match candidates {
                Some(values) if options.is_exact() => values.contains(&needle),
                Some(values) => {
                    let needle = needle.to_lowercase();
                    values
                        .iter()
                        .any(|candidate| candidate.to_lowercase().contains(&needle))
                }
                None => false,
            }
        });
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluates one advanced query part: the id list (when present) and every
/// predicate must hold.
fn matches_query_part(
    table: &Table,
    id: i64,
    row: &Row,
    part: &QueryPart,
) -> JsonStoreResult<bool> {
    if !part.ids().is_empty() && !part.ids().contains(&id) {
        return Ok(false);
    }
    for predicate in part.predicates() {
        if !matches_predicate(table, row, predicate)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_predicate(table: &Table, row: &Row, predicate: &Predicate) -> JsonStoreResult<bool> {
    if !table.schema.contains_path(&predicate.field) {
        log::error!(
            "Advanced query references undeclared search field: {}",
            predicate.field
        );
        return Err(JsonStoreError::new(
            &format!(
                "Advanced query references undeclared search field: {}",
                predicate.field
            ),
            ErrorKind::InvalidSearchField,
        ));
    }

    let empty = BTreeSet::new();
    let candidates = row.index_values.get(&predicate.field).unwrap_or(&empty);

    let hit = match (&predicate.operator, &predicate.operand) {
        (QueryOperator::Equal, Operand::Single(value)) => {
            candidates.contains(&index_text(value))
        }
        (QueryOperator::NotEqual, Operand::Single(value)) => {
            !candidates.contains(&index_text(value))
        }
        (QueryOperator::LessThan, Operand::Single(value)) => {
            any_compares(candidates, value, |ordering| ordering == CmpOrdering::Less)
        }
        (QueryOperator::LessThanOrEqual, Operand::Single(value)) => {
            any_compares(candidates, value, |ordering| {
                ordering != CmpOrdering::Greater
            })
        }
        (QueryOperator::GreaterThan, Operand::Single(value)) => {
            any_compares(candidates, value, |ordering| {
                ordering == CmpOrdering::Greater
            })
        }
        (QueryOperator::GreaterThanOrEqual, Operand::Single(value)) => {
            any_compares(candidates, value, |ordering| ordering != CmpOrdering::Less)
        }
        (QueryOperator::Between, Operand::Pair(lower, upper)) => {
            in_range(candidates, lower, upper)
        }
        (QueryOperator::NotBetween, Operand::Pair(lower, upper)) => {
            !in_range(candidates, lower, upper)
        }
        (QueryOperator::Inside, Operand::Set(values)) => values
            .iter()
            .any(|value| candidates.contains(&index_text(value))),
        (QueryOperator::NotInside, Operand::Set(values)) => !values
            .iter()
            .any(|value| candidates.contains(&index_text(value))),
        (QueryOperator::Like, Operand::Single(value)) => {
            any_like(candidates, value, |haystack, needle| {
                haystack.contains(needle)
            })
        }
        (QueryOperator::NotLike, Operand::Single(value)) => {
            !any_like(candidates, value, |haystack, needle| {
                haystack.contains(needle)
            })
        }
        // leftLike is SQL `%value`: the indexed value ends with the operand
        (QueryOperator::LeftLike, Operand::Single(value)) => {
            any_like(candidates, value, |haystack, needle| {
                haystack.ends_with(needle)
            })
        }
        (QueryOperator::NotLeftLike, Operand::Single(value)) => {
            !any_like(candidates, value, |haystack, needle| {
                haystack.ends_with(needle)
            })
        }
        // rightLike is SQL `value%`: the indexed value starts with the operand
        (QueryOperator::RightLike, Operand::Single(value)) => {
            any_like(candidates, value, |haystack, needle| {
                haystack.starts_with(needle)
            })
        }
        (QueryOperator::NotRightLike, Operand::Single(value)) => {
            !any_like(candidates, value, |haystack, needle| {
                haystack.starts_with(needle)
            })
        }
        (operator, _) => {
            log::error!("Operand shape does not fit operator {}", operator);
            return Err(JsonStoreError::new(
                &format!("Operand shape does not fit operator {}", operator),
                ErrorKind::InvalidSearchField,
            ));
        }
    };
    Ok(hit)
}

/// Compares two indexed text values numerically when both parse as numbers,
/// lexicographically otherwise. This mirrors column affinity: a numeric
/// column compares `9 < 10`, a text column compares `"10" < "9"`.
fn compare_text(left: &str, right: &str) -> CmpOrdering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(CmpOrdering::Equal),
        _ => left.cmp(right),
    }
}

fn any_compares(
    candidates: &BTreeSet<String>,
    operand: &Value,
    accept: impl Fn(CmpOrdering) -> bool,
) -> bool {
    let operand = index_text(operand);
    candidates
        .iter()
        .any(|candidate| accept(compare_text(candidate, &operand)))
}

fn in_range(candidates: &BTreeSet<String>, lower: &Value, upper: &Value) -> bool {
    let lower = index_text(lower);
    let upper = index_text(upper);
    candidates.iter().any(|candidate| {
        compare_text(candidate, &lower) != CmpOrdering::Less
            && compare_text(candidate, &upper) != CmpOrdering::Greater
    })
}

fn any_like(
    candidates: &BTreeSet<String>,
    operand: &Value,
    accept: impl Fn(&str, &str) -> bool,
) -> bool {
    let needle = index_text(operand).to_lowercase();
    candidates
        .iter()
        .any(|candidate| accept(&candidate.to_lowercase(), &needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchFieldType;
    use crate::query::search_field;

    fn provisioned(name: &str, fields: &[(&str, SearchFieldType)]) -> InMemoryCoordinator {
        let coordinator = InMemoryCoordinator::new();
        let mut options = ProvisionOptions::new(name);
        for (path, field_type) in fields {
            options = options.search_field(path, field_type.as_str());
        }
        coordinator.provision(&options).unwrap();
        coordinator
    }

    fn people_store() -> InMemoryCoordinator {
        let coordinator = provisioned(
            "people",
            &[
                ("name", SearchFieldType::String),
                ("age", SearchFieldType::Integer),
            ],
        );
        for (name, age) in [("carlos", 25), ("mike", 30), ("carla", 40)] {
            coordinator
                .store_object(
                    "people",
                    &json!({"name": name, "age": age}),
                    false,
                    &AddOptions::new(),
                )
                .unwrap();
        }
        coordinator
    }

    #[test]
    fn test_provision_reports_reopen() {
        let coordinator = InMemoryCoordinator::new();
        let options = ProvisionOptions::new("people").search_field("name", "string");
        assert!(!coordinator.provision(&options).unwrap());
        assert!(coordinator.provision(&options).unwrap());
    }

    #[test]
    fn test_provision_drop_first_recreates() {
        let coordinator = people_store();
        let options = ProvisionOptions::new("people")
            .search_field("name", "string")
            .drop_first();
        assert!(!coordinator.provision(&options).unwrap());
        assert_eq!(coordinator.count("people").unwrap(), 0);
    }

    #[test]
    fn test_store_assigns_sequential_ids() {
        let coordinator = people_store();
        let query = SimpleQuery::new();
        let results = coordinator
            .find("people", &query, &QueryOptions::new())
            .unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r[FIELD_ID].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_fuzzy_matches_substring() {
        let coordinator = people_store();
        let query = SimpleQuery::from_value(&json!({"name": "carl"})).unwrap();
        let results = coordinator
            .find("people", &query, &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 2); // carlos and carla
    }

    #[test]
    fn test_find_exact_requires_full_value() {
        let coordinator = people_store();
        let query = SimpleQuery::from_value(&json!({"name": "carl"})).unwrap();
        let results = coordinator
            .find("people", &query, &QueryOptions::new().exact())
            .unwrap();
        assert!(results.is_empty());
        let query = SimpleQuery::from_value(&json!({"name": "carlos"})).unwrap();
        let results = coordinator
            .find("people", &query, &QueryOptions::new().exact())
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_find_undeclared_field_fails() {
        let coordinator = people_store();
        let query = SimpleQuery::from_value(&json!({"height": 180})).unwrap();
        let result = coordinator.find("people", &query, &QueryOptions::new());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidSearchField);
    }

    #[test]
    fn test_find_by_id_clause() {
        let coordinator = people_store();
        let query = SimpleQuery::with_id(&json!(2));
        let results = coordinator
            .find("people", &query, &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][FIELD_JSON]["name"], "mike");
    }

    #[test]
    fn test_find_pagination() {
        let coordinator = people_store();
        let query = SimpleQuery::new();
        let results = coordinator
            .find("people", &query, &QueryOptions::new().limit(2).offset(1))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0][FIELD_ID], 2);
    }

    #[test]
    fn test_find_projection_uses_indexed_values() {
        let coordinator = people_store();
        let query = SimpleQuery::with_id(&json!(1));
        let results = coordinator
            .find(
                "people",
                &query,
                &QueryOptions::new().filter(vec!["name".to_string(), FIELD_ID.to_string()]),
            )
            .unwrap();
        assert_eq!(results[0]["name"], "carlos");
        assert_eq!(results[0][FIELD_ID], 1);
        assert!(results[0].get(FIELD_JSON).is_none());
    }

    #[test]
    fn test_advanced_comparison_is_numeric_for_numbers() {
        let coordinator = people_store();
        let part = QueryPart::new().with(search_field("age").greater_than(26));
        let results = coordinator
            .find_with_query_parts("people", &[part], &QueryOptions::new())
            .unwrap();
        // 30 and 40, not a lexicographic "9" fluke
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_advanced_between_is_inclusive() {
        let coordinator = people_store();
        let part = QueryPart::new().with(search_field("age").between(25, 30));
        let results = coordinator
            .find_with_query_parts("people", &[part], &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_advanced_right_like_is_prefix() {
        let coordinator = people_store();
        let part = QueryPart::new().with(search_field("name").right_like("car"));
        let results = coordinator
            .find_with_query_parts("people", &[part], &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 2);

        let part = QueryPart::new().with(search_field("name").left_like("los"));
        let results = coordinator
            .find_with_query_parts("people", &[part], &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][FIELD_JSON]["name"], "carlos");
    }

    #[test]
    fn test_advanced_parts_are_anded() {
        let coordinator = people_store();
        let first = QueryPart::new().with(search_field("name").like("carl"));
        let second = QueryPart::new().with(search_field("age").less_than(30));
        let results = coordinator
            .find_with_query_parts("people", &[first, second], &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][FIELD_JSON]["name"], "carlos");
    }

    #[test]
    fn test_advanced_ids_restrict_results() {
        let coordinator = people_store();
        let part = QueryPart::new().add_id(1).add_id(3);
        let results = coordinator
            .find_with_query_parts("people", &[part], &QueryOptions::new())
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_soft_remove_hides_from_queries_but_stays_dirty() {
        let coordinator = people_store();
        let affected = coordinator
            .remove("people", &json!({"name": "carlos"}), true, true)
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(coordinator.count("people").unwrap(), 2);
        assert_eq!(coordinator.dirty_count("people").unwrap(), 1);

        let dirty = coordinator.all_dirty_in_collection("people").unwrap();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0][FIELD_OPERATION], "delete");
    }

    #[test]
    fn test_erase_drops_the_row() {
        let coordinator = people_store();
        let affected = coordinator
            .remove("people", &json!({"_id": 2}), false, true)
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(coordinator.count("people").unwrap(), 2);
        assert_eq!(coordinator.dirty_count("people").unwrap(), 0);
    }

    #[test]
    fn test_remove_unmatched_affects_nothing() {
        let coordinator = people_store();
        let affected = coordinator
            .remove("people", &json!({"name": "nobody"}), true, true)
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_replace_updates_payload_and_index() {
        let coordinator = people_store();
        let replacement =
            Document::with_metadata(1, json!({"name": "carlitos", "age": 26}), false,
                DocumentOperation::None);
        coordinator.replace("people", &replacement, true).unwrap();

        let query = SimpleQuery::from_value(&json!({"name": "carlitos"})).unwrap();
        let results = coordinator
            .find("people", &query, &QueryOptions::new().exact())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(coordinator.is_dirty("people", 1).unwrap());
    }

    #[test]
    fn test_replace_missing_id_fails() {
        let coordinator = people_store();
        let replacement =
            Document::with_metadata(99, json!({"name": "ghost"}), false, DocumentOperation::None);
        assert!(coordinator.replace("people", &replacement, true).is_err());
    }

    #[test]
    fn test_mark_clean_clears_flag() {
        let coordinator = people_store();
        coordinator
            .store_object("people", &json!({"name": "dirty", "age": 1}), true, &AddOptions::new())
            .unwrap();
        assert!(coordinator.is_dirty("people", 4).unwrap());
        coordinator
            .mark_clean("people", 4, DocumentOperation::Insert)
            .unwrap();
        assert!(!coordinator.is_dirty("people", 4).unwrap());
        assert_eq!(coordinator.count("people").unwrap(), 4);
    }

    #[test]
    fn test_mark_clean_purges_soft_deleted() {
        let coordinator = people_store();
        coordinator
            .remove("people", &json!({"_id": 1}), true, true)
            .unwrap();
        coordinator
            .mark_clean("people", 1, DocumentOperation::Delete)
            .unwrap();
        assert_eq!(coordinator.dirty_count("people").unwrap(), 0);
        let query = SimpleQuery::with_id(&json!(1));
        assert!(coordinator
            .find("people", &query, &QueryOptions::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let coordinator = people_store();
        coordinator.begin_transaction().unwrap();
        coordinator
            .store_object("people", &json!({"name": "temp", "age": 1}), true, &AddOptions::new())
            .unwrap();
        coordinator
            .remove("people", &json!({"_id": 1}), false, true)
            .unwrap();
        coordinator.rollback_transaction().unwrap();
        assert_eq!(coordinator.count("people").unwrap(), 3);
        assert_eq!(coordinator.dirty_count("people").unwrap(), 0);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let coordinator = people_store();
        coordinator.begin_transaction().unwrap();
        coordinator
            .store_object("people", &json!({"name": "kept", "age": 1}), false, &AddOptions::new())
            .unwrap();
        coordinator.commit_transaction().unwrap();
        assert_eq!(coordinator.count("people").unwrap(), 4);
    }

    #[test]
    fn test_nested_transaction_conflicts() {
        let coordinator = people_store();
        coordinator.begin_transaction().unwrap();
        let result = coordinator.begin_transaction();
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::TransactionConflict);
    }

    #[test]
    fn test_commit_without_transaction_fails() {
        let coordinator = people_store();
        assert_eq!(
            coordinator.commit_transaction().unwrap_err().kind(),
            &ErrorKind::NoTransactionInProgress
        );
        assert_eq!(
            coordinator.rollback_transaction().unwrap_err().kind(),
            &ErrorKind::NoTransactionInProgress
        );
    }

    #[test]
    fn test_clear_keeps_id_sequence() {
        let coordinator = people_store();
        coordinator.clear_table("people").unwrap();
        assert_eq!(coordinator.count("people").unwrap(), 0);
        coordinator
            .store_object("people", &json!({"name": "next", "age": 1}), false, &AddOptions::new())
            .unwrap();
        let results = coordinator
            .find("people", &SimpleQuery::new(), &QueryOptions::new())
            .unwrap();
        assert_eq!(results[0][FIELD_ID], 4);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let coordinator = people_store();
        coordinator.close().unwrap();
        assert!(!coordinator.is_open());
        let result = coordinator.count("people");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::StoreNotOpen);
    }

    #[test]
    fn test_additional_search_fields_are_indexed() {
        let coordinator = InMemoryCoordinator::new();
        let options = ProvisionOptions::new("notes")
            .search_field("title", "string")
            .additional_search_field("tag", "string");
        coordinator.provision(&options).unwrap();

        // tag never appears in the payload, only in the index
        let additional = AddOptions::new().additional_search_field("Tag", json!("work"));
        coordinator
            .store_object("notes", &json!({"title": "standup"}), false, &additional)
            .unwrap();

        let query = SimpleQuery::from_value(&json!({"tag": "work"})).unwrap();
        let results = coordinator
            .find("notes", &query, &QueryOptions::new().exact())
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_unknown_collection_fails() {
        let coordinator = InMemoryCoordinator::new();
        assert!(coordinator.count("nowhere").is_err());
    }
}
