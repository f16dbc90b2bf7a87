use crate::collection::{
    AddOptions, ChangeOptions, Document, RemoveOptions, StoreCollectionProvider,
};
use crate::common::{LockHandle, FIELD_ID, PATH_SEPARATOR};
use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use crate::query::{QueryOptions, QueryPart, SimpleQuery};
use crate::store::{StoreCoordinator, TransactionToken};
use itertools::Itertools;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default implementation of a document collection.
///
/// Every operation takes the store-wide lock for its full duration, then
/// delegates row work to the [`StoreCoordinator`]. Batch writes that must be
/// all-or-nothing run through [`Self::run_in_transaction`], which opens an
/// implicit transaction unless the caller already holds one (tracked by the
/// shared [`TransactionToken`]).
pub(crate) struct DefaultStoreCollection {
    name: String,
    coordinator: StoreCoordinator,
    token: TransactionToken,
    lock: LockHandle,
    was_reopened: bool,
    dropped: AtomicBool,
}

impl DefaultStoreCollection {
    pub(crate) fn new(
        name: &str,
        coordinator: StoreCoordinator,
        token: TransactionToken,
        lock: LockHandle,
        was_reopened: bool,
    ) -> DefaultStoreCollection {
        DefaultStoreCollection {
            name: name.to_string(),
            coordinator,
            token,
            lock,
            was_reopened,
            dropped: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> JsonStoreResult<()> {
        if self.dropped.load(Ordering::Acquire) || !self.coordinator.is_open() {
            log::error!("Collection {} is not open", self.name);
            return Err(JsonStoreError::new(
                &format!("Collection {} is not open", self.name),
                ErrorKind::StoreNotOpen,
            ));
        }
        Ok(())
    }

    /// Runs a batch write inside an implicit transaction.
    ///
    /// While a caller transaction is open the closure runs bare: its effects
    /// commit or roll back with the caller's transaction, never on their own.
    fn run_in_transaction<R>(
        &self,
        f: impl FnOnce() -> JsonStoreResult<R>,
    ) -> JsonStoreResult<R> {
        if self.token.is_active() {
            return f();
        }
        self.coordinator.begin_transaction()?;
        match f() {
            Ok(value) => {
                self.coordinator.commit_transaction()?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.coordinator.rollback_transaction() {
                    log::error!(
                        "Rollback after failed batch on {} also failed: {}",
                        self.name,
                        rollback_error
                    );
                }
                Err(error)
            }
        }
    }

    /// Builds the exact-match queries locating the documents an upsert input
    /// replaces: one single-field query per criteria field present in the
    /// input. Absent criteria fields contribute no query; the matches of the
    /// emitted queries are unioned.
    fn replace_criteria_queries(payload: &Value, criteria: &[String]) -> Vec<SimpleQuery> {
        let mut queries = Vec::new();
        for field in criteria {
            if let Some(value) = criteria_value(payload, field) {
                let mut query = SimpleQuery::new();
                query.add_clause(field, value);
                queries.push(query);
            }
        }
        queries
    }
}

/// Reads the value at a dotted path from a payload, matching field names
/// case-insensitively the way the index extractor does.
fn criteria_value(payload: &Value, path: &str) -> Option<Value> {
    let mut current = payload;
    for segment in path.split(PATH_SEPARATOR) {
        let object = current.as_object()?;
        current = object
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(segment))
            .map(|(_, value)| value)?;
    }
    Some(current.clone())
}

/// Deduplication key for cross-query unions: the id when the result carries
/// one, its serialized form otherwise (projections have no id).
fn dedup_key(value: &Value) -> String {
    match value.get(FIELD_ID).and_then(Value::as_i64) {
        Some(id) => format!("_id:{}", id),
        None => value.to_string(),
    }
}

impl StoreCollectionProvider for DefaultStoreCollection {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn was_reopened(&self) -> bool {
        self.was_reopened
    }

    fn add_data(
        &self,
        data: &[Value],
        mark_dirty: bool,
        options: &AddOptions,
    ) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.run_in_transaction(|| {
            for value in data {
                self.coordinator
                    .store_object(&self.name, value, mark_dirty, options)?;
            }
            Ok(data.len() as i64)
        })
    }

    fn find_with_queries(
        &self,
        queries: &[SimpleQuery],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        options.validate_pagination()?;

        // an empty query slice matches nothing; a caller wanting every
        // document passes an empty query element (or uses find_all)
        let mut results = Vec::new();
        for query in queries {
            results.extend(self.coordinator.find(&self.name, query, options)?);
        }

        Ok(results
            .into_iter()
            .unique_by(|value| dedup_key(value))
            .collect())
    }

    fn find_with_ids(&self, ids: &[i64]) -> JsonStoreResult<Vec<Value>> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        let options = QueryOptions::new().exact();
        let mut results = Vec::new();
        for id in ids {
            let query = SimpleQuery::with_id(&json!(*id));
            results.extend(self.coordinator.find(&self.name, &query, &options)?);
        }
        Ok(results
            .into_iter()
            .unique_by(|value| dedup_key(value))
            .collect())
    }

    fn find_with_advanced_query(
        &self,
        parts: &[QueryPart],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        options.validate_pagination()?;
        self.coordinator
            .find_with_query_parts(&self.name, parts, options)
    }

    fn find_all(&self, options: &QueryOptions) -> JsonStoreResult<Vec<Value>> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        options.validate_pagination()?;
        self.coordinator.find(&self.name, &SimpleQuery::new(), options)
    }

    fn count_documents(&self) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.coordinator.count(&self.name)
    }

    fn count_with_query(&self, query: &SimpleQuery, exact: bool) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.coordinator.count_with_query(&self.name, query, exact)
    }

    fn count_all_dirty_documents(&self) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.coordinator.dirty_count(&self.name)
    }

    fn is_dirty_document(&self, document: &Value) -> JsonStoreResult<bool> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        match document.get(FIELD_ID).and_then(Value::as_i64) {
            Some(id) => self.coordinator.is_dirty(&self.name, id),
            None => Ok(false),
        }
    }

    fn all_dirty_with_documents(&self, documents: &[Value]) -> JsonStoreResult<Vec<Value>> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        let all_dirty = self.coordinator.all_dirty_in_collection(&self.name)?;
        if documents.is_empty() {
            return Ok(all_dirty);
        }
        let requested: Vec<i64> = documents
            .iter()
            .filter_map(|document| document.get(FIELD_ID).and_then(Value::as_i64))
            .collect();
        Ok(all_dirty
            .into_iter()
            .filter(|dirty| {
                dirty
                    .get(FIELD_ID)
                    .and_then(Value::as_i64)
                    .map(|id| requested.contains(&id))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn mark_documents_clean(&self, documents: &[Value]) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;

        let mut cleaned = 0;
        let mut failures = Vec::new();
        for value in documents {
            let document = match Document::from_value(value) {
                Ok(document) => document,
                Err(_) => {
                    failures.push(value.clone());
                    continue;
                }
            };
            let id = match document.id() {
                Some(id) => id,
                None => {
                    failures.push(value.clone());
                    continue;
                }
            };
            match self
                .coordinator
                .mark_clean(&self.name, id, document.operation())
            {
                Ok(()) => cleaned += 1,
                Err(_) => failures.push(value.clone()),
            }
        }

        if !failures.is_empty() {
            log::error!(
                "{} documents in {} could not be marked clean",
                failures.len(),
                self.name
            );
            return Err(JsonStoreError::with_failures(
                &format!("{} documents could not be marked clean", failures.len()),
                ErrorKind::MarkCleanFailure,
                failures,
            ));
        }
        Ok(cleaned)
    }

    fn remove(&self, documents: &[Value], options: &RemoveOptions) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;

        let soft = !options.is_erase;
        let mut removed = 0;
        let mut failures = Vec::new();
        for document in documents {
            match self
                .coordinator
                .remove(&self.name, document, soft, options.exact)
            {
                Ok(affected) => removed += affected,
                Err(_) => failures.push(document.clone()),
            }
        }

        if !failures.is_empty() {
            log::error!(
                "{} documents in {} could not be removed",
                failures.len(),
                self.name
            );
            return Err(JsonStoreError::with_failures(
                &format!("{} documents could not be removed", failures.len()),
                ErrorKind::RemoveFailure,
                failures,
            ));
        }
        Ok(removed)
    }

    fn replace_documents(&self, documents: &[Value], mark_dirty: bool) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.run_in_transaction(|| {
            let mut replaced = 0;
            for value in documents {
                let outcome = Document::from_value(value).and_then(|document| {
                    self.coordinator.replace(&self.name, &document, mark_dirty)
                });
                if let Err(error) = outcome {
                    // first failure aborts and rolls back the whole batch
                    log::error!(
                        "Replace batch on {} aborted at a failing document: {}",
                        self.name,
                        error
                    );
                    return Err(JsonStoreError::with_failures(
                        "A document could not be replaced",
                        ErrorKind::ReplaceFailure,
                        vec![value.clone()],
                    ));
                }
                replaced += 1;
            }
            Ok(replaced)
        })
    }

    fn change_data(&self, data: &[Value], options: &ChangeOptions) -> JsonStoreResult<i64> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;

        // each input gets its own implicit transaction scope; a failing input
        // never undoes the inputs already applied
        let find_options = QueryOptions::new().exact();
        let mut changed = 0;
        for value in data {
            changed += self.run_in_transaction(|| {
                let document = Document::from_value(value)?;
                let payload = document.payload();

                let mut matched_ids: Vec<i64> = Vec::new();
                for query in Self::replace_criteria_queries(payload, &options.replace_criteria) {
                    for hit in self.coordinator.find(&self.name, &query, &find_options)? {
                        if let Some(id) = hit.get(FIELD_ID).and_then(Value::as_i64) {
                            if !matched_ids.contains(&id) {
                                matched_ids.push(id);
                            }
                        }
                    }
                }

                if matched_ids.is_empty() {
                    if options.add_new {
                        self.coordinator.store_object(
                            &self.name,
                            payload,
                            options.mark_dirty,
                            &AddOptions::new(),
                        )?;
                        return Ok(1);
                    }
                    return Ok(0);
                }

                let mut replaced = 0;
                for id in matched_ids {
                    let replacement = Document::with_metadata(
                        id,
                        payload.clone(),
                        false,
                        crate::collection::DocumentOperation::None,
                    );
                    self.coordinator
                        .replace(&self.name, &replacement, options.mark_dirty)?;
                    replaced += 1;
                }
                Ok(replaced)
            })?;
        }
        Ok(changed)
    }

    fn clear_collection(&self) -> JsonStoreResult<()> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        self.coordinator.clear_table(&self.name)
    }

    fn remove_collection(&self) -> JsonStoreResult<()> {
        let _guard = self.lock.acquire();
        self.ensure_open()?;
        if self.token.is_active() {
            log::error!(
                "Cannot remove collection {} while a transaction is in progress",
                self.name
            );
            return Err(JsonStoreError::new(
                &format!(
                    "Cannot remove collection {} while a transaction is in progress",
                    self.name
                ),
                ErrorKind::TransactionConflict,
            ));
        }
        self.coordinator.drop_table(&self.name)?;
        self.dropped.store(true, Ordering::Release);
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.dropped.load(Ordering::Acquire) && self.coordinator.is_open()
    }
}
