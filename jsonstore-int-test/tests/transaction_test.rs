use jsonstore::collection::{AddOptions, ProvisionOptions, RemoveOptions};
use jsonstore::errors::{ErrorKind, JsonStoreResult};
use jsonstore_int_test::test_util::{cleanup, create_test_context, seed_customers};
use serde_json::json;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_rollback_undoes_every_collection() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    store.open_collections(&[ProvisionOptions::new("orders").search_field("sku", "string")])?;
    let customers = store.collection("customers")?;
    let orders = store.collection("orders")?;
    seed_customers(&customers)?;

    store.start_transaction()?;
    customers.remove(&[json!({"_id": 1})], &RemoveOptions::new().erase())?;
    orders.add_data(&[json!({"sku": "A-1"})], true, &AddOptions::new())?;
    store.rollback_transaction()?;

    assert_eq!(customers.count_documents()?, 3);
    assert_eq!(orders.count_documents()?, 0);
    assert!(!store.transaction_in_progress());
    cleanup(ctx)
}

#[test]
fn test_commit_applies_every_collection() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    store.open_collections(&[ProvisionOptions::new("orders").search_field("sku", "string")])?;
    let customers = store.collection("customers")?;
    let orders = store.collection("orders")?;
    seed_customers(&customers)?;

    store.start_transaction()?;
    customers.remove(&[json!({"_id": 1})], &RemoveOptions::new().erase())?;
    orders.add_data(&[json!({"sku": "A-1"})], true, &AddOptions::new())?;
    store.commit_transaction()?;

    assert_eq!(customers.count_documents()?, 2);
    assert_eq!(orders.count_documents()?, 1);
    cleanup(ctx)
}

#[test]
fn test_batch_failure_inside_caller_transaction_does_not_rollback() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    let customers = store.collection("customers")?;
    seed_customers(&customers)?;

    store.start_transaction()?;
    customers.add_data(&[json!({"name": "pending", "age": 1})], false, &AddOptions::new())?;

    // a failing replace must not tear down the caller's transaction
    let result =
        customers.replace_documents(&[json!({"_id": 99, "json": {"name": "ghost"}})], false);
    assert_eq!(result.unwrap_err().kind(), &ErrorKind::ReplaceFailure);

    store.commit_transaction()?;
    assert_eq!(customers.count_documents()?, 4);
    cleanup(ctx)
}

#[test]
fn test_nested_start_conflicts() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    store.start_transaction()?;
    assert_eq!(
        store.start_transaction().unwrap_err().kind(),
        &ErrorKind::TransactionConflict
    );
    store.rollback_transaction()?;
    cleanup(ctx)
}

#[test]
fn test_commit_without_transaction_fails() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    assert_eq!(
        store.commit_transaction().unwrap_err().kind(),
        &ErrorKind::NoTransactionInProgress
    );
    assert_eq!(
        store.rollback_transaction().unwrap_err().kind(),
        &ErrorKind::NoTransactionInProgress
    );
    cleanup(ctx)
}

#[test]
fn test_remove_collection_blocked_during_transaction() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    let customers = store.collection("customers")?;

    store.start_transaction()?;
    assert_eq!(
        customers.remove_collection().unwrap_err().kind(),
        &ErrorKind::TransactionConflict
    );
    store.rollback_transaction()?;

    customers.remove_collection()?;
    cleanup(ctx)
}

#[test]
fn test_destroy_blocked_during_transaction() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    store.start_transaction()?;
    assert_eq!(
        store.destroy().unwrap_err().kind(),
        &ErrorKind::TransactionConflict
    );
    store.rollback_transaction()?;
    cleanup(ctx)
}
