use jsonstore::collection::{AddOptions, RemoveOptions};
use jsonstore::errors::JsonStoreResult;
use jsonstore::query::{QueryOptions, SimpleQuery};
use jsonstore_int_test::test_util::{cleanup, create_test_context, seed_customers};
use serde_json::json;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_add_data_dirty_lifecycle() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;

    customers.add_data(&[json!({"name": "local", "age": 1})], true, &AddOptions::new())?;
    assert_eq!(customers.count_all_dirty_documents()?, 1);
    assert!(customers.is_dirty_document(&json!({"_id": 1}))?);

    let dirty = customers.all_dirty_with_documents(&[])?;
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0]["_operation"], "insert");
    assert_eq!(dirty[0]["_dirty"], 1);

    let cleaned = customers.mark_documents_clean(&dirty)?;
    assert_eq!(cleaned, 1);
    assert_eq!(customers.count_all_dirty_documents()?, 0);
    assert!(!customers.is_dirty_document(&json!({"_id": 1}))?);
    // the document itself survives a mark-clean
    assert_eq!(customers.count_documents()?, 1);
    cleanup(ctx)
}

#[test]
fn test_add_data_clean_when_not_tracking() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    seed_customers(&customers)?;
    assert_eq!(customers.count_all_dirty_documents()?, 0);
    cleanup(ctx)
}

#[test]
fn test_replace_marks_update() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    seed_customers(&customers)?;

    customers.replace_documents(
        &[json!({"_id": 2, "json": {"name": "mike", "age": 31, "address": {"city": "Austin"}}})],
        true,
    )?;
    let dirty = customers.all_dirty_with_documents(&[])?;
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0]["_operation"], "update");
    cleanup(ctx)
}

#[test]
fn test_soft_delete_stays_dirty_until_cleaned() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    seed_customers(&customers)?;

    let removed = customers.remove(&[json!({"_id": 1})], &RemoveOptions::new())?;
    assert_eq!(removed, 1);

    // invisible to queries, still reported as a pending delete
    assert_eq!(customers.count_documents()?, 2);
    let query = SimpleQuery::with_id(&json!(1));
    assert!(customers
        .find_with_queries(&[query], &QueryOptions::new())?
        .is_empty());

    let dirty = customers.all_dirty_with_documents(&[])?;
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0]["_operation"], "delete");

    // after the sync push, the row is purged for good
    customers.mark_documents_clean(&dirty)?;
    assert_eq!(customers.count_all_dirty_documents()?, 0);
    assert!(customers.find_with_ids(&[1])?.is_empty());
    cleanup(ctx)
}

#[test]
fn test_erase_leaves_no_pending_delete() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    seed_customers(&customers)?;

    customers.remove(&[json!({"_id": 1})], &RemoveOptions::new().erase())?;
    assert_eq!(customers.count_documents()?, 2);
    assert_eq!(customers.count_all_dirty_documents()?, 0);
    cleanup(ctx)
}

#[test]
fn test_all_dirty_filters_to_requested_documents() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    customers.add_data(
        &[
            json!({"name": "a", "age": 1}),
            json!({"name": "b", "age": 2}),
            json!({"name": "c", "age": 3}),
        ],
        true,
        &AddOptions::new(),
    )?;

    let subset = customers.all_dirty_with_documents(&[json!({"_id": 1}), json!({"_id": 3})])?;
    assert_eq!(subset.len(), 2);
    assert_eq!(subset[0]["_id"], 1);
    assert_eq!(subset[1]["_id"], 3);
    cleanup(ctx)
}

#[test]
fn test_is_dirty_for_unknown_document_is_false() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let customers = ctx.store().collection("customers")?;
    seed_customers(&customers)?;
    assert!(!customers.is_dirty_document(&json!({"_id": 99}))?);
    assert!(!customers.is_dirty_document(&json!({"name": "never stored"}))?);
    cleanup(ctx)
}
