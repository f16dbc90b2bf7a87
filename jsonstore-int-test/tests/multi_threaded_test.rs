use jsonstore::collection::AddOptions;
use jsonstore::errors::JsonStoreResult;
use jsonstore_int_test::test_util::{cleanup, create_test_context};
use serde_json::json;
use std::thread;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_concurrent_writers_serialize() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();

    let mut handles = Vec::new();
    for worker in 0..4 {
        let store = store.clone();
        handles.push(thread::spawn(move || -> JsonStoreResult<()> {
            let customers = store.collection("customers")?;
            for i in 0..25 {
                customers.add_data(
                    &[json!({"name": format!("w{}-{}", worker, i), "age": i})],
                    true,
                    &AddOptions::new(),
                )?;
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread panicked")?;
    }

    let customers = store.collection("customers")?;
    assert_eq!(customers.count_documents()?, 100);
    assert_eq!(customers.count_all_dirty_documents()?, 100);

    // ids stay unique under concurrency
    let all = customers.find_with_ids(&(1..=100).collect::<Vec<i64>>())?;
    assert_eq!(all.len(), 100);
    cleanup(ctx)
}

#[test]
fn test_concurrent_readers_see_consistent_counts() -> JsonStoreResult<()> {
    let ctx = create_test_context()?;
    let store = ctx.store();
    let customers = store.collection("customers")?;
    let batch: Vec<_> = (0..50).map(|i| json!({"name": "r", "age": i})).collect();
    customers.add_data(&batch, false, &AddOptions::new())?;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        handles.push(thread::spawn(move || -> JsonStoreResult<()> {
            let customers = store.collection("customers")?;
            for _ in 0..20 {
                assert_eq!(customers.count_documents()?, 50);
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("reader thread panicked")?;
    }
    cleanup(ctx)
}
