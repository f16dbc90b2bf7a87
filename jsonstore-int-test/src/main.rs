use jsonstore::collection::{AddOptions, ChangeOptions, ProvisionOptions};
use jsonstore::errors::JsonStoreResult;
use jsonstore::query::{search_field, QueryOptions, QueryPart};
use jsonstore::JsonStore;
use serde_json::json;

fn main() -> JsonStoreResult<()> {
    println!("Starting stress test...");
    let store = JsonStore::builder().store_name("stress").open()?;
    store.open_collections(&[ProvisionOptions::new("records")
        .search_field("key", "string")
        .search_field("processed", "boolean")])?;
    let records = store.collection("records")?;

    let count = 100_000;
    let start = std::time::Instant::now();
    let batch: Vec<_> = (0..count)
        .map(|i| json!({"key": format!("record-{}", i), "processed": false}))
        .collect();
    records.add_data(&batch, true, &AddOptions::new())?;
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let part = QueryPart::new().with(search_field("processed").equal(false));
    let unprocessed = records.find_with_advanced_query(&[part], &QueryOptions::new())?;
    println!(
        "Found {} unprocessed records in {:?}",
        unprocessed.len(),
        start.elapsed()
    );

    let start = std::time::Instant::now();
    let changed = records.change_data(
        &[json!({"key": "record-0", "processed": true})],
        &ChangeOptions::new().replace_criteria(vec!["key".to_string()]),
    )?;
    println!("Changed {} records in {:?}", changed, start.elapsed());

    let start = std::time::Instant::now();
    let dirty = records.count_all_dirty_documents()?;
    println!("Counted {} dirty records in {:?}", dirty, start.elapsed());

    store.destroy()
}
