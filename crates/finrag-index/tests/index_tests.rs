use std::fs;

use tempfile::TempDir;

use finrag_core::error::Error;
use finrag_core::types::Meta;
use finrag_index::VectorStore;

fn meta(filename: &str) -> Meta {
    let mut m = Meta::new();
    m.insert("filename".to_string(), filename.to_string());
    m
}

fn three_vector_store() -> VectorStore {
    let mut store = VectorStore::new(4);
    store
        .build(
            &[
                vec![0.0, 0.0, 0.0, 0.0],
                vec![1.0, 1.0, 1.0, 1.0],
                vec![5.0, 5.0, 5.0, 5.0],
            ],
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            Some(vec![meta("a.txt"), meta("b.txt"), meta("c.txt")]),
        )
        .expect("build");
    store
}

#[test]
fn build_rejects_empty_embeddings() {
    let mut store = VectorStore::new(4);
    let err = store.build(&[], vec![], None).err().expect("must fail");
    assert!(matches!(err, Error::EmptyInput(_)));
}

#[test]
fn search_uninitialized_store_is_empty() {
    let store = VectorStore::new(4);
    let hits = store.search(&[0.0; 4], 5).expect("no error on empty store");
    assert!(hits.is_empty());
}

#[test]
fn exact_match_ranks_first_with_zero_distance() {
    let store = three_vector_store();
    let hits = store.search(&[1.0, 1.0, 1.0, 1.0], 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "B");
    assert_eq!(hits[0].distance, 0.0);
    // Second hit is whichever of A/C is actually closer: A at distance 4.
    assert_eq!(hits[1].text, "A");
    assert!(hits[0].distance <= hits[1].distance);
}

#[test]
fn results_come_back_in_non_decreasing_distance_order() {
    let store = three_vector_store();
    let hits = store.search(&[2.0, 2.0, 2.0, 2.0], 3).expect("search");
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn k_is_capped_at_stored_count() {
    let store = three_vector_store();
    let hits = store.search(&[0.0; 4], 50).expect("search");
    assert_eq!(hits.len(), 3);
}

#[test]
fn add_after_build_grows_by_exactly_the_new_vectors() {
    let mut store = three_vector_store();
    assert_eq!(store.len(), 3);

    store
        .add(&[vec![9.0, 9.0, 9.0, 9.0]], vec!["D".to_string()], Some(vec![meta("d.txt")]))
        .expect("add");
    assert_eq!(store.len(), 4);

    // Prior vectors stay retrievable at their original positions.
    let hits = store.search(&[1.0, 1.0, 1.0, 1.0], 1).expect("search");
    assert_eq!(hits[0].text, "B");
    assert_eq!(hits[0].metadata.get("filename").map(String::as_str), Some("b.txt"));
}

#[test]
fn add_on_uninitialized_store_behaves_as_build() {
    let mut store = VectorStore::new(2);
    store
        .add(&[vec![1.0, 0.0]], vec!["only".to_string()], None)
        .expect("add acts as build");
    assert!(store.is_initialized());
    assert_eq!(store.len(), 1);
}

#[test]
fn short_metadata_is_padded_with_empty_records() {
    let mut store = VectorStore::new(2);
    store
        .build(
            &[vec![0.0, 0.0], vec![1.0, 1.0]],
            vec!["one".to_string(), "two".to_string()],
            Some(vec![meta("only-one.txt")]),
        )
        .expect("build");

    let hits = store.search(&[0.0, 0.0], 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "one");
    assert_eq!(hits[0].metadata.get("filename").map(String::as_str), Some("only-one.txt"));
    assert!(hits[1].metadata.is_empty(), "padded entry is an empty record");
}

#[test]
fn save_then_load_round_trips_search_results() {
    let tmp = TempDir::new().expect("tempdir");
    let base = tmp.path().join("store").join("index");

    let store = three_vector_store();
    let before = store.search(&[1.0, 1.0, 1.0, 1.0], 3).expect("search before");
    store.save(&base).expect("save creates parent dirs");

    let restored = VectorStore::load(&base).expect("load");
    let after = restored.search(&[1.0, 1.0, 1.0, 1.0], 3).expect("search after");

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.text, a.text);
        assert_eq!(b.metadata, a.metadata);
        assert_eq!(b.distance, a.distance);
    }
}

#[test]
fn load_with_missing_geometric_file_is_not_found() {
    let tmp = TempDir::new().expect("tempdir");
    let base = tmp.path().join("index");
    three_vector_store().save(&base).expect("save");

    fs::remove_file(tmp.path().join("index.fvec")).expect("drop geometric file");
    let err = VectorStore::load(&base).err().expect("must fail");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn load_with_missing_side_table_is_not_found() {
    let tmp = TempDir::new().expect("tempdir");
    let base = tmp.path().join("index");
    three_vector_store().save(&base).expect("save");

    fs::remove_file(tmp.path().join("index.json")).expect("drop side-table");
    let err = VectorStore::load(&base).err().expect("must fail");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn load_repairs_short_side_table_metadata() {
    let tmp = TempDir::new().expect("tempdir");
    let base = tmp.path().join("index");
    three_vector_store().save(&base).expect("save");

    // Corrupt the side-table: drop the metadata for the last two documents.
    let table_path = tmp.path().join("index.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&fs::read(&table_path).expect("read")).expect("json");
    let metadata = value["metadata"].as_array_mut().expect("metadata array");
    metadata.truncate(1);
    fs::write(&table_path, serde_json::to_vec(&value).expect("encode")).expect("write");

    let restored = VectorStore::load(&base).expect("stale side-table still loads");
    assert_eq!(restored.len(), 3);
    let hits = restored.search(&[5.0, 5.0, 5.0, 5.0], 3).expect("search");
    assert_eq!(hits[0].text, "C");
    assert!(hits[0].metadata.is_empty(), "padded entries are empty records");
}

#[test]
fn uninitialized_store_snapshot_round_trips() {
    let tmp = TempDir::new().expect("tempdir");
    let base = tmp.path().join("empty");

    VectorStore::new(8).save(&base).expect("save empty snapshot");
    let restored = VectorStore::load(&base).expect("load empty snapshot");
    assert!(!restored.is_initialized());
    assert!(restored.search(&[0.0; 8], 3).expect("search").is_empty());
}
