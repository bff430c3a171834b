//! Index buckets following document writes

use crate::common::*;

#[test]
fn multi_valued_field_moves_between_buckets() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();

    table.set("x", &json!({"tag": ["a", "b"]})).unwrap();
    assert_eq!(tags.keys("a").unwrap(), vec!["x"]);
    assert_eq!(tags.keys("b").unwrap(), vec!["x"]);

    let before_b = tags.bucket(&foliodb::codec::index_key_for("b").unwrap()).unwrap();
    table.set("x", &json!({"tag": ["b", "c"]})).unwrap();

    // Bucket a is gone, not merely empty
    assert_eq!(tags.bucket_count(), 2);
    assert!(tags.keys("a").unwrap().is_empty());
    assert_eq!(tags.keys("b").unwrap(), before_b);
    assert_eq!(tags.keys("c").unwrap(), vec!["x"]);
    assert_index_consistent(&table, &tags);
}

#[test]
fn buckets_keep_insertion_order() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();

    for key in ["p3", "p1", "p2"] {
        table.set(key, &post("t", &["rust"])).unwrap();
    }
    assert_eq!(tags.keys("rust").unwrap(), vec!["p3", "p1", "p2"]);

    table.set("p1", &post("t", &["go"])).unwrap();
    assert_eq!(tags.keys("rust").unwrap(), vec!["p3", "p2"]);
}

#[test]
fn unchanged_values_leave_buckets_alone() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();

    table.set("p1", &post("first", &["a"])).unwrap();
    table.set("p2", &post("second", &["a"])).unwrap();
    table.set("p1", &post("renamed", &["a"])).unwrap();
    assert_eq!(tags.keys("a").unwrap(), vec!["p1", "p2"]);
}

#[test]
fn duplicate_values_in_one_document_index_once() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();

    table.set("p1", &post("t", &["a", "a", "a"])).unwrap();
    assert_eq!(tags.keys("a").unwrap(), vec!["p1"]);

    table.set("p1", &post("t", &["a"])).unwrap();
    assert_eq!(tags.keys("a").unwrap(), vec!["p1"]);

    table.delete("p1").unwrap();
    assert_eq!(tags.bucket_count(), 0);
}

#[test]
fn documents_without_the_field_are_not_indexed() {
    let t = TestDb::new();
    let table = t.table("people");
    let cities = table.create_index("city", "address.city").unwrap();

    table.set("ada", &json!({"address": {"city": "London"}})).unwrap();
    table.set("bob", &json!({"address": "unknown"})).unwrap();
    table.set("cy", &json!({"name": "cy"})).unwrap();
    table.set("raw", &"not even an object").unwrap();

    assert_eq!(cities.bucket_count(), 1);
    assert_eq!(cities.keys("London").unwrap(), vec!["ada"]);

    // Gaining the field later adds it
    table.set("cy", &json!({"address": {"city": "Paris"}})).unwrap();
    assert_eq!(cities.keys("Paris").unwrap(), vec!["cy"]);
    assert_index_consistent(&table, &cities);
}

#[test]
fn nested_array_paths_fan_out() {
    let t = TestDb::new();
    let table = t.table("orders");
    let skus = table.create_index("sku", "items.sku").unwrap();

    table
        .set("o1", &json!({"items": [{"sku": 7}, {"sku": 9}, {"qty": 1}]}))
        .unwrap();
    table.set("o2", &json!({"items": [{"sku": 9}]})).unwrap();

    assert_eq!(skus.keys(&7).unwrap(), vec!["o1"]);
    assert_eq!(skus.keys(&9).unwrap(), vec!["o1", "o2"]);
    assert_index_consistent(&table, &skus);
}

#[test]
fn several_indexes_on_one_table() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();
    let titles = table.create_index("title", "title").unwrap();

    table.set("p1", &post("hello", &["a"])).unwrap();
    table.set("p1", &post("bye", &["a", "b"])).unwrap();

    assert_eq!(table.indexes(), vec!["tag", "title"]);
    assert!(titles.keys("hello").unwrap().is_empty());
    assert_eq!(titles.keys("bye").unwrap(), vec!["p1"]);
    assert_eq!(tags.keys("b").unwrap(), vec!["p1"]);
    assert_index_consistent(&table, &tags);
    assert_index_consistent(&table, &titles);
}

#[test]
fn create_index_backfills_existing_documents() {
    let t = TestDb::new();
    let table = t.table("posts");
    table.set("p1", &post("one", &["a", "b"])).unwrap();
    table.set("p2", &post("two", &["b"])).unwrap();
    table.set("p3", &json!({"title": "untagged"})).unwrap();

    let tags = table.create_index("tag", "tag").unwrap();
    assert_eq!(sorted_keys(&tags, "b"), vec!["p1", "p2"]);
    assert_index_consistent(&table, &tags);

    // The backfilled index keeps following writes
    table.delete("p2").unwrap();
    assert_eq!(tags.keys("b").unwrap(), vec!["p1"]);
}

#[test]
fn corrupt_bucket_is_logged_and_write_still_succeeds() {
    let t = TestDb::new();
    let table = t.table("posts");
    let tags = table.create_index("tag", "tag").unwrap();
    table.set("p1", &post("t", &["a"])).unwrap();

    // Drop the bucket behind the index's back
    let keyspaces = t.backend.keyspace_names();
    let index_space = keyspaces.iter().find(|k| k.starts_with("i.")).unwrap();
    let buckets = t.backend.store(index_space).unwrap();
    buckets
        .delete(&foliodb::codec::index_key_for("a").unwrap())
        .unwrap();

    // Removing p1 from the missing bucket is treated as already done
    table.set("p1", &post("t", &["b"])).unwrap();
    assert_eq!(tags.keys("b").unwrap(), vec!["p1"]);
    table.delete("p1").unwrap();
    assert_eq!(tags.bucket_count(), 0);
}
