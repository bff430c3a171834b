//! Key-range scans over tables and indexes

use crate::common::*;

fn letters(t: &TestDb) -> std::sync::Arc<Table> {
    let table = t.table("letters");
    for key in ["c", "a", "e", "b", "d"] {
        table.set(key, &json!({"key": key})).unwrap();
    }
    table
}

#[test]
fn between_is_inclusive_on_both_ends() {
    let t = TestDb::new();
    let table = letters(&t);
    assert_eq!(
        table.between("b", "d", false).unwrap().keys().unwrap(),
        vec!["b", "c", "d"]
    );
}

#[test]
fn reverse_between_walks_down() {
    let t = TestDb::new();
    let table = letters(&t);
    assert_eq!(
        table.between("b", "d", true).unwrap().keys().unwrap(),
        vec!["d", "c", "b"]
    );
}

#[test]
fn all_equals_unbounded_between() {
    let t = TestDb::new();
    let table = letters(&t);
    let all = table.all(false).unwrap().keys().unwrap();
    assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(
        table.between(MIN_BOUNDS, MAX_BOUNDS, false).unwrap().keys().unwrap(),
        all
    );
    assert_eq!(
        table.all(true).unwrap().keys().unwrap(),
        vec!["e", "d", "c", "b", "a"]
    );
}

#[test]
fn half_open_ranges() {
    let t = TestDb::new();
    let table = letters(&t);
    assert_eq!(
        table.between("c", KeyBound::Max, false).unwrap().keys().unwrap(),
        vec!["c", "d", "e"]
    );
    assert_eq!(
        table.between(KeyBound::Min, "b", true).unwrap().keys().unwrap(),
        vec!["b", "a"]
    );
    // Bounds between stored keys
    assert_eq!(
        table.between("bb", "dd", false).unwrap().keys().unwrap(),
        vec!["c", "d"]
    );
}

#[test]
fn empty_and_inverted_ranges_yield_nothing() {
    let t = TestDb::new();
    let table = letters(&t);
    assert_eq!(
        table.between("d", "b", false).unwrap().count_remaining().unwrap(),
        0
    );
    let past_end = table.between(KeyBound::Max, KeyBound::Max, false).unwrap();
    assert_eq!(past_end.count_remaining().unwrap(), 0);
    let before_start = table.between(KeyBound::Min, KeyBound::Min, true).unwrap();
    assert_eq!(before_start.count_remaining().unwrap(), 0);

    let empty = t.table("empty");
    assert_eq!(empty.all(false).unwrap().count_remaining().unwrap(), 0);
}

#[test]
fn exhausted_range_reports_end_and_stays_closed() {
    let t = TestDb::new();
    let table = letters(&t);
    let mut range = table.between("a", "a", false).unwrap();

    let entry = range.try_next().unwrap();
    assert_eq!(entry.key_str(), "a");
    assert_eq!(entry.counter, 1);
    assert!(matches!(range.try_next(), Err(Error::EndOfRange)));
    assert!(range.is_closed());
    assert!(matches!(range.try_next(), Err(Error::EndOfRange)));
    assert!(range.next().is_none());
}

#[test]
fn dropping_a_range_early_releases_its_cursor() {
    let t = TestDb::new();
    let table = letters(&t);
    let mut range = table.all(false).unwrap();
    assert!(range.next().is_some());
    drop(range);

    let store = t.backend.store(&t.backend.keyspace_names()[0]).unwrap();
    assert_eq!(store.open_cursors(), 0);
}

#[test]
fn range_does_not_see_writes_after_open() {
    let t = TestDb::new();
    let table = letters(&t);
    let range = table.all(false).unwrap();
    table.set("f", &json!({"key": "f"})).unwrap();
    table.delete("a").unwrap();
    assert_eq!(range.keys().unwrap(), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn decode_all_yields_typed_documents() {
    let t = TestDb::new();
    let table = t.table("posts");
    table.set("p1", &post("one", &["a"])).unwrap();
    table.set("p2", &post("two", &[])).unwrap();

    let docs: Vec<(String, Versioned<Post>)> = table.all(false).unwrap().decode_all().unwrap();
    assert_eq!(
        docs,
        vec![
            ("p1".to_string(), Versioned::new(post("one", &["a"]), 1)),
            ("p2".to_string(), Versioned::new(post("two", &[]), 1)),
        ]
    );
}

#[test]
fn index_range_orders_by_value() {
    let t = TestDb::new();
    let table = t.table("people");
    let by_age = table.create_index("age", "age").unwrap();

    table.set("ada", &json!({"age": 36})).unwrap();
    table.set("bob", &json!({"age": -4})).unwrap();
    table.set("cy", &json!({"age": 120})).unwrap();
    table.set("dee", &json!({"age": 36.0})).unwrap();
    table.set("eve", &json!({"name": "no age"})).unwrap();

    let keys = |range: foliodb::IndexRange| -> Vec<String> {
        range.map(|e| e.unwrap().key_str().into_owned()).collect()
    };

    assert_eq!(keys(by_age.all(false).unwrap()), vec!["bob", "ada", "dee", "cy"]);
    assert_eq!(keys(by_age.all(true).unwrap()), vec!["cy", "dee", "ada", "bob"]);

    let lower = KeyBound::index_value(&0).unwrap();
    let upper = KeyBound::index_value(&100).unwrap();
    assert_eq!(keys(by_age.between(lower, upper, false).unwrap()), vec!["ada", "dee"]);
}
