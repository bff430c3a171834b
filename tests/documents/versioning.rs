//! Counter semantics of document writes
//!
//! Every successful write moves a document's counter forward by one, and a
//! conditional write against a stale counter changes nothing.

use crate::common::*;

#[test]
fn counters_start_at_one_and_increase() {
    let t = TestDb::new();
    let table = t.table("t");

    assert_eq!(table.set("k", &json!({"n": 1})).unwrap(), 1);
    assert_eq!(table.set("k", &json!({"n": 2})).unwrap(), 2);
    assert_eq!(table.set("other", &json!({"n": 1})).unwrap(), 1);

    let doc: Versioned<JsonValue> = table.get("k").unwrap();
    assert_eq!(doc.value, json!({"n": 2}));
    assert_eq!(doc.counter, 2);
}

#[test]
fn counter_survives_delete_and_reinsert() {
    let t = TestDb::new();
    let table = t.table("t");

    let c1 = table.set("k", &1).unwrap();
    table.delete("k").unwrap();
    let c2 = table.set("k", &2).unwrap();
    assert!(c2 > c1);

    // A writer that read before the delete cannot clobber the new document
    assert!(matches!(table.set_if("k", &3, c1), Err(Error::CounterChanged)));
    assert_eq!(table.get::<i32>("k").unwrap().value, 2);
}

#[test]
fn stale_conditional_write_is_rejected() {
    let t = TestDb::new();
    let table = t.table("t");

    let c1 = table.set("k", &"first").unwrap();
    let c2 = table.set_if("k", &"second", c1).unwrap();
    assert_eq!(c2, c1 + 1);

    let err = table.set_if("k", &"third", c1).unwrap_err();
    assert!(matches!(err, Error::CounterChanged));
    assert!(err.is_conflict());
    assert_eq!(table.get::<String>("k").unwrap(), Versioned::new("second".to_string(), c2));
}

#[test]
fn conditional_delete_respects_counter() {
    let t = TestDb::new();
    let table = t.table("t");

    let c = table.set("k", &1).unwrap();
    table.set("k", &2).unwrap();
    assert!(matches!(table.delete_if("k", c), Err(Error::CounterChanged)));
    table.delete_if("k", c + 1).unwrap();
    assert!(table.get::<i32>("k").unwrap_err().is_not_found());
}

#[test]
fn delete_of_missing_key_is_a_no_op() {
    let t = TestDb::new();
    let table = t.table("t");
    let tags = table.create_index("tag", "tag").unwrap();

    table.delete("ghost").unwrap();
    assert_eq!(table.count(), 0);
    assert_eq!(tags.bucket_count(), 0);
}

#[test]
fn typed_documents_round_trip_through_get() {
    let t = TestDb::new();
    let table = t.table("posts");

    table.set("p1", &post("hello", &["a", "b"])).unwrap();
    let doc: Versioned<Post> = table.get("p1").unwrap();
    assert_eq!(doc.value, post("hello", &["a", "b"]));

    // The same bytes read back as a dynamic tree
    let dynamic: JsonValue = table.get("p1").unwrap().value;
    assert_eq!(dynamic, json!({"title": "hello", "tag": ["a", "b"]}));
}

#[test]
fn decoding_into_the_wrong_shape_fails() {
    let t = TestDb::new();
    let table = t.table("t");
    table.set("k", &[1, 2, 3]).unwrap();
    assert!(matches!(table.get::<Post>("k"), Err(Error::Decode(_))));
}

#[test]
fn update_aborts_without_writing() {
    let t = TestDb::new();
    let table = t.table("t");
    table.set("k", &5u32).unwrap();

    #[derive(Debug, PartialEq)]
    struct TooSmall;

    let result = table.update("k", |n: u32| if n < 10 { Err(TooSmall) } else { Ok(n) });
    assert!(matches!(result, Err(UpdateError::Aborted(TooSmall))));
    assert_eq!(table.get::<u32>("k").unwrap(), Versioned::new(5, 1));
}
