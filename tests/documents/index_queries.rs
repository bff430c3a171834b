//! Reading documents through an index

use crate::common::*;

fn library(t: &TestDb) -> (std::sync::Arc<Table>, std::sync::Arc<Index>) {
    let table = t.table("books");
    let by_author = table.create_index("author", "author").unwrap();
    table.set("b1", &json!({"author": "le guin", "title": "the dispossessed"})).unwrap();
    table.set("b2", &json!({"author": "le guin", "title": "the lathe of heaven"})).unwrap();
    table.set("b3", &json!({"author": "banks", "title": "excession"})).unwrap();
    (table, by_author)
}

#[test]
fn one_returns_first_live_document() {
    let t = TestDb::new();
    let (table, by_author) = library(&t);

    let (key, doc): (String, Versioned<JsonValue>) = by_author.one("le guin").unwrap();
    assert_eq!(key, "b1");
    assert_eq!(doc.value["title"], "the dispossessed");

    table.delete("b1").unwrap();
    let (key, _): (String, Versioned<JsonValue>) = by_author.one("le guin").unwrap();
    assert_eq!(key, "b2");
}

#[test]
fn one_on_missing_value_is_not_found() {
    let t = TestDb::new();
    let (_, by_author) = library(&t);
    let result: foliodb::Result<(String, Versioned<JsonValue>)> = by_author.one("tolkien");
    assert!(matches!(result, Err(Error::NotFound)));
}

#[test]
fn get_all_returns_bucket_documents() {
    let t = TestDb::new();
    let (_, by_author) = library(&t);

    let entries = by_author.get_all("le guin").unwrap();
    let keys: Vec<_> = entries.iter().map(|e| e.key_str().into_owned()).collect();
    assert_eq!(keys, vec!["b1", "b2"]);
    let titles: Vec<JsonValue> = entries
        .iter()
        .map(|e| e.decode::<JsonValue>().unwrap()["title"].clone())
        .collect();
    assert_eq!(titles, vec![json!("the dispossessed"), json!("the lathe of heaven")]);

    assert!(by_author.get_all("nobody").unwrap().is_empty());
}

#[test]
fn index_handle_lookup() {
    let t = TestDb::new();
    let (table, _) = library(&t);
    let handle = table.index("author").unwrap();
    assert_eq!(handle.name(), "author");
    assert_eq!(handle.qualified_name(), "books/author");
    assert_eq!(handle.path().to_string(), "author");
    assert!(table.index("title").is_none());
}

#[test]
fn index_range_yields_documents_by_value() {
    let t = TestDb::new();
    let (_, by_author) = library(&t);

    let keys: Vec<String> = by_author
        .all(false)
        .unwrap()
        .map(|e| e.unwrap().key_str().into_owned())
        .collect();
    assert_eq!(keys, vec!["b3", "b1", "b2"]);

    let only_banks: Vec<String> = by_author
        .between(
            KeyBound::index_value("banks").unwrap(),
            KeyBound::index_value("banks").unwrap(),
            false,
        )
        .unwrap()
        .map(|e| e.unwrap().key_str().into_owned())
        .collect();
    assert_eq!(only_banks, vec!["b3"]);
}
