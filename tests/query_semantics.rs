//! Query semantics through the public facade
//!
//! Index choice must never change what a request returns, only how much of
//! the store it visits.

use keyscan::planner::WhereValue;
use keyscan::{
    between, gt, gte, lt, lte, Database, DatabaseConfig, MemoryStorage, QueryOptions, Record,
    RecordTypeDescriptor, SortDirection,
};
use serde_json::{json, Value};

fn student(indexed: bool) -> RecordTypeDescriptor {
    let builder = RecordTypeDescriptor::builder("student").primary_key("id", true);
    let builder = if indexed {
        builder
            .index("by_age", "age")
            .unique_index("by_email", "email")
            .unique_index("uni_link", ["student_number", "hostel_number", "bed_number"])
    } else {
        builder
    };
    builder.build().unwrap()
}

async fn school(indexed: bool) -> Database<MemoryStorage> {
    let config = DatabaseConfig::new("school", 1).with_record_type(student(indexed));
    Database::connect(&MemoryStorage::new(), config).await.unwrap()
}

/// 100 students aged 1..=100, inserted in descending age order
async fn hundred_students(indexed: bool) -> Database<MemoryStorage> {
    let db = school(indexed).await;
    let student = db.record_type("student").unwrap();
    let records = (1..=100)
        .rev()
        .map(|age| {
            json!({
                "name": format!("student-{}", age),
                "age": age,
                "email": format!("s{}@school.io", age),
                "student_number": age,
                "hostel_number": age % 4,
                "bed_number": age % 7,
            })
        })
        .collect();
    let results = db.insert(&student, records).await.unwrap();
    assert!(results.iter().all(Result::is_ok));
    db
}

fn values(records: &[Record], field: &str) -> Vec<Value> {
    records
        .iter()
        .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn sorted_ids(records: &[Record]) -> Vec<i64> {
    let mut ids: Vec<i64> = records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_find_one_walks_index_in_key_order() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let found = db
        .find_one(&student, QueryOptions::new().filter("age", gt(12)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["age"], json!(13));

    let plan = db.explain(&student, &QueryOptions::new().filter("age", gt(12)));
    assert_eq!(plan.scan_type, "INDEX_RANGE");
}

#[tokio::test]
async fn test_composite_unique_lookup() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let options = QueryOptions::new()
        .filter("bed_number", 42 % 7)
        .filter("hostel_number", 42 % 4)
        .filter("student_number", 42);
    assert_eq!(db.explain(&student, &options).scan_type, "INDEX_EQ");
    assert_eq!(
        db.explain(&student, &options).index.as_deref(),
        Some("uni_link")
    );

    let found = db.find(&student, options).await.unwrap();
    assert_eq!(values(&found, "age"), vec![json!(42)]);
}

#[tokio::test]
async fn test_index_is_transparent_to_results() {
    let indexed = hundred_students(true).await;
    let plain = hundred_students(false).await;
    let with_index = indexed.record_type("student").unwrap();
    let without_index = plain.record_type("student").unwrap();

    let requests = vec![
        QueryOptions::new().filter("age", gt(90)),
        QueryOptions::new().filter("age", between(10, 20, true, false)),
        QueryOptions::new().filter("age", lte(5)).filter("hostel_number", 1),
        QueryOptions::new().filter("email", "s7@school.io"),
        QueryOptions::new().filter("id", gte(95)),
        QueryOptions::new()
            .filter("student_number", 8)
            .filter("hostel_number", 0)
            .filter("bed_number", 1),
        QueryOptions::new().filter("age", "12"),
    ];

    for options in requests {
        let a = indexed.find(&with_index, options.clone()).await.unwrap();
        let b = plain.find(&without_index, options.clone()).await.unwrap();
        assert_eq!(sorted_ids(&a), sorted_ids(&b), "differs for {:?}", options);
    }
}

#[tokio::test]
async fn test_between_composed_from_bounds() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let chained = db
        .find(&student, QueryOptions::new().filter("age", gte(3).lt(7)))
        .await
        .unwrap();
    let paired = db
        .find(
            &student,
            QueryOptions::new().filter("age", WhereValue::from((gte(3), lt(7)))),
        )
        .await
        .unwrap();
    let explicit = db
        .find(
            &student,
            QueryOptions::new().filter("age", between(3, 7, true, false)),
        )
        .await
        .unwrap();

    let expected: Vec<Value> = (3..7).map(|age| json!(age)).collect();
    assert_eq!(values(&chained, "age"), expected);
    assert_eq!(values(&paired, "age"), expected);
    assert_eq!(values(&explicit, "age"), expected);
}

#[tokio::test]
async fn test_order_skip_limit() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let page = db
        .find(
            &student,
            QueryOptions::new()
                .filter("age", lte(10))
                .order_by("age", SortDirection::Desc)
                .skip(2)
                .limit(3),
        )
        .await
        .unwrap();
    assert_eq!(values(&page, "age"), vec![json!(8), json!(7), json!(6)]);

    // Inserted in descending age order, so ids run the other way
    let by_id = db
        .find(
            &student,
            QueryOptions::new()
                .order_by("id", SortDirection::Desc)
                .limit(2),
        )
        .await
        .unwrap();
    assert_eq!(values(&by_id, "id"), vec![json!(100), json!(99)]);
    assert_eq!(values(&by_id, "age"), vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_find_one_respects_order() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let oldest = db
        .find_one(
            &student,
            QueryOptions::new()
                .filter("hostel_number", 0)
                .order_by("age", SortDirection::Desc),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oldest["age"], json!(100));
}

#[tokio::test]
async fn test_missing_sort_field_sorts_last() {
    let db = school(true).await;
    let student = db.record_type("student").unwrap();
    db.insert(
        &student,
        vec![
            json!({"name": "a", "age": 30}),
            json!({"name": "b"}),
            json!({"name": "c", "age": 10}),
            json!({"name": "d", "age": 20}),
        ],
    )
    .await
    .unwrap();

    let asc = db
        .find(&student, QueryOptions::new().order_by("age", SortDirection::Asc))
        .await
        .unwrap();
    assert_eq!(
        values(&asc, "name"),
        vec![json!("c"), json!("d"), json!("a"), json!("b")]
    );

    let desc = db
        .find(&student, QueryOptions::new().order_by("age", SortDirection::Desc))
        .await
        .unwrap();
    assert_eq!(
        values(&desc, "name"),
        vec![json!("a"), json!("d"), json!("c"), json!("b")]
    );

    // Ties on the first key fall through to the second
    let multi = db
        .find(
            &student,
            QueryOptions::new()
                .order_by("missing", SortDirection::Asc)
                .order_by("name", SortDirection::Desc),
        )
        .await
        .unwrap();
    assert_eq!(
        values(&multi, "name"),
        vec![json!("d"), json!("c"), json!("b"), json!("a")]
    );
}

#[tokio::test]
async fn test_mixed_type_column_keeps_numbers_numeric() {
    let db = school(false).await;
    let student = db.record_type("student").unwrap();
    let records = (0..2000)
        .map(|i| match i % 3 {
            0 => json!({"v": (i * 7919) % 5000}),
            1 => json!({"v": format!("name-{}", i % 211)}),
            _ => json!({"v": null}),
        })
        .collect();
    db.insert(&student, records).await.unwrap();

    let sorted = db
        .find(&student, QueryOptions::new().order_by("v", SortDirection::Asc))
        .await
        .unwrap();
    assert_eq!(sorted.len(), 2000);

    let numbers: Vec<f64> = sorted.iter().filter_map(|r| r["v"].as_f64()).collect();
    assert_eq!(numbers.len(), 667);
    assert!(numbers.windows(2).all(|w| w[0] <= w[1]));

    // null < number < string
    assert!(sorted[0]["v"].is_null());
    assert!(sorted[1999]["v"].is_string());
}

#[tokio::test]
async fn test_skip_past_end_of_single_record_store() {
    let db = school(true).await;
    let student = db.record_type("student").unwrap();
    db.insert_one(&student, json!({"name": "only", "age": 1}))
        .await
        .unwrap();

    let streamed = db
        .find(&student, QueryOptions::new().skip(1))
        .await
        .unwrap();
    assert!(streamed.is_empty());

    let sorted = db
        .find(
            &student,
            QueryOptions::new()
                .order_by("age", SortDirection::Asc)
                .skip(5)
                .limit(10),
        )
        .await
        .unwrap();
    assert!(sorted.is_empty());

    assert!(db
        .find_one(&student, QueryOptions::new().skip(1))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_zero_limit_touches_nothing() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let deleted = db
        .delete(&student, QueryOptions::new().limit(0))
        .await
        .unwrap();
    assert!(deleted.is_empty());
    assert!(db
        .delete_one(&student, QueryOptions::new().limit(0))
        .await
        .unwrap()
        .is_none());

    let all = db.find(&student, QueryOptions::new()).await.unwrap();
    assert_eq!(all.len(), 100);
}

#[tokio::test]
async fn test_batch_found_by_range_in_scan_order() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let none = db
        .find(&student, QueryOptions::new().filter("age", gt(1000)))
        .await
        .unwrap();
    assert!(none.is_empty());

    let keys = db
        .insert(
            &student,
            vec![
                json!({"name": "w", "age": 1004}),
                json!({"name": "x", "age": 1001}),
                json!({"name": "y", "age": 1003}),
                json!({"name": "z", "age": 1002}),
            ],
        )
        .await
        .unwrap();
    assert_eq!(keys.len(), 4);
    assert!(keys.iter().all(Result::is_ok));

    // Walks the age index, so results come back in age order
    let batch = db
        .find(&student, QueryOptions::new().filter("age", gt(1000)))
        .await
        .unwrap();
    assert_eq!(
        values(&batch, "name"),
        vec![json!("x"), json!("z"), json!("y"), json!("w")]
    );
}

#[tokio::test]
async fn test_primary_key_survives_update() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let updated = db
        .update_one(
            &student,
            json!({"id": 5000, "name": "renamed"}),
            QueryOptions::new().filter("email", "s50@school.io"),
        )
        .await
        .unwrap()
        .unwrap();
    let id = updated["id"].clone();
    assert_ne!(id, json!(5000));
    assert_eq!(updated["name"], json!("renamed"));

    let stored = db.get(&student, &id).await.unwrap().unwrap();
    assert_eq!(stored["name"], json!("renamed"));
    assert_eq!(stored["age"], json!(50));
    assert!(db.get(&student, &json!(5000)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_many_moves_records_along_the_index() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let updated = db
        .update(
            &student,
            json!({"age": 500}),
            QueryOptions::new().filter("age", gte(91)),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 10);

    let moved = db
        .find(&student, QueryOptions::new().filter("age", 500))
        .await
        .unwrap();
    assert_eq!(moved.len(), 10);
}

#[tokio::test]
async fn test_delete_then_find() {
    let db = hundred_students(true).await;
    let student = db.record_type("student").unwrap();

    let removed = db
        .delete(&student, QueryOptions::new().filter("age", lt(11)))
        .await
        .unwrap();
    assert_eq!(removed.len(), 10);

    let first = db
        .delete_one(
            &student,
            QueryOptions::new().order_by("age", SortDirection::Asc),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first["age"], json!(11));

    let left = db.find(&student, QueryOptions::new()).await.unwrap();
    assert_eq!(left.len(), 89);
}

#[tokio::test]
async fn test_delete_by_primary_range_includes_zero_key() {
    let config = DatabaseConfig::new("ledger", 1).with_record_type(
        RecordTypeDescriptor::builder("entry")
            .primary_key("id", false)
            .build()
            .unwrap(),
    );
    let db = Database::connect(&MemoryStorage::new(), config)
        .await
        .unwrap();
    let entry = db.record_type("entry").unwrap();

    let key = db
        .insert_one(&entry, json!({"id": 0, "memo": "opening"}))
        .await
        .unwrap();
    assert_eq!(key, json!(0));

    let deleted = db
        .delete(&entry, QueryOptions::new().filter("id", lte(100)))
        .await
        .unwrap();
    assert_eq!(values(&deleted, "memo"), vec![json!("opening")]);
    assert!(db.find(&entry, QueryOptions::new()).await.unwrap().is_empty());
}
