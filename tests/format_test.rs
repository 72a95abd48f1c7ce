//! Integration tests for parameter binding and query formatting.

mod common;

use chrono::NaiveDate;
use common::MockPool;
use db_access_layer::db::{QueryFormatter, query_id};
use db_access_layer::{
    Database, Escaper, MySqlEscaper, SqlValue, bindings, format_query, paramify,
};
use serde_json::json;

#[test]
fn test_paramify_into_in_clause() {
    let ids = vec![4, 8, 15];
    let set = paramify(ids, "id");
    let sql = format!("SELECT * FROM users WHERE id IN ({})", set.placeholder_list());

    assert_eq!(sql, "SELECT * FROM users WHERE id IN (:id0, :id1, :id2)");
    assert_eq!(
        format_query(&sql, Some(set.values()), &MySqlEscaper),
        "SELECT * FROM users WHERE id IN (4, 8, 15)"
    );
}

#[test]
fn test_two_param_sets_with_distinct_prefixes() {
    let names = paramify(["ann", "bo"], "n");
    let roles = paramify(["admin"], "r");
    let sql = format!(
        "SELECT * FROM users WHERE name IN ({}) AND role IN ({})",
        names.placeholder_list(),
        roles.placeholder_list()
    );

    let mut values = names.into_values();
    values.extend(roles.into_values());

    assert_eq!(
        format_query(&sql, Some(&values), &MySqlEscaper),
        "SELECT * FROM users WHERE name IN ('ann', 'bo') AND role IN ('admin')"
    );
}

#[test]
fn test_list_binding_expands_inline() {
    let b = bindings! { "ids" => vec![1, 2, 3], "rows" => vec![vec!["a", "b"], vec!["c", "d"]] };
    assert_eq!(
        format_query("DELETE FROM t WHERE id IN (:ids)", Some(&b), &MySqlEscaper),
        "DELETE FROM t WHERE id IN (1, 2, 3)"
    );
    assert_eq!(
        format_query("INSERT INTO t (x, y) VALUES :rows", Some(&b), &MySqlEscaper),
        "INSERT INTO t (x, y) VALUES ('a', 'b'), ('c', 'd')"
    );
}

#[test]
fn test_mixed_value_types() {
    let created = NaiveDate::from_ymd_opt(2023, 7, 1)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let b = bindings! {
        "name" => "O'Reilly",
        "active" => true,
        "score" => 9.5,
        "deleted" => None::<i32>,
        "created" => created,
        "meta" => json!({"tier": "gold"}),
        "now" => SqlValue::raw("NOW()"),
    };

    let sql = format_query(
        "INSERT INTO u VALUES (:name, :active, :score, :deleted, :created, :meta, :now)",
        Some(&b),
        &MySqlEscaper,
    );
    assert_eq!(
        sql,
        "INSERT INTO u VALUES ('O\\'Reilly', true, 9.5, NULL, '2023-07-01 08:30:00.000', \
         '{\\\"tier\\\":\\\"gold\\\"}', NOW())"
    );
}

#[test]
fn test_colons_outside_placeholders_survive() {
    let b = bindings! { "id" => 1 };
    assert_eq!(
        format_query(
            "SELECT '10:30' AS t, :id AS id, :other AS o",
            Some(&b),
            &MySqlEscaper
        ),
        "SELECT '10:30' AS t, 1 AS id, :other AS o"
    );
}

#[test]
fn test_injection_stays_inside_literal() {
    let b = bindings! { "name" => "'; DROP TABLE users; --" };
    assert_eq!(
        format_query("SELECT * FROM users WHERE name = :name", Some(&b), &MySqlEscaper),
        "SELECT * FROM users WHERE name = '\\'; DROP TABLE users; --'"
    );
}

/// Escaper that renders every value as `?`, to show escaping is pluggable.
struct Redacting;

impl Escaper for Redacting {
    fn escape(&self, _value: &SqlValue) -> String {
        "?".to_string()
    }
}

#[test]
fn test_custom_escaper() {
    let b = bindings! { "a" => 1, "b" => "secret" };
    assert_eq!(
        format_query("SELECT :a, :b, :c", Some(&b), &Redacting),
        "SELECT ?, ?, :c"
    );
}

#[tokio::test]
async fn test_database_formats_through_pool_hook() {
    let pool = MockPool::with_formatter(QueryFormatter::new(std::sync::Arc::new(Redacting), None));
    let db = Database::from_pool(pool.clone(), None);

    assert_eq!(
        db.query_format("SELECT :x", Some(&bindings! { "x" => 1 })),
        "SELECT ?"
    );

    db.query("INSERT :x", Some(&bindings! { "x" => "value" }))
        .await
        .unwrap();
    assert_eq!(pool.state.committed(), ["?"]);
}

#[test]
fn test_query_id_ignores_bound_values() {
    let template = "SELECT * FROM t WHERE id = :id";
    let first = format_query(template, Some(&bindings! { "id" => 1 }), &MySqlEscaper);
    let second = format_query(template, Some(&bindings! { "id" => 2 }), &MySqlEscaper);

    assert_ne!(first, second);
    assert_eq!(query_id(template), query_id(template));
    assert_ne!(query_id(&first), query_id(&second));
}
