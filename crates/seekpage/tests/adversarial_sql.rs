//! Statements that try to confuse the splice scanner.

use seekpage::{Compiler, Cursor, Dialect, OrderBy, PageError, Pager, ParamList, Value};

fn keyset(dialect: Dialect, sql: &str) -> Result<String, PageError> {
    let order = OrderBy::new().asc("id").unwrap();
    let pager = Pager::new(2, 10);
    let cursor = Cursor::create(&order, &pager, &[("id", Value::Int(10))], None).unwrap();
    Compiler::new(dialect)
        .compile(sql, &order, &ParamList::new(), &pager, Some(&cursor))
        .map(|q| q.sql().to_string())
}

const TAIL: &str = "ORDER BY id ASC LIMIT 11 OFFSET 0";

#[test]
fn keyword_inside_string_literal() {
    let sql = keyset(Dialect::MySql, "SELECT * FROM t WHERE note = 'x WHERE y ORDER BY z'").unwrap();
    assert_eq!(
        sql,
        format!("SELECT * FROM t WHERE (note = 'x WHERE y ORDER BY z') AND (id >= :cursor__0) {TAIL}")
    );
}

#[test]
fn keyword_inside_comments() {
    let sql = keyset(
        Dialect::Postgres,
        "SELECT * FROM t -- WHERE hidden\n/* ORDER BY nope */",
    )
    .unwrap();
    assert!(sql.starts_with("SELECT * FROM t WHERE (id >= :cursor__0)"));
    assert!(sql.ends_with(TAIL));
}

#[test]
fn keyword_inside_quoted_identifiers() {
    let sql = keyset(Dialect::MySql, "SELECT `where`, \"order\" FROM t").unwrap();
    assert_eq!(
        sql,
        format!("SELECT `where`, \"order\" FROM t WHERE (id >= :cursor__0) {TAIL}")
    );
}

#[test]
fn where_in_subquery_is_not_top_level() {
    let sql = keyset(
        Dialect::MySql,
        "SELECT * FROM (SELECT * FROM u WHERE a = 1 ORDER BY b LIMIT 9) t",
    )
    .unwrap();
    assert_eq!(
        sql,
        format!("SELECT * FROM (SELECT * FROM u WHERE a = 1 ORDER BY b LIMIT 9) t WHERE (id >= :cursor__0) {TAIL}")
    );
}

#[test]
fn correlated_subquery_in_where() {
    let sql = keyset(
        Dialect::Sqlite,
        "SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.t_id = t.id) OR t.pinned",
    )
    .unwrap();
    assert!(sql.starts_with(
        "SELECT * FROM t WHERE (EXISTS (SELECT 1 FROM u WHERE u.t_id = t.id) OR t.pinned) AND (id >= :cursor__0)"
    ));
}

#[test]
fn cte_with_inner_order() {
    let sql = keyset(
        Dialect::Postgres,
        "WITH recent AS (SELECT * FROM t ORDER BY id DESC LIMIT 100) SELECT * FROM recent;",
    )
    .unwrap();
    assert!(sql.ends_with(&format!("SELECT * FROM recent WHERE (id >= :cursor__0) {TAIL}")));
}

#[test]
fn lowercase_and_mixed_case_keywords() {
    let sql = keyset(Dialect::MySql, "select * from t where a = 1 group by id").unwrap();
    assert_eq!(
        sql,
        format!("select * from t where (a = 1) AND (id >= :cursor__0) group by id {TAIL}")
    );
}

#[test]
fn placeholders_in_literals_are_left_alone() {
    let q = Compiler::new(Dialect::MySql)
        .compile(
            "SELECT ':ids' AS label, x FROM t WHERE x IN (:ids)",
            &OrderBy::new(),
            &ParamList::new().bind("ids", vec![1, 2]),
            &Pager::new(1, 10),
            None,
        )
        .unwrap();
    assert!(q.sql().starts_with("SELECT ':ids' AS label, x FROM t WHERE x IN (:ids__0, :ids__1)"));
}

#[test]
fn fails_closed_on_ambiguous_statements() {
    let cases = [
        "SELECT * FROM t WHERE a = 1 UNION ALL SELECT * FROM u",
        "SELECT * FROM t LIMIT 10",
        "SELECT * FROM t ORDER BY id",
        "SELECT * FROM t WHERE (a = 1",
        "SELECT * FROM t WHERE a = 1)",
        "SELECT * FROM t WHERE a = 'oops",
        "SELECT * FROM t; DROP TABLE t",
        "",
    ];
    for sql in cases {
        let err = keyset(Dialect::MySql, sql).unwrap_err();
        assert!(err.is_insertion_point(), "{sql:?} -> {err}");
    }
}

#[test]
fn injection_through_params_stays_bound() {
    let q = Compiler::new(Dialect::MySql)
        .compile(
            "SELECT * FROM t WHERE name = :name",
            &OrderBy::new().asc("id").unwrap(),
            &ParamList::new().bind("name", "x'; DROP TABLE t; --"),
            &Pager::new(1, 10),
            None,
        )
        .unwrap();
    assert!(!q.sql().contains("DROP"));
    assert_eq!(q.params().len(), 1);
}

#[test]
fn mysql_double_quoted_literal_with_escaped_quote() {
    let sql = keyset(
        Dialect::MySql,
        r#"SELECT * FROM t WHERE note = "a\" WHERE 1=1 \"""#,
    )
    .unwrap();
    assert_eq!(
        sql,
        format!(r#"SELECT * FROM t WHERE (note = "a\" WHERE 1=1 \"") AND (id >= :cursor__0) {TAIL}"#)
    );

    let err = keyset(Dialect::MySql, r#"SELECT * FROM t WHERE note = "a\""#).unwrap_err();
    assert!(err.is_insertion_point());
}
