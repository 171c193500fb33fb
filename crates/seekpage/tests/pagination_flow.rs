//! Multi-request pagination against an in-memory table.

use indexmap::IndexMap;
use seekpage::{
    BindValue, Dialect, Driver, MemoryCursorStore, OrderBy, PageRequest, PageResult, Pager,
    ParamList, Params, Value, paginate, paginate_offset,
};
use std::sync::Mutex;

type Row = IndexMap<String, Value>;

/// Serves `ids` sorted by `id`, honouring the compiled ORDER BY direction,
/// LIMIT/OFFSET and a single-column `id` seek predicate.
struct Table {
    ids: Vec<i64>,
    executed: Mutex<Vec<String>>,
}

impl Table {
    fn new(n: i64) -> Self {
        Self {
            ids: (1..=n).collect(),
            executed: Mutex::new(Vec::new()),
        }
    }

    fn last_sql(&self) -> String {
        self.executed.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

fn number_after(sql: &str, keyword: &str) -> usize {
    let at = sql.rfind(keyword).unwrap() + keyword.len();
    sql[at..].split_whitespace().next().unwrap().parse().unwrap()
}

fn row(id: i64) -> Row {
    let mut r = IndexMap::new();
    r.insert("id".to_string(), Value::Int(id));
    r.insert("title".to_string(), Value::from(format!("post {id}")));
    r
}

impl Driver for Table {
    type Row = Row;

    async fn execute(&self, _: Dialect, sql: &str, params: &Params) -> PageResult<Vec<Row>> {
        self.executed.lock().unwrap().push(sql.to_string());

        let mut ids = self.ids.clone();
        if let Some(bound) = params.get("cursor__0") {
            let BindValue::Int(v) = *bound.value() else {
                panic!("unexpected cursor bind {bound:?}");
            };
            let keep: fn(i64, i64) -> bool = if sql.contains("id >= :cursor__0") {
                |id, v| id >= v
            } else if sql.contains("id > :cursor__0") {
                |id, v| id > v
            } else if sql.contains("id <= :cursor__0") {
                |id, v| id <= v
            } else {
                |id, v| id < v
            };
            ids.retain(|&id| keep(id, v));
        }
        if sql.contains("ORDER BY id DESC") {
            ids.reverse();
        }

        let limit = number_after(sql, "LIMIT");
        let offset = number_after(sql, "OFFSET");
        Ok(ids.into_iter().skip(offset).take(limit).map(row).collect())
    }

    async fn count(&self, _: Dialect, sql: &str, _: &Params) -> PageResult<i64> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(self.ids.len() as i64)
    }
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|r| match r["id"] {
            Value::Int(id) => id,
            _ => unreachable!(),
        })
        .collect()
}

const SQL: &str = "SELECT id, title FROM posts";

#[tokio::test]
async fn walks_forward_with_keyset_cursors() {
    let table = Table::new(23);
    let store = MemoryCursorStore::new();
    let order = OrderBy::new().asc("id").unwrap();
    let params = ParamList::new();
    let first = Pager::new(1, 5).with_cursor_name("feed");

    let page1 = paginate(
        &table,
        Dialect::Sqlite,
        PageRequest::new(SQL, &order, &params, &first),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(ids(page1.items()), [1, 2, 3, 4, 5]);
    assert!(table.last_sql().ends_with("LIMIT 6 OFFSET 0"));
    assert!(page1.has_next());

    let second = first.next(1);
    let page2 = paginate(
        &table,
        Dialect::Sqlite,
        PageRequest::new(SQL, &order, &params, &second),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(ids(page2.items()), [6, 7, 8, 9, 10]);
    assert_eq!(
        table.last_sql(),
        "SELECT id, title FROM posts WHERE (id >= :cursor__0) ORDER BY id ASC LIMIT 6 OFFSET 0"
    );
    assert_eq!(page2.page(), 2);
    assert_eq!(page2.from(), 6);
}

#[tokio::test]
async fn jumping_pages_falls_back_to_offset() {
    let table = Table::new(23);
    let store = MemoryCursorStore::new();
    let order = OrderBy::new().asc("id").unwrap();
    let params = ParamList::new();
    let pager = Pager::new(1, 5).with_cursor_name("feed");

    paginate(&table, Dialect::MySql, PageRequest::new(SQL, &order, &params, &pager), &store)
        .await
        .unwrap();

    let fourth = pager.with_page(4);
    let page4 = paginate(&table, Dialect::MySql, PageRequest::new(SQL, &order, &params, &fourth), &store)
        .await
        .unwrap();
    assert_eq!(ids(page4.items()), [16, 17, 18, 19, 20]);
    assert!(table.last_sql().ends_with("LIMIT 6 OFFSET 15"));

    let fifth = fourth.next(1);
    let page5 = paginate(&table, Dialect::MySql, PageRequest::new(SQL, &order, &params, &fifth), &store)
        .await
        .unwrap();
    assert!(table.last_sql().contains("WHERE (id >= :cursor__0)"));
    assert_eq!(ids(page5.items()), [21, 22, 23]);
    assert!(!page5.has_next());
    assert!(page5.on_last_page());
    assert_eq!(page5.to(), 23);
}

#[tokio::test]
async fn changed_page_size_ignores_stored_cursor() {
    let table = Table::new(30);
    let store = MemoryCursorStore::new();
    let order = OrderBy::new().asc("id").unwrap();
    let params = ParamList::new();
    let pager = Pager::new(1, 5).with_cursor_name("feed");

    paginate(&table, Dialect::MySql, PageRequest::new(SQL, &order, &params, &pager), &store)
        .await
        .unwrap();

    let resized = pager.next(1).with_size(10);
    let page = paginate(&table, Dialect::MySql, PageRequest::new(SQL, &order, &params, &resized), &store)
        .await
        .unwrap();
    assert!(!table.last_sql().contains("cursor__0"));
    assert_eq!(ids(page.items()), (11..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn look_ahead_fills_focus_window_and_total() {
    let table = Table::new(100);
    let order = OrderBy::new().desc("id").unwrap();
    let params = ParamList::new();
    let pager = Pager::new(1, 10).with_each_side(2).with_need_total(true);

    let page = paginate_offset(
        &table,
        Dialect::Postgres,
        PageRequest::new(SQL, &order, &params, &pager),
    )
    .await
    .unwrap();

    assert_eq!(ids(page.items())[0], 100);
    assert_eq!(page.total(), Some(100));
    assert_eq!(page.last_page(), Some(10));
    assert_eq!(page.focus_pages(), [1, 2, 3, 4, 5]);
    let executed = table.executed.lock().unwrap();
    assert!(executed[0].ends_with("ORDER BY id DESC LIMIT 41 OFFSET 0"));
    assert_eq!(
        executed[1],
        "SELECT COUNT(*) FROM (SELECT id, title FROM posts) AS seekpage_count"
    );
}

#[tokio::test]
async fn probe_mode_without_total() {
    let table = Table::new(26);
    let order = OrderBy::new().asc("id").unwrap();
    let params = ParamList::new();
    let pager = Pager::new(2, 10).with_each_side(1);

    let page = paginate_offset(
        &table,
        Dialect::Sqlite,
        PageRequest::new(SQL, &order, &params, &pager),
    )
    .await
    .unwrap();

    assert_eq!(page.total(), None);
    assert_eq!(page.next_page_count(), 1);
    assert_eq!(page.focus_pages(), [1, 2, 3]);
    assert_eq!(page.meta().to, 20);
}
