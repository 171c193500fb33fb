//! Compile offset-paginated statements and build page navigation from rows.
//!
//! No database is needed; rows are faked to show what `Paginator` derives
//! from the probe rows.
//!
//! Run with: `cargo run --example offset_pagination -p seekpage`

use seekpage::{
    Compiler, Dialect, OrderBy, PageResult, Pager, PagerConfig, ParamList, Paginator,
};

const CONFIG: &str = r#"
[pagination]
default_size = 10
default_each_side = 2
max_size = 50
"#;

fn print_header(title: &str) {
    println!("\n=== {title} ===");
}

fn main() -> PageResult<()> {
    let config = PagerConfig::from_toml_str(CONFIG)?;
    let order = OrderBy::new().desc("created_at")?.asc("id")?;
    let params = ParamList::new()
        .bind("status", vec!["active", "pending"])
        .bind("owner", 42);
    let sql = "SELECT id, title, created_at FROM posts \
               WHERE owner_id = :owner AND status IN (:status)";
    let compiler = Compiler::new(Dialect::MySql);

    print_header("Page 3 from request values");
    // `size=500` is clamped to `max_size`.
    let pager = Pager::from_request(&config, Some(3), Some(500), None);
    let q = compiler.compile(sql, &order, &params, &pager, None)?;
    println!("SQL:    {}", q.sql());
    for (name, p) in q.params() {
        println!("  :{name} = {:?} ({:?})", p.value(), p.param_type());
    }

    // LIMIT covers this page, two look-ahead pages and one probe row.
    // Pretend only 64 rows remained past the offset.
    let rows: Vec<i64> = (101..=164).collect();
    let page = Paginator::from_window(rows, q.window(), None)?;
    println!("items:  {:?}", page.items());
    println!("pages:  {:?}", page.focus_pages());
    println!("next:   {:?}", page.next_url("/posts?page={page}"));
    println!("prev:   {:?}", page.prev_url("/posts?page={page}"));

    print_header("Counting query");
    let count = compiler.count_query(sql, &params)?;
    println!("SQL:    {}", count.sql());

    print_header("Page with a known total");
    let pager = Pager::from_config(&config).with_page(9);
    let q = compiler.compile(sql, &order, &params, &pager, None)?;
    let rows: Vec<i64> = (81..=83).collect();
    let page = Paginator::from_window(rows, q.window(), Some(83))?;
    println!(
        "meta:   {}",
        serde_json::to_string(&page.meta()).unwrap_or_default()
    );

    Ok(())
}
