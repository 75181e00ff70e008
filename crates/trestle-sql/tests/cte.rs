//! CTE hoisting, deduplication, conflicts, and WITH placement.

use trestle_sql::*;

fn render(dialect: Dialect, stmt: &Stmt) -> Result<String> {
    render_statement(dialect, stmt, &RenderOptions::default())
}

fn stats_cte(name: &str, table: &str) -> std::sync::Arc<Cte> {
    Cte::new(
        name,
        SelectStmt::new()
            .item(SelectItem::expr(Expr::column("id")))
            .from(TableExpr::table(table)),
    )
}

#[test]
fn test_shared_cte_renders_one_definition() {
    let stats = stats_cte("stats", "orders");
    let stmt = Stmt::Select(
        SelectStmt::new()
            .from(TableExpr::Cte(stats.clone()))
            .where_(Expr::exists(
                SelectStmt::new().from(TableExpr::Cte(stats)).into(),
            ))
            .into(),
    );
    let sql = render(Dialect::Tsql, &stmt).unwrap();
    assert_eq!(sql.matches("[stats] AS (").count(), 1);
    assert_eq!(
        sql,
        "WITH [stats] AS (SELECT [id] FROM [orders]) SELECT * FROM [stats] WHERE EXISTS (SELECT * FROM [stats])"
    );
}

#[test]
fn test_equal_but_distinct_definitions_also_dedup() {
    let first = stats_cte("stats", "orders");
    let second = stats_cte("stats", "orders");
    let stmt = Stmt::Select(
        SelectStmt::new()
            .from(TableExpr::Cte(first))
            .where_(Expr::exists(
                SelectStmt::new().from(TableExpr::Cte(second)).into(),
            ))
            .into(),
    );
    let sql = render(Dialect::Tsql, &stmt).unwrap();
    assert_eq!(sql.matches("[stats] AS (").count(), 1);
}

#[test]
fn test_conflicting_names_error() {
    let orders = stats_cte("stats", "orders");
    let users = stats_cte("stats", "users");
    let stmt = Stmt::Select(
        SelectStmt::new()
            .from(TableExpr::Cte(orders))
            .where_(Expr::exists(
                SelectStmt::new().from(TableExpr::Cte(users)).into(),
            ))
            .into(),
    );
    assert!(matches!(
        render(Dialect::Tsql, &stmt),
        Err(Error::CteNameConflict { .. })
    ));
    assert!(matches!(
        render(Dialect::Postgres, &stmt),
        Err(Error::CteNameConflict { .. })
    ));
}

#[test]
fn test_with_attaches_to_inner_select_for_mysql_insert() {
    let src = stats_cte("src", "staging");
    let stmt = Stmt::Insert(
        InsertStmt::new(TableRef::new("t")).columns(["a"]).query(
            SelectStmt::new()
                .item(SelectItem::expr(Expr::column("id")))
                .from(TableExpr::Cte(src)),
        ),
    );
    assert_eq!(
        render(Dialect::MySql, &stmt).unwrap(),
        "INSERT INTO `t` (`a`) WITH `src` AS (SELECT `id` FROM `staging`) SELECT `id` FROM `src`"
    );
}

#[test]
fn test_with_precedes_insert_on_tsql() {
    let src = stats_cte("src", "staging");
    let stmt = Stmt::Insert(
        InsertStmt::new(TableRef::new("t")).columns(["a"]).query(
            SelectStmt::new()
                .item(SelectItem::expr(Expr::column("id")))
                .from(TableExpr::Cte(src)),
        ),
    );
    assert_eq!(
        render(Dialect::Tsql, &stmt).unwrap(),
        "WITH [src] AS (SELECT [id] FROM [staging]) INSERT INTO [t] ([a]) SELECT [id] FROM [src]"
    );
}

#[test]
fn test_cte_in_mysql_insert_values_is_unsupported() {
    let src = stats_cte("src", "staging");
    let stmt = Stmt::Insert(
        InsertStmt::new(TableRef::new("t"))
            .columns(["a"])
            .row([Expr::subquery(
                SelectStmt::new()
                    .item(SelectItem::expr(Expr::column("id")))
                    .from(TableExpr::Cte(src))
                    .into(),
            )]),
    );
    assert!(matches!(
        render(Dialect::MySql, &stmt),
        Err(Error::Unsupported { .. })
    ));
}

#[test]
fn test_each_script_statement_hoists_its_own_with() {
    let stats = stats_cte("stats", "orders");
    let select = Stmt::Select(
        SelectStmt::new()
            .from(TableExpr::Cte(stats))
            .into(),
    );
    let sql = render_script(
        Dialect::Tsql,
        &[select.clone(), select],
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(
        sql,
        "WITH [stats] AS (SELECT [id] FROM [orders]) SELECT * FROM [stats]; WITH [stats] AS (SELECT [id] FROM [orders]) SELECT * FROM [stats]"
    );
}

#[test]
fn test_cte_alias_used_at_reference() {
    let a = AliasId::new();
    let recent = Cte::aliased(
        "recent",
        a,
        SelectStmt::new()
            .item(SelectItem::expr(Expr::column("id")))
            .from(TableExpr::table("events")),
    );
    let stmt = Stmt::Select(
        SelectStmt::new()
            .item(SelectItem::expr(Expr::qualified_column(a, "id")))
            .from(TableExpr::Cte(recent))
            .into(),
    );
    assert_eq!(
        render(Dialect::Tsql, &stmt).unwrap(),
        "WITH [recent] AS (SELECT [id] FROM [events]) SELECT [A0].[id] FROM [recent] [A0]"
    );
    assert_eq!(
        render(Dialect::Postgres, &stmt).unwrap(),
        "SELECT \"A0\".\"id\" FROM (WITH \"recent\" AS (SELECT \"id\" FROM \"events\") SELECT * FROM \"recent\") \"A0\""
    );
}

#[test]
fn test_cte_under_update_hoists() {
    let vip = stats_cte("vip", "customers");
    let o = AliasId::new();
    let stmt = Stmt::Update(
        UpdateStmt::new(TableRef::new("orders").aliased(o))
            .set("priority", Expr::literal(1i32))
            .where_(Expr::qualified_column(o, "customer_id").in_query(
                SelectStmt::new()
                    .item(SelectItem::expr(Expr::column("id")))
                    .from(TableExpr::Cte(vip))
                    .into(),
            )),
    );
    let sql = render(Dialect::MySql, &stmt).unwrap();
    assert!(sql.starts_with("WITH `vip` AS (SELECT `id` FROM `customers`) UPDATE"));
}
