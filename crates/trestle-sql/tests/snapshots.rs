//! Snapshot tests for full statements across all three dialects.

use trestle_sql::*;

fn render(dialect: Dialect, stmt: &Stmt) -> String {
    render_statement(dialect, stmt, &RenderOptions::default()).unwrap()
}

fn catalog_select() -> Stmt {
    Stmt::Select(
        SelectStmt::new()
            .items([
                SelectItem::expr(Expr::column("id")),
                SelectItem::expr(Expr::column("handle")),
            ])
            .from(TableExpr::table("products"))
            .where_(
                Expr::column("status")
                    .eq(Expr::literal("active"))
                    .and(Expr::column("deleted_at").is_null()),
            )
            .order_by(OrderItem::desc(Expr::column("created_at")))
            .limit(10)
            .into(),
    )
}

#[test]
fn test_select_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &catalog_select()),
        @"SELECT TOP 10 [id], [handle] FROM [products] WHERE [status] = 'active' AND [deleted_at] IS NULL ORDER BY [created_at] DESC"
    );
}

#[test]
fn test_select_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &catalog_select()),
        @"SELECT `id`, `handle` FROM `products` WHERE `status` = 'active' AND `deleted_at` IS NULL ORDER BY `created_at` DESC LIMIT 10"
    );
}

#[test]
fn test_select_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &catalog_select()),
        @r#"SELECT "id", "handle" FROM "products" WHERE "status" = 'active' AND "deleted_at" IS NULL ORDER BY "created_at" DESC LIMIT 10"#
    );
}

#[test]
fn test_select_with_join_aliases() {
    let p = AliasId::new();
    let t = AliasId::new();
    let stmt = Stmt::Select(
        SelectStmt::new()
            .items([
                SelectItem::expr(Expr::qualified_column(p, "id")),
                SelectItem::expr(Expr::qualified_column(t, "title")),
            ])
            .from(TableExpr::Table(TableRef::new("products").aliased(p)))
            .join(
                JoinKind::Left,
                TableExpr::Table(TableRef::new("product_translations").aliased(t)),
                Expr::qualified_column(t, "product_id").eq(Expr::qualified_column(p, "id")),
            )
            .into(),
    );
    insta::assert_snapshot!(
        render(Dialect::Postgres, &stmt),
        @r#"SELECT "A0"."id", "A1"."title" FROM "products" "A0" LEFT JOIN "product_translations" "A1" ON "A1"."product_id" = "A0"."id""#
    );
}

#[test]
fn test_offset_fetch_tsql() {
    let stmt = Stmt::Select(
        SelectStmt::new()
            .items([SelectItem::expr(Expr::column("c"))])
            .from(TableExpr::table("t"))
            .order_by(OrderItem::asc(Expr::column("c")))
            .limit(10)
            .offset(20)
            .into(),
    );
    insta::assert_snapshot!(
        render(Dialect::Tsql, &stmt),
        @"SELECT [c] FROM [t] ORDER BY [c] ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

fn insert_with_output() -> Stmt {
    Stmt::Insert(
        InsertStmt::new(TableRef::new("products"))
            .columns(["handle", "status"])
            .row([Expr::literal("sandals"), Expr::literal("active")])
            .row([Expr::literal("boots"), Expr::null()])
            .output(["id", "handle"]),
    )
}

#[test]
fn test_insert_output_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &insert_with_output()),
        @"INSERT INTO [products] ([handle], [status]) OUTPUT INSERTED.[id], INSERTED.[handle] VALUES ('sandals', 'active'), ('boots', NULL)"
    );
}

#[test]
fn test_insert_returning_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &insert_with_output()),
        @r#"INSERT INTO "products" ("handle", "status") VALUES ('sandals', 'active'), ('boots', NULL) RETURNING "id", "handle""#
    );
}

fn multi_table_update() -> Stmt {
    let o = AliasId::new();
    let c = AliasId::new();
    Stmt::Update(
        UpdateStmt::new(TableRef::new("orders").aliased(o))
            .set("status", Expr::literal("shipped"))
            .sources([
                TableExpr::Table(TableRef::new("orders").aliased(o)),
                TableExpr::Table(TableRef::new("customers").aliased(c)),
            ])
            .where_(
                Expr::qualified_column(o, "customer_id")
                    .eq(Expr::qualified_column(c, "id"))
                    .and(Expr::qualified_column(c, "vip").eq(Expr::literal(true))),
            ),
    )
}

#[test]
fn test_update_from_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &multi_table_update()),
        @"UPDATE [A0] SET [status] = 'shipped' FROM [orders] [A0], [customers] [A1] WHERE [A0].[customer_id] = [A1].[id] AND [A1].[vip] = 1"
    );
}

#[test]
fn test_update_multi_table_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &multi_table_update()),
        @"UPDATE `orders` `A0`, `customers` `A1` SET `A0`.`status` = 'shipped' WHERE `A0`.`customer_id` = `A1`.`id` AND `A1`.`vip` = TRUE"
    );
}

#[test]
fn test_update_from_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &multi_table_update()),
        @r#"UPDATE "orders" "A0" SET "status" = 'shipped' FROM "customers" "A1" WHERE "A0"."customer_id" = "A1"."id" AND "A1"."vip" = TRUE"#
    );
}

fn multi_table_delete() -> Stmt {
    let s = AliasId::new();
    let u = AliasId::new();
    Stmt::Delete(
        DeleteStmt::new(TableRef::new("sessions").aliased(s))
            .sources([
                TableExpr::Table(TableRef::new("sessions").aliased(s)),
                TableExpr::Table(TableRef::new("users").aliased(u)),
            ])
            .where_(
                Expr::qualified_column(s, "user_id")
                    .eq(Expr::qualified_column(u, "id"))
                    .and(Expr::qualified_column(u, "banned").eq(Expr::literal(true))),
            ),
    )
}

#[test]
fn test_delete_from_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &multi_table_delete()),
        @"DELETE [A0] FROM [sessions] [A0], [users] [A1] WHERE [A0].[user_id] = [A1].[id] AND [A1].[banned] = 1"
    );
}

#[test]
fn test_delete_multi_table_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &multi_table_delete()),
        @"DELETE `A0` FROM `sessions` `A0`, `users` `A1` WHERE `A0`.`user_id` = `A1`.`id` AND `A1`.`banned` = TRUE"
    );
}

#[test]
fn test_delete_using_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &multi_table_delete()),
        @r#"DELETE FROM "sessions" "A0" USING "users" "A1" WHERE "A0"."user_id" = "A1"."id" AND "A1"."banned" = TRUE"#
    );
}

fn merge_inventory() -> Stmt {
    let t = AliasId::new();
    let s = AliasId::new();
    let source = TableExpr::values(
        vec![
            vec![Expr::literal("sku-1"), Expr::literal(5i32)],
            vec![Expr::literal("sku-2"), Expr::literal(8i32)],
        ],
        s,
        ["sku", "qty"],
    );
    Stmt::Merge(
        MergeStmt::new(
            TableRef::new("inventory").aliased(t),
            source,
            Expr::qualified_column(t, "sku").eq(Expr::qualified_column(s, "sku")),
        )
        .when_matched_update(None, [Assignment::new("qty", Expr::qualified_column(s, "qty"))])
        .when_not_matched_insert(
            None,
            ["sku", "qty"],
            [
                Expr::qualified_column(s, "sku"),
                Expr::qualified_column(s, "qty"),
            ],
        ),
    )
}

#[test]
fn test_merge_native_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &merge_inventory()),
        @"MERGE INTO [inventory] [A0] USING (VALUES ('sku-1', 5), ('sku-2', 8)) [A1] ([sku], [qty]) ON [A0].[sku] = [A1].[sku] WHEN MATCHED THEN UPDATE SET [qty] = [A1].[qty] WHEN NOT MATCHED THEN INSERT ([sku], [qty]) VALUES ([A1].[sku], [A1].[qty]);"
    );
}

#[test]
fn test_merge_simulated_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &merge_inventory()),
        @r#"UPDATE "inventory" "A0" SET "qty" = "A1"."qty" FROM (VALUES ('sku-1', 5), ('sku-2', 8)) "A1" ("sku", "qty") WHERE "A0"."sku" = "A1"."sku"; INSERT INTO "inventory" ("sku", "qty") SELECT "A1"."sku", "A1"."qty" FROM (VALUES ('sku-1', 5), ('sku-2', 8)) "A1" ("sku", "qty") WHERE NOT EXISTS (SELECT * FROM "inventory" "A0" WHERE "A0"."sku" = "A1"."sku")"#
    );
}

#[test]
fn test_merge_simulated_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &merge_inventory()),
        @"UPDATE `inventory` `A0`, (SELECT 'sku-1' AS `sku`, 5 AS `qty` UNION ALL SELECT 'sku-2', 8) `A1` SET `A0`.`qty` = `A1`.`qty` WHERE `A0`.`sku` = `A1`.`sku`; INSERT INTO `inventory` (`sku`, `qty`) SELECT `A1`.`sku`, `A1`.`qty` FROM (SELECT 'sku-1' AS `sku`, 5 AS `qty` UNION ALL SELECT 'sku-2', 8) `A1` WHERE NOT EXISTS (SELECT * FROM `inventory` `A0` WHERE `A0`.`sku` = `A1`.`sku`)"
    );
}

fn nested_ctes() -> Stmt {
    let base = Cte::new(
        "base",
        SelectStmt::new()
            .items([SelectItem::expr(Expr::column("id"))])
            .from(TableExpr::table("events")),
    );
    let filtered = Cte::new(
        "filtered",
        SelectStmt::new()
            .from(TableExpr::Cte(base))
            .where_(Expr::column("id").gt(Expr::literal(10i32))),
    );
    Stmt::Select(SelectStmt::new().from(TableExpr::Cte(filtered)).into())
}

#[test]
fn test_cte_hoisting_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &nested_ctes()),
        @"WITH [base] AS (SELECT [id] FROM [events]), [filtered] AS (SELECT * FROM [base] WHERE [id] > 10) SELECT * FROM [filtered]"
    );
}

#[test]
fn test_cte_hoisting_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &nested_ctes()),
        @"WITH `base` AS (SELECT `id` FROM `events`), `filtered` AS (SELECT * FROM `base` WHERE `id` > 10) SELECT * FROM `filtered`"
    );
}

#[test]
fn test_cte_inline_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &nested_ctes()),
        @r#"SELECT * FROM (WITH "base" AS (SELECT "id" FROM "events"), "filtered" AS (SELECT * FROM "base" WHERE "id" > 10) SELECT * FROM "filtered") "filtered""#
    );
}

fn recursive_cte() -> Stmt {
    let seed: SelectQuery = SelectStmt::new()
        .items([SelectItem::expr(Expr::column("id"))])
        .from(TableExpr::table("roots"))
        .into();
    let step: SelectQuery = SelectStmt::new()
        .items([SelectItem::expr(Expr::column("id"))])
        .from(TableExpr::table("walk"))
        .into();
    let walk = Cte::new("walk", seed.union_all(step));
    Stmt::Select(SelectStmt::new().from(TableExpr::Cte(walk)).into())
}

#[test]
fn test_recursive_cte_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &recursive_cte()),
        @"WITH RECURSIVE `walk` AS (SELECT `id` FROM `roots` UNION ALL SELECT `id` FROM `walk`) SELECT * FROM `walk`"
    );
}

#[test]
fn test_recursive_cte_tsql_has_no_keyword() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &recursive_cte()),
        @"WITH [walk] AS (SELECT [id] FROM [roots] UNION ALL SELECT [id] FROM [walk]) SELECT * FROM [walk]"
    );
}

#[test]
fn test_recursive_cte_inline_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &recursive_cte()),
        @r#"SELECT * FROM (WITH RECURSIVE "walk" AS (SELECT "id" FROM "roots" UNION ALL SELECT "id" FROM "walk") SELECT * FROM "walk") "walk""#
    );
}

fn values_with_partial_nulls() -> Stmt {
    let v = AliasId::new();
    Stmt::Select(
        SelectStmt::new()
            .from(TableExpr::values(
                vec![
                    vec![Expr::literal(1i32), Expr::null()],
                    vec![Expr::literal(2i32), Expr::literal("two")],
                ],
                v,
                ["n", "label"],
            ))
            .into(),
    )
}

#[test]
fn test_values_null_typing_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &values_with_partial_nulls()),
        @"SELECT * FROM (VALUES (1, CAST(NULL AS nvarchar(MAX))), (2, 'two')) [A0] ([n], [label])"
    );
}

#[test]
fn test_values_null_typing_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &values_with_partial_nulls()),
        @r#"SELECT * FROM (VALUES (1, CAST(NULL AS text)), (2, 'two')) "A0" ("n", "label")"#
    );
}

#[test]
fn test_values_as_union_mysql() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &values_with_partial_nulls()),
        @"SELECT * FROM (SELECT 1 AS `n`, CAST(NULL AS char) AS `label` UNION ALL SELECT 2, 'two') `A0`"
    );
}

fn identity_insert() -> Stmt {
    Stmt::Insert(
        InsertStmt::new(TableRef::new("users"))
            .columns(["id", "name"])
            .row([Expr::literal(1i32), Expr::literal("root")])
            .identity_insert(["id"]),
    )
}

#[test]
fn test_identity_insert_tsql() {
    insta::assert_snapshot!(
        render(Dialect::Tsql, &identity_insert()),
        @"SET IDENTITY_INSERT [users] ON; INSERT INTO [users] ([id], [name]) VALUES (1, 'root'); SET IDENTITY_INSERT [users] OFF"
    );
}

#[test]
fn test_identity_resync_postgres() {
    insta::assert_snapshot!(
        render(Dialect::Postgres, &identity_insert()),
        @r#"INSERT INTO "users" ("id", "name") VALUES (1, 'root'); SELECT setval(pg_get_serial_sequence('"users"', 'id'), (SELECT MAX("id") FROM "users"))"#
    );
}

#[test]
fn test_identity_insert_mysql_needs_nothing() {
    insta::assert_snapshot!(
        render(Dialect::MySql, &identity_insert()),
        @"INSERT INTO `users` (`id`, `name`) VALUES (1, 'root')"
    );
}
