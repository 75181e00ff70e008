//! Render a statement tree to SQL text.
//!
//! One [`Renderer`] lives for one render call. It owns the output buffer,
//! the alias allocator and the CTE registry, and recurses depth-first
//! through the tree. Dialect-agnostic grammar (precedence, clause order,
//! list shapes) lives here; everything a backend answers differently is
//! dispatched through [`Dialect`].
//!
//! Hoisted WITH clauses are assembled in two passes: the statement body
//! renders into a detached buffer while references register their
//! definitions, then the WITH clause and the body are concatenated.

use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::alias::{AliasAllocator, AliasRef};
use crate::cte::CteRegistry;
use crate::dialect::{Dialect, mysql, postgres, tsql};
use crate::error::{Error, Result};
use crate::escape::valid_function_name;
use crate::expr::{ArithOp, BitOp, ColumnRef, Expr, InSet, Literal, WindowFunc};
use crate::merge::merge_into_statements;
use crate::stmt::{
    Assignment, CreateIndexStmt, Cte, DeleteStmt, InsertSource, InsertStmt, MatchedAction,
    MergeStmt, OrderItem, SelectItem, SelectQuery, SelectStmt, Stmt, TableExpr, TableRef,
    UpdateStmt,
};
use crate::types::SqlType;

/// Caller configuration for one render pass. Never mutated by the engine.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Maps schema names in the tree to schema names in the emitted SQL.
    pub schema_map: IndexMap<String, String>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remap_schema(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.schema_map.insert(from.into(), to.into());
        self
    }
}

/// Render one statement to SQL text.
///
/// The result may be several semicolon-joined statements when the input
/// expands (identity resync, simulated MERGE).
pub fn render_statement(dialect: Dialect, stmt: &Stmt, opts: &RenderOptions) -> Result<String> {
    let mut r = Renderer::new(dialect, opts);
    r.render_top_level(stmt)?;
    Ok(r.finish())
}

/// Render several statements as one semicolon-joined script.
pub fn render_script(dialect: Dialect, stmts: &[Stmt], opts: &RenderOptions) -> Result<String> {
    let mut r = Renderer::new(dialect, opts);
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            // Self-terminated statements (native MERGE) already end in `;`.
            if !r.sql.ends_with(';') {
                r.push(";");
            }
            r.push(" ");
        }
        r.render_top_level(stmt)?;
    }
    Ok(r.finish())
}

/// Rendering state for one render call.
pub(crate) struct Renderer<'a> {
    dialect: Dialect,
    opts: &'a RenderOptions,
    sql: String,
    aliases: AliasAllocator,
    ctes: CteRegistry,
    /// CTE names visible from an enclosing WITH; references to them render
    /// as the bare name.
    declared: Vec<String>,
    /// Set while a WITH clause renders, so references inside definitions
    /// only register for conflict detection.
    in_with_clause: bool,
    /// A target alias whose qualification is stripped from column
    /// references (single-table DELETE where the dialect forbids it).
    suppress: Option<AliasRef>,
}

impl<'a> Renderer<'a> {
    fn new(dialect: Dialect, opts: &'a RenderOptions) -> Self {
        Self {
            dialect,
            opts,
            sql: String::new(),
            aliases: AliasAllocator::new(),
            ctes: CteRegistry::new(),
            declared: Vec::new(),
            in_with_clause: false,
            suppress: None,
        }
    }

    fn finish(self) -> String {
        self.sql
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    fn resolve_alias(&mut self, alias: &AliasRef) -> String {
        match alias {
            AliasRef::Named(name) => name.clone(),
            AliasRef::Anon(id) => self.aliases.name(*id).to_string(),
        }
    }

    fn alias_ident(&mut self, alias: &AliasRef) -> String {
        let name = self.resolve_alias(alias);
        self.quote(&name)
    }

    /// Schema-qualified quoted table name, without alias. Schema remapping
    /// from the render options applies here and only here.
    fn table_name(&self, table: &TableRef) -> String {
        let mut out = String::new();
        if let Some(schema) = &table.schema {
            let schema = self.opts.schema_map.get(schema).unwrap_or(schema);
            out.push_str(&self.quote(schema));
            out.push('.');
        }
        out.push_str(&self.quote(&table.name));
        out
    }

    fn comma<T>(
        &mut self,
        items: &[T],
        mut f: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            f(self, item)?;
        }
        Ok(())
    }

    fn comma_idents(&mut self, names: &[String]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            let quoted = self.quote(name);
            self.push(&quoted);
        }
    }

    pub(crate) fn paren_expr(&mut self, expr: &Expr) -> Result<()> {
        self.push("(");
        self.render_expr(expr)?;
        self.push(")");
        Ok(())
    }

    fn render_top_level(&mut self, stmt: &Stmt) -> Result<()> {
        debug!(dialect = %self.dialect, "rendering statement");
        match stmt {
            Stmt::Insert(insert) => self.render_top_insert(insert),
            Stmt::Merge(merge) if !self.dialect.supports_native_merge() => {
                let rewritten = merge_into_statements(merge)?;
                for (i, stmt) in rewritten.iter().enumerate() {
                    if i > 0 {
                        self.push("; ");
                    }
                    self.render_top_level(stmt)?;
                }
                Ok(())
            }
            _ => self.hoist_scope(true, |r| r.render_stmt(stmt)),
        }
    }

    fn render_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Select(query) => self.render_query(query),
            Stmt::Insert(insert) => self.render_insert(insert),
            Stmt::Update(update) => self.render_update(update),
            Stmt::Delete(delete) => self.render_delete(delete),
            Stmt::Merge(merge) => self.render_merge(merge),
            Stmt::CreateIndex(index) => self.render_create_index(index),
        }
    }

    /// Render `f` into a detached buffer; if it registered CTEs, emit the
    /// hoisted WITH clause first, then the body.
    fn hoist_scope(
        &mut self,
        allow_with: bool,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let saved = mem::take(&mut self.sql);
        let result = f(self);
        let body = mem::replace(&mut self.sql, saved);
        result?;
        let pending = self.ctes.take_pending();
        if !pending.is_empty() {
            if !allow_with {
                return Err(Error::Unsupported {
                    dialect: self.dialect,
                    construct: "WITH clause in this statement position".to_string(),
                });
            }
            let (defs, recursive) = self.ctes.collect_transitive(&pending)?;
            self.render_with_clause(&defs, recursive)?;
        }
        self.sql.push_str(&body);
        Ok(())
    }

    fn render_with_clause(&mut self, defs: &[Arc<Cte>], recursive: bool) -> Result<()> {
        trace!(count = defs.len(), recursive, "emitting WITH clause");
        self.push("WITH ");
        if recursive && self.dialect.recursive_keyword() {
            self.push("RECURSIVE ");
        }
        let was_in_with = self.in_with_clause;
        self.in_with_clause = true;
        let declared_base = self.declared.len();
        for def in defs {
            self.declared.push(def.name.clone());
        }
        for (i, def) in defs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            let name = self.quote(&def.name);
            self.push(&name);
            self.push(" AS (");
            self.render_query(&def.query)?;
            self.push(")");
        }
        self.declared.truncate(declared_base);
        self.in_with_clause = was_in_with;
        self.push(" ");
        Ok(())
    }

    fn render_top_insert(&mut self, insert: &InsertStmt) -> Result<()> {
        if self.dialect == Dialect::Tsql && insert.identity_insert {
            let table = self.table_name(&insert.table);
            self.push(&format!("SET IDENTITY_INSERT {table} ON; "));
            self.hoist_scope(true, |r| r.render_insert(insert))?;
            self.push(&format!("; SET IDENTITY_INSERT {table} OFF"));
            return Ok(());
        }

        // MySQL has no WITH position ahead of INSERT; a query source opens
        // its own scope, anything else with a CTE is rejected.
        let allow_with = self.dialect != Dialect::MySql;
        self.hoist_scope(allow_with, |r| r.render_insert(insert))?;

        if self.dialect == Dialect::Postgres && insert.identity_insert {
            let table = self.table_name(&insert.table);
            let relation = self.dialect.string_literal(&table);
            for column in &insert.identity_columns {
                let col_arg = self.dialect.string_literal(column);
                let col = self.quote(column);
                self.push(&format!(
                    "; SELECT setval(pg_get_serial_sequence({relation}, {col_arg}), (SELECT MAX({col}) FROM {table}))"
                ));
            }
        }
        Ok(())
    }

    fn render_insert(&mut self, insert: &InsertStmt) -> Result<()> {
        if insert.columns.is_empty() {
            return Err(Error::EmptyList {
                construct: "INSERT",
                item: "column",
            });
        }
        if !insert.output.is_empty() && !self.dialect.supports_output() {
            return Err(Error::Unsupported {
                dialect: self.dialect,
                construct: "OUTPUT/RETURNING".to_string(),
            });
        }

        self.push("INSERT INTO ");
        let table = self.table_name(&insert.table);
        self.push(&table);
        self.push(" (");
        self.comma_idents(&insert.columns);
        self.push(")");

        if self.dialect == Dialect::Tsql && !insert.output.is_empty() {
            self.output_clause("INSERTED", &insert.output);
        }

        match &insert.source {
            InsertSource::Rows(rows) => {
                if rows.is_empty() {
                    return Err(Error::EmptyList {
                        construct: "INSERT",
                        item: "row",
                    });
                }
                self.push(" VALUES ");
                for (i, row) in rows.iter().enumerate() {
                    if row.len() != insert.columns.len() {
                        return Err(Error::RowArity {
                            expected: insert.columns.len(),
                            found: row.len(),
                        });
                    }
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push("(");
                    self.comma(row, |r, value| r.render_expr(value))?;
                    self.push(")");
                }
            }
            InsertSource::Query(query) => {
                self.push(" ");
                if self.dialect == Dialect::MySql {
                    self.hoist_scope(true, |r| r.render_query(query))?;
                } else {
                    self.render_query(query)?;
                }
            }
        }

        if self.dialect == Dialect::Postgres && !insert.output.is_empty() {
            self.returning_clause(&insert.output);
        }
        Ok(())
    }

    fn output_clause(&mut self, prefix: &str, columns: &[String]) {
        self.push(" OUTPUT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(prefix);
            self.push(".");
            let quoted = self.quote(column);
            self.push(&quoted);
        }
    }

    fn returning_clause(&mut self, columns: &[String]) {
        self.push(" RETURNING ");
        self.comma_idents(columns);
    }

    fn render_query(&mut self, query: &SelectQuery) -> Result<()> {
        match query {
            SelectQuery::Select(select) => self.render_select(select),
            SelectQuery::Compound { op, left, right } => {
                self.render_compound_operand(left)?;
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.render_compound_operand(right)
            }
        }
    }

    fn render_compound_operand(&mut self, query: &SelectQuery) -> Result<()> {
        // A branch with its own ordering or pagination needs parentheses to
        // keep those clauses scoped to the branch.
        let parenthesize = match query {
            SelectQuery::Select(s) => {
                !s.order_by.is_empty() || s.limit.is_some() || s.offset.is_some()
            }
            SelectQuery::Compound { .. } => false,
        };
        if parenthesize {
            self.push("(");
            self.render_query(query)?;
            self.push(")");
            Ok(())
        } else {
            self.render_query(query)
        }
    }

    fn render_select(&mut self, select: &SelectStmt) -> Result<()> {
        self.push("SELECT ");
        if select.distinct {
            self.push("DISTINCT ");
        }
        if self.dialect == Dialect::Tsql {
            tsql::pagination_prefix(self, select);
        }
        if select.items.is_empty() {
            self.push("*");
        } else {
            self.comma(&select.items, |r, item| r.render_select_item(item))?;
        }
        if !select.from.is_empty() {
            self.push(" FROM ");
            self.comma(&select.from, |r, table| r.render_table_expr(table))?;
        }
        for join in &select.joins {
            self.push(" ");
            self.push(join.kind.as_str());
            self.push(" ");
            self.render_table_expr(&join.table)?;
            self.push(" ON ");
            self.render_expr(&join.on)?;
        }
        if let Some(where_) = &select.where_ {
            self.push(" WHERE ");
            self.render_expr(where_)?;
        }
        if !select.group_by.is_empty() {
            self.push(" GROUP BY ");
            self.comma(&select.group_by, |r, expr| r.render_expr(expr))?;
        }
        if let Some(having) = &select.having {
            self.push(" HAVING ");
            self.render_expr(having)?;
        }
        if !select.order_by.is_empty() {
            self.push(" ORDER BY ");
            self.render_order_list(&select.order_by)?;
        }
        match self.dialect {
            Dialect::Tsql => tsql::pagination_suffix(self, select)?,
            Dialect::MySql => mysql::pagination_suffix(self, select)?,
            Dialect::Postgres => postgres::pagination_suffix(self, select),
        }
        Ok(())
    }

    fn render_select_item(&mut self, item: &SelectItem) -> Result<()> {
        match item {
            SelectItem::Expr { expr, alias } => {
                self.render_expr(expr)?;
                if let Some(alias) = alias {
                    self.push(" AS ");
                    let quoted = self.quote(alias);
                    self.push(&quoted);
                }
                Ok(())
            }
            SelectItem::Wildcard(None) => {
                self.push("*");
                Ok(())
            }
            SelectItem::Wildcard(Some(source)) => {
                let qualifier = self.alias_ident(source);
                self.push(&qualifier);
                self.push(".*");
                Ok(())
            }
        }
    }

    fn render_order_list(&mut self, items: &[OrderItem]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.render_expr(&item.expr)?;
            self.push(if item.desc { " DESC" } else { " ASC" });
        }
        Ok(())
    }

    fn render_table_expr(&mut self, table: &TableExpr) -> Result<()> {
        match table {
            TableExpr::Table(t) => self.render_table_ref(t),
            TableExpr::Derived {
                query,
                alias,
                columns,
            } => {
                self.push("(");
                self.render_query(query)?;
                self.push(") ");
                let alias = self.alias_ident(alias);
                self.push(&alias);
                if !columns.is_empty() && !columns_match_output(columns, query) {
                    self.push(" (");
                    self.comma_idents(columns);
                    self.push(")");
                }
                Ok(())
            }
            TableExpr::Values {
                rows,
                alias,
                columns,
            } => self.render_values(rows, alias, columns),
            TableExpr::Cte(cte) => self.render_cte_ref(cte),
        }
    }

    fn render_table_ref(&mut self, table: &TableRef) -> Result<()> {
        let name = self.table_name(table);
        self.push(&name);
        if let Some(alias) = &table.alias {
            self.push(" ");
            let alias = self.alias_ident(alias);
            self.push(&alias);
        }
        Ok(())
    }

    fn render_values(
        &mut self,
        rows: &[Vec<Expr>],
        alias: &AliasRef,
        columns: &[String],
    ) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::EmptyList {
                construct: "table-value constructor",
                item: "column",
            });
        }
        if rows.is_empty() {
            return Err(Error::EmptyList {
                construct: "table-value constructor",
                item: "row",
            });
        }
        for row in rows {
            if row.len() != columns.len() {
                return Err(Error::RowArity {
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        let casts = values_casts(rows);

        if self.dialect == Dialect::MySql {
            // No VALUES table constructor; a UNION ALL of SELECTs with the
            // column names aliased onto the first row.
            self.push("(");
            for (ri, row) in rows.iter().enumerate() {
                if ri > 0 {
                    self.push(" UNION ALL ");
                }
                self.push("SELECT ");
                for (ci, cell) in row.iter().enumerate() {
                    if ci > 0 {
                        self.push(", ");
                    }
                    let cast = if ri == 0 { casts[ci] } else { None };
                    self.render_values_cell(cell, cast)?;
                    if ri == 0 {
                        self.push(" AS ");
                        let quoted = self.quote(&columns[ci]);
                        self.push(&quoted);
                    }
                }
            }
            self.push(") ");
            let alias = self.alias_ident(alias);
            self.push(&alias);
        } else {
            self.push("(VALUES ");
            for (ri, row) in rows.iter().enumerate() {
                if ri > 0 {
                    self.push(", ");
                }
                self.push("(");
                for (ci, cell) in row.iter().enumerate() {
                    if ci > 0 {
                        self.push(", ");
                    }
                    let cast = if ri == 0 { casts[ci] } else { None };
                    self.render_values_cell(cell, cast)?;
                }
                self.push(")");
            }
            self.push(") ");
            let alias = self.alias_ident(alias);
            self.push(&alias);
            self.push(" (");
            self.comma_idents(columns);
            self.push(")");
        }
        Ok(())
    }

    fn render_values_cell(&mut self, cell: &Expr, cast: Option<SqlType>) -> Result<()> {
        match cast {
            Some(ty) => {
                let type_name = self.dialect.type_name(ty)?;
                self.push("CAST(");
                self.render_expr(cell)?;
                self.push(" AS ");
                self.push(&type_name);
                self.push(")");
                Ok(())
            }
            None => self.render_expr(cell),
        }
    }

    fn render_cte_ref(&mut self, cte: &Arc<Cte>) -> Result<()> {
        if self.dialect.supports_inline_cte() && !self.declared.iter().any(|n| n == &cte.name) {
            return self.render_cte_inline(cte);
        }
        let queue = !self.dialect.supports_inline_cte() && !self.in_with_clause;
        self.ctes.register(cte, queue)?;
        let name = self.quote(&cte.name);
        self.push(&name);
        if let Some(alias) = &cte.alias {
            self.push(" ");
            let alias = self.alias_ident(alias);
            self.push(&alias);
        }
        Ok(())
    }

    /// Inline form for dialects that allow WITH directly in a derived-table
    /// position: the reference carries its own transitive definition list.
    fn render_cte_inline(&mut self, cte: &Arc<Cte>) -> Result<()> {
        let roots = [Arc::clone(cte)];
        let (defs, recursive) = self.ctes.collect_transitive(&roots)?;
        self.push("(");
        self.render_with_clause(&defs, recursive)?;
        self.push("SELECT * FROM ");
        let name = self.quote(&cte.name);
        self.push(&name);
        self.push(") ");
        let alias = match &cte.alias {
            Some(alias) => self.alias_ident(alias),
            None => self.quote(&cte.name),
        };
        self.push(&alias);
        Ok(())
    }

    fn locate_target(&self, sources: &[TableExpr], target: &TableRef) -> Result<usize> {
        sources
            .iter()
            .position(|s| {
                matches!(s, TableExpr::Table(t) if t.name == target.name && t.schema == target.schema)
            })
            .ok_or_else(|| Error::TargetNotInSources {
                table: target.name.clone(),
            })
    }

    /// The identifier naming the target row set: its alias where one is
    /// bound in the source list, the bare table name otherwise.
    fn target_label(&mut self, sources: &[TableExpr], pos: Option<usize>, target: &TableRef) -> String {
        let alias = pos
            .and_then(|p| match &sources[p] {
                TableExpr::Table(t) => t.alias.clone(),
                _ => None,
            })
            .or_else(|| target.alias.clone());
        match alias {
            Some(alias) => self.alias_ident(&alias),
            None => self.quote(&target.name),
        }
    }

    fn render_sets(&mut self, sets: &[Assignment], qualifier: Option<&str>) -> Result<()> {
        self.push(" SET ");
        for (i, set) in sets.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let Some(qualifier) = qualifier {
                self.push(qualifier);
                self.push(".");
            }
            let column = self.quote(&set.column);
            self.push(&column);
            self.push(" = ");
            self.render_expr(&set.value)?;
        }
        Ok(())
    }

    fn where_clause(&mut self, where_: &Option<Expr>) -> Result<()> {
        if let Some(where_) = where_ {
            self.push(" WHERE ");
            self.render_expr(where_)?;
        }
        Ok(())
    }

    fn render_update(&mut self, update: &UpdateStmt) -> Result<()> {
        if update.sets.is_empty() {
            return Err(Error::EmptyList {
                construct: "UPDATE",
                item: "assignment",
            });
        }
        if !update.output.is_empty() && !self.dialect.supports_output() {
            return Err(Error::Unsupported {
                dialect: self.dialect,
                construct: "OUTPUT/RETURNING".to_string(),
            });
        }
        let multi = !update.sources.is_empty();
        let target_pos = if multi {
            Some(self.locate_target(&update.sources, &update.target)?)
        } else {
            None
        };

        match self.dialect {
            Dialect::Tsql => {
                if multi || update.target.alias.is_some() {
                    let fallback = [TableExpr::Table(update.target.clone())];
                    let sources: &[TableExpr] = if multi { &update.sources } else { &fallback };
                    let label = self.target_label(sources, target_pos, &update.target);
                    self.push("UPDATE ");
                    self.push(&label);
                    self.render_sets(&update.sets, None)?;
                    if !update.output.is_empty() {
                        self.output_clause("INSERTED", &update.output);
                    }
                    self.push(" FROM ");
                    self.comma(sources, |r, table| r.render_table_expr(table))?;
                } else {
                    self.push("UPDATE ");
                    let table = self.table_name(&update.target);
                    self.push(&table);
                    self.render_sets(&update.sets, None)?;
                    if !update.output.is_empty() {
                        self.output_clause("INSERTED", &update.output);
                    }
                }
                self.where_clause(&update.where_)?;
            }
            Dialect::MySql => {
                self.push("UPDATE ");
                if multi {
                    self.comma(&update.sources, |r, table| r.render_table_expr(table))?;
                    let label = self.target_label(&update.sources, target_pos, &update.target);
                    self.render_sets(&update.sets, Some(&label))?;
                } else {
                    self.render_table_ref(&update.target)?;
                    self.render_sets(&update.sets, None)?;
                }
                self.where_clause(&update.where_)?;
            }
            Dialect::Postgres => {
                self.push("UPDATE ");
                self.render_table_ref(&update.target)?;
                self.render_sets(&update.sets, None)?;
                if multi {
                    // The target is implicitly in scope; repeating it in
                    // FROM would self-join.
                    let rest: Vec<TableExpr> = update
                        .sources
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| Some(*i) != target_pos)
                        .map(|(_, t)| t.clone())
                        .collect();
                    if !rest.is_empty() {
                        self.push(" FROM ");
                        self.comma(&rest, |r, table| r.render_table_expr(table))?;
                    }
                }
                self.where_clause(&update.where_)?;
                if !update.output.is_empty() {
                    self.returning_clause(&update.output);
                }
            }
        }
        Ok(())
    }

    fn render_delete(&mut self, delete: &DeleteStmt) -> Result<()> {
        if !delete.output.is_empty() && !self.dialect.supports_output() {
            return Err(Error::Unsupported {
                dialect: self.dialect,
                construct: "OUTPUT/RETURNING".to_string(),
            });
        }
        let multi = !delete.sources.is_empty();
        let target_pos = if multi {
            Some(self.locate_target(&delete.sources, &delete.target)?)
        } else {
            None
        };

        match self.dialect {
            Dialect::Tsql => {
                if multi || delete.target.alias.is_some() {
                    let fallback = [TableExpr::Table(delete.target.clone())];
                    let sources: &[TableExpr] = if multi { &delete.sources } else { &fallback };
                    let label = self.target_label(sources, target_pos, &delete.target);
                    self.push("DELETE ");
                    self.push(&label);
                    if !delete.output.is_empty() {
                        self.output_clause("DELETED", &delete.output);
                    }
                    self.push(" FROM ");
                    self.comma(sources, |r, table| r.render_table_expr(table))?;
                } else {
                    self.push("DELETE FROM ");
                    let table = self.table_name(&delete.target);
                    self.push(&table);
                    if !delete.output.is_empty() {
                        self.output_clause("DELETED", &delete.output);
                    }
                }
                self.where_clause(&delete.where_)?;
            }
            Dialect::MySql => {
                if multi {
                    let label = self.target_label(&delete.sources, target_pos, &delete.target);
                    self.push("DELETE ");
                    self.push(&label);
                    self.push(" FROM ");
                    self.comma(&delete.sources, |r, table| r.render_table_expr(table))?;
                    self.where_clause(&delete.where_)?;
                } else {
                    // MySQL forbids aliasing the deleted table; references
                    // qualified by the alias drop their qualifier.
                    self.push("DELETE FROM ");
                    let table = self.table_name(&delete.target);
                    self.push(&table);
                    let saved = self.suppress.take();
                    self.suppress = delete.target.alias.clone();
                    let result = self.where_clause(&delete.where_);
                    self.suppress = saved;
                    result?;
                }
            }
            Dialect::Postgres => {
                self.push("DELETE FROM ");
                self.render_table_ref(&delete.target)?;
                if multi {
                    let rest: Vec<TableExpr> = delete
                        .sources
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| Some(*i) != target_pos)
                        .map(|(_, t)| t.clone())
                        .collect();
                    if !rest.is_empty() {
                        self.push(" USING ");
                        self.comma(&rest, |r, table| r.render_table_expr(table))?;
                    }
                }
                self.where_clause(&delete.where_)?;
                if !delete.output.is_empty() {
                    self.returning_clause(&delete.output);
                }
            }
        }
        Ok(())
    }

    fn render_merge(&mut self, merge: &MergeStmt) -> Result<()> {
        if merge.when_matched.is_empty() && merge.when_not_matched.is_none() {
            return Err(Error::EmptyList {
                construct: "MERGE",
                item: "WHEN clause",
            });
        }
        self.push("MERGE INTO ");
        self.render_table_ref(&merge.target)?;
        self.push(" USING ");
        self.render_table_expr(&merge.source)?;
        self.push(" ON ");
        self.render_expr(&merge.on)?;
        for matched in &merge.when_matched {
            self.push(" WHEN MATCHED");
            if let Some(predicate) = &matched.predicate {
                self.push(" AND ");
                self.render_expr(predicate)?;
            }
            self.push(" THEN ");
            match &matched.action {
                MatchedAction::Update(sets) => {
                    if sets.is_empty() {
                        return Err(Error::EmptyList {
                            construct: "MERGE update action",
                            item: "assignment",
                        });
                    }
                    self.push("UPDATE");
                    self.render_sets(sets, None)?;
                }
                MatchedAction::Delete => self.push("DELETE"),
            }
        }
        if let Some(insert) = &merge.when_not_matched {
            if insert.columns.is_empty() {
                return Err(Error::EmptyList {
                    construct: "MERGE insert action",
                    item: "column",
                });
            }
            if insert.values.len() != insert.columns.len() {
                return Err(Error::RowArity {
                    expected: insert.columns.len(),
                    found: insert.values.len(),
                });
            }
            self.push(" WHEN NOT MATCHED");
            if let Some(predicate) = &insert.predicate {
                self.push(" AND ");
                self.render_expr(predicate)?;
            }
            self.push(" THEN INSERT (");
            self.comma_idents(&insert.columns);
            self.push(") VALUES (");
            self.comma(&insert.values, |r, value| r.render_expr(value))?;
            self.push(")");
        }
        // T-SQL requires MERGE to be terminated.
        self.push(";");
        Ok(())
    }

    fn render_create_index(&mut self, index: &CreateIndexStmt) -> Result<()> {
        if index.columns.is_empty() {
            return Err(Error::EmptyList {
                construct: "CREATE INDEX",
                item: "column",
            });
        }
        self.push("CREATE ");
        if index.unique {
            self.push("UNIQUE ");
        }
        self.push("INDEX ");
        let name = self.quote(&index.name);
        self.push(&name);
        self.push(" ON ");
        let table = self.table_name(&index.table);
        self.push(&table);
        self.push(" (");
        for (i, column) in index.columns.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            let quoted = self.quote(&column.name);
            self.push(&quoted);
            if column.desc {
                self.push(" DESC");
            }
        }
        self.push(")");
        Ok(())
    }

    pub(crate) fn render_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(lit) => {
                let text = self.dialect.literal(lit)?;
                self.push(&text);
                Ok(())
            }
            Expr::Column(column) => self.render_column(column),
            Expr::Star => {
                self.push("*");
                Ok(())
            }
            Expr::Cmp { op, left, right } => {
                self.render_cmp_operand(left)?;
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.render_cmp_operand(right)
            }
            Expr::And(items) => {
                if items.is_empty() {
                    return Err(Error::EmptyList {
                        construct: "AND",
                        item: "operand",
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(" AND ");
                    }
                    // OR binds looser; nested OR keeps its parentheses.
                    if matches!(item, Expr::Or(_)) {
                        self.paren_expr(item)?;
                    } else {
                        self.render_expr(item)?;
                    }
                }
                Ok(())
            }
            Expr::Or(items) => {
                if items.is_empty() {
                    return Err(Error::EmptyList {
                        construct: "OR",
                        item: "operand",
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(" OR ");
                    }
                    self.render_expr(item)?;
                }
                Ok(())
            }
            Expr::Not(inner) => {
                self.push("NOT ");
                if is_atomic_predicate(inner) {
                    self.render_expr(inner)
                } else {
                    self.paren_expr(inner)
                }
            }
            Expr::Arith { op, left, right } => {
                self.render_arith_operand(*op, left)?;
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.render_arith_operand(*op, right)
            }
            Expr::Bit { op, left, right } => {
                self.render_bit_operand(*op, left)?;
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.render_bit_operand(*op, right)
            }
            Expr::BitNot(inner) => {
                self.push("~");
                match inner.as_ref() {
                    Expr::Column(_)
                    | Expr::Literal(_)
                    | Expr::Call { .. }
                    | Expr::Cast { .. }
                    | Expr::BitNot(_) => self.render_expr(inner),
                    _ => self.paren_expr(inner),
                }
            }
            Expr::Like { expr, pattern } => {
                self.render_expr(expr)?;
                self.push(" LIKE ");
                self.render_expr(pattern)
            }
            Expr::In { expr, set } => {
                self.render_expr(expr)?;
                self.push(" IN (");
                match set {
                    InSet::List(items) => {
                        if items.is_empty() {
                            return Err(Error::EmptyList {
                                construct: "IN",
                                item: "value",
                            });
                        }
                        self.comma(items, |r, item| r.render_expr(item))?;
                    }
                    InSet::Query(query) => self.render_query(query)?,
                }
                self.push(")");
                Ok(())
            }
            Expr::IsNull { expr, negated } => {
                if is_bool_combo(expr) {
                    self.paren_expr(expr)?;
                } else {
                    self.render_expr(expr)?;
                }
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
            Expr::Exists(query) => {
                self.push("EXISTS (");
                self.render_query(query)?;
                self.push(")");
                Ok(())
            }
            Expr::Subquery(query) => {
                self.push("(");
                self.render_query(query)?;
                self.push(")");
                Ok(())
            }
            Expr::Case { whens, else_ } => {
                if whens.is_empty() {
                    return Err(Error::EmptyList {
                        construct: "CASE",
                        item: "WHEN arm",
                    });
                }
                self.push("CASE");
                for arm in whens {
                    self.push(" WHEN ");
                    self.render_expr(&arm.when)?;
                    self.push(" THEN ");
                    self.render_expr(&arm.then)?;
                }
                if let Some(else_) = else_ {
                    self.push(" ELSE ");
                    self.render_expr(else_)?;
                }
                self.push(" END");
                Ok(())
            }
            Expr::Cast { expr, ty } => {
                let type_name = self.dialect.type_name(*ty)?;
                self.push("CAST(");
                self.render_expr(expr)?;
                self.push(" AS ");
                self.push(&type_name);
                self.push(")");
                Ok(())
            }
            Expr::Call { name, args } => {
                if !valid_function_name(name) {
                    return Err(Error::InvalidFunctionName { name: name.clone() });
                }
                self.push(name);
                self.push("(");
                self.comma(args, |r, arg| r.render_expr(arg))?;
                self.push(")");
                Ok(())
            }
            Expr::Window {
                func,
                partition_by,
                order_by,
            } => self.render_window(func, partition_by, order_by),
            Expr::DateAdd { unit, amount, date } => match self.dialect {
                Dialect::Tsql => tsql::date_add(self, *unit, amount, date),
                Dialect::MySql => mysql::date_add(self, *unit, amount, date),
                Dialect::Postgres => postgres::date_add(self, *unit, amount, date),
            },
            Expr::DateDiff { unit, start, end } => match self.dialect {
                Dialect::Tsql => tsql::date_diff(self, *unit, start, end),
                Dialect::MySql => mysql::date_diff(self, *unit, start, end),
                Dialect::Postgres => postgres::date_diff(self, *unit, start, end),
            },
        }
    }

    fn render_column(&mut self, column: &ColumnRef) -> Result<()> {
        if let Some(source) = &column.source {
            if self.suppress.as_ref() != Some(source) {
                let qualifier = self.alias_ident(source);
                self.push(&qualifier);
                self.push(".");
            }
        }
        let name = self.quote(&column.name);
        self.push(&name);
        Ok(())
    }

    fn render_cmp_operand(&mut self, expr: &Expr) -> Result<()> {
        if is_bool_combo(expr) {
            self.paren_expr(expr)
        } else {
            self.render_expr(expr)
        }
    }

    fn render_arith_operand(&mut self, op: ArithOp, expr: &Expr) -> Result<()> {
        let parens = match expr {
            Expr::Arith { op: inner, .. } => op.binds_tighter() && !inner.binds_tighter(),
            _ => is_bool_combo(expr),
        };
        if parens {
            self.paren_expr(expr)
        } else {
            self.render_expr(expr)
        }
    }

    fn render_bit_operand(&mut self, op: BitOp, expr: &Expr) -> Result<()> {
        let parens = match expr {
            Expr::Bit { op: inner, .. } => *inner != op,
            Expr::Arith { .. } => true,
            Expr::BitNot(_) => false,
            _ => is_bool_combo(expr),
        };
        if parens {
            self.paren_expr(expr)
        } else {
            self.render_expr(expr)
        }
    }

    fn render_window(
        &mut self,
        func: &WindowFunc,
        partition_by: &[Expr],
        order_by: &[OrderItem],
    ) -> Result<()> {
        if func.requires_order() && order_by.is_empty() {
            return Err(Error::EmptyList {
                construct: "ranking window function",
                item: "ORDER BY item",
            });
        }
        match func {
            WindowFunc::RowNumber => self.push("ROW_NUMBER()"),
            WindowFunc::Rank => self.push("RANK()"),
            WindowFunc::DenseRank => self.push("DENSE_RANK()"),
            WindowFunc::Agg { name, args } => {
                if !valid_function_name(name) {
                    return Err(Error::InvalidFunctionName { name: name.clone() });
                }
                self.push(name);
                self.push("(");
                self.comma(args, |r, arg| r.render_expr(arg))?;
                self.push(")");
            }
        }
        self.push(" OVER (");
        let mut wrote = false;
        if !partition_by.is_empty() {
            self.push("PARTITION BY ");
            self.comma(partition_by, |r, expr| r.render_expr(expr))?;
            wrote = true;
        }
        if !order_by.is_empty() {
            if wrote {
                self.push(" ");
            }
            self.push("ORDER BY ");
            self.render_order_list(order_by)?;
        }
        self.push(")");
        Ok(())
    }
}

/// Whether a predicate needs no parentheses under NOT.
fn is_atomic_predicate(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Cmp { .. }
            | Expr::IsNull { .. }
            | Expr::Like { .. }
            | Expr::In { .. }
            | Expr::Exists(_)
            | Expr::Column(_)
            | Expr::Literal(_)
    )
}

fn is_bool_combo(expr: &Expr) -> bool {
    matches!(expr, Expr::And(_) | Expr::Or(_) | Expr::Not(_))
}

fn columns_match_output(columns: &[String], query: &SelectQuery) -> bool {
    match query.output_names() {
        Some(names) => {
            names.len() == columns.len()
                && names
                    .iter()
                    .zip(columns)
                    .all(|(name, column)| name.eq_ignore_ascii_case(column))
        }
        None => false,
    }
}

/// Per-column CAST decisions for a table-value constructor.
///
/// A column that is NULL in some rows but not all gets its first-row cell
/// cast to the type of the first typed literal found, so the backend can
/// infer the column type. An all-NULL column stays uncast; no cell carries
/// type metadata to infer from.
fn values_casts(rows: &[Vec<Expr>]) -> Vec<Option<SqlType>> {
    let width = rows[0].len();
    (0..width)
        .map(|ci| {
            let mut has_null = false;
            let mut all_null = true;
            let mut ty = None;
            for row in rows {
                match &row[ci] {
                    Expr::Literal(Literal::Null) => has_null = true,
                    Expr::Literal(lit) => {
                        all_null = false;
                        if ty.is_none() {
                            ty = lit.sql_type();
                        }
                    }
                    _ => all_null = false,
                }
            }
            if has_null && !all_null { ty } else { None }
        })
        .collect()
}
