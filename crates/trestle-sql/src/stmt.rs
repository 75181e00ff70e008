//! SQL statements and table expressions.

use std::sync::Arc;

use crate::alias::AliasRef;
use crate::expr::Expr;

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Select(SelectQuery),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Merge(MergeStmt),
    CreateIndex(CreateIndexStmt),
}

/// A query expression: a plain SELECT or a UNION chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectQuery {
    Select(SelectStmt),
    Compound {
        op: SetOp,
        left: Box<SelectQuery>,
        right: Box<SelectQuery>,
    },
}

impl SelectQuery {
    /// The output column names of this query, if every item has one.
    ///
    /// Used to elide a derived table's column-alias list when it is
    /// redundant. A wildcard or an unaliased expression item yields `None`.
    pub fn output_names(&self) -> Option<Vec<&str>> {
        match self {
            SelectQuery::Select(s) => s
                .items
                .iter()
                .map(|item| match item {
                    SelectItem::Expr {
                        alias: Some(alias), ..
                    } => Some(alias.as_str()),
                    SelectItem::Expr {
                        expr: Expr::Column(col),
                        alias: None,
                    } => Some(col.name.as_str()),
                    _ => None,
                })
                .collect(),
            SelectQuery::Compound { left, .. } => left.output_names(),
        }
    }

    pub fn union(self, other: SelectQuery) -> Self {
        SelectQuery::Compound {
            op: SetOp::Union,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn union_all(self, other: SelectQuery) -> Self {
        SelectQuery::Compound {
            op: SetOp::UnionAll,
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

impl From<SelectStmt> for SelectQuery {
    fn from(s: SelectStmt) -> Self {
        SelectQuery::Select(s)
    }
}

/// Set operators between SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
}

impl SetOp {
    pub fn as_str(self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
        }
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectStmt {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Vec<TableExpr>,
    pub joins: Vec<Join>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// An item in a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Expr { expr: Expr, alias: Option<String> },
    /// `*` or `qualifier.*`
    Wildcard(Option<AliasRef>),
}

impl SelectItem {
    pub fn expr(expr: Expr) -> Self {
        SelectItem::Expr { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        SelectItem::Expr {
            expr,
            alias: Some(alias.into()),
        }
    }

    pub fn wildcard() -> Self {
        SelectItem::Wildcard(None)
    }

    pub fn wildcard_from(source: impl Into<AliasRef>) -> Self {
        SelectItem::Wildcard(Some(source.into()))
    }
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub desc: bool,
}

impl OrderItem {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, desc: false }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, desc: true }
    }
}

/// A reference to a named table, optionally schema-qualified and aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<AliasRef>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(mut self, alias: impl Into<AliasRef>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A table-producing expression in a FROM, USING or source list.
#[derive(Debug, Clone, PartialEq)]
pub enum TableExpr {
    Table(TableRef),
    /// A parenthesized subquery with an alias and an optional column-alias
    /// list (elided at render time when redundant).
    Derived {
        query: Box<SelectQuery>,
        alias: AliasRef,
        columns: Vec<String>,
    },
    /// A table-value constructor; `columns` names its output columns.
    Values {
        rows: Vec<Vec<Expr>>,
        alias: AliasRef,
        columns: Vec<String>,
    },
    /// A reference to a common table expression.
    Cte(Arc<Cte>),
}

impl TableExpr {
    pub fn table(name: impl Into<String>) -> Self {
        TableExpr::Table(TableRef::new(name))
    }

    pub fn derived(
        query: impl Into<SelectQuery>,
        alias: impl Into<AliasRef>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        TableExpr::Derived {
            query: Box::new(query.into()),
            alias: alias.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(
        rows: Vec<Vec<Expr>>,
        alias: impl Into<AliasRef>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        TableExpr::Values {
            rows,
            alias: alias.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A JOIN clause attached to a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableExpr,
    pub on: Expr,
}

/// Type of JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// A common table expression.
///
/// The same `Arc<Cte>` may be referenced from several tree positions; the
/// defining query is rendered once per unique name in a hoisted WITH clause.
/// A recursive CTE references itself through a plain [`TableRef`] carrying
/// its own name.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub alias: Option<AliasRef>,
    pub query: SelectQuery,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: impl Into<SelectQuery>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            alias: None,
            query: query.into(),
        })
    }

    pub fn aliased(
        name: impl Into<String>,
        alias: impl Into<AliasRef>,
        query: impl Into<SelectQuery>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            alias: Some(alias.into()),
            query: query.into(),
        })
    }
}

// ============================================================================
// INSERT / UPDATE / DELETE
// ============================================================================

/// An assignment in UPDATE SET or a MERGE update action.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: Expr) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Where an INSERT's rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Rows(Vec<Vec<Expr>>),
    Query(Box<SelectQuery>),
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub source: InsertSource,
    /// Columns echoed back per inserted row (OUTPUT/RETURNING).
    pub output: Vec<String>,
    /// True when the statement writes explicit values into identity columns.
    pub identity_insert: bool,
    /// The identity columns, for dialects that must resync a sequence.
    pub identity_columns: Vec<String>,
}

impl InsertStmt {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            source: InsertSource::Rows(Vec::new()),
            output: Vec::new(),
            identity_insert: false,
            identity_columns: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn row(mut self, values: impl IntoIterator<Item = Expr>) -> Self {
        match &mut self.source {
            InsertSource::Rows(rows) => rows.push(values.into_iter().collect()),
            InsertSource::Query(_) => {
                self.source = InsertSource::Rows(vec![values.into_iter().collect()]);
            }
        }
        self
    }

    pub fn query(mut self, query: impl Into<SelectQuery>) -> Self {
        self.source = InsertSource::Query(Box::new(query.into()));
        self
    }

    pub fn output(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.output.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn identity_insert(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.identity_insert = true;
        self.identity_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }
}

/// An UPDATE statement; `sources` holds the full multi-table list, target
/// included, exactly as the caller joined them.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub target: TableRef,
    pub sets: Vec<Assignment>,
    pub sources: Vec<TableExpr>,
    pub where_: Option<Expr>,
    pub output: Vec<String>,
}

impl UpdateStmt {
    pub fn new(target: TableRef) -> Self {
        Self {
            target,
            sets: Vec::new(),
            sources: Vec::new(),
            where_: None,
            output: Vec::new(),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.sets.push(Assignment::new(column, value));
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = TableExpr>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn output(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.output.extend(columns.into_iter().map(Into::into));
        self
    }
}

/// A DELETE statement; `sources` as for [`UpdateStmt`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub target: TableRef,
    pub sources: Vec<TableExpr>,
    pub where_: Option<Expr>,
    pub output: Vec<String>,
}

impl DeleteStmt {
    pub fn new(target: TableRef) -> Self {
        Self {
            target,
            sources: Vec::new(),
            where_: None,
            output: Vec::new(),
        }
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = TableExpr>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn output(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.output.extend(columns.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// MERGE
// ============================================================================

/// A MERGE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStmt {
    pub target: TableRef,
    pub source: TableExpr,
    pub on: Expr,
    pub when_matched: Vec<WhenMatched>,
    pub when_not_matched: Option<NotMatchedInsert>,
}

/// A WHEN MATCHED clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenMatched {
    pub predicate: Option<Expr>,
    pub action: MatchedAction,
}

/// The action of a WHEN MATCHED clause.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchedAction {
    Update(Vec<Assignment>),
    Delete,
}

/// The WHEN NOT MATCHED ... THEN INSERT clause.
#[derive(Debug, Clone, PartialEq)]
pub struct NotMatchedInsert {
    pub predicate: Option<Expr>,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,
}

impl MergeStmt {
    pub fn new(target: TableRef, source: TableExpr, on: Expr) -> Self {
        Self {
            target,
            source,
            on,
            when_matched: Vec::new(),
            when_not_matched: None,
        }
    }

    pub fn when_matched_update(
        mut self,
        predicate: Option<Expr>,
        sets: impl IntoIterator<Item = Assignment>,
    ) -> Self {
        self.when_matched.push(WhenMatched {
            predicate,
            action: MatchedAction::Update(sets.into_iter().collect()),
        });
        self
    }

    pub fn when_matched_delete(mut self, predicate: Option<Expr>) -> Self {
        self.when_matched.push(WhenMatched {
            predicate,
            action: MatchedAction::Delete,
        });
        self
    }

    pub fn when_not_matched_insert(
        mut self,
        predicate: Option<Expr>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        values: impl IntoIterator<Item = Expr>,
    ) -> Self {
        self.when_not_matched = Some(NotMatchedInsert {
            predicate,
            columns: columns.into_iter().map(Into::into).collect(),
            values: values.into_iter().collect(),
        });
        self
    }
}

/// A CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStmt {
    pub name: String,
    pub table: TableRef,
    pub unique: bool,
    pub columns: Vec<IndexColumn>,
}

/// One indexed column.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub name: String,
    pub desc: bool,
}

impl IndexColumn {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: false,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: true,
        }
    }
}

impl CreateIndexStmt {
    pub fn new(name: impl Into<String>, table: TableRef) -> Self {
        Self {
            name: name.into(),
            table,
            unique: false,
            columns: Vec::new(),
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn column(mut self, column: IndexColumn) -> Self {
        self.columns.push(column);
        self
    }
}

// ============================================================================
// Builder-style constructors
// ============================================================================

impl SelectStmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn item(mut self, item: SelectItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = SelectItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn from(mut self, table: TableExpr) -> Self {
        self.from.push(table);
        self
    }

    pub fn join(mut self, kind: JoinKind, table: TableExpr, on: Expr) -> Self {
        self.joins.push(Join { kind, table, on });
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_ = Some(match self.where_ {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }
}
