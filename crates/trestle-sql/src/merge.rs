//! MERGE simulation as a structural rewrite.
//!
//! Dialects without native MERGE receive an equivalent UPDATE/DELETE/INSERT
//! sequence built from the same match predicates. This is a pure tree
//! transformation; the result goes through the normal render path.

use std::sync::Arc;

use crate::cte::{CteScan, scan_query, scan_table_expr};
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::stmt::{
    Cte, DeleteStmt, InsertSource, InsertStmt, MatchedAction, MergeStmt, SelectItem, SelectStmt,
    Stmt, TableExpr, TableRef, UpdateStmt,
};

/// Rewrite a MERGE into plain statements, in clause order with the INSERT
/// last, so each statement sees the rows the native MERGE would have seen.
///
/// The rewrite is refused when the source expression reads the target table:
/// sequential statements would observe their own writes and diverge from
/// MERGE's snapshot semantics.
pub fn merge_into_statements(merge: &MergeStmt) -> Result<Vec<Stmt>> {
    if merge.when_matched.is_empty() && merge.when_not_matched.is_none() {
        return Err(Error::EmptyList {
            construct: "MERGE",
            item: "WHEN clause",
        });
    }
    if source_reads_table(&merge.source, &merge.target.name) {
        return Err(Error::MergeNotSimulatable {
            table: merge.target.name.clone(),
        });
    }

    let mut out = Vec::new();
    for matched in &merge.when_matched {
        let filter = with_predicate(merge.on.clone(), matched.predicate.clone());
        match &matched.action {
            MatchedAction::Update(sets) => {
                if sets.is_empty() {
                    return Err(Error::EmptyList {
                        construct: "MERGE update action",
                        item: "assignment",
                    });
                }
                out.push(Stmt::Update(UpdateStmt {
                    target: merge.target.clone(),
                    sets: sets.clone(),
                    sources: vec![
                        TableExpr::Table(merge.target.clone()),
                        merge.source.clone(),
                    ],
                    where_: Some(filter),
                    output: Vec::new(),
                }));
            }
            MatchedAction::Delete => {
                out.push(Stmt::Delete(DeleteStmt {
                    target: merge.target.clone(),
                    sources: vec![
                        TableExpr::Table(merge.target.clone()),
                        merge.source.clone(),
                    ],
                    where_: Some(filter),
                    output: Vec::new(),
                }));
            }
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

        // Source rows that have no match in the target.
        let matched_rows = SelectStmt::new()
            .from(TableExpr::Table(merge.target.clone()))
            .where_(merge.on.clone());
        let not_matched = Expr::Not(Box::new(Expr::exists(matched_rows.into())));
        let filter = match &insert.predicate {
            Some(p) => p.clone().and(not_matched),
            None => not_matched,
        };
        let select = SelectStmt::new()
            .items(insert.values.iter().cloned().map(SelectItem::expr))
            .from(merge.source.clone())
            .where_(filter);

        out.push(Stmt::Insert(InsertStmt {
            table: TableRef {
                alias: None,
                ..merge.target.clone()
            },
            columns: insert.columns.clone(),
            source: InsertSource::Query(Box::new(select.into())),
            output: Vec::new(),
            identity_insert: false,
            identity_columns: Vec::new(),
        }));
    }

    Ok(out)
}

/// Whether `source` references a table called `name` anywhere, including
/// inside derived tables and CTE definitions. Schema qualifiers are ignored
/// when matching.
fn source_reads_table(source: &TableExpr, name: &str) -> bool {
    let mut hit = false;
    let mut ctes: Vec<Arc<Cte>> = Vec::new();
    {
        let mut on_cte = |c: &Arc<Cte>| ctes.push(Arc::clone(c));
        let mut on_table = |t: &TableRef| {
            if t.name == name {
                hit = true;
            }
        };
        let mut scan = CteScan {
            on_cte: &mut on_cte,
            on_table: &mut on_table,
        };
        scan_table_expr(source, &mut scan);
    }
    let mut seen: Vec<String> = Vec::new();
    while let Some(cte) = ctes.pop() {
        if hit {
            return true;
        }
        if seen.iter().any(|n| n == &cte.name) {
            continue;
        }
        seen.push(cte.name.clone());
        let mut on_cte = |c: &Arc<Cte>| ctes.push(Arc::clone(c));
        let mut on_table = |t: &TableRef| {
            if t.name == name {
                hit = true;
            }
        };
        let mut scan = CteScan {
            on_cte: &mut on_cte,
            on_table: &mut on_table,
        };
        scan_query(&cte.query, &mut scan);
    }
    hit
}

fn with_predicate(on: Expr, predicate: Option<Expr>) -> Expr {
    match predicate {
        Some(p) => on.and(p),
        None => on,
    }
}
