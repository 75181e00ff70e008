//! CTE bookkeeping: registration, conflict detection, transitive discovery.
//!
//! Dialects without inline WITH support hoist every CTE used by a statement
//! into one deduplicated WITH clause. References register here while the
//! statement body renders; afterwards the registry walks each defining query
//! for nested references and produces the definition list in dependency
//! order, so a referenced CTE always precedes its referencer.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::expr::{Expr, InSet, WindowFunc};
use crate::stmt::{Cte, SelectItem, SelectQuery, SelectStmt, TableExpr, TableRef};

/// Callbacks invoked for every CTE reference and named-table reference found
/// while walking a subtree.
pub(crate) struct CteScan<'a> {
    pub on_cte: &'a mut dyn FnMut(&Arc<Cte>),
    pub on_table: &'a mut dyn FnMut(&TableRef),
}

/// Per-render CTE registry.
#[derive(Default)]
pub(crate) struct CteRegistry {
    /// Every definition seen this render, for naming-conflict detection.
    seen: IndexMap<String, Arc<Cte>>,
    /// References awaiting hoisting in the current statement scope.
    pending: Vec<Arc<Cte>>,
}

impl CteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference. With `queue` set the definition is also added to
    /// the current statement's hoisting list (once per name).
    pub fn register(&mut self, cte: &Arc<Cte>, queue: bool) -> Result<()> {
        self.check(cte)?;
        if queue && !self.pending.iter().any(|p| p.name == cte.name) {
            self.pending.push(Arc::clone(cte));
        }
        Ok(())
    }

    pub fn take_pending(&mut self) -> Vec<Arc<Cte>> {
        std::mem::take(&mut self.pending)
    }

    /// Expand `roots` with every CTE their defining queries reference,
    /// transitively. Returns the definitions in emission order (dependencies
    /// first) and whether any defining query references its own name.
    pub fn collect_transitive(&mut self, roots: &[Arc<Cte>]) -> Result<(Vec<Arc<Cte>>, bool)> {
        let mut out = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        let mut recursive = false;
        for root in roots {
            self.visit(root, &mut out, &mut visited, &mut recursive)?;
        }
        Ok((out, recursive))
    }

    fn visit(
        &mut self,
        cte: &Arc<Cte>,
        out: &mut Vec<Arc<Cte>>,
        visited: &mut Vec<String>,
        recursive: &mut bool,
    ) -> Result<()> {
        self.check(cte)?;
        if visited.iter().any(|n| n == &cte.name) {
            return Ok(());
        }
        visited.push(cte.name.clone());

        let mut found: Vec<Arc<Cte>> = Vec::new();
        let mut self_ref = false;
        {
            let name = cte.name.as_str();
            let mut on_cte = |c: &Arc<Cte>| found.push(Arc::clone(c));
            let mut on_table = |t: &TableRef| {
                if t.schema.is_none() && t.name == name {
                    self_ref = true;
                }
            };
            let mut scan = CteScan {
                on_cte: &mut on_cte,
                on_table: &mut on_table,
            };
            scan_query(&cte.query, &mut scan);
        }
        if self_ref {
            *recursive = true;
        }
        for dep in &found {
            self.visit(dep, out, visited, recursive)?;
        }
        out.push(Arc::clone(cte));
        Ok(())
    }

    fn check(&mut self, cte: &Arc<Cte>) -> Result<()> {
        match self.seen.get(&cte.name) {
            Some(prev) => {
                if !Arc::ptr_eq(prev, cte) && **prev != **cte {
                    return Err(Error::CteNameConflict {
                        name: cte.name.clone(),
                    });
                }
            }
            None => {
                self.seen.insert(cte.name.clone(), Arc::clone(cte));
            }
        }
        Ok(())
    }
}

// Tree walking. The walkers only report references; recursion into a CTE's
// own defining query is the caller's decision.

pub(crate) fn scan_query(query: &SelectQuery, scan: &mut CteScan) {
    match query {
        SelectQuery::Select(s) => scan_select(s, scan),
        SelectQuery::Compound { left, right, .. } => {
            scan_query(left, scan);
            scan_query(right, scan);
        }
    }
}

fn scan_select(s: &SelectStmt, scan: &mut CteScan) {
    for item in &s.items {
        if let SelectItem::Expr { expr, .. } = item {
            scan_expr(expr, scan);
        }
    }
    for table in &s.from {
        scan_table_expr(table, scan);
    }
    for join in &s.joins {
        scan_table_expr(&join.table, scan);
        scan_expr(&join.on, scan);
    }
    if let Some(w) = &s.where_ {
        scan_expr(w, scan);
    }
    for g in &s.group_by {
        scan_expr(g, scan);
    }
    if let Some(h) = &s.having {
        scan_expr(h, scan);
    }
    for o in &s.order_by {
        scan_expr(&o.expr, scan);
    }
}

pub(crate) fn scan_table_expr(table: &TableExpr, scan: &mut CteScan) {
    match table {
        TableExpr::Table(t) => (scan.on_table)(t),
        TableExpr::Derived { query, .. } => scan_query(query, scan),
        TableExpr::Values { rows, .. } => {
            for row in rows {
                for value in row {
                    scan_expr(value, scan);
                }
            }
        }
        TableExpr::Cte(cte) => (scan.on_cte)(cte),
    }
}

pub(crate) fn scan_expr(expr: &Expr, scan: &mut CteScan) {
    match expr {
        Expr::Literal(_) | Expr::Column(_) | Expr::Star => {}
        Expr::Cmp { left, right, .. }
        | Expr::Arith { left, right, .. }
        | Expr::Bit { left, right, .. } => {
            scan_expr(left, scan);
            scan_expr(right, scan);
        }
        Expr::And(items) | Expr::Or(items) => {
            for item in items {
                scan_expr(item, scan);
            }
        }
        Expr::Not(inner) | Expr::BitNot(inner) => scan_expr(inner, scan),
        Expr::Like { expr, pattern } => {
            scan_expr(expr, scan);
            scan_expr(pattern, scan);
        }
        Expr::In { expr, set } => {
            scan_expr(expr, scan);
            match set {
                InSet::List(items) => {
                    for item in items {
                        scan_expr(item, scan);
                    }
                }
                InSet::Query(q) => scan_query(q, scan),
            }
        }
        Expr::IsNull { expr, .. } => scan_expr(expr, scan),
        Expr::Exists(q) | Expr::Subquery(q) => scan_query(q, scan),
        Expr::Case { whens, else_ } => {
            for arm in whens {
                scan_expr(&arm.when, scan);
                scan_expr(&arm.then, scan);
            }
            if let Some(e) = else_ {
                scan_expr(e, scan);
            }
        }
        Expr::Cast { expr, .. } => scan_expr(expr, scan),
        Expr::Call { args, .. } => {
            for arg in args {
                scan_expr(arg, scan);
            }
        }
        Expr::Window {
            func,
            partition_by,
            order_by,
        } => {
            if let WindowFunc::Agg { args, .. } = func {
                for arg in args {
                    scan_expr(arg, scan);
                }
            }
            for p in partition_by {
                scan_expr(p, scan);
            }
            for o in order_by {
                scan_expr(&o.expr, scan);
            }
        }
        Expr::DateAdd { amount, date, .. } => {
            scan_expr(amount, scan);
            scan_expr(date, scan);
        }
        Expr::DateDiff { start, end, .. } => {
            scan_expr(start, scan);
            scan_expr(end, scan);
        }
    }
}
