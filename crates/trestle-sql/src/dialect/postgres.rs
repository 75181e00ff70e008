//! PostgreSQL rendering rules.

use crate::dialect::{Dialect, finite_double, hex};
use crate::error::{Error, Result};
use crate::expr::{DateUnit, Expr, Literal};
use crate::render::Renderer;
use crate::stmt::SelectStmt;
use crate::types::SqlType;

pub(crate) fn quote(name: &str) -> String {
    format!("\"{}\"", crate::escape::escape_doubling(name, '"'))
}

/// Single-quoted string with doubled quotes (standard-conforming strings).
pub(crate) fn string_literal(text: &str) -> String {
    format!("'{}'", crate::escape::escape_doubling(text, '\''))
}

fn unsupported(construct: &str) -> Error {
    Error::Unsupported {
        dialect: Dialect::Postgres,
        construct: construct.to_string(),
    }
}

pub(crate) fn literal(lit: &Literal) -> Result<String> {
    Ok(match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
        Literal::Byte(_) => return Err(unsupported("byte (8-bit integer) literal")),
        Literal::I16(n) => n.to_string(),
        Literal::I32(n) => n.to_string(),
        Literal::I64(n) => n.to_string(),
        Literal::Decimal(d) => d.to_string(),
        Literal::Double(v) => finite_double(*v)?,
        Literal::DateTime(dt) => {
            format!("'{}'::timestamp", dt.strftime("%Y-%m-%d %H:%M:%S%.f"))
        }
        Literal::DateTimeOffset(ts) => format!("'{ts}'::timestamptz"),
        Literal::Guid(g) => format!("'{g}'::uuid"),
        Literal::Text(s) => string_literal(s),
        Literal::Bytes(b) => format!("'\\x{}'::bytea", hex(b)),
        Literal::Xml(x) => format!("{}::xml", string_literal(x)),
    })
}

pub(crate) fn type_name(ty: SqlType) -> Result<String> {
    Ok(match ty {
        SqlType::Bool => "boolean".to_string(),
        SqlType::Byte => return Err(unsupported("byte (8-bit integer) type")),
        SqlType::Int16 => "smallint".to_string(),
        SqlType::Int32 => "int".to_string(),
        SqlType::Int64 => "bigint".to_string(),
        SqlType::Decimal { spec: Some(s) } => format!("numeric({},{})", s.precision, s.scale),
        SqlType::Decimal { spec: None } => "numeric".to_string(),
        SqlType::Double => "double precision".to_string(),
        SqlType::DateTime => "timestamp".to_string(),
        SqlType::DateTimeOffset => "timestamptz".to_string(),
        SqlType::Guid => "uuid".to_string(),
        SqlType::Text { len: Some(n) } => format!("varchar({n})"),
        SqlType::Text { len: None } => "text".to_string(),
        SqlType::FixedText { len } => format!("char({len})"),
        SqlType::Blob { .. } | SqlType::FixedBlob { .. } => "bytea".to_string(),
        SqlType::Xml => "xml".to_string(),
    })
}

fn unit_word(unit: DateUnit) -> &'static str {
    match unit {
        DateUnit::Year => "year",
        DateUnit::Month => "month",
        DateUnit::Day => "day",
        DateUnit::Hour => "hour",
        DateUnit::Minute => "minute",
        DateUnit::Second => "second",
    }
}

/// Interval arithmetic; the amount multiplies a one-unit interval so any
/// integer expression, negative included, works unchanged.
pub(crate) fn date_add(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    amount: &Expr,
    date: &Expr,
) -> Result<()> {
    r.push("(");
    r.render_expr(date)?;
    r.push(" + (");
    r.render_expr(amount)?;
    r.push(") * INTERVAL '1 ");
    r.push(unit_word(unit));
    r.push("')");
    Ok(())
}

/// Boundary-crossing date difference built from truncation, subtraction and
/// unit conversion. TRUNC keeps integer division truncating toward zero, so
/// a negative difference keeps its sign instead of rounding away from zero.
pub(crate) fn date_diff(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    start: &Expr,
    end: &Expr,
) -> Result<()> {
    match unit {
        DateUnit::Year => {
            r.push("CAST(EXTRACT(YEAR FROM ");
            r.render_expr(end)?;
            r.push(") - EXTRACT(YEAR FROM ");
            r.render_expr(start)?;
            r.push(") AS int)");
        }
        DateUnit::Month => {
            r.push("CAST((EXTRACT(YEAR FROM ");
            r.render_expr(end)?;
            r.push(") - EXTRACT(YEAR FROM ");
            r.render_expr(start)?;
            r.push(")) * 12 + (EXTRACT(MONTH FROM ");
            r.render_expr(end)?;
            r.push(") - EXTRACT(MONTH FROM ");
            r.render_expr(start)?;
            r.push(")) AS int)");
        }
        DateUnit::Day => {
            r.push("(CAST(date_trunc('day', ");
            r.render_expr(end)?;
            r.push(") AS date) - CAST(date_trunc('day', ");
            r.render_expr(start)?;
            r.push(") AS date))");
        }
        DateUnit::Hour | DateUnit::Minute | DateUnit::Second => {
            let divisor = match unit {
                DateUnit::Hour => 3600,
                DateUnit::Minute => 60,
                _ => 1,
            };
            let word = unit_word(unit);
            r.push("CAST(TRUNC(EXTRACT(EPOCH FROM date_trunc('");
            r.push(word);
            r.push("', ");
            r.render_expr(end)?;
            r.push(") - date_trunc('");
            r.push(word);
            r.push("', ");
            r.render_expr(start)?;
            r.push("))");
            if divisor > 1 {
                r.push(&format!(" / {divisor}"));
            }
            r.push(") AS bigint)");
        }
    }
    Ok(())
}

pub(crate) fn pagination_suffix(r: &mut Renderer<'_>, s: &SelectStmt) {
    if let Some(limit) = s.limit {
        r.push(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = s.offset {
        r.push(&format!(" OFFSET {offset}"));
    }
}
