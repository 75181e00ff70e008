//! MySQL rendering rules.

use crate::dialect::{Dialect, finite_double, hex};
use crate::error::{Error, Result};
use crate::expr::{DateUnit, Expr, Literal};
use crate::render::Renderer;
use crate::stmt::SelectStmt;
use crate::types::SqlType;

pub(crate) fn quote(name: &str) -> String {
    format!("`{}`", crate::escape::escape_doubling(name, '`'))
}

/// Single-quoted string with backslash escaping for `'` and `\`.
pub(crate) fn string_literal(text: &str) -> String {
    format!("'{}'", crate::escape::escape_backslash(text))
}

fn unsupported(construct: &str) -> Error {
    Error::Unsupported {
        dialect: Dialect::MySql,
        construct: construct.to_string(),
    }
}

pub(crate) fn literal(lit: &Literal) -> Result<String> {
    Ok(match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
        Literal::Byte(n) => n.to_string(),
        Literal::I16(n) => n.to_string(),
        Literal::I32(n) => n.to_string(),
        Literal::I64(n) => n.to_string(),
        Literal::Decimal(d) => d.to_string(),
        Literal::Double(v) => finite_double(*v)?,
        Literal::DateTime(dt) => format!("'{}'", dt.strftime("%Y-%m-%d %H:%M:%S%.f")),
        Literal::DateTimeOffset(_) => {
            return Err(unsupported("datetime-with-offset literal"));
        }
        Literal::Guid(g) => format!("0x{}", g.simple()),
        Literal::Text(s) => string_literal(s),
        Literal::Bytes(b) => format!("x'{}'", hex(b)),
        Literal::Xml(_) => return Err(unsupported("xml literal")),
    })
}

pub(crate) fn type_name(ty: SqlType) -> Result<String> {
    Ok(match ty {
        SqlType::Bool => "signed".to_string(),
        SqlType::Byte => "unsigned".to_string(),
        SqlType::Int16 | SqlType::Int32 | SqlType::Int64 => "signed".to_string(),
        SqlType::Decimal { spec: Some(s) } => format!("decimal({},{})", s.precision, s.scale),
        SqlType::Decimal { spec: None } => "decimal".to_string(),
        SqlType::Double => "double".to_string(),
        SqlType::DateTime => "datetime".to_string(),
        SqlType::DateTimeOffset => return Err(unsupported("datetime-with-offset type")),
        SqlType::Guid => "binary(16)".to_string(),
        SqlType::Text { len: Some(n) } => format!("char({n})"),
        SqlType::Text { len: None } => "char".to_string(),
        SqlType::FixedText { len } => format!("char({len})"),
        SqlType::Blob { len: Some(n) } => format!("binary({n})"),
        SqlType::Blob { len: None } => "binary".to_string(),
        SqlType::FixedBlob { len } => format!("binary({len})"),
        SqlType::Xml => return Err(unsupported("xml type")),
    })
}

fn unit_keyword(unit: DateUnit) -> &'static str {
    match unit {
        DateUnit::Year => "YEAR",
        DateUnit::Month => "MONTH",
        DateUnit::Day => "DAY",
        DateUnit::Hour => "HOUR",
        DateUnit::Minute => "MINUTE",
        DateUnit::Second => "SECOND",
    }
}

pub(crate) fn date_add(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    amount: &Expr,
    date: &Expr,
) -> Result<()> {
    r.push("DATE_ADD(");
    r.render_expr(date)?;
    r.push(", INTERVAL (");
    r.render_expr(amount)?;
    r.push(") ");
    r.push(unit_keyword(unit));
    r.push(")");
    Ok(())
}

/// Boundary-crossing date difference.
///
/// MySQL's native TIMESTAMPDIFF counts complete units, so year and month
/// come from calendar-field arithmetic, days from DATEDIFF, and time units
/// from TIMESTAMPDIFF over operands truncated to the unit.
pub(crate) fn date_diff(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    start: &Expr,
    end: &Expr,
) -> Result<()> {
    match unit {
        DateUnit::Year => {
            r.push("(YEAR(");
            r.render_expr(end)?;
            r.push(") - YEAR(");
            r.render_expr(start)?;
            r.push("))");
        }
        DateUnit::Month => {
            r.push("((YEAR(");
            r.render_expr(end)?;
            r.push(") - YEAR(");
            r.render_expr(start)?;
            r.push(")) * 12 + (MONTH(");
            r.render_expr(end)?;
            r.push(") - MONTH(");
            r.render_expr(start)?;
            r.push(")))");
        }
        DateUnit::Day => {
            r.push("DATEDIFF(");
            r.render_expr(end)?;
            r.push(", ");
            r.render_expr(start)?;
            r.push(")");
        }
        DateUnit::Hour | DateUnit::Minute | DateUnit::Second => {
            let fmt = match unit {
                DateUnit::Hour => "'%Y-%m-%d %H:00:00'",
                DateUnit::Minute => "'%Y-%m-%d %H:%i:00'",
                _ => "'%Y-%m-%d %H:%i:%s'",
            };
            r.push("TIMESTAMPDIFF(");
            r.push(unit_keyword(unit));
            r.push(", DATE_FORMAT(");
            r.render_expr(start)?;
            r.push(", ");
            r.push(fmt);
            r.push("), DATE_FORMAT(");
            r.render_expr(end)?;
            r.push(", ");
            r.push(fmt);
            r.push("))");
        }
    }
    Ok(())
}

pub(crate) fn pagination_suffix(r: &mut Renderer<'_>, s: &SelectStmt) -> Result<()> {
    match (s.limit, s.offset) {
        (Some(limit), Some(offset)) => {
            r.push(&format!(" LIMIT {limit} OFFSET {offset}"));
        }
        (Some(limit), None) => {
            r.push(&format!(" LIMIT {limit}"));
        }
        (None, Some(_)) => return Err(unsupported("OFFSET without LIMIT")),
        (None, None) => {}
    }
    Ok(())
}
