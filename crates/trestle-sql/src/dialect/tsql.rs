//! T-SQL (SQL Server) rendering rules.

use crate::dialect::{Dialect, finite_double, hex};
use crate::error::{Error, Result};
use crate::expr::{DateUnit, Expr, Literal};
use crate::render::Renderer;
use crate::stmt::SelectStmt;
use crate::types::SqlType;

pub(crate) fn quote(name: &str) -> String {
    format!("[{}]", crate::escape::escape_doubling(name, ']'))
}

/// Single-quoted string, `N`-prefixed only when the text holds a character
/// outside the 0–255 range.
pub(crate) fn string_literal(text: &str) -> String {
    let escaped = crate::escape::escape_doubling(text, '\'');
    if text.chars().any(|c| c as u32 > 0xFF) {
        format!("N'{escaped}'")
    } else {
        format!("'{escaped}'")
    }
}

pub(crate) fn literal(lit: &Literal) -> Result<String> {
    Ok(match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(true) => "1".to_string(),
        Literal::Bool(false) => "0".to_string(),
        Literal::Byte(n) => n.to_string(),
        Literal::I16(n) => n.to_string(),
        Literal::I32(n) => n.to_string(),
        Literal::I64(n) => n.to_string(),
        Literal::Decimal(d) => d.to_string(),
        Literal::Double(v) => finite_double(*v)?,
        Literal::DateTime(dt) => format!("'{}'", dt.strftime("%Y-%m-%dT%H:%M:%S%.f")),
        Literal::DateTimeOffset(ts) => format!("'{ts}'"),
        Literal::Guid(g) => format!("'{g}'"),
        Literal::Text(s) => string_literal(s),
        Literal::Bytes(b) => format!("0x{}", hex(b)),
        Literal::Xml(x) => string_literal(x),
    })
}

pub(crate) fn type_name(ty: SqlType) -> Result<String> {
    Ok(match ty {
        SqlType::Bool => "bit".to_string(),
        SqlType::Byte => "tinyint".to_string(),
        SqlType::Int16 => "smallint".to_string(),
        SqlType::Int32 => "int".to_string(),
        SqlType::Int64 => "bigint".to_string(),
        SqlType::Decimal { spec: Some(s) } => format!("decimal({},{})", s.precision, s.scale),
        SqlType::Decimal { spec: None } => "decimal".to_string(),
        SqlType::Double => "float".to_string(),
        SqlType::DateTime => "datetime2".to_string(),
        SqlType::DateTimeOffset => "datetimeoffset".to_string(),
        SqlType::Guid => "uniqueidentifier".to_string(),
        SqlType::Text { len: Some(n) } => format!("nvarchar({n})"),
        SqlType::Text { len: None } => "nvarchar(MAX)".to_string(),
        SqlType::FixedText { len } => format!("nchar({len})"),
        SqlType::Blob { len: Some(n) } => format!("varbinary({n})"),
        SqlType::Blob { len: None } => "varbinary(MAX)".to_string(),
        SqlType::FixedBlob { len } => format!("binary({len})"),
        SqlType::Xml => "xml".to_string(),
    })
}

fn unit_keyword(unit: DateUnit) -> &'static str {
    match unit {
        DateUnit::Year => "year",
        DateUnit::Month => "month",
        DateUnit::Day => "day",
        DateUnit::Hour => "hour",
        DateUnit::Minute => "minute",
        DateUnit::Second => "second",
    }
}

pub(crate) fn date_add(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    amount: &Expr,
    date: &Expr,
) -> Result<()> {
    r.push("DATEADD(");
    r.push(unit_keyword(unit));
    r.push(", ");
    r.render_expr(amount)?;
    r.push(", ");
    r.render_expr(date)?;
    r.push(")");
    Ok(())
}

pub(crate) fn date_diff(
    r: &mut Renderer<'_>,
    unit: DateUnit,
    start: &Expr,
    end: &Expr,
) -> Result<()> {
    r.push("DATEDIFF(");
    r.push(unit_keyword(unit));
    r.push(", ");
    r.render_expr(start)?;
    r.push(", ");
    r.render_expr(end)?;
    r.push(")");
    Ok(())
}

/// `TOP n` immediately after SELECT/DISTINCT, only while no OFFSET forces
/// the fetch form.
pub(crate) fn pagination_prefix(r: &mut Renderer<'_>, s: &SelectStmt) {
    if s.offset.is_none() {
        if let Some(limit) = s.limit {
            r.push(&format!("TOP {limit} "));
        }
    }
}

pub(crate) fn pagination_suffix(r: &mut Renderer<'_>, s: &SelectStmt) -> Result<()> {
    if let Some(offset) = s.offset {
        if s.order_by.is_empty() {
            return Err(Error::OffsetWithoutOrderBy {
                dialect: Dialect::Tsql,
            });
        }
        r.push(&format!(" OFFSET {offset} ROWS"));
        if let Some(limit) = s.limit {
            r.push(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
    }
    Ok(())
}
