//! Backend dialects.
//!
//! [`Dialect`] is a closed enum; every behavior method dispatches into one
//! module per backend, and each of those matches exhaustively over the
//! closed node and type enums. Adding a node kind therefore fails to compile
//! until every dialect answers for it.

pub(crate) mod mysql;
pub(crate) mod postgres;
pub(crate) mod tsql;

use std::fmt;

use crate::error::{Error, Result};
use crate::expr::Literal;
use crate::types::SqlType;

/// A target SQL backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Tsql,
    MySql,
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Tsql => "tsql",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
        })
    }
}

impl Dialect {
    /// Quote an identifier with this dialect's delimiter pair.
    pub fn quote_ident(self, name: &str) -> String {
        match self {
            Dialect::Tsql => tsql::quote(name),
            Dialect::MySql => mysql::quote(name),
            Dialect::Postgres => postgres::quote(name),
        }
    }

    /// Render a string literal, fully escaped for this dialect.
    pub fn string_literal(self, text: &str) -> String {
        match self {
            Dialect::Tsql => tsql::string_literal(text),
            Dialect::MySql => mysql::string_literal(text),
            Dialect::Postgres => postgres::string_literal(text),
        }
    }

    /// Render a scalar literal, or fail if this dialect cannot represent it.
    pub fn literal(self, lit: &Literal) -> Result<String> {
        match self {
            Dialect::Tsql => tsql::literal(lit),
            Dialect::MySql => mysql::literal(lit),
            Dialect::Postgres => postgres::literal(lit),
        }
    }

    /// The type name used in CAST expressions.
    pub fn type_name(self, ty: SqlType) -> Result<String> {
        match self {
            Dialect::Tsql => tsql::type_name(ty),
            Dialect::MySql => mysql::type_name(ty),
            Dialect::Postgres => postgres::type_name(ty),
        }
    }

    /// Whether WITH may be declared immediately before the query using it,
    /// anywhere in a statement. Dialects without this hoist all CTEs into
    /// one top-level WITH clause.
    pub(crate) fn supports_inline_cte(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Whether the hoisted/inline WITH clause spells out `RECURSIVE`.
    pub(crate) fn recursive_keyword(self) -> bool {
        match self {
            Dialect::Tsql => false,
            Dialect::MySql | Dialect::Postgres => true,
        }
    }

    /// Whether INSERT/UPDATE/DELETE can echo rows back to the caller.
    pub(crate) fn supports_output(self) -> bool {
        match self {
            Dialect::Tsql | Dialect::Postgres => true,
            Dialect::MySql => false,
        }
    }

    /// Whether MERGE passes through natively instead of being rewritten.
    pub(crate) fn supports_native_merge(self) -> bool {
        matches!(self, Dialect::Tsql)
    }
}

/// Render a finite double; NaN and infinities have no SQL spelling.
pub(crate) fn finite_double(v: f64) -> Result<String> {
    if v.is_finite() {
        Ok(format!("{v}"))
    } else {
        Err(Error::UnrepresentableLiteral {
            reason: format!("double value {v}"),
        })
    }
}

/// Lowercase hex encoding for binary literals.
pub(crate) fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(Dialect::Tsql.quote_ident("x]y"), "[x]]y]");
        assert_eq!(Dialect::Postgres.quote_ident("x]y"), "\"x]y\"");
        assert_eq!(Dialect::MySql.quote_ident("x]y"), "`x]y`");
        assert_eq!(Dialect::Postgres.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(Dialect::Tsql.string_literal("a'b"), "'a''b'");
        assert_eq!(Dialect::Postgres.string_literal("a'b"), "'a''b'");
        assert_eq!(Dialect::MySql.string_literal("a'b"), "'a\\'b'");
    }

    #[test]
    fn test_unicode_prefix_is_per_literal() {
        assert_eq!(Dialect::Tsql.string_literal("plain"), "'plain'");
        assert_eq!(Dialect::Tsql.string_literal("caf\u{e9}"), "'caf\u{e9}'");
        assert_eq!(Dialect::Tsql.string_literal("价格"), "N'价格'");
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(Dialect::Tsql.literal(&Literal::Bool(true)).unwrap(), "1");
        assert_eq!(Dialect::Tsql.literal(&Literal::Bool(false)).unwrap(), "0");
        assert_eq!(
            Dialect::MySql.literal(&Literal::Bool(true)).unwrap(),
            "TRUE"
        );
        assert_eq!(
            Dialect::Postgres.literal(&Literal::Bool(false)).unwrap(),
            "FALSE"
        );
    }

    #[test]
    fn test_guid_literals() {
        let guid = uuid::Uuid::parse_str("6db4f597-0b70-4dd0-95c4-5f1e0eb051e8").unwrap();
        assert_eq!(
            Dialect::Tsql.literal(&Literal::Guid(guid)).unwrap(),
            "'6db4f597-0b70-4dd0-95c4-5f1e0eb051e8'"
        );
        assert_eq!(
            Dialect::MySql.literal(&Literal::Guid(guid)).unwrap(),
            "0x6db4f5970b704dd095c45f1e0eb051e8"
        );
        assert_eq!(
            Dialect::Postgres.literal(&Literal::Guid(guid)).unwrap(),
            "'6db4f597-0b70-4dd0-95c4-5f1e0eb051e8'::uuid"
        );
    }

    #[test]
    fn test_unrepresentable_literals() {
        assert!(Dialect::Postgres.literal(&Literal::Byte(7)).is_err());
        assert!(
            Dialect::MySql
                .literal(&Literal::Xml("<a/>".into()))
                .is_err()
        );
        assert!(Dialect::Tsql.literal(&Literal::Double(f64::NAN)).is_err());
    }
}
