//! Escaping safety: for any input, the rendered literal or identifier can
//! never terminate its quoting context early, and scanning it back yields
//! the original text.

use proptest::prelude::*;
use trestle_sql::Dialect;

/// Scan a `delim`-quoted chunk where the delimiter is escaped by doubling.
/// Returns the recovered content only if the closing delimiter lands exactly
/// at the end of the input.
fn scan_doubled(rendered: &str, open: char, close: char) -> Option<String> {
    let mut chars = rendered.chars();
    if chars.next()? != open {
        return None;
    }
    let mut content = String::new();
    loop {
        match chars.next()? {
            c if c == close => {
                if chars.clone().next() == Some(close) {
                    chars.next();
                    content.push(close);
                } else {
                    return if chars.next().is_none() {
                        Some(content)
                    } else {
                        None
                    };
                }
            }
            c => content.push(c),
        }
    }
}

/// Scan a single-quoted chunk using MySQL's backslash escaping.
fn scan_backslashed(rendered: &str) -> Option<String> {
    let mut chars = rendered.chars();
    if chars.next()? != '\'' {
        return None;
    }
    let mut content = String::new();
    loop {
        match chars.next()? {
            '\\' => content.push(chars.next()?),
            '\'' => {
                return if chars.next().is_none() {
                    Some(content)
                } else {
                    None
                };
            }
            c => content.push(c),
        }
    }
}

proptest! {
    #[test]
    fn tsql_string_roundtrip(s in ".*") {
        let rendered = Dialect::Tsql.string_literal(&s);
        let body = rendered.strip_prefix('N').unwrap_or(&rendered);
        prop_assert_eq!(scan_doubled(body, '\'', '\''), Some(s));
    }

    #[test]
    fn postgres_string_roundtrip(s in ".*") {
        let rendered = Dialect::Postgres.string_literal(&s);
        prop_assert_eq!(scan_doubled(&rendered, '\'', '\''), Some(s));
    }

    #[test]
    fn mysql_string_roundtrip(s in ".*") {
        let rendered = Dialect::MySql.string_literal(&s);
        prop_assert_eq!(scan_backslashed(&rendered), Some(s));
    }

    #[test]
    fn tsql_identifier_roundtrip(s in ".*") {
        let rendered = Dialect::Tsql.quote_ident(&s);
        prop_assert_eq!(scan_doubled(&rendered, '[', ']'), Some(s));
    }

    #[test]
    fn postgres_identifier_roundtrip(s in ".*") {
        let rendered = Dialect::Postgres.quote_ident(&s);
        prop_assert_eq!(scan_doubled(&rendered, '"', '"'), Some(s));
    }

    #[test]
    fn mysql_identifier_roundtrip(s in ".*") {
        let rendered = Dialect::MySql.quote_ident(&s);
        prop_assert_eq!(scan_doubled(&rendered, '`', '`'), Some(s));
    }

    #[test]
    fn repeated_delimiters_never_escape(n in 0usize..16) {
        let s = "'".repeat(n);
        let rendered = Dialect::Postgres.string_literal(&s);
        prop_assert_eq!(scan_doubled(&rendered, '\'', '\''), Some(s));
    }
}

#[test]
fn test_known_vectors() {
    assert_eq!(Dialect::Tsql.string_literal("a'b"), "'a''b'");
    assert_eq!(Dialect::Postgres.string_literal("a'b"), "'a''b'");
    assert_eq!(Dialect::MySql.string_literal("a'b"), "'a\\'b'");

    assert_eq!(Dialect::Tsql.quote_ident("x]y"), "[x]]y]");
    assert_eq!(Dialect::Postgres.quote_ident("x]y"), "\"x]y\"");
    assert_eq!(Dialect::MySql.quote_ident("x]y"), "`x]y`");
}

#[test]
fn test_embedded_injection_attempt_stays_inert() {
    let attack = "'; DROP TABLE users; --";
    assert_eq!(
        Dialect::Postgres.string_literal(attack),
        "'''; DROP TABLE users; --'"
    );
    assert_eq!(
        Dialect::MySql.string_literal(attack),
        "'\\'; DROP TABLE users; --'"
    );
}
