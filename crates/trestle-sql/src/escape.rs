//! Injection-safe escaping primitives.
//!
//! Everything that reaches the output buffer as a literal or identifier goes
//! through one of these functions. Both strategies are total: no input can
//! produce text that terminates its quoting context early.

/// Escape `text` for a context delimited by `delim`, doubling each
/// occurrence of the delimiter. Used for `'` (T-SQL, PostgreSQL strings),
/// `"` and `` ` `` (identifiers), and `]` (T-SQL identifiers).
pub fn escape_doubling(text: &str, delim: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == delim {
            out.push(delim);
        }
        out.push(c);
    }
    out
}

/// Escape `text` for a MySQL single-quoted string, backslash-prefixing the
/// quote and the backslash itself.
pub fn escape_backslash(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Whether `name` is safe to emit unquoted in function-call syntax.
///
/// Built-in function names cannot be identifier-quoted, so anything that is
/// not a strict identifier is rejected before emission.
pub fn valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubling_quote() {
        assert_eq!(escape_doubling("a'b", '\''), "a''b");
        assert_eq!(escape_doubling("''", '\''), "''''");
        assert_eq!(escape_doubling("plain", '\''), "plain");
    }

    #[test]
    fn test_doubling_bracket() {
        assert_eq!(escape_doubling("x]y", ']'), "x]]y");
        // Opening bracket needs no escape; only the closing delimiter can
        // terminate the context.
        assert_eq!(escape_doubling("[x]", ']'), "[x]]");
    }

    #[test]
    fn test_backslash() {
        assert_eq!(escape_backslash("a'b"), "a\\'b");
        assert_eq!(escape_backslash("a\\b"), "a\\\\b");
        assert_eq!(escape_backslash("a\\'b"), "a\\\\\\'b");
    }

    #[test]
    fn test_function_names() {
        assert!(valid_function_name("COALESCE"));
        assert!(valid_function_name("date_trunc"));
        assert!(valid_function_name("_f0"));
        assert!(!valid_function_name(""));
        assert!(!valid_function_name("1abs"));
        assert!(!valid_function_name("CHAR(1); DROP TABLE x"));
        assert!(!valid_function_name("f-n"));
    }
}
