//! SQL text helpers: string literals and qualified identifiers
//!
//! Every value interpolated into generated SQL goes through
//! [`quote_literal`], and every identifier through [`QualifiedName`].
//! [`parse_literal`] reverses `quote_literal` the way the warehouse parser
//! does, so escaping can be checked end to end.

use thiserror::Error;

/// Errors from SQL literal or identifier handling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlError {
    #[error("Expected a single-quoted string literal")]
    NotALiteral,

    #[error("Unterminated string literal")]
    Unterminated,

    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),
}

/// Render `value` as a single-quoted SQL string literal
///
/// Quotes are doubled; backslashes and NUL are backslash-escaped because the
/// warehouse treats backslash as an escape character inside literals.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Parse one string literal from the start of `input`
///
/// Returns the decoded value and the remaining input after the closing quote.
pub fn parse_literal(input: &str) -> Result<(String, &str), SqlError> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '\'')) => {}
        _ => return Err(SqlError::NotALiteral),
    }

    let mut value = String::new();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' => {
                // '' is an escaped quote, a lone ' ends the literal
                if input[i + 1..].starts_with('\'') {
                    chars.next();
                    value.push('\'');
                } else {
                    return Ok((value, &input[i + 1..]));
                }
            }
            '\\' => {
                let (_, escaped) = chars.next().ok_or(SqlError::Unterminated)?;
                value.push(match escaped {
                    '0' => '\0',
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    other => other,
                });
            }
            _ => value.push(ch),
        }
    }

    Err(SqlError::Unterminated)
}

/// A validated, possibly schema-qualified identifier (`DB.SCHEMA.NAME`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Wrap a compile-time identifier
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(name.parse::<QualifiedName>().is_ok(), "invalid identifier {name}");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.split('.').all(|part| {
                let mut chars = part.chars();
                matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            });

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(SqlError::InvalidIdentifier(s.to_string()))
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_plain() {
        assert_eq!(quote_literal("DENIED"), "'DENIED'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_quote_literal_escapes_quotes_and_backslashes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(r"a\b"), r"'a\\b'");
        assert_eq!(quote_literal("nul\0"), r"'nul\0'");
    }

    #[test]
    fn test_parse_literal_recovers_hostile_input() {
        let inputs = [
            "plain question",
            "what's the 'worst' claim?",
            r"trailing backslash \",
            r"\' ) AS ANSWER; DROP TABLE AI_ENRICHED_CLAIMS; --",
            "multi\nline\ttext\0end",
            "''''",
            "unicode ✓ ünïcödé",
        ];

        for input in inputs {
            let quoted = quote_literal(input);
            let (parsed, rest) = parse_literal(&quoted).unwrap();
            assert_eq!(parsed, input);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_parse_literal_returns_remainder() {
        let (value, rest) = parse_literal("'a''b', 'c') AS X").unwrap();
        assert_eq!(value, "a'b");
        assert_eq!(rest, ", 'c') AS X");
    }

    #[test]
    fn test_parse_literal_errors() {
        assert_eq!(parse_literal("abc"), Err(SqlError::NotALiteral));
        assert_eq!(parse_literal("'abc"), Err(SqlError::Unterminated));
        assert_eq!(parse_literal(r"'abc\"), Err(SqlError::Unterminated));
    }

    #[test]
    fn test_qualified_name() {
        assert!("AI_ENRICHED_CLAIMS".parse::<QualifiedName>().is_ok());
        assert!("CORTEX_DEMO.HEALTHCARE.AI_ENRICHED_CLAIMS"
            .parse::<QualifiedName>()
            .is_ok());
        assert!("SNOWFLAKE.CORTEX.COMPLETE".parse::<QualifiedName>().is_ok());
        assert!("claims; DROP TABLE x".parse::<QualifiedName>().is_err());
        assert!("a..b".parse::<QualifiedName>().is_err());
        assert!("1abc".parse::<QualifiedName>().is_err());
        assert!("".parse::<QualifiedName>().is_err());
    }
}
