//! Tokenizer for the supported SQL subset.

use std::ops::Range;

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word: keyword or identifier. Keywords are matched case-insensitively.
    Word(String),
    /// Back-ticked or double-quoted identifier, quotes removed.
    Quoted(String),
    /// Single-quoted string literal, quotes and escapes resolved.
    Str(String),
    /// Numeric literal, verbatim.
    Number(String),
    /// `?`
    Param,
    Star,
    Comma,
    Dot,
    LParen,
    RParen,
    Semicolon,
    /// Comparison operator: `=`, `!=`, `<>`, `<`, `>`, `<=`, `>=`.
    Cmp(&'static str),
    /// Anything else (`+`, `-` outside numbers, `:` ...). Kept so DDL
    /// fragments can still be sliced from the source.
    Other(char),
}

/// A token and its byte range in the statement text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// Whether this is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

/// Split a statement into tokens.
///
/// Fails on unterminated quotes; every other character becomes some token.
pub fn tokenize(sql: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let end_of = |idx: usize| chars.get(idx).map(|(pos, _)| *pos).unwrap_or(sql.len());
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // `-- comment` to end of line
        if c == '-' && matches!(chars.get(i + 1), Some((_, '-'))) {
            while i < chars.len() && chars[i].1 != '\n' {
                i += 1;
            }
            continue;
        }

        let (kind, next) = match c {
            '\'' => {
                let (text, next) = read_quoted(&chars, i, '\'')?;
                (TokenKind::Str(text), next)
            }
            '`' | '"' => {
                let (text, next) = read_quoted(&chars, i, c)?;
                (TokenKind::Quoted(text), next)
            }
            '?' => (TokenKind::Param, i + 1),
            '*' => (TokenKind::Star, i + 1),
            ',' => (TokenKind::Comma, i + 1),
            '.' if !next_is_digit(&chars, i) => (TokenKind::Dot, i + 1),
            '(' => (TokenKind::LParen, i + 1),
            ')' => (TokenKind::RParen, i + 1),
            ';' => (TokenKind::Semicolon, i + 1),
            '=' => (TokenKind::Cmp("="), i + 1),
            '!' if matches!(chars.get(i + 1), Some((_, '='))) => (TokenKind::Cmp("!="), i + 2),
            '<' => match chars.get(i + 1).map(|(_, c)| *c) {
                Some('=') => (TokenKind::Cmp("<="), i + 2),
                Some('>') => (TokenKind::Cmp("<>"), i + 2),
                _ => (TokenKind::Cmp("<"), i + 1),
            },
            '>' => match chars.get(i + 1).map(|(_, c)| *c) {
                Some('=') => (TokenKind::Cmp(">="), i + 2),
                _ => (TokenKind::Cmp(">"), i + 1),
            },
            c if c.is_ascii_digit() || c == '.' || (c == '-' && next_is_digit(&chars, i)) => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_ascii_digit() || chars[j].1 == '.') {
                    j += 1;
                }
                (TokenKind::Number(sql[start..end_of(j)].to_string()), j)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_alphanumeric() || chars[j].1 == '_') {
                    j += 1;
                }
                (TokenKind::Word(sql[start..end_of(j)].to_string()), j)
            }
            other => (TokenKind::Other(other), i + 1),
        };

        tokens.push(Token {
            kind,
            span: start..end_of(next),
        });
        i = next;
    }

    Ok(tokens)
}

fn next_is_digit(chars: &[(usize, char)], i: usize) -> bool {
    matches!(chars.get(i + 1), Some((_, c)) if c.is_ascii_digit())
}

/// Read a quoted run starting at `chars[i] == quote`. A doubled quote is an
/// escaped quote; inside string literals a backslash escapes the next char.
fn read_quoted(chars: &[(usize, char)], i: usize, quote: char) -> Result<(String, usize), String> {
    let mut text = String::new();
    let mut j = i + 1;

    while j < chars.len() {
        let c = chars[j].1;
        if c == quote {
            if matches!(chars.get(j + 1), Some((_, q)) if *q == quote) {
                text.push(quote);
                j += 2;
                continue;
            }
            return Ok((text, j + 1));
        }
        if c == '\\' && quote == '\'' {
            if let Some((_, escaped)) = chars.get(j + 1) {
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    '0' => '\0',
                    other => *other,
                });
                j += 2;
                continue;
            }
        }
        text.push(c);
        j += 1;
    }

    Err(format!(
        "unterminated {} starting at byte {}",
        if quote == '\'' { "string" } else { "quoted identifier" },
        chars[i].0
    ))
}
