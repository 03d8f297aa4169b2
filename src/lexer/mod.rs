use std::borrow::Cow;
use std::fmt;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::AsmError;
use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

lazy_static! {
    static ref LABEL: Regex = Regex::new(r"^([A-Za-z_]\w*):$").unwrap();
    static ref ADDRESS: Regex = Regex::new(r"^\[([A-Za-z_]\w*)\]$").unwrap();
    static ref NUMBER: Regex = Regex::new(r"^[0-9]").unwrap();
    static ref STRING: Regex = Regex::new(r#"^"((?:[^"\\]|\\.)*)"$"#).unwrap();
    static ref IDENT: Regex = Regex::new(r"^[A-Za-z_]\w*$").unwrap();
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    /// `name:` in front of an instruction
    Label,
    /// `[name]`, the address of a label
    Address,
    Number,
    Str,
    Ident,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Label => "label",
            TokenKind::Address => "address",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Ident => "identifier",
        })
    }
}

/// Decoded contents of a token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Value {
    /// Label, address and identifier names, without their punctuation
    Name(String),
    Byte(u8),
    /// String characters, unescaped, without the terminating zero
    Bytes(Vec<u8>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    /// Text exactly as written in the source
    pub literal: String,
    pub value: Value,
    pub span: Span,
}

impl Token {
    pub fn name(&self) -> Option<&str> {
        match &self.value {
            Value::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// Test if a character separates tokens.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Split source into one list of tokens per non-empty line.
///
/// Blank and comment-only lines produce nothing.
pub fn lex(src: &str) -> Result<Vec<Vec<Token>>, AsmError> {
    let mut lines = Vec::new();
    let mut base = 0;
    for line in src.split('\n') {
        let mut cur = Cursor::new(line, base);
        let mut toks = Vec::new();
        while let Some((word, span)) = cur.next_word()? {
            toks.push(classify(word, span)?);
        }
        if !toks.is_empty() {
            lines.push(toks);
        }
        base += line.len() + 1;
    }
    debug!(
        "lexed {} tokens over {} lines",
        lines.iter().map(Vec::len).sum::<usize>(),
        lines.len()
    );
    Ok(lines)
}

/// Classify a single word, trying each pattern in priority order.
pub fn classify(word: &str, span: Span) -> Result<Token, AsmError> {
    let token = |kind, value| Token {
        kind,
        literal: word.to_string(),
        value,
        span,
    };
    let invalid = |reason: String| AsmError::InvalidLiteral {
        token: word.to_string(),
        reason,
        span,
    };

    if let Some(caps) = LABEL.captures(word) {
        return Ok(token(TokenKind::Label, Value::Name(caps[1].to_string())));
    }
    if let Some(caps) = ADDRESS.captures(word) {
        return Ok(token(TokenKind::Address, Value::Name(caps[1].to_string())));
    }
    if NUMBER.is_match(word) {
        let val = word.parse::<u8>().map_err(|e| invalid(e.to_string()))?;
        return Ok(token(TokenKind::Number, Value::Byte(val)));
    }
    if let Some(caps) = STRING.captures(word) {
        let bytes = unescape(&caps[1])
            .chars()
            .map(|c| u8::try_from(c).map_err(|_| invalid(format!("`{c}` does not fit in a word"))))
            .collect::<Result<Vec<u8>, AsmError>>()?;
        return Ok(token(TokenKind::Str, Value::Bytes(bytes)));
    }
    if IDENT.is_match(word) {
        return Ok(token(TokenKind::Ident, Value::Name(word.to_string())));
    }
    Err(AsmError::Lex {
        token: word.to_string(),
        span,
    })
}

fn unescape(s: &str) -> Cow<str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            // Trailing backslash; include it as is
            None => result.push('\\'),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Idx;

    fn kinds(src: &str) -> Vec<Vec<TokenKind>> {
        lex(src)
            .unwrap()
            .iter()
            .map(|line| line.iter().map(|tok| tok.kind).collect())
            .collect()
    }

    #[test]
    fn classifies_each_kind() {
        assert_eq!(
            kinds("start: LD [x]\nx: DB 42\nmsg: DB \"hi\"\nOPR clr inc"),
            vec![
                vec![TokenKind::Label, TokenKind::Ident, TokenKind::Address],
                vec![TokenKind::Label, TokenKind::Ident, TokenKind::Number],
                vec![TokenKind::Label, TokenKind::Ident, TokenKind::Str],
                vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Ident],
            ]
        );
    }

    #[test]
    fn drops_blank_and_comment_lines() {
        let lines = lex("\n   \n; only a comment\n  OUT ; trailing\n\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0].literal, "OUT");
    }

    #[test]
    fn decodes_values() {
        let lines = lex("loop: JMP [loop]\nDB 255\nDB \"a\\nb\"").unwrap();
        assert_eq!(lines[0][0].value, Value::Name("loop".into()));
        assert_eq!(lines[0][2].value, Value::Name("loop".into()));
        assert_eq!(lines[1][1].value, Value::Byte(255));
        assert_eq!(lines[2][1].value, Value::Bytes(b"a\nb".to_vec()));
    }

    #[test]
    fn spans_point_into_source() {
        let src = "OUT\n  JMP [end]";
        let lines = lex(src).unwrap();
        let addr = &lines[1][1];
        assert_eq!(addr.span, Span::new(Idx(10), 5));
        assert_eq!(&src[addr.span.as_range()], "[end]");
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(matches!(
            lex("LD [x"),
            Err(AsmError::Lex { token, .. }) if token == "[x"
        ));
        assert!(matches!(lex("a: b: OUT"), Ok(_)));
        assert!(matches!(lex("JMP @here"), Err(AsmError::Lex { .. })));
    }

    #[test]
    fn rejects_out_of_range_literals() {
        assert!(matches!(lex("DB 256"), Err(AsmError::InvalidLiteral { .. })));
        assert!(matches!(lex("DB 12abc"), Err(AsmError::InvalidLiteral { .. })));
        assert!(matches!(lex("DB \"ħ\""), Err(AsmError::InvalidLiteral { .. })));
    }

    #[test]
    fn unescapes_strings() {
        assert_eq!(unescape("plain"), "plain");
        assert_eq!(unescape(r#"\"q\"\t\\"#), "\"q\"\t\\");
        assert_eq!(unescape(r"\x"), r"\x");
    }
}
