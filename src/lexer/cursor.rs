// Loosely based on `rustc_lexer`'s cursor, reduced to the line-oriented needs of Chip3 source.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use crate::error::AsmError;
use crate::span::{Idx, Span};

use super::is_whitespace;

/// Peekable iterator over the characters of a single source line.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// Line being split
    line: &'a str,
    /// Offset of the line inside the whole source
    base: usize,
    /// Byte index into `line`
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str, base: usize) -> Cursor<'a> {
        Cursor { line, base, pos: 0 }
    }

    /// Peek the next character without consuming it.
    pub fn first(&self) -> Option<char> {
        self.line[self.pos..].chars().next()
    }

    /// Consume one character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.first()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.first() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(Idx(self.base + start), self.pos - start)
    }

    /// Return the next whitespace-separated word of the line along with its span.
    ///
    /// A comment ends the line. Quoted strings are kept whole, spaces included.
    pub fn next_word(&mut self) -> Result<Option<(&'a str, Span)>, AsmError> {
        self.eat_while(is_whitespace);
        let start = self.pos;
        match self.first() {
            None | Some(';') => return Ok(None),
            Some('"') => {
                self.bump();
                loop {
                    match self.bump() {
                        None => {
                            return Err(AsmError::UnterminatedString {
                                span: self.span_from(start),
                            })
                        }
                        Some('\\') => {
                            self.bump();
                        }
                        Some('"') => break,
                        Some(_) => {}
                    }
                }
                // Anything glued to the closing quote stays part of the word and fails to classify
                self.eat_while(|c| !is_whitespace(c) && c != ';');
            }
            Some(_) => self.eat_while(|c| !is_whitespace(c) && c != ';'),
        }
        Ok(Some((&self.line[start..self.pos], self.span_from(start))))
    }
}
