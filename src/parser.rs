use log::debug;

use crate::error::AsmError;
use crate::lexer::{lex, Token, TokenKind};
use crate::span::{Idx, Span};

/// Name bound to the address of the statement it prefixes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name: String,
    pub span: Span,
}

/// One source line: `[label:] MNEMONIC [operands...]`.
///
/// Operands are kept verbatim; their types are only checked by the compiler.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Stmt {
    pub label: Option<Label>,
    /// Uppercased mnemonic
    pub mnemonic: String,
    /// Location of the mnemonic as written
    pub span: Span,
    pub operands: Vec<Token>,
}

/// Group each line of tokens into a statement, preserving line order.
pub fn parse(lines: Vec<Vec<Token>>) -> Result<Vec<Stmt>, AsmError> {
    let stmts = lines
        .into_iter()
        .map(parse_line)
        .collect::<Result<Vec<_>, _>>()?;
    debug!("parsed {} statements", stmts.len());
    Ok(stmts)
}

/// Lex and parse in one step.
pub fn parse_source(src: &str) -> Result<Vec<Stmt>, AsmError> {
    parse(lex(src)?)
}

fn parse_line(line: Vec<Token>) -> Result<Stmt, AsmError> {
    let mut toks = line.into_iter().peekable();

    // Labels can only occur in first position
    let label = match toks.next_if(|tok| tok.kind == TokenKind::Label) {
        Some(tok) => Some(Label {
            name: tok.name().unwrap_or_default().to_string(),
            span: tok.span,
        }),
        None => None,
    };

    let mnemonic = match toks.next() {
        Some(tok) if tok.kind == TokenKind::Ident => tok,
        Some(tok) => {
            return Err(AsmError::Parse {
                found: tok.literal,
                span: tok.span,
            })
        }
        None => {
            // Only reachable after a lone label
            let end = label.as_ref().map(|l| l.span.end()).unwrap_or_default();
            return Err(AsmError::Parse {
                found: "end of line".to_string(),
                span: Span::new(Idx(end), 0),
            });
        }
    };

    Ok(Stmt {
        label,
        mnemonic: mnemonic.literal.to_uppercase(),
        span: mnemonic.span,
        operands: toks.collect(),
    })
}
