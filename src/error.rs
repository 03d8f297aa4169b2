use miette::Diagnostic;
use thiserror::Error;

use crate::isa::KindSet;
use crate::lexer::TokenKind;
use crate::span::Span;

/// Every way a source file can fail to assemble.
///
/// Errors are reported at the first failure; no stage returns partial output.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
pub enum AsmError {
    // Lexer errors
    #[error("Encountered an unknown token `{token}`")]
    #[diagnostic(
        code(lex::unknown),
        help("operands are `[label]` addresses, decimal numbers, \"strings\" or names")
    )]
    Lex {
        token: String,
        #[label("unknown token")]
        span: Span,
    },

    #[error("Encountered an invalid literal `{token}`: {reason}")]
    #[diagnostic(code(lex::bad_lit), help("every value must fit in a single 8-bit word"))]
    InvalidLiteral {
        token: String,
        reason: String,
        #[label("incorrect literal")]
        span: Span,
    },

    #[error("Encountered an unterminated string literal")]
    #[diagnostic(
        code(lex::str_lit),
        help("make sure to close string literals with a \" character")
    )]
    UnterminatedString {
        #[label("incorrect literal")]
        span: Span,
    },

    // Parser errors
    #[error("Expected instruction, found `{found}`")]
    #[diagnostic(
        code(parse::expected_instruction),
        help("lines should start with an optional `label:` followed by an instruction")
    )]
    Parse {
        found: String,
        #[label("expected instruction")]
        span: Span,
    },

    // Compiler errors
    #[error("Unknown instruction `{mnemonic}`")]
    #[diagnostic(
        code(compile::unknown_instruction),
        help("available instructions are OPR CLR NOT INC ROL ROR LD ST ADD AND JMP JZ OUT DB")
    )]
    UnknownInstruction {
        mnemonic: String,
        #[label("unknown instruction")]
        span: Span,
    },

    #[error("Unknown operator `{name}`")]
    #[diagnostic(
        code(compile::unknown_operator),
        help("OPR combines any of CLR NOT INC ROL ROR")
    )]
    UnknownOperator {
        name: String,
        #[label("unknown operator")]
        span: Span,
    },

    #[error("Duplicate label `{label}`")]
    #[diagnostic(
        code(compile::duplicate_label),
        help("labels may only be defined once per program")
    )]
    DuplicateLabel {
        label: String,
        #[label("duplicate label")]
        span: Span,
        #[label("first defined here")]
        first: Span,
    },

    #[error("Instruction `{mnemonic}` expected {expected} operands, found {found}")]
    #[diagnostic(code(compile::arity), help("check the number of operands for this instruction"))]
    ArityMismatch {
        mnemonic: String,
        expected: String,
        found: usize,
        #[label("wrong number of operands")]
        span: Span,
    },

    #[error(
        "Instruction `{mnemonic}` expected operand {index} to be of type {expected}, found {found}"
    )]
    #[diagnostic(
        code(compile::operand_type),
        help("check the type of operands allowed for this instruction")
    )]
    OperandTypeMismatch {
        mnemonic: String,
        index: usize,
        expected: KindSet,
        found: TokenKind,
        #[label("unexpected operand")]
        span: Span,
    },

    // Linker errors
    #[error("Unknown reference `{label}`")]
    #[diagnostic(
        code(link::unresolved),
        help("define the label with `{label}:` in front of an instruction")
    )]
    UnresolvedReference {
        label: String,
        #[label("undefined label")]
        span: Span,
    },

    #[error("Program is {size} words long but memory only holds {capacity}")]
    #[diagnostic(code(assemble::too_large), help("shorten the program or its data"))]
    ProgramTooLarge { size: usize, capacity: usize },
}

/// Failure to place a byte image into a fresh machine.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
pub enum LoadError {
    #[error("Image is {size} words long but memory only holds {capacity}")]
    #[diagnostic(code(load::too_large))]
    TooLarge { size: usize, capacity: usize },
}
