use log::debug;

use crate::air::{Air, AirStmt, Operand};
use crate::error::AsmError;
use crate::isa::{self, MEMORY_WORDS};
use crate::lexer::{Token, TokenKind, Value};
use crate::parser::Stmt;

/// First pass: validate every statement and assign it an address.
///
/// Rejects unknown mnemonics, duplicate labels and operands that do not match the
/// instruction's signature, and fails if the program cannot fit in memory.
pub fn compile(stmts: Vec<Stmt>) -> Result<Air, AsmError> {
    let mut air = Air::new();
    let mut addr = 0;

    for stmt in stmts {
        let Stmt {
            label,
            mnemonic,
            span,
            operands,
        } = stmt;

        let desc = isa::lookup(&mnemonic).ok_or_else(|| AsmError::UnknownInstruction {
            mnemonic: mnemonic.clone(),
            span,
        })?;

        if let Some(label) = &label {
            if let Err(first) = air.define(&label.name) {
                let first = air
                    .get(first)
                    .label
                    .as_ref()
                    .map(|l| l.span)
                    .unwrap_or(label.span);
                return Err(AsmError::DuplicateLabel {
                    label: label.name.clone(),
                    span: label.span,
                    first,
                });
            }
        }

        // There are no optional operands, so the count alone decides the arity
        if !desc.signature.accepts_count(operands.len()) {
            let span = operands.last().map(|tok| tok.span).unwrap_or(span);
            return Err(AsmError::ArityMismatch {
                mnemonic,
                expected: desc.signature.arity(),
                found: operands.len(),
                span,
            });
        }

        let count = operands.len();
        let operands = operands
            .into_iter()
            .enumerate()
            .map(|(idx, tok)| {
                let Some(kinds) = desc.signature.kinds_at(idx) else {
                    return Err(AsmError::ArityMismatch {
                        mnemonic: mnemonic.clone(),
                        expected: desc.signature.arity(),
                        found: count,
                        span: tok.span,
                    });
                };
                if !kinds.contains(tok.kind) {
                    return Err(AsmError::OperandTypeMismatch {
                        mnemonic: mnemonic.clone(),
                        index: idx,
                        expected: kinds,
                        found: tok.kind,
                        span: tok.span,
                    });
                }
                to_operand(tok)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let size = (desc.size)(&operands);
        air.add_stmt(AirStmt {
            label,
            desc,
            operands,
            addr,
            size,
            span,
        });
        addr += size;
    }

    if addr > MEMORY_WORDS {
        return Err(AsmError::ProgramTooLarge {
            size: addr,
            capacity: MEMORY_WORDS,
        });
    }
    debug!("compiled {} statements into {} words", air.len(), addr);
    Ok(air)
}

/// Convert a type-checked token into an operand.
fn to_operand(tok: Token) -> Result<Operand, AsmError> {
    match tok.value {
        Value::Byte(val) => Ok(Operand::Byte(val)),
        Value::Bytes(bytes) => Ok(Operand::Bytes(bytes)),
        Value::Name(name) => match tok.kind {
            TokenKind::Address => Ok(Operand::Ref {
                label: name,
                span: tok.span,
            }),
            // Bare names are only accepted as operators
            _ => isa::Operator::from_name(&name)
                .map(Operand::Operator)
                .ok_or(AsmError::UnknownOperator {
                    name,
                    span: tok.span,
                }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Operator;
    use crate::parser::parse_source;

    fn compile_src(src: &str) -> Result<Air, AsmError> {
        compile(parse_source(src).unwrap())
    }

    #[test]
    fn assigns_addresses() {
        let air = compile_src("LD [x]\nmsg: DB \"abc\"\nx: DB 42\nOUT").unwrap();
        let addrs: Vec<_> = air.iter().map(|s| (s.addr, s.size)).collect();
        assert_eq!(addrs, vec![(0, 1), (1, 4), (5, 1), (6, 1)]);
        assert_eq!(air.size(), 7);
        let symbols: Vec<_> = air.symbols().collect();
        assert_eq!(symbols, vec![("msg", 1), ("x", 5)]);
    }

    #[test]
    fn mnemonics_ignore_case() {
        let air = compile_src("ld [x]\nx: db 1").unwrap();
        assert_eq!(air.get(0).desc.mnemonic, "LD");
        assert_eq!(air.get(1).desc.mnemonic, "DB");
    }

    #[test]
    fn converts_operands() {
        let air = compile_src("OPR clr Inc\nJMP [end]\nend: DB 7").unwrap();
        assert_eq!(
            air.get(0).operands,
            vec![
                Operand::Operator(Operator::Clr),
                Operand::Operator(Operator::Inc)
            ]
        );
        assert!(matches!(
            &air.get(1).operands[0],
            Operand::Ref { label, .. } if label == "end"
        ));
        assert_eq!(air.get(2).operands, vec![Operand::Byte(7)]);
    }

    #[test]
    fn unknown_instruction() {
        assert!(matches!(
            compile_src("HLT"),
            Err(AsmError::UnknownInstruction { mnemonic, .. }) if mnemonic == "HLT"
        ));
    }

    #[test]
    fn duplicate_label() {
        let err = compile_src("loop: OUT\nloop: JMP [loop]").unwrap_err();
        match err {
            AsmError::DuplicateLabel { label, span, first } => {
                assert_eq!(label, "loop");
                assert_eq!(first.offs(), 0);
                assert_eq!(span.offs(), 10);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn arity_mismatch() {
        assert!(matches!(
            compile_src("OUT 1"),
            Err(AsmError::ArityMismatch { expected, found: 1, .. }) if expected == "0"
        ));
        assert!(matches!(
            compile_src("LD"),
            Err(AsmError::ArityMismatch { found: 0, .. })
        ));
        assert!(matches!(
            compile_src("OPR clr not inc rol ror clr"),
            Err(AsmError::ArityMismatch { expected, .. }) if expected == "1 to 5"
        ));
    }

    #[test]
    fn operand_type_mismatch() {
        assert!(matches!(
            compile_src("LD 3"),
            Err(AsmError::OperandTypeMismatch { index: 0, found: TokenKind::Number, .. })
        ));
        assert!(matches!(
            compile_src("DB name"),
            Err(AsmError::OperandTypeMismatch { found: TokenKind::Ident, .. })
        ));
        assert!(matches!(
            compile_src("OPR [x]"),
            Err(AsmError::OperandTypeMismatch { found: TokenKind::Address, .. })
        ));
    }

    #[test]
    fn unknown_operator() {
        assert!(matches!(
            compile_src("OPR clr nop"),
            Err(AsmError::UnknownOperator { name, .. }) if name == "nop"
        ));
    }

    #[test]
    fn program_too_large() {
        let src = "DB 0\n".repeat(30) + "DB \"abc\"";
        assert!(matches!(
            compile_src(&src),
            Err(AsmError::ProgramTooLarge { size: 34, capacity: 32 })
        ));
        let src = "DB 0\n".repeat(32);
        assert!(compile_src(&src).is_ok());
    }
}
