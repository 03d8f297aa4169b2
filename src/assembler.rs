use log::debug;

use crate::air::Linked;
use crate::compiler::compile;
use crate::error::AsmError;
use crate::linker::backpatch;
use crate::parser::parse_source;

/// Result of assembling a source file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Assembly {
    /// Memory image, starting at address 0
    pub words: Vec<u8>,
    /// Labels in definition order with their addresses
    pub symbols: Vec<(String, u8)>,
    pub stmts: Vec<Linked>,
}

/// Run the whole pipeline: lex, parse, compile, link and encode.
pub fn assemble(src: &str) -> Result<Assembly, AsmError> {
    let air = compile(parse_source(src)?)?;
    let stmts = backpatch(&air)?;
    let words: Vec<u8> = stmts.iter().flat_map(Linked::emit).collect();
    let symbols = air
        .symbols()
        .map(|(name, addr)| (name.to_string(), addr as u8))
        .collect();
    debug!("assembled {} words", words.len());
    Ok(Assembly {
        words,
        symbols,
        stmts,
    })
}

/// Assemble source text into a memory image.
pub fn assemble_source(src: &str) -> Result<Vec<u8>, AsmError> {
    assemble(src).map(|asm| asm.words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_data() {
        assert_eq!(
            assemble_source("LD [x]\nx: DB 42").unwrap(),
            vec![0b001_00001, 42]
        );
    }

    #[test]
    fn every_opcode() {
        let src = r#"
        start:  LD  [a]     ; 0
                ST  [b]     ; 1
                ADD [a]     ; 2
                AND [b]     ; 3
                JZ  [start] ; 4
                OUT         ; 5
                OPR clr inc ; 6
                CLR         ; 7
                NOT
                INC
                ROL
                ROR
        end:    JMP [end]   ; 12
        a:      DB  5       ; 13
        b:      DB  [end]   ; 14
        "#;
        assert_eq!(
            assemble_source(src).unwrap(),
            vec![
                0b001_01101,
                0b010_01110,
                0b011_01101,
                0b100_01110,
                0b110_00000,
                0b111_00000,
                0b000_00101,
                0b000_00001,
                0b000_00010,
                0b000_00100,
                0b000_01000,
                0b000_10000,
                0b101_01100,
                5,
                12,
            ]
        );
    }

    #[test]
    fn strings_are_zero_terminated() {
        assert_eq!(
            assemble_source("OUT\nDB \"Hi\"\nDB 1").unwrap(),
            vec![0b111_00000, b'H', b'i', 0, 1]
        );
    }

    #[test]
    fn symbols_are_reported() {
        let asm = assemble("a: OUT\nb: DB \"xy\"\nc: DB 0").unwrap();
        assert_eq!(
            asm.symbols,
            vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 4)]
        );
    }

    #[test]
    fn deterministic() {
        let src = "loop: LD [n]\nINC\nST [n]\nJMP [loop]\nn: DB 0";
        assert_eq!(assemble_source(src), assemble_source(src));
    }

    #[test]
    fn failures_produce_no_output() {
        assert!(matches!(
            assemble_source("loop: OUT\nloop: OUT"),
            Err(AsmError::DuplicateLabel { .. })
        ));
        assert!(matches!(
            assemble_source("JMP [missing]"),
            Err(AsmError::UnresolvedReference { .. })
        ));
        assert!(matches!(
            assemble_source("LD [x"),
            Err(AsmError::Lex { .. })
        ));
        assert!(matches!(
            assemble_source("[x] LD"),
            Err(AsmError::Parse { .. })
        ));
    }

    #[test]
    fn empty_source() {
        assert_eq!(assemble_source("; nothing\n\n").unwrap(), Vec::<u8>::new());
    }
}
