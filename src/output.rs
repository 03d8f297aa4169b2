//! Human-oriented rendering of machine state: memory listings, printouts and symbols.
//!
//! Everything renders to a `String`. Colour is used unless minimal output was requested.

use std::cell::RefCell;
use std::fmt::Write;
use std::str::Chars;

use colored::Colorize;

use crate::isa::disassemble;
use crate::system::System;

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Switch minimal output on or off, returning the previous value.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

fn dim(text: &str) -> String {
    if is_minimal() {
        text.to_string()
    } else {
        text.dimmed().to_string()
    }
}

fn bold(text: &str) -> String {
    if is_minimal() {
        text.to_string()
    } else {
        text.bold().to_string()
    }
}

/// One row of a memory listing: index, decimal, binary and disassembly.
pub fn memory_row(index: usize, word: u8) -> String {
    format!(
        "{:>3}  {:>3}  {}  {}",
        index,
        word,
        dim(&format!("{word:08b}")),
        disassemble(word)
    )
}

const MARKER_COLUMN: usize = 32;

/// Full memory of `system`, marking the words under the address register and program counter.
pub fn memory_listing(system: &System) -> String {
    let mut out = String::new();
    if !is_minimal() {
        let _ = writeln!(out, "{}", bold("idx  dec  binary    instruction"));
    }
    let ar = system.ram.ar as usize;
    let pc = system.cpu.pc as usize;
    for (index, &word) in system.ram.data.iter().enumerate() {
        let mut markers = String::new();
        if index == ar {
            markers.push_str(" <AR");
        }
        if index == pc {
            markers.push_str(" <PC");
        }
        let mut row = memory_row(index, word);
        if !markers.is_empty() {
            // Pad by visible width, colour codes included in `row` take no space
            let width = Decolored::new(&row).count();
            row.push_str(&" ".repeat(MARKER_COLUMN.saturating_sub(width)));
            row.push_str(&markers);
        }
        let _ = writeln!(out, "{row}");
    }
    out
}

/// Assembled image without any machine state attached.
pub fn image_listing(words: &[u8]) -> String {
    let mut out = String::new();
    if !is_minimal() {
        let _ = writeln!(out, "{}", bold("idx  dec  binary    instruction"));
    }
    for (index, &word) in words.iter().enumerate() {
        let _ = writeln!(out, "{}", memory_row(index, word));
    }
    out
}

/// Every printed byte as decimal, hex, character and bit pattern.
pub fn printout_table(paper: &[u8]) -> String {
    let mut out = String::new();
    if !is_minimal() {
        let _ = writeln!(out, "{}", bold("  #  dec  hex   chr  bits"));
    }
    for (index, &byte) in paper.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:>3}  0x{:02x}  {}  {}",
            index,
            byte,
            byte,
            char_display(byte),
            bit_pattern(byte)
        );
    }
    out
}

/// Printout as text, one character per byte.
pub fn printout_text(paper: &[u8]) -> String {
    paper.iter().map(|&byte| byte as char).collect()
}

/// Label table, in definition order.
pub fn symbol_table(symbols: &[(String, u8)]) -> String {
    let width = symbols
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (name, addr) in symbols {
        let _ = writeln!(out, "{}  {:>2}", bold(&format!("{name:<width$}")), addr);
    }
    out
}

fn bit_pattern(byte: u8) -> String {
    if is_minimal() {
        return format!("{byte:08b}");
    }
    (0..8)
        .rev()
        .map(|bit| if byte >> bit & 1 == 1 { '█' } else { '·' })
        .collect()
}

/// Three column wide rendering of a byte as a character.
fn char_display(byte: u8) -> String {
    match byte {
        // ASCII control characters which are arbitrarily considered significant
        0x00 => "NUL".into(),
        0x08 => "BS ".into(),
        0x09 => "HT ".into(),
        0x0a => "LF ".into(),
        0x0d => "CR ".into(),
        0x1b => "ESC".into(),
        0x7f => "DEL".into(),

        0x20 => "[_]".into(),
        0x21..=0x7e => format!("{:<3}", byte as char),

        0x00..=0x7f => dim("───"),
        0x80.. => dim("┄┄┄"),
    }
}

/// Characters of a string with ANSI colour sequences removed.
pub struct Decolored<'a> {
    chars: Chars<'a>,
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble_source;

    fn plain(text: &str) -> String {
        Decolored::new(text).collect()
    }

    #[test]
    fn decolored() {
        assert_eq!(plain("abcdef"), "abcdef");
        assert_eq!(plain("abc\x1b[0;2mdef\x1b[0m"), "abcdef");
        assert_eq!(plain("abc\x1b[0xyz"), "abc");
    }

    #[test]
    fn row() {
        assert_eq!(plain(&memory_row(3, 0b001_00101)), "  3   37  00100101  LD 5");
        assert_eq!(plain(&memory_row(0, 0)), "  0    0  00000000  OPR");
    }

    #[test]
    fn listing_marks_registers() {
        set_minimal(true);
        let image = assemble_source("LD [x]\nOUT\nx: DB 9").unwrap();
        let system = System::load(&image).unwrap().ticks().nth(2).unwrap();
        let listing = memory_listing(&system);
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 32);
        // Executing LD 2: the address register points at x, the program counter past LD
        assert!(lines[1].contains("OUT"));
        assert!(lines[1].ends_with(" <PC"));
        assert!(lines[2].ends_with("<AR"));
        assert!(!lines[0].contains('<'));
        set_minimal(false);
    }

    #[test]
    fn same_register_twice() {
        set_minimal(true);
        let listing = memory_listing(&System::new());
        assert!(listing.lines().next().unwrap().ends_with("<AR <PC"));
        set_minimal(false);
    }

    #[test]
    fn printout() {
        set_minimal(true);
        assert_eq!(
            printout_table(b"A \n"),
            "  0   65  0x41  A    01000001\n  1   32  0x20  [_]  00100000\n  2   10  0x0a  LF   00001010\n"
        );
        set_minimal(false);
        assert!(plain(&printout_table(&[1])).contains("·······█"));
    }

    #[test]
    fn text() {
        assert_eq!(printout_text(b"Hi!"), "Hi!");
        assert_eq!(printout_text(&[]), "");
    }

    #[test]
    fn symbols() {
        let table = symbol_table(&[("loop".into(), 0), ("x".into(), 12)]);
        assert_eq!(plain(&table), "loop   0\nx     12\n");
    }
}
