use std::fmt;

use crate::isa::{MEMORY_WORDS, OPERAND_MASK};
use crate::system::bus::{Device, Line, Signal};

/// Single-ported block of random-access memory.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Ram {
    /// Reset flag
    pub rst: bool,
    /// Read request flag
    pub read: bool,
    /// Write request flag
    pub write: bool,
    /// Memory locations
    pub data: [u8; MEMORY_WORDS],
    /// Address register
    pub ar: u8,
    /// Data register
    pub dr: u8,
}

impl Default for Ram {
    fn default() -> Self {
        Ram::new()
    }
}

impl Ram {
    pub fn new() -> Self {
        Ram {
            rst: false,
            read: false,
            write: false,
            data: [0; MEMORY_WORDS],
            ar: 0,
            dr: 0,
        }
    }

    /// Size of memory in words.
    pub const fn size(&self) -> usize {
        MEMORY_WORDS
    }

    /// Honor at most one request, checking reset, read and write in that order.
    pub fn cycle(&self) -> Ram {
        if self.rst {
            Ram::new()
        } else if self.read {
            self.read_word()
        } else if self.write {
            self.write_word()
        } else {
            *self
        }
    }

    fn index(&self) -> usize {
        (self.ar & OPERAND_MASK) as usize
    }

    /// Produce the word at the address register on the data register.
    fn read_word(&self) -> Ram {
        Ram {
            dr: self.data[self.index()],
            ..*self
        }
    }

    /// Store the data register at the address register.
    fn write_word(&self) -> Ram {
        let mut data = self.data;
        data[self.index()] = self.dr;
        Ram { data, ..*self }
    }
}

impl Device for Ram {
    fn cycle(&self) -> Self {
        Ram::cycle(self)
    }

    fn line(&self, line: Line) -> Option<Signal> {
        match line {
            Line::Reset => Some(Signal::Flag(self.rst)),
            Line::Read => Some(Signal::Flag(self.read)),
            Line::Write => Some(Signal::Flag(self.write)),
            Line::Address => Some(Signal::Word(self.ar)),
            Line::Data => Some(Signal::Word(self.dr)),
            Line::Output | Line::OutputRegister => None,
        }
    }

    fn accept(&mut self, line: Line, signal: Signal) {
        match line {
            Line::Reset => self.rst = signal.flag(),
            Line::Read => self.read = signal.flag(),
            Line::Write => self.write = signal.flag(),
            Line::Address => self.ar = signal.word() & OPERAND_MASK,
            Line::Data => self.dr = signal.word(),
            Line::Output | Line::OutputRegister => {}
        }
    }
}

impl fmt::Display for Ram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |flag| if flag { "on" } else { "off" };
        write!(
            f,
            "RAM RST:{} READ:{} WRITE:{} AR:{} DR:{}",
            on_off(self.rst),
            on_off(self.read),
            on_off(self.write),
            self.ar,
            self.dr,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_data() -> Ram {
        let mut ram = Ram::new();
        for (i, word) in ram.data.iter_mut().enumerate() {
            *word = i as u8 * 2;
        }
        ram
    }

    #[test]
    fn starts_zeroed() {
        let ram = Ram::new();
        assert_eq!(ram.size(), 32);
        assert!(ram.data.iter().all(|&w| w == 0));
    }

    #[test]
    fn read_produces_word() {
        let ram = Ram {
            read: true,
            ar: 5,
            ..with_data()
        };
        let next = ram.cycle();
        assert_eq!(next.dr, 10);
        assert_eq!(next.data, ram.data);
    }

    #[test]
    fn write_stores_word() {
        let ram = Ram {
            write: true,
            ar: 3,
            dr: 77,
            ..Ram::new()
        };
        let next = ram.cycle();
        assert_eq!(next.data[3], 77);
        // Snapshot taken before the cycle is untouched
        assert_eq!(ram.data[3], 0);
    }

    #[test]
    fn read_wins_over_write() {
        let ram = Ram {
            read: true,
            write: true,
            ar: 1,
            dr: 99,
            ..with_data()
        };
        let next = ram.cycle();
        assert_eq!(next.dr, 2);
        assert_eq!(next.data[1], 2);
    }

    #[test]
    fn reset_clears() {
        let ram = Ram {
            rst: true,
            read: true,
            ..with_data()
        };
        assert_eq!(ram.cycle(), Ram::new());
    }

    #[test]
    fn idle_is_noop() {
        let ram = with_data();
        assert_eq!(ram.cycle(), ram);
    }

    #[test]
    fn address_line_is_masked() {
        let mut ram = Ram::new();
        ram.accept(Line::Address, Signal::Word(0b1110_0001));
        assert_eq!(ram.ar, 1);
    }

    #[test]
    fn display() {
        let ram = Ram {
            read: true,
            ar: 4,
            dr: 8,
            ..Ram::new()
        };
        assert_eq!(ram.to_string(), "RAM RST:off READ:on WRITE:off AR:4 DR:8");
    }
}
