use std::fmt;

use crate::isa::{unpack, Opcode, Operator, OPERAND_MASK};
use crate::system::bus::{Device, Line, Signal};

/// Every phase the CPU can be in.
///
/// Memory replies arrive one tick after a request, so instructions that read memory take two
/// phases.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Phase {
    #[default]
    Reset,
    Fetch,
    Fetch2,
    Opr,
    Ld,
    Ld2,
    St,
    Add,
    Add2,
    And,
    And2,
    Jmp,
    Jz,
    Out,
    /// Terminal until reset
    Halt,
}

impl From<Opcode> for Phase {
    fn from(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Opr => Phase::Opr,
            Opcode::Ld => Phase::Ld,
            Opcode::St => Phase::St,
            Opcode::Add => Phase::Add,
            Opcode::And => Phase::And,
            Opcode::Jmp => Phase::Jmp,
            Opcode::Jz => Phase::Jz,
            Opcode::Out => Phase::Out,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Reset => "RESET",
            Phase::Fetch => "FETCH",
            Phase::Fetch2 => "FETCH2",
            Phase::Opr => "OPR",
            Phase::Ld => "LD",
            Phase::Ld2 => "LD2",
            Phase::St => "ST",
            Phase::Add => "ADD",
            Phase::Add2 => "ADD2",
            Phase::And => "AND",
            Phase::And2 => "AND2",
            Phase::Jmp => "JMP",
            Phase::Jz => "JZ",
            Phase::Out => "OUT",
            Phase::Halt => "HALT",
        })
    }
}

/// Complete CPU state. Every cycle produces a new value; nothing is mutated in place.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cpu {
    /// Phase executed on the last cycle
    pub phase: Phase,
    /// Phase to execute on the next cycle
    pub next: Phase,
    /// Reset flag
    pub rst: bool,
    /// Read request flag
    pub read: bool,
    /// Write request flag
    pub write: bool,
    /// Accumulator
    pub a: u8,
    /// Data register
    pub dr: u8,
    /// Instruction register, 3 bits
    pub ir: u8,
    /// Address register, 5 bits
    pub ar: u8,
    /// Last load address register, 5 bits
    pub lr: u8,
    /// Program counter, 5 bits
    pub pc: u8,
    /// Value pushed to the output device this cycle
    pub output: Option<u8>,
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            phase: Phase::Reset,
            next: Phase::Fetch,
            rst: false,
            read: false,
            write: false,
            a: 0,
            dr: 0,
            ir: 0,
            ar: 0,
            lr: 0,
            pc: 0,
            output: None,
        }
    }

    /// Execute one phase. A raised reset flag takes priority over the pending phase.
    pub fn cycle(&self) -> Cpu {
        let phase = if self.rst { Phase::Reset } else { self.next };
        let next = match phase {
            Phase::Reset => Cpu::new(),
            Phase::Fetch => self.fetch(),
            Phase::Fetch2 => self.fetch2(),
            Phase::Opr => self.opr(),
            Phase::Ld => self.ld(),
            Phase::Ld2 => self.ld2(),
            Phase::St => self.st(),
            Phase::Add => self.add(),
            Phase::Add2 => self.add2(),
            Phase::And => self.and(),
            Phase::And2 => self.and2(),
            Phase::Jmp => self.jmp(),
            Phase::Jz => self.jz(),
            Phase::Out => self.out(),
            Phase::Halt => self.halt(),
        };
        Cpu { phase, ..next }
    }

    /// Address of the instruction being executed. The program counter is already past it.
    fn current_addr(&self) -> u8 {
        self.pc.wrapping_sub(1) & OPERAND_MASK
    }

    fn halt(&self) -> Cpu {
        Cpu {
            next: Phase::Halt,
            ..*self
        }
    }

    /// Point the address register at the program counter and wait for memory.
    fn fetch(&self) -> Cpu {
        Cpu {
            ar: self.pc,
            read: true,
            write: false,
            output: None,
            next: Phase::Fetch2,
            ..*self
        }
    }

    /// Decode the word that arrived from memory and dispatch on its opcode.
    fn fetch2(&self) -> Cpu {
        let (opcode, operand) = unpack(self.dr);
        Cpu {
            ir: opcode.code(),
            ar: operand,
            read: false,
            pc: self.pc.wrapping_add(1) & OPERAND_MASK,
            next: opcode.into(),
            ..*self
        }
    }

    /// Load memory into the accumulator. Address zero loads from the address in the
    /// accumulator instead. The operand as written is kept in the last load register.
    fn ld(&self) -> Cpu {
        let ar = if self.ar == 0 {
            self.a & OPERAND_MASK
        } else {
            self.ar
        };
        Cpu {
            ar,
            lr: self.ar,
            read: true,
            next: Phase::Ld2,
            ..*self
        }
    }

    fn ld2(&self) -> Cpu {
        Cpu {
            a: self.dr,
            read: false,
            next: Phase::Fetch,
            ..*self
        }
    }

    /// Store the accumulator into memory. Address zero stores to the last loaded address.
    fn st(&self) -> Cpu {
        let ar = if self.ar == 0 { self.lr } else { self.ar };
        Cpu {
            ar,
            dr: self.a,
            write: true,
            next: Phase::Fetch,
            ..*self
        }
    }

    fn add(&self) -> Cpu {
        Cpu {
            read: true,
            next: Phase::Add2,
            ..*self
        }
    }

    fn add2(&self) -> Cpu {
        Cpu {
            a: self.a.wrapping_add(self.dr),
            read: false,
            next: Phase::Fetch,
            ..*self
        }
    }

    fn and(&self) -> Cpu {
        Cpu {
            read: true,
            next: Phase::And2,
            ..*self
        }
    }

    fn and2(&self) -> Cpu {
        Cpu {
            a: self.a & self.dr,
            read: false,
            next: Phase::Fetch,
            ..*self
        }
    }

    /// Jump to `target`, halting instead when it is the jump itself.
    fn jump_to(&self, target: u8) -> Cpu {
        let target = target & OPERAND_MASK;
        let next = if target == self.current_addr() {
            Phase::Halt
        } else {
            Phase::Fetch
        };
        Cpu {
            pc: target,
            next,
            ..*self
        }
    }

    fn jmp(&self) -> Cpu {
        self.jump_to(self.ar)
    }

    fn jz(&self) -> Cpu {
        if self.a == 0 {
            self.jump_to(self.ar)
        } else {
            self.jump_to(self.pc)
        }
    }

    fn out(&self) -> Cpu {
        Cpu {
            output: Some(self.a),
            next: Phase::Fetch,
            ..*self
        }
    }

    /// Run every operator flagged in the address register, lowest bit first.
    fn opr(&self) -> Cpu {
        let a = Operator::decode(self.ar).fold(self.a, |a, op| op.apply(a));
        Cpu {
            a,
            next: Phase::Fetch,
            ..*self
        }
    }
}

impl Device for Cpu {
    fn cycle(&self) -> Self {
        Cpu::cycle(self)
    }

    fn line(&self, line: Line) -> Option<Signal> {
        Some(match line {
            Line::Reset => Signal::Flag(self.rst),
            Line::Read => Signal::Flag(self.read),
            Line::Write => Signal::Flag(self.write),
            Line::Address => Signal::Word(self.ar),
            Line::Data => Signal::Word(self.dr),
            Line::Output => Signal::Flag(self.output.is_some()),
            Line::OutputRegister => Signal::Word(self.output.unwrap_or(0)),
        })
    }

    fn accept(&mut self, line: Line, signal: Signal) {
        match line {
            Line::Reset => self.rst = signal.flag(),
            Line::Data => self.dr = signal.word(),
            _ => {}
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU {}->{} RST:{} READ:{} WRITE:{} A:{} AR:{} DR:{} IR:{} LR:{} PC:{}",
            self.phase,
            self.next,
            on_off(self.rst),
            on_off(self.read),
            on_off(self.write),
            self.a,
            self.ar,
            self.dr,
            self.ir,
            self.lr,
            self.pc,
        )?;
        if let Some(out) = self.output {
            write!(f, " OUT:{out}")?;
        }
        Ok(())
    }
}
