//! Chip3 instruction set.
//!
//! Every instruction is one 8-bit word: the top 3 bits select the opcode class and the bottom
//! 5 bits carry either an address or a set of operator flags.
//!
//! | Opcode | Mnemonic | Operand  | Function                            |
//! |--------|----------|----------|-------------------------------------|
//! | 000    | OPR      | operator | Operate on accumulator              |
//! | 001    | LD       | address  | Load memory into accumulator        |
//! | 010    | ST       | address  | Store accumulator into memory       |
//! | 011    | ADD      | address  | Add memory location to accumulator  |
//! | 100    | AND      | address  | Bitwise AND memory with accumulator |
//! | 101    | JMP      | address  | Unconditional jump                  |
//! | 110    | JZ       | address  | Jump if accumulator is zero         |
//! | 111    | OUT      |          | Output accumulator                  |

use std::fmt;

use crate::air::{Operand, Resolved};
use crate::lexer::TokenKind;

pub const OPCODE_MASK: u8 = 0b111;
pub const OPERAND_MASK: u8 = 0b11111;
/// Words addressable by a 5-bit operand.
pub const MEMORY_WORDS: usize = 1 << 5;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    Opr = 0b000,
    Ld = 0b001,
    St = 0b010,
    Add = 0b011,
    And = 0b100,
    Jmp = 0b101,
    Jz = 0b110,
    Out = 0b111,
}

impl Opcode {
    /// Indexed by code.
    pub const ALL: [Opcode; 8] = [
        Opcode::Opr,
        Opcode::Ld,
        Opcode::St,
        Opcode::Add,
        Opcode::And,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Out,
    ];

    /// Opcode for the lowest 3 bits of `bits`. Every value maps to an opcode.
    pub fn from_bits(bits: u8) -> Opcode {
        Self::ALL[(bits & OPCODE_MASK) as usize]
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Opr => "OPR",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Add => "ADD",
            Opcode::And => "AND",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Out => "OUT",
        }
    }
}

/// Operations on the accumulator selected by the flag bits of an `OPR` word.
///
/// When several flags are set they all run in the same cycle, lowest bit first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    /// Clear accumulator
    Clr = 0b00001,
    /// One's complement accumulator
    Not = 0b00010,
    /// Increment accumulator
    Inc = 0b00100,
    /// Shift accumulator left, dropping the high bit
    Rol = 0b01000,
    /// Shift accumulator right, dropping the low bit
    Ror = 0b10000,
}

impl Operator {
    /// In execution order.
    pub const ALL: [Operator; 5] = [
        Operator::Clr,
        Operator::Not,
        Operator::Inc,
        Operator::Rol,
        Operator::Ror,
    ];

    pub fn flag(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Operator::Clr => "CLR",
            Operator::Not => "NOT",
            Operator::Inc => "INC",
            Operator::Rol => "ROL",
            Operator::Ror => "ROR",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Operators whose flag is set in `flags`, in execution order.
    pub fn decode(flags: u8) -> impl Iterator<Item = Operator> {
        Self::ALL
            .into_iter()
            .filter(move |op| flags & op.flag() != 0)
    }

    pub fn apply(self, a: u8) -> u8 {
        match self {
            Operator::Clr => 0,
            Operator::Not => !a,
            Operator::Inc => a.wrapping_add(1),
            Operator::Rol => a << 1,
            Operator::Ror => a >> 1,
        }
    }
}

/// Pack an opcode and operand into a single word.
pub fn pack(opcode: Opcode, operand: u8) -> u8 {
    (opcode.code() & OPCODE_MASK) << 5 | (operand & OPERAND_MASK)
}

/// Split a word into opcode and operand.
pub fn unpack(word: u8) -> (Opcode, u8) {
    (Opcode::from_bits(word >> 5), word & OPERAND_MASK)
}

/// Render a memory word as the instruction it would execute as.
pub fn disassemble(word: u8) -> String {
    let (opcode, operand) = unpack(word);
    match opcode {
        Opcode::Opr => Operator::decode(operand).fold("OPR".to_string(), |mut s, op| {
            s.push(' ');
            s.push_str(op.mnemonic());
            s
        }),
        Opcode::Out => "OUT".to_string(),
        _ => format!("{} {}", opcode.mnemonic(), operand),
    }
}

/// Set of token kinds accepted at one operand position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct KindSet(u8);

impl KindSet {
    pub const ADDRESS: KindSet = KindSet::of(TokenKind::Address);
    pub const NUMBER: KindSet = KindSet::of(TokenKind::Number);
    pub const STRING: KindSet = KindSet::of(TokenKind::Str);
    pub const IDENT: KindSet = KindSet::of(TokenKind::Ident);

    const fn bit(kind: TokenKind) -> u8 {
        match kind {
            TokenKind::Label => 1 << 0,
            TokenKind::Address => 1 << 1,
            TokenKind::Number => 1 << 2,
            TokenKind::Str => 1 << 3,
            TokenKind::Ident => 1 << 4,
        }
    }

    pub const fn of(kind: TokenKind) -> KindSet {
        KindSet(Self::bit(kind))
    }

    pub const fn or(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }

    pub fn contains(self, kind: TokenKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = [
            TokenKind::Label,
            TokenKind::Address,
            TokenKind::Number,
            TokenKind::Str,
            TokenKind::Ident,
        ];
        let mut first = true;
        for kind in kinds.into_iter().filter(|k| self.contains(*k)) {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{kind}")?;
            first = false;
        }
        Ok(())
    }
}

/// Operand types an instruction accepts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signature {
    /// One entry per operand
    Exact(&'static [KindSet]),
    /// Between `min` and `max` operands, all of the same kinds
    Repeated {
        kinds: KindSet,
        min: usize,
        max: usize,
    },
}

impl Signature {
    pub fn accepts_count(&self, count: usize) -> bool {
        match *self {
            Signature::Exact(kinds) => kinds.len() == count,
            Signature::Repeated { min, max, .. } => (min..=max).contains(&count),
        }
    }

    /// Human readable operand count
    pub fn arity(&self) -> String {
        match *self {
            Signature::Exact(kinds) => kinds.len().to_string(),
            Signature::Repeated { min, max, .. } => format!("{min} to {max}"),
        }
    }

    /// Kinds accepted at position `idx`, or `None` past the last operand.
    pub fn kinds_at(&self, idx: usize) -> Option<KindSet> {
        match *self {
            Signature::Exact(kinds) => kinds.get(idx).copied(),
            Signature::Repeated { kinds, max, .. } => (idx < max).then_some(kinds),
        }
    }
}

/// Static description of a mnemonic.
pub struct Descriptor {
    pub mnemonic: &'static str,
    pub signature: Signature,
    /// Number of words the statement occupies, known before linking
    pub size: fn(&[Operand]) -> usize,
    /// Words emitted for fully resolved operands
    pub encode: fn(&[Resolved]) -> Vec<u8>,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("mnemonic", &self.mnemonic)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.mnemonic == other.mnemonic
    }
}

impl Eq for Descriptor {}

const NONE: Signature = Signature::Exact(&[]);
const ADDRESS: Signature = Signature::Exact(&[KindSet::ADDRESS]);
const DATA_KINDS: KindSet = KindSet::ADDRESS.or(KindSet::NUMBER).or(KindSet::STRING);
const DATA: Signature = Signature::Exact(&[DATA_KINDS]);

fn one_word(_: &[Operand]) -> usize {
    1
}

fn data_size(ops: &[Operand]) -> usize {
    match ops.first() {
        // Trailing zero
        Some(Operand::Bytes(bytes)) => bytes.len() + 1,
        _ => 1,
    }
}

fn encode_data(ops: &[Resolved]) -> Vec<u8> {
    match ops.first() {
        Some(Resolved::Addr(val) | Resolved::Byte(val)) => vec![*val],
        Some(Resolved::Bytes(bytes)) => bytes.iter().copied().chain([0]).collect(),
        Some(Resolved::Operator(op)) => vec![op.flag()],
        None => Vec::new(),
    }
}

fn encode_operate(ops: &[Resolved]) -> Vec<u8> {
    let flags = ops.iter().fold(0, |flags, op| match op {
        Resolved::Operator(op) => flags | op.flag(),
        _ => flags,
    });
    vec![pack(Opcode::Opr, flags)]
}

/// Encoder for an address-taking opcode.
fn encode_addressed(opcode: Opcode, ops: &[Resolved]) -> Vec<u8> {
    let addr = match ops.first() {
        Some(Resolved::Addr(addr)) => *addr,
        _ => 0,
    };
    vec![pack(opcode, addr)]
}

/// All mnemonics understood by the assembler.
pub static INSTRUCTIONS: [Descriptor; 14] = [
    Descriptor {
        mnemonic: "DB",
        signature: DATA,
        size: data_size,
        encode: encode_data,
    },
    Descriptor {
        mnemonic: "OPR",
        signature: Signature::Repeated {
            kinds: KindSet::IDENT,
            min: 1,
            max: Operator::ALL.len(),
        },
        size: one_word,
        encode: encode_operate,
    },
    Descriptor {
        mnemonic: "CLR",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Opr, Operator::Clr.flag())],
    },
    Descriptor {
        mnemonic: "NOT",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Opr, Operator::Not.flag())],
    },
    Descriptor {
        mnemonic: "INC",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Opr, Operator::Inc.flag())],
    },
    Descriptor {
        mnemonic: "ROL",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Opr, Operator::Rol.flag())],
    },
    Descriptor {
        mnemonic: "ROR",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Opr, Operator::Ror.flag())],
    },
    Descriptor {
        mnemonic: "LD",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::Ld, ops),
    },
    Descriptor {
        mnemonic: "ST",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::St, ops),
    },
    Descriptor {
        mnemonic: "ADD",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::Add, ops),
    },
    Descriptor {
        mnemonic: "AND",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::And, ops),
    },
    Descriptor {
        mnemonic: "JMP",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::Jmp, ops),
    },
    Descriptor {
        mnemonic: "JZ",
        signature: ADDRESS,
        size: one_word,
        encode: |ops| encode_addressed(Opcode::Jz, ops),
    },
    Descriptor {
        mnemonic: "OUT",
        signature: NONE,
        size: one_word,
        encode: |_| vec![pack(Opcode::Out, 0)],
    },
];

/// Find the descriptor for an uppercased mnemonic.
pub fn lookup(mnemonic: &str) -> Option<&'static Descriptor> {
    INSTRUCTIONS.iter().find(|desc| desc.mnemonic == mnemonic)
}
