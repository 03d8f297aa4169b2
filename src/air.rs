use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::isa::{Descriptor, Operator};
use crate::parser::Label;
use crate::span::Span;

/// Insertion-ordered map using a fast non-cryptographic hash.
pub type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Type-checked operand, before label addresses are known.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    /// Address of a label
    Ref { label: String, span: Span },
    Byte(u8),
    /// String characters, without the terminating zero
    Bytes(Vec<u8>),
    Operator(Operator),
}

/// Operand with every reference replaced by an address.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Resolved {
    Addr(u8),
    Byte(u8),
    Bytes(Vec<u8>),
    Operator(Operator),
}

/// Single statement after the first pass.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AirStmt {
    pub label: Option<Label>,
    pub desc: &'static Descriptor,
    pub operands: Vec<Operand>,
    /// Address of the first word
    pub addr: usize,
    /// Number of words
    pub size: usize,
    /// Location of the mnemonic
    pub span: Span,
}

/// Statement ready for encoding.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Linked {
    pub label: Option<String>,
    pub desc: &'static Descriptor,
    pub operands: Vec<Resolved>,
    pub addr: u8,
}

impl Linked {
    pub fn emit(&self) -> Vec<u8> {
        (self.desc.encode)(&self.operands)
    }
}

/// Assembly intermediate representation: compiled statements and the labels they define.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Air {
    stmts: Vec<AirStmt>,
    /// Label -> index of the statement carrying it
    labels: FxMap<String, usize>,
}

impl Air {
    pub fn new() -> Self {
        Air::default()
    }

    /// Register `label` for the next statement to be added.
    ///
    /// Returns the index of the statement already carrying the label, if any.
    pub fn define(&mut self, label: &str) -> Result<(), usize> {
        if let Some(&idx) = self.labels.get(label) {
            return Err(idx);
        }
        self.labels.insert(label.to_string(), self.stmts.len());
        Ok(())
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.stmts.push(stmt)
    }

    /// Statement carrying `label`.
    pub fn dereference(&self, label: &str) -> Option<&AirStmt> {
        self.labels.get(label).map(|&idx| &self.stmts[idx])
    }

    /// Labels in definition order with their addresses.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.labels
            .iter()
            .map(|(name, &idx)| (name.as_str(), self.stmts[idx].addr))
    }

    /// Total size in words.
    pub fn size(&self) -> usize {
        self.stmts.last().map(|s| s.addr + s.size).unwrap_or(0)
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.stmts[idx]
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AirStmt> {
        self.stmts.iter()
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.stmts.iter()
    }
}
