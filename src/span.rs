use std::ops::Range;

use miette::SourceSpan;

/// Position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub usize);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: usize,
}

impl Span {
    pub fn new(start: Idx, len: usize) -> Self {
        Span { start, len }
    }

    pub fn offs(&self) -> usize {
        self.start.0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start.0 + self.len
    }

    pub fn as_range(&self) -> Range<usize> {
        self.offs()..self.end()
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}

impl From<Span> for Range<usize> {
    fn from(value: Span) -> Self {
        value.as_range()
    }
}
