use std::fmt;

use crate::system::bus::{Device, Line, Signal};

/// Output device: appends every word the CPU outputs to its paper.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Printer {
    /// Reset flag
    pub rst: bool,
    /// Output request flag
    pub output: bool,
    /// Output register
    pub or: u8,
    /// The full printout
    pub paper: Vec<u8>,
}

impl Printer {
    pub fn new() -> Self {
        Printer::default()
    }

    pub fn cycle(&self) -> Printer {
        if self.rst {
            Printer::new()
        } else if self.output {
            self.print()
        } else {
            self.clone()
        }
    }

    fn print(&self) -> Printer {
        let mut paper = Vec::with_capacity(self.paper.len() + 1);
        paper.extend_from_slice(&self.paper);
        paper.push(self.or);
        Printer {
            paper,
            ..self.clone()
        }
    }
}

impl Device for Printer {
    fn cycle(&self) -> Self {
        Printer::cycle(self)
    }

    fn line(&self, line: Line) -> Option<Signal> {
        match line {
            Line::Reset => Some(Signal::Flag(self.rst)),
            Line::Output => Some(Signal::Flag(self.output)),
            Line::OutputRegister => Some(Signal::Word(self.or)),
            _ => None,
        }
    }

    fn accept(&mut self, line: Line, signal: Signal) {
        match line {
            Line::Reset => self.rst = signal.flag(),
            Line::Output => self.output = signal.flag(),
            Line::OutputRegister => self.or = signal.word(),
            _ => {}
        }
    }
}

impl fmt::Display for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |flag| if flag { "on" } else { "off" };
        write!(
            f,
            "Printer RST:{} OUTPUT:{} OR:{} PAPER:{}",
            on_off(self.rst),
            on_off(self.output),
            self.or,
            self.paper.len(),
        )
    }
}
