//! Signal lines between devices.
//!
//! After a device cycles, every wire leaving it copies the value of one of its lines onto a
//! line of another device. Devices are cycled in [`ORDER`], so a device always receives the
//! signals of the devices before it on the same tick, and those of the devices after it on the
//! next tick.

use std::fmt;

/// Devices attached to the bus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DeviceId {
    Cpu,
    Ram,
    Printer,
}

/// Named signal lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Line {
    Reset,
    Read,
    Write,
    /// Address register
    Address,
    /// Data register
    Data,
    /// Output request
    Output,
    /// Output register
    OutputRegister,
}

/// Value carried by a line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signal {
    Flag(bool),
    Word(u8),
}

impl Signal {
    pub fn flag(self) -> bool {
        match self {
            Signal::Flag(flag) => flag,
            Signal::Word(word) => word != 0,
        }
    }

    pub fn word(self) -> u8 {
        match self {
            Signal::Flag(flag) => flag as u8,
            Signal::Word(word) => word,
        }
    }
}

/// A component that advances one tick at a time and exchanges signals over the bus.
pub trait Device: Clone + fmt::Display {
    /// State after one clock tick. Never mutates `self`.
    fn cycle(&self) -> Self;

    /// Value currently driven on `line`, or `None` if the device does not drive it.
    fn line(&self, line: Line) -> Option<Signal>;

    /// Latch an incoming signal. Lines the device does not listen to are ignored.
    fn accept(&mut self, line: Line, signal: Signal);
}

/// Copies `line` of `from` onto `into` of `to`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Wire {
    pub from: DeviceId,
    pub line: Line,
    pub to: DeviceId,
    pub into: Line,
}

const fn wire(from: DeviceId, line: Line, to: DeviceId, into: Line) -> Wire {
    Wire {
        from,
        line,
        to,
        into,
    }
}

/// Order in which devices cycle on every tick.
pub const ORDER: [DeviceId; 3] = [DeviceId::Cpu, DeviceId::Ram, DeviceId::Printer];

/// Every connection on the bus.
pub const WIRING: &[Wire] = &[
    wire(DeviceId::Cpu, Line::Read, DeviceId::Ram, Line::Read),
    wire(DeviceId::Cpu, Line::Write, DeviceId::Ram, Line::Write),
    wire(DeviceId::Cpu, Line::Address, DeviceId::Ram, Line::Address),
    wire(DeviceId::Cpu, Line::Data, DeviceId::Ram, Line::Data),
    wire(DeviceId::Cpu, Line::Output, DeviceId::Printer, Line::Output),
    wire(DeviceId::Cpu, Line::OutputRegister, DeviceId::Printer, Line::OutputRegister),
    wire(DeviceId::Ram, Line::Data, DeviceId::Cpu, Line::Data),
];

/// Wires leaving `device`, in declaration order.
pub fn wires_from(device: DeviceId) -> impl Iterator<Item = &'static Wire> {
    WIRING.iter().filter(move |wire| wire.from == device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_conversions() {
        assert!(Signal::Word(3).flag());
        assert!(!Signal::Word(0).flag());
        assert_eq!(Signal::Flag(true).word(), 1);
        assert_eq!(Signal::Word(200).word(), 200);
    }

    #[test]
    fn every_device_cycles_once() {
        for id in [DeviceId::Cpu, DeviceId::Ram, DeviceId::Printer] {
            assert_eq!(ORDER.iter().filter(|&&d| d == id).count(), 1);
        }
    }

    #[test]
    fn no_device_wired_to_itself() {
        assert!(WIRING.iter().all(|wire| wire.from != wire.to));
    }

    #[test]
    fn wires_keep_declaration_order() {
        let lines: Vec<_> = wires_from(DeviceId::Cpu).map(|w| w.line).collect();
        assert_eq!(
            lines,
            vec![
                Line::Read,
                Line::Write,
                Line::Address,
                Line::Data,
                Line::Output,
                Line::OutputRegister
            ]
        );
        assert_eq!(wires_from(DeviceId::Printer).count(), 0);
    }
}
