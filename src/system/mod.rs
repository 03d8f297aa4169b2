//! The Chip3 machine: a CPU, a block of RAM and a printer connected by a bus.

use std::fmt;

use log::trace;

use crate::error::LoadError;

pub mod bus;
pub mod cpu;
pub mod printer;
pub mod ram;

use bus::{wires_from, Device, DeviceId, Line, Signal, Wire, ORDER};
use cpu::{Cpu, Phase};
use printer::Printer;
use ram::Ram;

/// Snapshot of the whole machine between two ticks.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct System {
    pub cpu: Cpu,
    pub ram: Ram,
    pub printer: Printer,
    /// Number of cycles executed since creation
    pub cycle: u64,
}

impl System {
    /// Machine in a virgin state with all memory zeroed.
    pub fn new() -> Self {
        System::default()
    }

    /// Fresh machine with `image` copied to the start of memory.
    pub fn load(image: &[u8]) -> Result<Self, LoadError> {
        let mut system = System::new();
        let capacity = system.ram.size();
        if image.len() > capacity {
            return Err(LoadError::TooLarge {
                size: image.len(),
                capacity,
            });
        }
        system.ram.data[..image.len()].copy_from_slice(image);
        Ok(system)
    }

    /// Execute one tick, returning the next snapshot.
    ///
    /// Each device cycles in bus order, and its outgoing wires are applied before the next
    /// device cycles.
    pub fn cycle(&self) -> System {
        let mut next = self.clone();
        next.cycle += 1;
        for device in ORDER {
            next.cycle_device(device);
            for wire in wires_from(device) {
                next.propagate(wire);
            }
        }
        trace!("{next}");
        next
    }

    /// Raise the reset line of every device. The reset happens on the next cycle.
    pub fn reset(&self) -> System {
        let mut next = self.clone();
        for device in ORDER {
            next.accept(device, Line::Reset, Signal::Flag(true));
        }
        next
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.phase == Phase::Halt
    }

    /// Cycle until halted or until `max_cycles` more ticks have run.
    pub fn run(&self, max_cycles: u64) -> System {
        let mut state = self.clone();
        for _ in 0..max_cycles {
            if state.is_halted() {
                break;
            }
            state = state.cycle();
        }
        state
    }

    /// Every following snapshot, one per tick. Never ends.
    pub fn ticks(&self) -> impl Iterator<Item = System> {
        std::iter::successors(Some(self.cycle()), |state| Some(state.cycle()))
    }

    /// Everything printed so far.
    pub fn printout(&self) -> &[u8] {
        &self.printer.paper
    }

    fn cycle_device(&mut self, device: DeviceId) {
        match device {
            DeviceId::Cpu => self.cpu = self.cpu.cycle(),
            DeviceId::Ram => self.ram = self.ram.cycle(),
            DeviceId::Printer => self.printer = self.printer.cycle(),
        }
    }

    fn line(&self, device: DeviceId, line: Line) -> Option<Signal> {
        match device {
            DeviceId::Cpu => self.cpu.line(line),
            DeviceId::Ram => self.ram.line(line),
            DeviceId::Printer => self.printer.line(line),
        }
    }

    fn accept(&mut self, device: DeviceId, line: Line, signal: Signal) {
        match device {
            DeviceId::Cpu => self.cpu.accept(line, signal),
            DeviceId::Ram => self.ram.accept(line, signal),
            DeviceId::Printer => self.printer.accept(line, signal),
        }
    }

    fn propagate(&mut self, wire: &Wire) {
        if let Some(signal) = self.line(wire.from, wire.line) {
            self.accept(wire.to, wire.into, signal);
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\n\t{}\n\t{}",
            self.cycle, self.cpu, self.ram, self.printer
        )
    }
}
