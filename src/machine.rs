use std::fs;

use anyhow::Context;
use thiserror::Error;

use crate::{
    address_map::{AddressSpaceMap, DeviceBinding, MapError},
    bus::Bus,
    config::{MachineConfig, DEFAULT_DISK_BASE, DEFAULT_TERMINAL_BASE},
    cpu::Processor,
    device::Device,
    disk::DiskController,
    dsk_image::DiskImage,
    memory::{Memory, MemoryError},
    terminal::{Console, Terminal},
    utils::hexdump,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// The emulated computer: a CPU core wired to the bus.
pub struct Machine<P: Processor> {
    bus: Bus,
    cpu: P,
    console: Option<Console>,
    cycles: usize,
}

impl<P: Processor> Machine<P> {
    /// Builds the machine described by `config`, loading any images it names.
    pub fn from_config(config: &MachineConfig, cpu: P) -> anyhow::Result<Self> {
        let mut builder = MachineBuilder::new();

        if let Some(path) = &config.memory.image {
            let image = fs::read(path)
                .with_context(|| format!("reading memory image {}", path.display()))?;
            builder.image(config.memory.load_address, &image);
        }

        if let Some(disk) = &config.disk {
            let mut image = match &disk.image {
                Some(path) => DiskImage::load_from_file(path)
                    .with_context(|| format!("loading disk image {}", path.display()))?,
                None => DiskImage::new_empty(disk.sectors)?,
            };
            image.set_write_protected(disk.write_protected);
            builder.disk(disk.base, image);
        }

        if let Some(terminal) = &config.terminal {
            if terminal.echo {
                builder.terminal_with_echo(terminal.base, Box::new(std::io::stdout()));
            } else {
                builder.terminal(terminal.base);
            }
        }

        Ok(builder.build(cpu)?)
    }

    /// Resets every device and the CPU. Plain memory is left intact so a
    /// loaded program survives.
    pub fn reset(&mut self) {
        tracing::info!("Resetting machine");
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.cycles = 0;
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.bus);
        self.cycles += cycles as usize;
        cycles
    }

    /// Runs for at least `n` cycles, or until the CPU halts.
    pub fn step_for(&mut self, n: usize) {
        let mut cycles_executed = 0;
        while cycles_executed < n && !self.cpu.halted() {
            let cycles_taken = self.step();
            if cycles_taken == 0 {
                tracing::warn!("CPU reported a zero-cycle step at {:04X}", self.cpu.pc());
                break;
            }
            cycles_executed += cycles_taken as usize;
        }
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    pub fn halted(&self) -> bool {
        self.cpu.halted()
    }

    pub fn cpu(&self) -> &P {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Host handle on the terminal, if the machine has one.
    pub fn console(&self) -> Option<Console> {
        self.console.clone()
    }

    /// Dump of plain memory; device registers are not read.
    pub fn memory_dump(&self, start: u16, end: u16) -> String {
        hexdump(self.bus.memory().data(), start, end)
    }
}

#[derive(Debug, Default)]
pub struct MachineBuilder {
    bindings: Vec<DeviceBinding>,
    images: Vec<(u16, Vec<u8>)>,
    console: Option<Console>,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock layout: an empty disk controller at 0xFF00 and the terminal at 0xFF10.
    pub fn stock() -> Self {
        let mut builder = Self::new();
        builder
            .device(DEFAULT_DISK_BASE, Box::new(DiskController::new()))
            .terminal(DEFAULT_TERMINAL_BASE);
        builder
    }

    pub fn disk(&mut self, base: u16, image: DiskImage) -> &mut Self {
        self.device(base, Box::new(DiskController::with_disk(image)))
    }

    pub fn terminal(&mut self, base: u16) -> &mut Self {
        let terminal = Terminal::new(Console::new());
        self.console = Some(terminal.console());
        self.device(base, Box::new(terminal))
    }

    pub fn terminal_with_echo(&mut self, base: u16, sink: Box<dyn std::io::Write>) -> &mut Self {
        let terminal = Terminal::new(Console::new()).with_echo(sink);
        self.console = Some(terminal.console());
        self.device(base, Box::new(terminal))
    }

    /// Maps any device at `base` using its own window size.
    pub fn device(&mut self, base: u16, device: Box<dyn Device>) -> &mut Self {
        self.bindings.push(DeviceBinding::new(base, device));
        self
    }

    pub fn binding(&mut self, binding: DeviceBinding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    /// Program image copied into plain memory at `start` when the machine is built.
    pub fn image(&mut self, start: u16, data: &[u8]) -> &mut Self {
        self.images.push((start, data.to_vec()));
        self
    }

    /// Validates the layout and assembles the machine. Overlapping or
    /// out-of-range windows are rejected here, before any access happens.
    pub fn build<P: Processor>(&mut self, cpu: P) -> Result<Machine<P>, MachineError> {
        let map = AddressSpaceMap::new(std::mem::take(&mut self.bindings))?;

        let mut memory = Memory::new();
        for (start, data) in &self.images {
            memory.load(*start, data)?;
        }

        tracing::info!("Initializing machine with {} device(s)", map.len());

        Ok(Machine {
            bus: Bus::new(memory, map),
            cpu,
            console: self.console.take(),
            cycles: 0,
        })
    }
}
