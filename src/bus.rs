use crate::{address_map::AddressSpaceMap, cpu::CpuIo, memory::Memory};

/// Routes every CPU memory access either to the device owning the address or
/// to plain memory.
#[derive(Debug, Default)]
pub struct Bus {
    memory: Memory,
    map: AddressSpaceMap,
}

impl Bus {
    pub fn new(memory: Memory, map: AddressSpaceMap) -> Self {
        Self { memory, map }
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        match self.map.lookup(addr) {
            Some((index, offset)) => {
                let device = self.map.device_mut(index);
                let value = device.read(offset);
                tracing::trace!(
                    "[BUS] [RD] {:04X} -> {}[{:X}] = {:02X}",
                    addr,
                    device.name(),
                    offset,
                    value
                );
                value
            }
            None => self.memory.read_byte(addr),
        }
    }

    pub fn write_byte(&mut self, addr: u16, data: u8) {
        match self.map.lookup(addr) {
            Some((index, offset)) => {
                let device = self.map.device_mut(index);
                tracing::trace!(
                    "[BUS] [WR] {:04X} -> {}[{:X}] = {:02X}",
                    addr,
                    device.name(),
                    offset,
                    data
                );
                device.write(offset, data);
            }
            None => self.memory.write_byte(addr, data),
        }
    }

    /// Writes `data` starting at `start_addr` through the normal routing rule.
    pub fn write_block(&mut self, start_addr: u16, data: &[u8]) {
        let mut addr = start_addr;
        for &byte in data {
            self.write_byte(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    /// Name of the device owning `addr`, if any.
    pub fn device_at(&self, addr: u16) -> Option<&str> {
        let (index, _) = self.map.lookup(addr)?;
        self.map.bindings().nth(index).map(|binding| binding.name())
    }

    /// Resets every mapped device. Plain memory keeps its contents.
    pub fn reset(&mut self) {
        self.map.reset();
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn map(&self) -> &AddressSpaceMap {
        &self.map
    }
}

impl CpuIo for Bus {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.write_byte(addr, value);
    }
}
