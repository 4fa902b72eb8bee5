// +-----------+--------------------------------------------------+
// | Range     | Default layout                                   |
// +-----------+--------------------------------------------------+
// | 0x0000-   | Plain memory                                     |
// | 0xFF00-0F | Disk controller (sector I/O registers)           |
// | 0xFF10    | Terminal data register                           |
// | 0xFF11-   | Plain memory (vectors at 0xFFF0-0xFFFF)          |
// +-----------+--------------------------------------------------+
use std::fmt;

use thiserror::Error;

use crate::device::Device;

const ADDRESS_SPACE: u32 = 0x10000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("device {name} has an empty window at {base:#06X}")]
    EmptyWindow { name: String, base: u16 },

    #[error("device {name} window {base:#06X}+{size:#X} runs past the end of the address space")]
    OutOfRange { name: String, base: u16, size: u32 },

    #[error(
        "device {second} window {second_start:#06X}-{second_end:#06X} overlaps \
         device {first} window {first_start:#06X}-{first_end:#06X}"
    )]
    Overlap {
        first: String,
        first_start: u16,
        first_end: u16,
        second: String,
        second_start: u16,
        second_end: u16,
    },
}

/// A device and the window of addresses it owns.
#[derive(Debug)]
pub struct DeviceBinding {
    base: u16,
    size: u32,
    device: Box<dyn Device>,
}

impl DeviceBinding {
    /// Binds `device` at `base` using the device's own window size.
    pub fn new(base: u16, device: Box<dyn Device>) -> Self {
        let size = device.window_size();
        Self::with_size(base, size, device)
    }

    pub fn with_size(base: u16, size: u32, device: Box<dyn Device>) -> Self {
        Self { base, size, device }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Last address of the window. Only meaningful for a validated binding.
    pub fn end(&self) -> u16 {
        u32::from(self.base)
            .saturating_add(self.size.saturating_sub(1))
            .min(ADDRESS_SPACE - 1) as u16
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn contains(&self, address: u16) -> bool {
        address >= self.base && u32::from(address - self.base) < self.size
    }
}

/// Fixed table of device windows, sorted by ascending base address.
#[derive(Debug, Default)]
pub struct AddressSpaceMap {
    bindings: Vec<DeviceBinding>,
}

impl AddressSpaceMap {
    pub fn new(mut bindings: Vec<DeviceBinding>) -> Result<Self, MapError> {
        for binding in &bindings {
            if binding.size == 0 {
                return Err(MapError::EmptyWindow {
                    name: binding.name().to_string(),
                    base: binding.base,
                });
            }
            let past_end = u32::from(binding.base)
                .checked_add(binding.size)
                .map_or(true, |end| end > ADDRESS_SPACE);
            if past_end {
                return Err(MapError::OutOfRange {
                    name: binding.name().to_string(),
                    base: binding.base,
                    size: binding.size,
                });
            }
        }

        // stable, so equal bases keep the order they were declared in
        bindings.sort_by_key(|binding| binding.base);

        for pair in bindings.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if second.base <= first.end() {
                return Err(MapError::Overlap {
                    first: first.name().to_string(),
                    first_start: first.base,
                    first_end: first.end(),
                    second: second.name().to_string(),
                    second_start: second.base,
                    second_end: second.end(),
                });
            }
        }

        for binding in &bindings {
            tracing::info!(
                "Mapped {} at {:#06X}-{:#06X}",
                binding.name(),
                binding.base,
                binding.end()
            );
        }

        Ok(Self { bindings })
    }

    /// Finds the window owning `address`, returning its index and the offset
    /// of `address` within it.
    pub fn lookup(&self, address: u16) -> Option<(usize, u16)> {
        let index = self
            .bindings
            .partition_point(|binding| binding.base <= address)
            .checked_sub(1)?;
        let binding = &self.bindings[index];

        if binding.contains(address) {
            Some((index, address - binding.base))
        } else {
            None
        }
    }

    pub fn device_mut(&mut self, index: usize) -> &mut dyn Device {
        self.bindings[index].device.as_mut()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &DeviceBinding> {
        self.bindings.iter()
    }

    pub fn reset(&mut self) {
        for binding in &mut self.bindings {
            binding.device.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for AddressSpaceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for binding in &self.bindings {
            writeln!(
                f,
                "0x{:04X} - 0x{:04X} - {}",
                binding.base,
                binding.end(),
                binding.name()
            )?;
        }
        Ok(())
    }
}
