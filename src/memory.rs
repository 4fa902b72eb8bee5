use derivative::Derivative;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MEMORY_SIZE: usize = 0x10000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("image of {len} bytes at {start:#06X} runs past the end of memory")]
    ImageTooLarge { start: u16, len: usize },

    #[error("snapshot holds {0} bytes, expected {}", MEMORY_SIZE)]
    BadSnapshot(usize),
}

/// Plain memory behind every address no device claims.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Clone, Debug, PartialEq)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Memory {
    #[derivative(Debug = "ignore")]
    data: Vec<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<u8>> for Memory {
    type Error = MemoryError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        if data.len() != MEMORY_SIZE {
            return Err(MemoryError::BadSnapshot(data.len()));
        }
        Ok(Memory { data })
    }
}

impl From<Memory> for Vec<u8> {
    fn from(memory: Memory) -> Self {
        memory.data
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            data: vec![0xFF; MEMORY_SIZE],
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn reset(&mut self) {
        self.data.fill(0xFF);
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    /// Copies a program image into memory starting at `start`.
    pub fn load(&mut self, start: u16, image: &[u8]) -> Result<(), MemoryError> {
        let start_index = start as usize;
        let end = start_index + image.len();
        if end > self.data.len() {
            return Err(MemoryError::ImageTooLarge {
                start,
                len: image.len(),
            });
        }

        self.data[start_index..end].copy_from_slice(image);
        tracing::debug!(
            "Loaded {} bytes at {:#06X}-{:#06X}",
            image.len(),
            start,
            end.saturating_sub(1)
        );
        Ok(())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let memory = Memory::new();
        assert_eq!(memory.size(), 0x10000);
        assert!(memory.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_load_image() {
        let mut memory = Memory::new();
        memory.load(0xFFFE, &[0x12, 0x34]).unwrap();
        assert_eq!(memory.read_byte(0xFFFE), 0x12);
        assert_eq!(memory.read_byte(0xFFFF), 0x34);

        assert_eq!(
            memory.load(0xFFFF, &[1, 2]),
            Err(MemoryError::ImageTooLarge {
                start: 0xFFFF,
                len: 2
            })
        );
    }

    #[test]
    fn test_snapshot() {
        let mut memory = Memory::new();
        memory.write_byte(0x8000, 0x39);

        let json = serde_json::to_string(&memory).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, memory);

        assert!(serde_json::from_str::<Memory>("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_reset_clears_contents() {
        let mut memory = Memory::new();
        memory.write_byte(0x0100, 0x42);
        memory.reset();
        assert_eq!(memory.read_byte(0x0100), 0xFF);
    }
}
