// Disk emulation error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("No disk in drive")]
    NoDisk,
    #[error("Invalid sector number {0}")]
    InvalidSector(u16),
    #[error("Disk is write protected")]
    WriteProtected,
    #[error("Illegal command {0:#04X}")]
    IllegalCommand(u8),
    #[error("Invalid disk size: {0}")]
    InvalidSize(String),
    #[error("Disk image has no backing file")]
    NoBackingFile,
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiskError {
    /// Value presented in the controller's error register.
    pub fn code(&self) -> u8 {
        match self {
            DiskError::NoDisk => 0x01,
            DiskError::InvalidSector(_) => 0x02,
            DiskError::WriteProtected => 0x03,
            DiskError::IllegalCommand(_) => 0x04,
            DiskError::InvalidSize(_) => 0x05,
            DiskError::NoBackingFile => 0x06,
            DiskError::Io(_) => 0x07,
        }
    }
}
