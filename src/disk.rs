// +--------+-----------------------+-----------------------+
// | Offset | Read                  | Write                 |
// +--------+-----------------------+-----------------------+
// | 0x0    | Status                | Command               |
// | 0x1    | Sector number (high)  | Sector number (high)  |
// | 0x2    | Sector number (low)   | Sector number (low)   |
// | 0x3    | Data                  | Data                  |
// | 0x4    | Last error code       | -                     |
// | 0x5-F  | 0xFF                  | -                     |
// +--------+-----------------------+-----------------------+
use crate::{
    device::Device,
    disk_error::DiskError,
    dsk_image::{DiskImage, SECTOR_SIZE},
};

pub const DISK_WINDOW_SIZE: u32 = 16;

pub const REG_STATUS: u16 = 0x0;
pub const REG_COMMAND: u16 = 0x0;
pub const REG_SECTOR_HIGH: u16 = 0x1;
pub const REG_SECTOR_LOW: u16 = 0x2;
pub const REG_DATA: u16 = 0x3;
pub const REG_ERROR: u16 = 0x4;

pub const STATUS_READY: u8 = 0x01;
pub const STATUS_DRQ: u8 = 0x02;
pub const STATUS_ERROR: u8 = 0x04;
pub const STATUS_WRITE_PROTECT: u8 = 0x08;

pub const CMD_RESET: u8 = 0x00;
pub const CMD_READ: u8 = 0x01;
pub const CMD_WRITE: u8 = 0x02;
pub const CMD_FLUSH: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transfer {
    Idle,
    Read,
    Write,
}

/// Block-storage device: programmed I/O over 512-byte sectors.
#[derive(Debug)]
pub struct DiskController {
    disk: Option<DiskImage>,
    sector: u16,
    transfer: Transfer,
    buffer: Vec<u8>,
    buffer_pos: usize,
    error: Option<u8>,
}

impl Default for DiskController {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskController {
    pub fn new() -> Self {
        Self {
            disk: None,
            sector: 0,
            transfer: Transfer::Idle,
            buffer: vec![0; SECTOR_SIZE],
            buffer_pos: 0,
            error: None,
        }
    }

    pub fn with_disk(image: DiskImage) -> Self {
        let mut controller = Self::new();
        controller.insert_disk(image);
        controller
    }

    pub fn insert_disk(&mut self, image: DiskImage) {
        tracing::info!("Disk inserted ({} sectors)", image.sector_count());
        self.disk = Some(image);
        self.abort_transfer();
    }

    pub fn eject_disk(&mut self) -> Option<DiskImage> {
        self.abort_transfer();
        self.disk.take()
    }

    pub fn disk(&self) -> Option<&DiskImage> {
        self.disk.as_ref()
    }

    pub fn sector(&self) -> u16 {
        self.sector
    }

    pub fn status(&self) -> u8 {
        let mut status = 0;
        if let Some(disk) = &self.disk {
            status |= STATUS_READY;
            if disk.is_write_protected() {
                status |= STATUS_WRITE_PROTECT;
            }
        }
        if self.transfer != Transfer::Idle {
            status |= STATUS_DRQ;
        }
        if self.error.is_some() {
            status |= STATUS_ERROR;
        }
        status
    }

    fn execute_command(&mut self, cmd: u8) {
        self.error = None;
        self.abort_transfer();

        let result = match cmd {
            CMD_RESET => Ok(()),
            CMD_READ => self.read_sector_command(),
            CMD_WRITE => self.write_sector_command(),
            CMD_FLUSH => self.flush_command(),
            _ => Err(DiskError::IllegalCommand(cmd)),
        };

        if let Err(err) = result {
            tracing::warn!("[DISK] Command {:02X} failed: {}", cmd, err);
            self.error = Some(err.code());
        }
    }

    fn read_sector_command(&mut self) -> Result<(), DiskError> {
        let disk = self.disk.as_ref().ok_or(DiskError::NoDisk)?;
        let data = disk.read_sector(self.sector)?;
        self.buffer.copy_from_slice(data);
        self.buffer_pos = 0;
        self.transfer = Transfer::Read;

        tracing::debug!("[DISK] Reading sector {}", self.sector);
        Ok(())
    }

    fn write_sector_command(&mut self) -> Result<(), DiskError> {
        let disk = self.disk.as_ref().ok_or(DiskError::NoDisk)?;
        if disk.is_write_protected() {
            return Err(DiskError::WriteProtected);
        }
        if self.sector as usize >= disk.sector_count() {
            return Err(DiskError::InvalidSector(self.sector));
        }

        self.buffer.fill(0);
        self.buffer_pos = 0;
        self.transfer = Transfer::Write;

        tracing::debug!("[DISK] Writing sector {}", self.sector);
        Ok(())
    }

    fn flush_command(&mut self) -> Result<(), DiskError> {
        self.disk.as_ref().ok_or(DiskError::NoDisk)?.save()
    }

    fn read_data(&mut self) -> u8 {
        if self.transfer != Transfer::Read {
            return 0xFF;
        }

        let data = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        if self.buffer_pos >= SECTOR_SIZE {
            self.complete_transfer();
        }
        data
    }

    fn write_data(&mut self, value: u8) {
        if self.transfer != Transfer::Write {
            tracing::trace!("[DISK] Data write {:02X} with no transfer pending", value);
            return;
        }

        self.buffer[self.buffer_pos] = value;
        self.buffer_pos += 1;
        if self.buffer_pos < SECTOR_SIZE {
            return;
        }

        let result = match &mut self.disk {
            Some(disk) => disk.write_sector(self.sector, &self.buffer),
            None => Err(DiskError::NoDisk),
        };
        match result {
            Ok(()) => self.complete_transfer(),
            Err(err) => {
                tracing::warn!("[DISK] Sector {} write failed: {}", self.sector, err);
                self.error = Some(err.code());
                self.abort_transfer();
            }
        }
    }

    // the head moves on to the next sector once a transfer finishes
    fn complete_transfer(&mut self) {
        self.transfer = Transfer::Idle;
        self.buffer_pos = 0;
        self.sector = self.sector.wrapping_add(1);
    }

    fn abort_transfer(&mut self) {
        self.transfer = Transfer::Idle;
        self.buffer_pos = 0;
    }
}

impl Device for DiskController {
    fn name(&self) -> &str {
        "disk"
    }

    fn window_size(&self) -> u32 {
        DISK_WINDOW_SIZE
    }

    fn read(&mut self, offset: u16) -> u8 {
        match offset {
            REG_STATUS => self.status(),
            REG_SECTOR_HIGH => (self.sector >> 8) as u8,
            REG_SECTOR_LOW => self.sector as u8,
            REG_DATA => self.read_data(),
            REG_ERROR => self.error.unwrap_or(0),
            _ => 0xFF,
        }
    }

    fn write(&mut self, offset: u16, value: u8) {
        match offset {
            REG_COMMAND => self.execute_command(value),
            REG_SECTOR_HIGH => self.sector = (self.sector & 0x00FF) | ((value as u16) << 8),
            REG_SECTOR_LOW => self.sector = (self.sector & 0xFF00) | value as u16,
            REG_DATA => self.write_data(value),
            _ => tracing::trace!("[DISK] Ignored write to register {:X} = {:02X}", offset, value),
        }
    }

    fn reset(&mut self) {
        self.sector = 0;
        self.error = None;
        self.abort_transfer();
    }
}
