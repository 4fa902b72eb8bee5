// Raw sector image backing the disk controller

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::disk_error::DiskError;

pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct DiskImage {
    data: Vec<u8>,
    path: Option<PathBuf>,
    write_protected: bool,
}

impl DiskImage {
    /// A zero-filled image of `sectors` sectors.
    pub fn new_empty(sectors: u16) -> Result<Self, DiskError> {
        if sectors == 0 {
            return Err(DiskError::InvalidSize(
                "a disk needs at least one sector".to_string(),
            ));
        }

        Ok(Self {
            data: vec![0; sectors as usize * SECTOR_SIZE],
            path: None,
            write_protected: false,
        })
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, DiskError> {
        if data.is_empty() || data.len() % SECTOR_SIZE != 0 {
            return Err(DiskError::InvalidSize(format!(
                "{} bytes is not a whole number of {}-byte sectors",
                data.len(),
                SECTOR_SIZE
            )));
        }
        if data.len() / SECTOR_SIZE > u16::MAX as usize + 1 {
            return Err(DiskError::InvalidSize(format!(
                "{} bytes exceeds the addressable sector count",
                data.len()
            )));
        }

        Ok(Self {
            data,
            path: None,
            write_protected: false,
        })
    }

    /// Loads an image and remembers its path so `save` can write it back.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DiskError> {
        let path = path.as_ref();
        let mut image = Self::from_bytes(fs::read(path)?)?;
        image.path = Some(path.to_path_buf());

        tracing::info!(
            "Loaded disk image {} ({} sectors)",
            path.display(),
            image.sector_count()
        );
        Ok(image)
    }

    pub fn save(&self) -> Result<(), DiskError> {
        let path = self.path.as_ref().ok_or(DiskError::NoBackingFile)?;
        self.save_to_file(path)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DiskError> {
        fs::write(path.as_ref(), &self.data)?;
        tracing::debug!("Saved disk image to {}", path.as_ref().display());
        Ok(())
    }

    pub fn set_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = Some(path.into());
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sector_count(&self) -> usize {
        self.data.len() / SECTOR_SIZE
    }

    pub fn read_sector(&self, sector: u16) -> Result<&[u8], DiskError> {
        let start = self.sector_offset(sector)?;
        Ok(&self.data[start..start + SECTOR_SIZE])
    }

    pub fn write_sector(&mut self, sector: u16, data: &[u8]) -> Result<(), DiskError> {
        if self.write_protected {
            return Err(DiskError::WriteProtected);
        }
        if data.len() != SECTOR_SIZE {
            return Err(DiskError::InvalidSize(format!(
                "sector writes take {} bytes, got {}",
                SECTOR_SIZE,
                data.len()
            )));
        }

        let start = self.sector_offset(sector)?;
        self.data[start..start + SECTOR_SIZE].copy_from_slice(data);
        Ok(())
    }

    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    pub fn set_write_protected(&mut self, protected: bool) {
        self.write_protected = protected;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn sector_offset(&self, sector: u16) -> Result<usize, DiskError> {
        if (sector as usize) < self.sector_count() {
            Ok(sector as usize * SECTOR_SIZE)
        } else {
            Err(DiskError::InvalidSector(sector))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_validation() {
        assert!(DiskImage::new_empty(0).is_err());
        assert!(DiskImage::from_bytes(vec![]).is_err());
        assert!(DiskImage::from_bytes(vec![0; 513]).is_err());
        assert_eq!(
            DiskImage::from_bytes(vec![0; 1024]).unwrap().sector_count(),
            2
        );
    }

    #[test]
    fn test_sector_access() {
        let mut disk = DiskImage::new_empty(4).unwrap();
        let pattern: Vec<u8> = (0..SECTOR_SIZE).map(|i| (i % 251) as u8).collect();

        disk.write_sector(3, &pattern).unwrap();
        assert_eq!(disk.read_sector(3).unwrap(), &pattern[..]);
        assert!(disk.read_sector(2).unwrap().iter().all(|&b| b == 0));
        assert!(matches!(
            disk.read_sector(4),
            Err(DiskError::InvalidSector(4))
        ));
    }

    #[test]
    fn test_write_protect() {
        let mut disk = DiskImage::new_empty(1).unwrap();
        disk.set_write_protected(true);
        assert!(matches!(
            disk.write_sector(0, &[0xAA; SECTOR_SIZE]),
            Err(DiskError::WriteProtected)
        ));
        assert_eq!(disk.read_sector(0).unwrap()[0], 0);
    }

    #[test]
    fn test_save_without_path() {
        let disk = DiskImage::new_empty(1).unwrap();
        assert!(matches!(disk.save(), Err(DiskError::NoBackingFile)));
    }
}
