use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISK_BASE: u16 = 0xFF00;
pub const DEFAULT_TERMINAL_BASE: u16 = 0xFF10;
pub const DEFAULT_DISK_SECTORS: u16 = 1440;

/// Machine layout as read from a JSON file.
///
/// Every field is optional; the defaults describe the stock machine with a
/// disk controller at 0xFF00 and the terminal at 0xFF10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub memory: MemoryConfig,
    pub disk: Option<DiskConfig>,
    pub terminal: Option<TerminalConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub image: Option<PathBuf>,
    pub load_address: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub base: u16,
    pub image: Option<PathBuf>,
    /// Size of the blank disk used when no image is given.
    pub sectors: u16,
    pub write_protected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub base: u16,
    pub echo: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            disk: Some(DiskConfig::default()),
            terminal: Some(TerminalConfig::default()),
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_DISK_BASE,
            image: None,
            sectors: DEFAULT_DISK_SECTORS,
            write_protected: false,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_TERMINAL_BASE,
            echo: false,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid machine configuration")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading machine configuration {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_stock_machine() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.disk.unwrap().base, 0xFF00);
        assert_eq!(config.terminal.unwrap().base, 0xFF10);
    }

    #[test]
    fn test_partial_config() {
        let config = MachineConfig::from_json(
            r#"{
                "memory": { "image": "forth.bin", "load_address": 256 },
                "disk": { "write_protected": true },
                "terminal": null
            }"#,
        )
        .unwrap();

        assert_eq!(config.memory.image, Some(PathBuf::from("forth.bin")));
        assert_eq!(config.memory.load_address, 0x0100);
        let disk = config.disk.unwrap();
        assert!(disk.write_protected);
        assert_eq!(disk.base, DEFAULT_DISK_BASE);
        assert_eq!(config.terminal, None);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(MachineConfig::from_json(r#"{ "disk": { "base": "high" } }"#).is_err());
    }
}
