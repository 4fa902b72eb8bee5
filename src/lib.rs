pub mod address_map;
pub mod bus;
pub mod config;
pub mod cpu;
pub mod device;
pub mod disk;
pub mod disk_error;
pub mod dsk_image;
pub mod machine;
pub mod memory;
pub mod terminal;
pub mod utils;

pub use address_map::{AddressSpaceMap, DeviceBinding, MapError};
pub use bus::Bus;
pub use config::MachineConfig;
pub use cpu::{CpuIo, Processor};
pub use device::Device;
pub use disk::DiskController;
pub use disk_error::DiskError;
pub use dsk_image::DiskImage;
pub use machine::{Machine, MachineBuilder, MachineError};
pub use memory::Memory;
pub use terminal::{Console, Terminal};
pub use utils::hexdump;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
