use std::fmt::Debug;

/// A peripheral occupying a window of the address space.
///
/// Offsets are zero-based within the window. What each offset means is up to
/// the device; the bus only forwards the access.
pub trait Device: Debug {
    fn name(&self) -> &str;

    /// Number of addresses the device claims.
    fn window_size(&self) -> u32;

    fn read(&mut self, offset: u16) -> u8;
    fn write(&mut self, offset: u16, value: u8);

    fn reset(&mut self) {}
}
