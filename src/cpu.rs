/// Memory access interface seen by the CPU core.
///
/// Every opcode fetch, operand load and store goes through here. Reads take
/// `&mut self` because a mapped device may change state when it is read.
pub trait CpuIo {
    fn read_byte(&mut self, addr: u16) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8);

    /// Big-endian word read made of two independent byte accesses.
    fn read_word(&mut self, addr: u16) -> u16 {
        let high_byte = self.read_byte(addr) as u16;
        let low_byte = self.read_byte(addr.wrapping_add(1)) as u16;
        (high_byte << 8) | low_byte
    }

    /// Big-endian word write made of two independent byte accesses, high byte first.
    fn write_word(&mut self, addr: u16, value: u16) {
        let high_byte = ((value & 0xFF00) >> 8) as u8;
        let low_byte = (value & 0x00FF) as u8;
        self.write_byte(addr, high_byte);
        self.write_byte(addr.wrapping_add(1), low_byte);
    }
}

/// An 8-bit CPU core that drives the machine one instruction at a time.
pub trait Processor {
    fn reset(&mut self, io: &mut dyn CpuIo);

    /// Executes one instruction and returns the cycles it took.
    fn step(&mut self, io: &mut dyn CpuIo) -> u32;

    fn pc(&self) -> u16;

    fn halted(&self) -> bool {
        false
    }
}
