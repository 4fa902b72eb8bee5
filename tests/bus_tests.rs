use std::{cell::RefCell, rc::Rc};

use sidforth::{
    AddressSpaceMap, Bus, Console, CpuIo, Device, DeviceBinding, MapError, Memory, Terminal,
};
use tracing_subscriber::fmt;

#[ctor::ctor]
fn init() {
    let fmt_subscriber = fmt::Subscriber::builder()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(fmt_subscriber)
        .expect("Unable to set global tracing subscriber");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read(u16),
    Write(u16, u8),
}

/// Device that records every access and answers reads from a counter.
#[derive(Debug)]
struct Probe {
    name: &'static str,
    size: u32,
    log: Rc<RefCell<Vec<Access>>>,
    next: u8,
}

impl Probe {
    fn new(name: &'static str, size: u32) -> (Self, Rc<RefCell<Vec<Access>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = Probe {
            name,
            size,
            log: log.clone(),
            next: 0x80,
        };
        (probe, log)
    }
}

impl Device for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn window_size(&self) -> u32 {
        self.size
    }

    fn read(&mut self, offset: u16) -> u8 {
        self.log.borrow_mut().push(Access::Read(offset));
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }

    fn write(&mut self, offset: u16, value: u8) {
        self.log.borrow_mut().push(Access::Write(offset, value));
    }
}

fn stock_bus() -> (Bus, Rc<RefCell<Vec<Access>>>, Rc<RefCell<Vec<Access>>>) {
    let (disk, disk_log) = Probe::new("disk", 16);
    let (tty, tty_log) = Probe::new("terminal", 1);
    let map = AddressSpaceMap::new(vec![
        DeviceBinding::new(0xFF00, Box::new(disk)),
        DeviceBinding::new(0xFF10, Box::new(tty)),
    ])
    .unwrap();
    (Bus::new(Memory::new(), map), disk_log, tty_log)
}

#[test]
fn test_device_window_offsets() {
    let (mut bus, disk_log, tty_log) = stock_bus();

    for addr in 0xFF00..=0xFF0F_u16 {
        bus.write_byte(addr, addr as u8);
        bus.read_byte(addr);
    }

    let expected: Vec<Access> = (0..16u16)
        .flat_map(|offset| [Access::Write(offset, offset as u8), Access::Read(offset)])
        .collect();
    assert_eq!(*disk_log.borrow(), expected);
    assert!(tty_log.borrow().is_empty());
}

#[test]
fn test_plain_memory_outside_windows() {
    let (mut bus, disk_log, tty_log) = stock_bus();

    for addr in [0x0000, 0x1234, 0xFEFF, 0xFF11, 0xFFFE, 0xFFFF] {
        bus.write_byte(addr, 0x5A);
        assert_eq!(bus.read_byte(addr), 0x5A);
        assert_eq!(bus.device_at(addr), None);
    }

    assert!(disk_log.borrow().is_empty());
    assert!(tty_log.borrow().is_empty());
}

#[test]
fn test_device_writes_leave_memory_untouched() {
    let (mut bus, _disk_log, _tty_log) = stock_bus();

    bus.write_byte(0xFF05, 0x00);
    bus.write_byte(0xFF10, 0x00);

    assert_eq!(bus.memory().read_byte(0xFF05), 0xFF);
    assert_eq!(bus.memory().read_byte(0xFF10), 0xFF);
}

#[test]
fn test_overlap_rejected_before_access() {
    let (disk, _) = Probe::new("disk", 16);
    let (tty, _) = Probe::new("terminal", 1);

    let result = AddressSpaceMap::new(vec![
        DeviceBinding::new(0xFF10, Box::new(tty)),
        DeviceBinding::new(0xFF08, Box::new(disk)),
    ]);

    match result {
        Err(MapError::Overlap { first, second, .. }) => {
            assert_eq!(first, "disk");
            assert_eq!(second, "terminal");
        }
        other => panic!("expected overlap, got {:?}", other),
    }
}

#[test]
fn test_reads_happen_once_per_call() {
    let (mut bus, _disk_log, tty_log) = stock_bus();

    let first = bus.read_byte(0xFF10);
    let second = bus.read_byte(0xFF10);

    assert_ne!(first, second);
    assert_eq!(*tty_log.borrow(), vec![Access::Read(0), Access::Read(0)]);
}

#[test]
fn test_terminal_input_consumed_in_order() {
    let console = Console::new();
    let map = AddressSpaceMap::new(vec![DeviceBinding::new(
        0xFF10,
        Box::new(Terminal::new(console.clone())),
    )])
    .unwrap();
    let mut bus = Bus::new(Memory::new(), map);

    console.push_str("AB");
    assert_eq!(bus.read_byte(0xFF10), b'A');
    assert_eq!(bus.read_byte(0xFF10), b'B');
    assert_eq!(bus.read_byte(0xFF10), 0x00);
}

#[test]
fn test_write_order_preserved() {
    let (mut bus, disk_log, _tty_log) = stock_bus();

    bus.write_byte(0xFF03, 0xAA);
    bus.write_byte(0xFF03, 0xBB);

    assert_eq!(
        *disk_log.borrow(),
        vec![Access::Write(3, 0xAA), Access::Write(3, 0xBB)]
    );
}

#[test]
fn test_terminal_write_scenario() {
    let (mut bus, disk_log, tty_log) = stock_bus();

    bus.write_byte(0xFF10, 0x41);
    assert_eq!(*tty_log.borrow(), vec![Access::Write(0, 0x41)]);

    bus.read_byte(0xFF00);
    assert_eq!(tty_log.borrow().len(), 1);
    assert_eq!(*disk_log.borrow(), vec![Access::Read(0)]);
}

#[test]
fn test_word_access_straddling_window() {
    let (mut bus, disk_log, tty_log) = stock_bus();
    bus.memory_mut().write_byte(0xFEFF, 0x12);

    // high byte from plain memory, low byte from the first disk register
    let word = bus.read_word(0xFEFF);
    assert_eq!(word, 0x1280);
    assert_eq!(*disk_log.borrow(), vec![Access::Read(0)]);

    // high byte to the terminal, low byte to plain memory
    bus.write_word(0xFF10, 0xCAFE);
    assert_eq!(*tty_log.borrow(), vec![Access::Write(0, 0xCA)]);
    assert_eq!(bus.memory().read_byte(0xFF10), 0xFF);
    assert_eq!(bus.memory().read_byte(0xFF11), 0xFE);
}

#[test]
fn test_write_block_routes_each_byte() {
    let (mut bus, disk_log, tty_log) = stock_bus();

    bus.write_block(0xFF0E, &[1, 2, 3, 4]);

    assert_eq!(
        *disk_log.borrow(),
        vec![Access::Write(14, 1), Access::Write(15, 2)]
    );
    assert_eq!(*tty_log.borrow(), vec![Access::Write(0, 3)]);
    assert_eq!(bus.memory().read_byte(0xFF11), 4);
}
