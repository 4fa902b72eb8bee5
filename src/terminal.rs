use std::{
    cell::RefCell,
    collections::VecDeque,
    io::Write,
    rc::Rc,
};

use derivative::Derivative;

use crate::device::Device;

pub const TERMINAL_WINDOW_SIZE: u32 = 1;

/// Host side of the terminal: feeds keystrokes in and collects output.
#[derive(Debug, Clone, Default)]
pub struct Console {
    input: Rc<RefCell<VecDeque<u8>>>,
    output: Rc<RefCell<Vec<u8>>>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&self, bytes: &[u8]) {
        self.input.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn push_str(&self, text: &str) {
        self.push_input(text.as_bytes());
    }

    pub fn pending_input(&self) -> usize {
        self.input.borrow().len()
    }

    /// Drains everything the machine has printed so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }
}

/// Character device with a single data register.
///
/// Reading pops one pending input byte (0x00 when none is waiting); writing
/// emits one output byte.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Terminal {
    console: Console,
    #[derivative(Debug = "ignore")]
    echo: Option<Box<dyn Write>>,
}

impl Terminal {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            echo: None,
        }
    }

    /// Also copies every output byte to `sink`, e.g. the host's stdout.
    pub fn with_echo(mut self, sink: Box<dyn Write>) -> Self {
        self.echo = Some(sink);
        self
    }

    pub fn console(&self) -> Console {
        self.console.clone()
    }
}

impl Device for Terminal {
    fn name(&self) -> &str {
        "terminal"
    }

    fn window_size(&self) -> u32 {
        TERMINAL_WINDOW_SIZE
    }

    fn read(&mut self, offset: u16) -> u8 {
        if offset != 0 {
            return 0xFF;
        }
        self.console.input.borrow_mut().pop_front().unwrap_or(0x00)
    }

    fn write(&mut self, offset: u16, value: u8) {
        if offset != 0 {
            return;
        }

        self.console.output.borrow_mut().push(value);
        if let Some(sink) = &mut self.echo {
            if let Err(err) = sink.write_all(&[value]).and_then(|_| sink.flush()) {
                tracing::warn!("[TTY] Echo failed: {}", err);
            }
        }
    }

    fn reset(&mut self) {
        self.console.input.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_consume_input() {
        let mut terminal = Terminal::new(Console::new());
        let console = terminal.console();
        console.push_str("ok");

        assert_eq!(terminal.read(0), b'o');
        assert_eq!(console.pending_input(), 1);
        assert_eq!(terminal.read(0), b'k');
        assert_eq!(terminal.read(0), 0x00);
    }

    #[test]
    fn test_writes_reach_console_and_echo() {
        let sink = Shared::default();
        let mut terminal = Terminal::new(Console::new()).with_echo(Box::new(sink.clone()));
        let console = terminal.console();

        for &b in b"hi\r\n" {
            terminal.write(0, b);
        }

        assert_eq!(console.output_string(), "hi\r\n");
        assert!(console.take_output().is_empty());
        assert_eq!(&*sink.0.borrow(), b"hi\r\n");
    }
}
