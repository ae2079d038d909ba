// src/console/terminal.rs - Where console text ends up
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Output surface of the console.
pub trait TerminalSink {
    fn write(&mut self, text: &str);

    fn writeln(&mut self, line: &str) {
        self.write(line);
        self.write("\n");
    }

    fn clear(&mut self);
}

/// Writes to the process's stdout, ANSI clear included.
#[derive(Debug, Default)]
pub struct StdoutTerminal;

impl TerminalSink for StdoutTerminal {
    fn write(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!("Terminal write failed: {}", e);
        }
    }

    fn clear(&mut self) {
        self.write("\x1b[2J\x1b[H");
    }
}

/// In-memory terminal. Clones share the same buffer, so one can be handed to the
/// console while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct BufferTerminal {
    contents: Rc<RefCell<String>>,
}

impl BufferTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.contents.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents.borrow().lines().map(str::to_string).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents.borrow().contains(needle)
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut *self.contents.borrow_mut())
    }
}

impl TerminalSink for BufferTerminal {
    fn write(&mut self, text: &str) {
        self.contents.borrow_mut().push_str(text);
    }

    fn clear(&mut self) {
        self.contents.borrow_mut().clear();
    }
}
