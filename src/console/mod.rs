// src/console/mod.rs - Terminal session: local pseudo-shell or a booted guest
//
// The console starts in MOCK mode, answering commands itself. A boot request (manual or
// the delayed autoboot) moves it to BOOTING; readiness of the guest moves it to GUEST,
// where keystrokes go to the guest and the guest's output feeds the serial bridge. A
// failed launch or a closed link falls back to MOCK.

pub mod shell;
pub mod terminal;

use crate::bridge::SerialBridge;
use crate::communication::event_system::{EventSender, GuestEvent, OneShotTimer, SessionEvent};
use crate::config::ConsoleConfig;
use crate::guest::{GuestLauncher, GuestLink};
use crate::hardware::RegisterBank;
use shell::ShellReply;
use std::fmt;
use terminal::TerminalSink;

pub const BANNER: [&str; 8] = [
    "SYSINIT: [OK] PIFORGE CORE",
    "╔════════════════════════════════════════════════════════╗",
    "║ PIFORGE TERMINAL v0.2.0                                ║",
    "║ TYPE \"gpio-help\" FOR HARDWARE COMMANDS                 ║",
    "║                                                        ║",
    "║ STATUS: SYSTEM_READY                                   ║",
    "╚════════════════════════════════════════════════════════╝",
    "",
];

const KEY_BACKSPACE: u8 = 8;
const KEY_LF: u8 = b'\n';
const KEY_CR: u8 = b'\r';
const KEY_DEL: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    Mock,
    Booting,
    Guest,
}

impl fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleMode::Mock => "MOCK",
            ConsoleMode::Booting => "BOOTING",
            ConsoleMode::Guest => "GUEST",
        };
        f.write_str(name)
    }
}

pub struct Console {
    mode: ConsoleMode,
    settings: ConsoleConfig,
    /// Echo typed characters back. Off when the host terminal already echoes.
    echo_input: bool,
    line: String,
    /// The previous keystroke was CR, so an LF right after it belongs to the same line end.
    after_cr: bool,
    /// Trailing bytes of a UTF-8 sequence the guest has not finished sending.
    pending_utf8: Vec<u8>,
    sink: Box<dyn TerminalSink>,
    bridge: SerialBridge,
    launcher: Box<dyn GuestLauncher>,
    link: Option<Box<dyn GuestLink>>,
    events: EventSender,
    boot_timer: Option<OneShotTimer>,
    injection_timer: Option<OneShotTimer>,
    autoboot_scheduled: bool,
}

impl Console {
    pub fn new(
        settings: ConsoleConfig,
        sink: Box<dyn TerminalSink>,
        launcher: Box<dyn GuestLauncher>,
        events: EventSender,
    ) -> Self {
        Self {
            mode: ConsoleMode::Mock,
            bridge: SerialBridge::new(settings.tag_window),
            settings,
            echo_input: true,
            line: String::new(),
            after_cr: false,
            pending_utf8: Vec::new(),
            sink,
            launcher,
            link: None,
            events,
            boot_timer: None,
            injection_timer: None,
            autoboot_scheduled: false,
        }
    }

    pub fn set_echo_input(&mut self, echo: bool) {
        self.echo_input = echo;
    }

    pub fn mode(&self) -> ConsoleMode {
        self.mode
    }

    pub fn bridge(&self) -> &SerialBridge {
        &self.bridge
    }

    /// Print the banner and prompt, and arm the delayed autoboot when configured.
    pub fn start(&mut self) {
        for line in BANNER {
            self.sink.writeln(line);
        }
        self.prompt();
        if self.settings.autoboot && !self.autoboot_scheduled {
            self.autoboot_scheduled = true;
            tracing::debug!("Autoboot in {:?}", self.settings.boot_delay());
            self.boot_timer = Some(OneShotTimer::schedule(
                self.settings.boot_delay(),
                self.events.clone(),
                SessionEvent::BootDue,
            ));
        }
    }

    /// Boot the guest, unless one is already booting or running.
    pub fn request_boot(&mut self) -> bool {
        if self.mode != ConsoleMode::Mock {
            tracing::debug!("Ignoring boot request in {} mode", self.mode);
            return false;
        }
        self.boot_timer = None;
        self.mode = ConsoleMode::Booting;
        self.sink.writeln(">>> BOOTING PIFORGE OS <<<");
        tracing::info!("Booting guest via {}", self.launcher.describe());

        match self.launcher.launch(self.events.clone()) {
            Ok(link) => {
                self.bridge.reset();
                self.link = Some(link);
                true
            }
            Err(e) => {
                tracing::warn!("Guest init failed: {}", e);
                self.sink.writeln(&format!("ERR: GUEST INIT FAILED: {}", e));
                self.mode = ConsoleMode::Mock;
                self.prompt();
                false
            }
        }
    }

    pub fn on_guest_event(&mut self, event: GuestEvent, bank: &mut RegisterBank) {
        match event {
            GuestEvent::Ready => {
                if self.link.is_none() {
                    return;
                }
                self.sink.writeln("EMULATOR: [OK] READY");
                self.mode = ConsoleMode::Guest;
                tracing::info!("Guest ready, injecting helpers in {:?}", self.settings.injection_delay());
                if !self.bridge.injected() && self.injection_timer.is_none() {
                    self.injection_timer = Some(OneShotTimer::schedule(
                        self.settings.injection_delay(),
                        self.events.clone(),
                        SessionEvent::InjectionDue,
                    ));
                }
            }
            GuestEvent::Output(bytes) => {
                if self.link.is_none() {
                    return;
                }
                self.echo_guest(&bytes);
                self.bridge.on_guest_output(bank, &bytes);
            }
            GuestEvent::Exited(reason) => {
                if self.link.is_none() {
                    return;
                }
                match &reason {
                    Some(reason) => tracing::warn!("Guest exited: {}", reason),
                    None => tracing::info!("Guest exited"),
                }
                self.teardown_guest();
                self.sink.writeln("");
                self.sink.writeln("EMULATOR: GUEST EXITED");
                self.prompt();
            }
        }
    }

    /// Send the helper script to the guest. Runs at most once per console.
    pub fn inject(&mut self) {
        self.injection_timer = None;
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let Some(bytes) = self.bridge.take_injection() else {
            return;
        };
        tracing::info!("Injecting {} bytes of GPIO helpers", bytes.len());
        if let Err(e) = link.send(&bytes) {
            tracing::error!("Injection failed: {}", e);
        }
    }

    /// One keystroke from the user.
    pub fn on_key(&mut self, byte: u8, bank: &mut RegisterBank) {
        if self.mode != ConsoleMode::Mock {
            if let Some(link) = self.link.as_mut() {
                if let Err(e) = link.send(&[byte]) {
                    tracing::debug!("Dropping keystroke: {}", e);
                }
            }
            return;
        }
        let after_cr = std::mem::replace(&mut self.after_cr, byte == KEY_CR);
        if byte == KEY_LF && after_cr {
            return;
        }
        match byte {
            KEY_CR | KEY_LF => {
                self.sink.writeln("");
                let line = std::mem::take(&mut self.line);
                if self.run_line(&line, bank) {
                    self.prompt();
                }
            }
            KEY_DEL | KEY_BACKSPACE => {
                if self.line.pop().is_some() && self.echo_input {
                    self.sink.write("\u{8} \u{8}");
                }
            }
            b if b.is_ascii_graphic() || b == b' ' => {
                self.line.push(char::from(b));
                if self.echo_input {
                    self.sink.write(&char::from(b).to_string());
                }
            }
            _ => tracing::trace!("Ignoring control byte {:#04x}", byte),
        }
    }

    /// Returns whether the prompt is still owed.
    fn run_line(&mut self, line: &str, bank: &mut RegisterBank) -> bool {
        match shell::execute(line, bank) {
            ShellReply::Lines(lines) => {
                for line in lines {
                    self.sink.writeln(&line);
                }
            }
            ShellReply::Clear => self.sink.clear(),
            // A failed boot prints its own prompt.
            ShellReply::Boot => {
                self.request_boot();
                return false;
            }
        }
        true
    }

    /// Echo guest output, holding back a multi-byte character split across reads.
    fn echo_guest(&mut self, bytes: &[u8]) {
        self.pending_utf8.extend_from_slice(bytes);
        let complete = complete_utf8_len(&self.pending_utf8);
        if complete == 0 {
            return;
        }
        let text = String::from_utf8_lossy(&self.pending_utf8[..complete]).into_owned();
        self.pending_utf8.drain(..complete);
        self.sink.write(&text);
    }

    fn prompt(&mut self) {
        if self.mode == ConsoleMode::Mock {
            let prompt = self.settings.prompt.clone();
            self.sink.write(&prompt);
        }
    }

    fn teardown_guest(&mut self) {
        self.injection_timer = None;
        self.pending_utf8.clear();
        if let Some(mut link) = self.link.take() {
            link.shutdown();
        }
        self.mode = ConsoleMode::Mock;
    }

    /// Cancel pending timers and stop the guest.
    pub fn dispose(&mut self) {
        self.boot_timer = None;
        self.teardown_guest();
        tracing::debug!("Console disposed");
    }
}

/// Length of `bytes` without a trailing, still incomplete UTF-8 sequence.
///
/// Invalid bytes count as complete; lossy decoding replaces them.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let byte = bytes[i];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if bytes.len() - i < needed { i } else { bytes.len() };
    }
    bytes.len()
}

impl Drop for Console {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("mode", &self.mode)
            .field("line", &self.line)
            .field("guest", &self.link.is_some())
            .finish()
    }
}
