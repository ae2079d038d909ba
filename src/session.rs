// src/session.rs - Simulation context: the register bank and everything lent it
//
// One session owns one bank. The workbench, the console and the bridge inside it only
// ever borrow the bank for the duration of a single event.

use crate::communication::event_system::{EventReceiver, EventSender, SessionEvent};
use crate::config::Config;
use crate::console::Console;
use crate::console::terminal::TerminalSink;
use crate::guest::GuestLauncher;
use crate::hardware::RegisterBank;
use crate::workbench::Workbench;

#[derive(Debug)]
pub struct Session {
    bank: RegisterBank,
    workbench: Workbench,
    console: Console,
    events: EventSender,
}

impl Session {
    pub fn new(
        config: &Config,
        sink: Box<dyn TerminalSink>,
        launcher: Box<dyn GuestLauncher>,
        events: EventSender,
    ) -> Self {
        let mut bank = RegisterBank::new();
        let workbench = Workbench::new(config.board.model, &bank);
        let console = Console::new(config.console.clone(), sink, launcher, events.clone());
        Self { bank, workbench, console, events }
    }

    pub fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    pub fn workbench_mut(&mut self) -> &mut Workbench {
        &mut self.workbench
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Borrow the bank alongside the workbench, for gestures that drive pins.
    pub fn workbench_and_bank(&mut self) -> (&mut Workbench, &mut RegisterBank) {
        (&mut self.workbench, &mut self.bank)
    }

    pub fn start(&mut self) {
        self.console.start();
    }

    /// Handle one event. Returns `false` once the session should stop.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Key(byte) => self.console.on_key(byte, &mut self.bank),
            SessionEvent::Guest(guest) => self.console.on_guest_event(guest, &mut self.bank),
            SessionEvent::BootDue => {
                self.console.request_boot();
            }
            SessionEvent::InjectionDue => self.console.inject(),
            SessionEvent::RunDeferred => {
                self.bank.run_deferred();
            }
            SessionEvent::Shutdown => {
                self.console.dispose();
                return false;
            }
        }
        self.schedule_deferred();
        true
    }

    /// Listener writes run on the next turn of the loop, never inside the current one.
    pub fn schedule_deferred(&self) {
        if self.bank.pending_actions() > 0 && self.events.send(SessionEvent::RunDeferred).is_err() {
            tracing::debug!("Session loop gone, dropping deferred GPIO actions");
        }
    }

    /// Process events until shutdown or until every sender is gone.
    pub async fn run(&mut self, events: &mut EventReceiver) {
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        self.console.dispose();
        tracing::info!("Session ended");
    }
}
