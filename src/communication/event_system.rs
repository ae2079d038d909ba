// src/communication/event_system.rs - Session events and one-shot timers
//
// Everything that happens to a session arrives as a `SessionEvent` on one unbounded
// channel and is handled in order on a single task. Background work (guest readers,
// timers) only ever sends events; it never touches session state.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

/// Something the guest did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestEvent {
    /// The guest is up and its serial channel accepts input.
    Ready,
    /// Bytes the guest wrote to its serial output.
    Output(Vec<u8>),
    /// The serial channel closed.
    Exited(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One keystroke typed into the terminal.
    Key(u8),
    Guest(GuestEvent),
    /// The delayed automatic boot is due.
    BootDue,
    /// The settle delay after guest readiness has elapsed.
    InjectionDue,
    /// Apply register writes queued by pin listeners.
    RunDeferred,
    Shutdown,
}

pub type EventSender = UnboundedSender<SessionEvent>;
pub type EventReceiver = UnboundedReceiver<SessionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    unbounded_channel()
}

/// Deliver `event` once after `delay`, unless cancelled first.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct OneShotTimer {
    handle: JoinHandle<()>,
}

impl OneShotTimer {
    pub fn schedule(delay: Duration, events: EventSender, event: SessionEvent) -> Self {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            tracing::trace!("Timer fired after {:?}: {:?}", delay, event);
            if events.send(event).is_err() {
                tracing::debug!("Timer fired after the session went away");
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
