//! Pin-change fan-out.
//!
//! Dispatch is single-pass and non-reentrant: the listener list for a pin is
//! snapshotted before any listener runs, and listeners never get access to the
//! register bank. A listener that wants to write a register pushes a [`PinAction`]
//! onto the [`ActionQueue`] it is handed; the bank applies queued actions on the next
//! event-loop turn (see `RegisterBank::run_deferred`).

use piforge_shared::{GPIO_PIN_COUNT, PinMode};
use std::collections::VecDeque;
use std::rc::Rc;

/// Notification payload: the pin that changed and the value written.
///
/// For digital writes `value` is 0 or 1, for PWM writes it is the duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinChange {
    pub pin: u8,
    pub value: u8,
}

/// A register write requested from inside a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    SetMode { pin: u8, mode: PinMode },
    DigitalWrite { pin: u8, value: u8 },
    SetPwm { pin: u8, duty: u8 },
}

/// FIFO of writes waiting for the next turn.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: VecDeque<PinAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: PinAction) {
        self.pending.push_back(action);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take everything queued so far, leaving the queue empty for the next turn.
    pub fn take(&mut self) -> VecDeque<PinAction> {
        std::mem::take(&mut self.pending)
    }
}

pub type PinListener = Rc<dyn Fn(&PinChange, &mut ActionQueue)>;

/// Per-pin listener lists, in registration order.
pub struct PinEventBus {
    listeners: Vec<Vec<PinListener>>,
}

impl PinEventBus {
    pub fn new() -> Self {
        Self {
            listeners: (0..GPIO_PIN_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    /// Register a listener. Returns `false` (and drops it) for an invalid pin.
    pub fn subscribe(&mut self, pin: u8, listener: PinListener) -> bool {
        match self.listeners.get_mut(pin as usize) {
            Some(list) => {
                list.push(listener);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, pin: u8) -> usize {
        self.listeners.get(pin as usize).map_or(0, Vec::len)
    }

    /// Invoke every listener of `change.pin` once, in registration order.
    pub fn dispatch(&self, change: PinChange, queue: &mut ActionQueue) {
        let Some(list) = self.listeners.get(change.pin as usize) else {
            return;
        };
        let snapshot: Vec<PinListener> = list.iter().cloned().collect();
        tracing::trace!("Dispatching GPIO{}={} to {} listener(s)", change.pin, change.value, snapshot.len());
        for listener in snapshot {
            listener(&change, queue);
        }
    }
}

impl Default for PinEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PinEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total: usize = self.listeners.iter().map(Vec::len).sum();
        f.debug_struct("PinEventBus").field("listeners", &total).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_dispatch_in_registration_order() {
        let mut bus = PinEventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = log.clone();
            bus.subscribe(5, Rc::new(move |change: &PinChange, _: &mut ActionQueue| {
                log.borrow_mut().push((tag, change.value));
            }));
        }
        let mut queue = ActionQueue::new();
        bus.dispatch(PinChange { pin: 5, value: 1 }, &mut queue);
        assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_subscribe_invalid_pin() {
        let mut bus = PinEventBus::new();
        assert!(!bus.subscribe(28, Rc::new(|_: &PinChange, _: &mut ActionQueue| {})));
        assert_eq!(bus.listener_count(28), 0);
    }

    #[test]
    fn test_listener_queues_actions() {
        let mut bus = PinEventBus::new();
        bus.subscribe(3, Rc::new(|change: &PinChange, queue: &mut ActionQueue| {
            queue.push(PinAction::DigitalWrite { pin: 4, value: change.value });
        }));
        let mut queue = ActionQueue::new();
        bus.dispatch(PinChange { pin: 3, value: 1 }, &mut queue);
        assert_eq!(queue.len(), 1);
        let drained: Vec<_> = queue.take().into_iter().collect();
        assert_eq!(drained, vec![PinAction::DigitalWrite { pin: 4, value: 1 }]);
        assert!(queue.is_empty());
    }
}
