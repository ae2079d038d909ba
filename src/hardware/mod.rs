// src/hardware/mod.rs - GPIO register bank
//
// The bank is the only place hardware state lives. It is explicitly constructed and
// owned by the session, then lent (`&mut`) to whoever needs to drive it: the workbench,
// the pseudo-shell and the serial bridge.

use crate::communication::pin_events::{ActionQueue, PinAction, PinChange, PinEventBus};
use piforge_shared::{GPIO_PIN_COUNT, MAX_DUTY_CYCLE, PinMode, PinSnapshot, PinState};
use std::rc::Rc;

/// Register bank for BCM pins 0..=27.
///
/// Every operation on an out-of-range pin, and every write that does not match the
/// pin's mode, is a silent no-op: callers cannot tell the two apart. Rejections are
/// only visible at `trace` log level.
#[derive(Debug)]
pub struct RegisterBank {
    pins: [PinState; GPIO_PIN_COUNT],
    events: PinEventBus,
    deferred: ActionQueue,
    /// Bumped by every accepted mutation, mode changes included.
    revision: u64,
}

impl RegisterBank {
    /// All registers start in mode IN with value 0.
    pub fn new() -> Self {
        Self {
            pins: [PinState::default(); GPIO_PIN_COUNT],
            events: PinEventBus::new(),
            deferred: ActionQueue::new(),
            revision: 0,
        }
    }

    fn register_mut(&mut self, pin: u8) -> Option<&mut PinState> {
        self.pins.get_mut(pin as usize)
    }

    pub fn set_mode(&mut self, pin: u8, mode: PinMode) {
        match self.register_mut(pin) {
            Some(state) => {
                state.mode = mode;
                self.revision += 1;
                tracing::debug!("GPIO{} set to {} mode", pin, mode);
            }
            None => tracing::trace!("Ignoring set_mode on invalid GPIO{}", pin),
        }
    }

    /// Drive an OUT pin. Any non-zero `value` drives the pin high.
    pub fn digital_write(&mut self, pin: u8, value: u8) {
        let value = u8::from(value != 0);
        let Some(state) = self.register_mut(pin) else {
            tracing::trace!("Ignoring digital_write on invalid GPIO{}", pin);
            return;
        };
        if state.mode != PinMode::Out {
            tracing::trace!("Ignoring digital_write on GPIO{} in {} mode", pin, state.mode);
            return;
        }
        state.value = value;
        tracing::debug!("GPIO{} set to {}", pin, value);
        self.revision += 1;
        self.notify(PinChange { pin, value });
    }

    /// Drive an IN pin from outside the board (a button pulling the line).
    ///
    /// Mirror image of [`RegisterBank::digital_write`]: accepted only in mode IN, and
    /// notifies listeners the same way.
    pub fn drive_input(&mut self, pin: u8, value: u8) {
        let value = u8::from(value != 0);
        let Some(state) = self.register_mut(pin) else {
            tracing::trace!("Ignoring drive_input on invalid GPIO{}", pin);
            return;
        };
        if state.mode != PinMode::In {
            tracing::trace!("Ignoring drive_input on GPIO{} in {} mode", pin, state.mode);
            return;
        }
        state.value = value;
        tracing::debug!("GPIO{} input driven to {}", pin, value);
        self.revision += 1;
        self.notify(PinChange { pin, value });
    }

    /// Current value of a pin, whatever its mode. Invalid pins read as 0.
    pub fn digital_read(&self, pin: u8) -> u8 {
        self.pins.get(pin as usize).map_or(0, |state| state.value)
    }

    /// Set the duty cycle of a PWM pin (clamped to 100) and derive its digital value.
    pub fn set_pwm(&mut self, pin: u8, duty: u8) {
        let duty = duty.min(MAX_DUTY_CYCLE);
        let Some(state) = self.register_mut(pin) else {
            tracing::trace!("Ignoring set_pwm on invalid GPIO{}", pin);
            return;
        };
        if state.mode != PinMode::Pwm {
            tracing::trace!("Ignoring set_pwm on GPIO{} in {} mode", pin, state.mode);
            return;
        }
        state.duty_cycle = Some(duty);
        state.value = u8::from(duty > 0);
        tracing::debug!("GPIO{} PWM set to {}%", pin, duty);
        self.revision += 1;
        self.notify(PinChange { pin, value: duty });
    }

    /// Register a listener for accepted writes on `pin`.
    ///
    /// Listeners run synchronously in registration order. They cannot touch the bank;
    /// writes they want to make go through the [`ActionQueue`] and are applied by
    /// [`RegisterBank::run_deferred`].
    pub fn on_pin_change<F>(&mut self, pin: u8, listener: F)
    where
        F: Fn(&PinChange, &mut ActionQueue) + 'static,
    {
        if !self.events.subscribe(pin, Rc::new(listener)) {
            tracing::trace!("Ignoring listener for invalid GPIO{}", pin);
        }
    }

    /// Counter of accepted mutations. Two equal readings mean no register changed in
    /// between, though listeners are only told about value and duty writes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn listener_count(&self, pin: u8) -> usize {
        self.events.listener_count(pin)
    }

    pub fn pin_state(&self, pin: u8) -> Option<PinState> {
        self.pins.get(pin as usize).copied()
    }

    /// Every register with its index, in pin order.
    pub fn all_pins(&self) -> Vec<PinSnapshot> {
        self.pins
            .iter()
            .enumerate()
            .map(|(pin, state)| PinSnapshot { pin: pin as u8, state: *state })
            .collect()
    }

    pub fn apply(&mut self, action: PinAction) {
        match action {
            PinAction::SetMode { pin, mode } => self.set_mode(pin, mode),
            PinAction::DigitalWrite { pin, value } => self.digital_write(pin, value),
            PinAction::SetPwm { pin, duty } => self.set_pwm(pin, duty),
        }
    }

    pub fn pending_actions(&self) -> usize {
        self.deferred.len()
    }

    /// Apply the writes listeners queued during previous turns.
    ///
    /// Only actions queued before this call are applied; anything their notifications
    /// queue waits for the next call. Returns how many actions ran.
    pub fn run_deferred(&mut self) -> usize {
        let batch = self.deferred.take();
        let count = batch.len();
        for action in batch {
            self.apply(action);
        }
        if count > 0 {
            tracing::trace!("Applied {} deferred GPIO action(s)", count);
        }
        count
    }

    fn notify(&mut self, change: PinChange) {
        self.events.dispatch(change, &mut self.deferred);
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}
