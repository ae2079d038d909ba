// src/bridge/mod.rs - Serial bridge between the guest and the register bank
pub mod injection;
pub mod tokenizer;

use crate::hardware::RegisterBank;
use tokenizer::{GpioTag, TagTokenizer};

/// Guest side of the GPIO simulation.
///
/// Outbound, every byte the guest writes goes through the tag tokenizer and recognized
/// tags are applied to the bank. Inbound, the helper script is handed out exactly once.
#[derive(Debug)]
pub struct SerialBridge {
    tokenizer: TagTokenizer,
    injected: bool,
    tags_applied: u64,
}

impl SerialBridge {
    pub fn new(tag_window: usize) -> Self {
        Self {
            tokenizer: TagTokenizer::new(tag_window),
            injected: false,
            tags_applied: 0,
        }
    }

    /// Feed one byte of guest output, applying a completed tag to `bank`.
    pub fn on_guest_byte(&mut self, bank: &mut RegisterBank, byte: u8) -> Option<GpioTag> {
        let tag = self.tokenizer.feed(byte)?;
        apply_tag(bank, tag);
        self.tags_applied += 1;
        Some(tag)
    }

    pub fn on_guest_output(&mut self, bank: &mut RegisterBank, bytes: &[u8]) -> Vec<GpioTag> {
        bytes
            .iter()
            .filter_map(|b| self.on_guest_byte(bank, *b))
            .collect()
    }

    /// The injection byte stream, the first time only.
    pub fn take_injection(&mut self) -> Option<Vec<u8>> {
        if self.injected {
            return None;
        }
        self.injected = true;
        Some(injection::injection_bytes().collect())
    }

    pub fn injected(&self) -> bool {
        self.injected
    }

    pub fn tags_applied(&self) -> u64 {
        self.tags_applied
    }

    /// Forget any partial tag, e.g. when a new guest starts.
    pub fn reset(&mut self) {
        self.tokenizer.reset();
    }
}

pub fn apply_tag(bank: &mut RegisterBank, tag: GpioTag) {
    tracing::debug!("Guest tag {:?}", tag);
    match tag {
        GpioTag::Out { pin, value } => bank.digital_write(pin, value),
        GpioTag::Mode { pin, mode } => bank.set_mode(pin, mode),
    }
}
