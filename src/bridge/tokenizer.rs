//! Incremental recognizer for the guest's GPIO tags.
//!
//! Recognizes, anywhere in the guest's serial output:
//!
//! ```text
//! [GPIO_OUT: <digits> <digits>]
//! [GPIO_MODE: <digits> <word>]
//! ```
//!
//! Markers are case-sensitive and separated by exactly one space. The tokenizer only
//! remembers the bytes since the most recent `[`, and gives up on a candidate once it
//! spans more than `window` bytes, so a tag is recognized iff it fits inside the last
//! `window` bytes of output. Each byte costs O(1) and memory is a fixed handful of
//! integers regardless of the window. A recognized tag resets the tokenizer, so nothing
//! before it can take part in a later match.

use piforge_shared::PinMode;

pub const DEFAULT_TAG_WINDOW: usize = 100;

const OUT_MARKER: &[u8] = b"[GPIO_OUT: ";
const MODE_MARKER: &[u8] = b"[GPIO_MODE: ";
/// Length of `[GPIO_`, shared by both markers.
const COMMON_PREFIX: usize = 6;
/// Longest mode word worth remembering (`OUT`, `PWM`).
const MAX_MODE_WORD: usize = 3;

/// A complete tag emitted by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioTag {
    Out { pin: u8, value: u8 },
    Mode { pin: u8, mode: PinMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Out,
    Mode,
}

impl TagKind {
    fn marker(self) -> &'static [u8] {
        match self {
            TagKind::Out => OUT_MARKER,
            TagKind::Mode => MODE_MARKER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Marker { kind: Option<TagKind>, matched: usize },
    Pin { kind: TagKind, pin: u32, digits: usize },
    Value { pin: u32, value: u32, digits: usize },
    Word { pin: u32, word: [u8; MAX_MODE_WORD], len: usize },
}

#[derive(Debug, Clone)]
pub struct TagTokenizer {
    state: State,
    window: usize,
    /// Bytes consumed since the `[` that opened the current candidate, inclusive.
    span: usize,
}

impl TagTokenizer {
    pub fn new(window: usize) -> Self {
        Self { state: State::Idle, window, span: 0 }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether a partial tag is currently being tracked.
    pub fn in_tag(&self) -> bool {
        self.state != State::Idle
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.span = 0;
    }

    /// Consume one byte of guest output.
    pub fn feed(&mut self, byte: u8) -> Option<GpioTag> {
        if byte == b'[' {
            self.state = State::Marker { kind: None, matched: 1 };
            self.span = 1;
            return None;
        }
        if self.state == State::Idle {
            return None;
        }
        self.span += 1;
        if self.span > self.window {
            self.reset();
            return None;
        }

        let (next, tag) = self.step(byte);
        self.state = next;
        if tag.is_some() || next == State::Idle {
            self.span = 0;
        }
        tag
    }

    /// Consume a chunk of output, returning every tag completed inside it.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<GpioTag> {
        bytes.iter().filter_map(|b| self.feed(*b)).collect()
    }

    fn step(&self, byte: u8) -> (State, Option<GpioTag>) {
        match self.state {
            State::Idle => (State::Idle, None),
            State::Marker { kind, matched } => match (kind, matched) {
                (None, COMMON_PREFIX) => match byte {
                    b'O' => (State::Marker { kind: Some(TagKind::Out), matched: matched + 1 }, None),
                    b'M' => (State::Marker { kind: Some(TagKind::Mode), matched: matched + 1 }, None),
                    _ => (State::Idle, None),
                },
                (None, _) if OUT_MARKER[matched] == byte => {
                    (State::Marker { kind: None, matched: matched + 1 }, None)
                }
                (Some(kind), _) if kind.marker()[matched] == byte => {
                    if matched + 1 == kind.marker().len() {
                        (State::Pin { kind, pin: 0, digits: 0 }, None)
                    } else {
                        (State::Marker { kind: Some(kind), matched: matched + 1 }, None)
                    }
                }
                _ => (State::Idle, None),
            },
            State::Pin { kind, pin, digits } => match byte {
                b'0'..=b'9' => (State::Pin { kind, pin: push_digit(pin, byte), digits: digits + 1 }, None),
                b' ' if digits > 0 => match kind {
                    TagKind::Out => (State::Value { pin, value: 0, digits: 0 }, None),
                    TagKind::Mode => (State::Word { pin, word: [0; MAX_MODE_WORD], len: 0 }, None),
                },
                _ => (State::Idle, None),
            },
            State::Value { pin, value, digits } => match byte {
                b'0'..=b'9' => (
                    State::Value { pin, value: push_digit(value, byte), digits: digits + 1 },
                    None,
                ),
                b']' if digits > 0 => (State::Idle, out_tag(pin, value)),
                _ => (State::Idle, None),
            },
            State::Word { pin, mut word, len } => match byte {
                b if b.is_ascii_alphanumeric() || b == b'_' => {
                    if let Some(slot) = word.get_mut(len) {
                        *slot = b;
                    }
                    (State::Word { pin, word, len: len + 1 }, None)
                }
                b']' if len > 0 => (State::Idle, mode_tag(pin, &word, len)),
                _ => (State::Idle, None),
            },
        }
    }
}

impl Default for TagTokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_WINDOW)
    }
}

fn push_digit(acc: u32, byte: u8) -> u32 {
    acc.saturating_mul(10).saturating_add(u32::from(byte - b'0'))
}

fn out_tag(pin: u32, value: u32) -> Option<GpioTag> {
    let Ok(pin) = u8::try_from(pin) else {
        tracing::trace!("Dropping GPIO_OUT tag for out-of-range pin {}", pin);
        return None;
    };
    Some(GpioTag::Out { pin, value: u8::from(value != 0) })
}

fn mode_tag(pin: u32, word: &[u8; MAX_MODE_WORD], len: usize) -> Option<GpioTag> {
    let Ok(pin) = u8::try_from(pin) else {
        tracing::trace!("Dropping GPIO_MODE tag for out-of-range pin {}", pin);
        return None;
    };
    if len > MAX_MODE_WORD {
        tracing::trace!("Dropping GPIO_MODE tag with unknown mode for pin {}", pin);
        return None;
    }
    let mode = std::str::from_utf8(&word[..len]).ok()?.parse::<PinMode>();
    match mode {
        Ok(mode) => Some(GpioTag::Mode { pin, mode }),
        Err(e) => {
            tracing::trace!("Dropping GPIO_MODE tag for pin {}: {}", pin, e);
            None
        }
    }
}
