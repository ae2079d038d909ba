// piforge_shared: shared types for the register bank, the workbench and the serial bridge

pub mod board_config;
pub mod components;
pub mod wiring;

pub use board_config::BoardModel;
pub use components::{ComponentKind, ComponentType, LedColor};
pub use wiring::{PinRef, Wire, WireColor};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of addressable GPIO registers (BCM 0..=27).
pub const GPIO_PIN_COUNT: usize = 28;

/// Highest valid BCM index.
pub const MAX_GPIO_PIN: u8 = (GPIO_PIN_COUNT - 1) as u8;

/// Largest PWM duty cycle, in percent.
pub const MAX_DUTY_CYCLE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown pin mode: {0}")]
    PinMode(String),
    #[error("unknown board model: {0}")]
    BoardModel(String),
    #[error("unknown component type: {0}")]
    ComponentType(String),
    #[error("unknown LED color: {0}")]
    LedColor(String),
}

/// Direction/function of a GPIO register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinMode {
    #[default]
    In,
    Out,
    Pwm,
}

impl PinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinMode::In => "IN",
            PinMode::Out => "OUT",
            PinMode::Pwm => "PWM",
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinMode {
    type Err = ParseError;

    /// Case-insensitive: `out`, `Out` and `OUT` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(PinMode::In),
            "OUT" => Ok(PinMode::Out),
            "PWM" => Ok(PinMode::Pwm),
            _ => Err(ParseError::PinMode(s.to_string())),
        }
    }
}

/// Contents of one register.
///
/// `duty_cycle` stays `None` until the first accepted PWM write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinState {
    pub mode: PinMode,
    pub value: u8,
    pub duty_cycle: Option<u8>,
}

impl PinState {
    /// Whether the pin is currently driven high, either digitally or by a non-zero duty cycle.
    pub fn is_high(&self) -> bool {
        self.value != 0
    }
}

/// A register together with its BCM index, as listed by `gpio-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSnapshot {
    pub pin: u8,
    #[serde(flatten)]
    pub state: PinState,
}

/// 2D canvas coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}
