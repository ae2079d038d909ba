//! Wire records and pin addressing (shared)

use crate::MAX_GPIO_PIN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component id that addresses the register bank itself.
pub const HOST_ID: &str = "host";

/// Ids accepted as the host when resolving wires. `rpi` is what older canvases emitted.
pub const HOST_ALIASES: [&str; 2] = [HOST_ID, "rpi"];

pub fn is_host_id(component_id: &str) -> bool {
    HOST_ALIASES.contains(&component_id)
}

/// Parse a host pin identifier (decimal BCM index) into a valid register index.
pub fn parse_host_pin(pin: &str) -> Option<u8> {
    pin.trim().parse::<u8>().ok().filter(|p| *p <= MAX_GPIO_PIN)
}

/// One end of a wire: a component pin or a host GPIO.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub component_id: String,
    pub pin: String,
}

impl PinRef {
    pub fn new(component_id: impl Into<String>, pin: impl Into<String>) -> Self {
        Self { component_id: component_id.into(), pin: pin.into() }
    }

    pub fn host(gpio: u8) -> Self {
        Self::new(HOST_ID, gpio.to_string())
    }

    pub fn is_host(&self) -> bool {
        is_host_id(&self.component_id)
    }

    /// The GPIO index when this end sits on the host header.
    pub fn host_gpio(&self) -> Option<u8> {
        if self.is_host() { parse_host_pin(&self.pin) } else { None }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component_id, self.pin)
    }
}

/// Wire colors, picked at random when a wire is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WireColor {
    #[default]
    Red,
    Blue,
    Green,
    Amber,
    Violet,
}

impl WireColor {
    pub const PALETTE: [WireColor; 5] = [
        WireColor::Red,
        WireColor::Blue,
        WireColor::Green,
        WireColor::Amber,
        WireColor::Violet,
    ];

    pub fn hex(&self) -> &'static str {
        match self {
            WireColor::Red => "#ef4444",
            WireColor::Blue => "#3b82f6",
            WireColor::Green => "#10b981",
            WireColor::Amber => "#f59e0b",
            WireColor::Violet => "#8b5cf6",
        }
    }
}

/// An undirected edge of the connectivity graph. `from`/`to` only record creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wire {
    pub id: String,
    pub from_id: String,
    pub from_pin: String,
    pub to_id: String,
    pub to_pin: String,
    pub color: WireColor,
}

impl Wire {
    pub fn new(id: impl Into<String>, from: PinRef, to: PinRef, color: WireColor) -> Self {
        Self {
            id: id.into(),
            from_id: from.component_id,
            from_pin: from.pin,
            to_id: to.component_id,
            to_pin: to.pin,
            color,
        }
    }

    pub fn from_ref(&self) -> PinRef {
        PinRef::new(&self.from_id, &self.from_pin)
    }

    pub fn to_ref(&self) -> PinRef {
        PinRef::new(&self.to_id, &self.to_pin)
    }

    /// Whether either end belongs to `component_id`.
    pub fn touches(&self, component_id: &str) -> bool {
        self.from_id == component_id || self.to_id == component_id
    }

    /// The end opposite to `component_id`, as `(component_id, pin)`.
    pub fn other_end(&self, component_id: &str) -> Option<(&str, &str)> {
        if self.from_id == component_id {
            Some((&self.to_id, &self.to_pin))
        } else if self.to_id == component_id {
            Some((&self.from_id, &self.from_pin))
        } else {
            None
        }
    }

    /// GPIO index of the host end facing `component_id`, if that end is the host.
    pub fn host_pin_facing(&self, component_id: &str) -> Option<u8> {
        match self.other_end(component_id) {
            Some((id, pin)) if is_host_id(id) => parse_host_pin(pin),
            _ => None,
        }
    }
}
