//! Closed catalog of placeable parts and their typed properties

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog tag of a placed part, without its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Led,
    Resistor,
    Button,
    Breadboard,
    Servo,
    Buzzer,
    Potentiometer,
    Oled,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Led,
        ComponentType::Resistor,
        ComponentType::Button,
        ComponentType::Breadboard,
        ComponentType::Servo,
        ComponentType::Buzzer,
        ComponentType::Potentiometer,
        ComponentType::Oled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComponentType::Led => "LED",
            ComponentType::Resistor => "Resistor",
            ComponentType::Button => "Button",
            ComponentType::Breadboard => "Breadboard",
            ComponentType::Servo => "Servo",
            ComponentType::Buzzer => "Buzzer",
            ComponentType::Potentiometer => "Potentiometer",
            ComponentType::Oled => "OLED",
        }
    }

    /// Pin identifiers the part exposes for wiring.
    pub fn pins(&self) -> &'static [&'static str] {
        match self {
            ComponentType::Led
            | ComponentType::Resistor
            | ComponentType::Button
            | ComponentType::Buzzer => &["p1", "p2"],
            ComponentType::Servo | ComponentType::Potentiometer => &["p1", "p2", "p3"],
            ComponentType::Oled => &["p1", "p2", "p3", "p4"],
            ComponentType::Breadboard => &[],
        }
    }

    /// Properties a freshly dropped part starts with.
    pub fn default_kind(&self) -> ComponentKind {
        match self {
            ComponentType::Led => ComponentKind::Led { color: LedColor::default() },
            ComponentType::Resistor => ComponentKind::Resistor { ohms: 220 },
            ComponentType::Button => ComponentKind::Button,
            ComponentType::Breadboard => ComponentKind::Breadboard,
            ComponentType::Servo => ComponentKind::Servo { min_angle: 0.0, max_angle: 180.0 },
            ComponentType::Buzzer => ComponentKind::Buzzer { tone_hz: 2000 },
            ComponentType::Potentiometer => ComponentKind::Potentiometer { ohms: 10_000 },
            ComponentType::Oled => ComponentKind::Oled { width: 128, height: 64 },
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::ComponentType(s.to_string()))
    }
}

/// LED body colors offered by the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LedColor {
    #[default]
    Red,
    Green,
    Blue,
    Yellow,
}

impl LedColor {
    pub fn hex(&self) -> &'static str {
        match self {
            LedColor::Red => "#ff4444",
            LedColor::Green => "#44ff44",
            LedColor::Blue => "#4444ff",
            LedColor::Yellow => "#ffff44",
        }
    }
}

impl FromStr for LedColor {
    type Err = ParseError;

    /// Accepts a color name or its hex code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [LedColor::Red, LedColor::Green, LedColor::Blue, LedColor::Yellow]
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(s) || format!("{:?}", c).eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::LedColor(s.to_string()))
    }
}

/// Resistor values selectable in the settings panel.
pub const RESISTOR_PRESETS: [u32; 4] = [220, 330, 1_000, 10_000];

/// A part's type together with its strongly typed properties.
///
/// Properties drive rendering and configuration only; the simulation never reads them
/// except to scale a derived reading (servo travel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentKind {
    Led { color: LedColor },
    Resistor { ohms: u32 },
    Button,
    Breadboard,
    Servo { min_angle: f32, max_angle: f32 },
    Buzzer { tone_hz: u32 },
    Potentiometer { ohms: u32 },
    Oled { width: u16, height: u16 },
}

impl ComponentKind {
    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentKind::Led { .. } => ComponentType::Led,
            ComponentKind::Resistor { .. } => ComponentType::Resistor,
            ComponentKind::Button => ComponentType::Button,
            ComponentKind::Breadboard => ComponentType::Breadboard,
            ComponentKind::Servo { .. } => ComponentType::Servo,
            ComponentKind::Buzzer { .. } => ComponentType::Buzzer,
            ComponentKind::Potentiometer { .. } => ComponentType::Potentiometer,
            ComponentKind::Oled { .. } => ComponentType::Oled,
        }
    }

    pub fn pins(&self) -> &'static [&'static str] {
        self.component_type().pins()
    }

    pub fn has_pin(&self, pin: &str) -> bool {
        self.pins().contains(&pin)
    }
}
