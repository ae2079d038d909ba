//! Board models the workbench can host (shared)

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Single-board computer shown on the canvas.
///
/// Every model exposes the same BCM 0..=27 register bank; the model only changes
/// how the board is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoardModel {
    #[serde(rename = "RPi5")]
    RPi5,
    #[default]
    #[serde(rename = "RPi4B")]
    RPi4B,
    #[serde(rename = "RPi3B+")]
    RPi3BPlus,
    #[serde(rename = "RPiZeroW")]
    RPiZeroW,
}

impl BoardModel {
    pub const ALL: [BoardModel; 4] = [
        BoardModel::RPi5,
        BoardModel::RPi4B,
        BoardModel::RPi3BPlus,
        BoardModel::RPiZeroW,
    ];

    /// Identifier used in configuration files.
    pub fn id(&self) -> &'static str {
        match self {
            BoardModel::RPi5 => "RPi5",
            BoardModel::RPi4B => "RPi4B",
            BoardModel::RPi3BPlus => "RPi3B+",
            BoardModel::RPiZeroW => "RPiZeroW",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BoardModel::RPi5 => "RPi 5",
            BoardModel::RPi4B => "RPi 4B",
            BoardModel::RPi3BPlus => "RPi 3B+",
            BoardModel::RPiZeroW => "Pi Zero W",
        }
    }

    /// SoC part number printed on the chip.
    pub fn soc(&self) -> &'static str {
        match self {
            BoardModel::RPi5 => "BCM2712",
            BoardModel::RPi4B => "BCM2711",
            BoardModel::RPi3BPlus => "BCM2837B0",
            BoardModel::RPiZeroW => "BCM2835",
        }
    }
}

impl fmt::Display for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoardModel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardModel::ALL
            .into_iter()
            .find(|model| model.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::BoardModel(s.to_string()))
    }
}
