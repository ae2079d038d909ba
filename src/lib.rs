// src/lib.rs - PiForge virtual breadboard: GPIO signal layer
pub mod bridge;
pub mod circuit;
pub mod communication;
pub mod config;
pub mod console;
pub mod guest;
pub mod hardware;
pub mod interaction;
pub mod session;
pub mod workbench;

pub use piforge_shared::{
    BoardModel, ComponentKind, ComponentType, LedColor, PinMode, PinRef, PinSnapshot, PinState,
    Position, Wire, WireColor,
};
