// src/guest/mod.rs - Guest VM launchers
//
// The guest operating system runs outside this process. All we need from it is a serial
// character stream in each direction, obtained either from a child process's stdio or
// from a serial device.

pub mod process;
pub mod serial;

use crate::communication::event_system::EventSender;
use crate::config::{GuestBackend, GuestConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuestError {
    #[error("Failed to spawn guest: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Serial port error: {0}")]
    Serial(#[source] std::io::Error),
    #[error("No guest backend configured")]
    NotConfigured,
    #[error("Guest link closed")]
    Closed,
}

/// Write side of a running guest's serial channel.
pub trait GuestLink {
    /// Queue bytes for the guest's serial input.
    fn send(&mut self, bytes: &[u8]) -> Result<(), GuestError>;

    /// Stop the guest and its I/O tasks. Idempotent.
    fn shutdown(&mut self);
}

/// Starts a guest. Output, readiness and exit are reported as session events.
pub trait GuestLauncher {
    fn launch(&self, events: EventSender) -> Result<Box<dyn GuestLink>, GuestError>;

    fn describe(&self) -> String;
}

/// Backend `none`: every boot attempt fails and the console stays local.
#[derive(Debug, Default)]
pub struct NoGuest;

impl GuestLauncher for NoGuest {
    fn launch(&self, _events: EventSender) -> Result<Box<dyn GuestLink>, GuestError> {
        Err(GuestError::NotConfigured)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

pub fn launcher_from_config(config: &GuestConfig) -> Box<dyn GuestLauncher> {
    match config.backend {
        GuestBackend::None => Box::new(NoGuest),
        GuestBackend::Process => Box::new(process::ProcessLauncher::new(
            config.command.clone(),
            config.args.clone(),
        )),
        GuestBackend::Serial => Box::new(serial::SerialLauncher::new(
            config.serial_port.clone(),
            config.baud,
        )),
    }
}
