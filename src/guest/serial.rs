// src/guest/serial.rs - Guest reached through a serial device or PTY
use crate::communication::event_system::{EventSender, GuestEvent, SessionEvent};
use crate::guest::{GuestError, GuestLauncher, GuestLink};
use serial2_tokio::SerialPort;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const READ_CHUNK: usize = 256;

/// Serial connection configuration
#[derive(Debug, Clone)]
pub struct SerialLauncher {
    port_name: String,
    baud_rate: u32,
}

impl SerialLauncher {
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self { port_name, baud_rate }
    }

    /// Serial devices present on this machine, for the CLI's diagnostics.
    pub fn available_ports() -> Vec<String> {
        match SerialPort::available_ports() {
            Ok(paths) => paths.iter().map(|p| p.display().to_string()).collect(),
            Err(_) => vec![],
        }
    }
}

impl GuestLauncher for SerialLauncher {
    fn launch(&self, events: EventSender) -> Result<Box<dyn GuestLink>, GuestError> {
        let port = SerialPort::open(&self.port_name, self.baud_rate).map_err(GuestError::Serial)?;
        let port = Arc::new(port);
        tracing::info!("Opened guest serial port {} @ {} baud", self.port_name, self.baud_rate);

        // Spawn background task to forward guest output as session events
        let read_port = port.clone();
        let reader_events = events.clone();
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; READ_CHUNK];
            let reason = loop {
                match read_port.read(&mut buf).await {
                    Ok(0) => break None,
                    Ok(n) => {
                        tracing::trace!("Serial RX {} bytes", n);
                        let event = SessionEvent::Guest(GuestEvent::Output(buf[..n].to_vec()));
                        if reader_events.send(event).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Serial read error: {}", e);
                        break Some(e.to_string());
                    }
                }
            };
            let _ = reader_events.send(SessionEvent::Guest(GuestEvent::Exited(reason)));
        });

        // Spawn background task to push keystrokes and injected commands to the guest
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let write_port = port;
        let writer = tokio::spawn(async move {
            while let Some(bytes) = input_rx.recv().await {
                let mut written = 0;
                while written < bytes.len() {
                    match write_port.write(&bytes[written..]).await {
                        Ok(n) => written += n,
                        Err(e) => {
                            tracing::error!("Serial write error: {}", e);
                            return;
                        }
                    }
                }
                tracing::trace!("Serial TX {} bytes", written);
            }
        });

        let _ = events.send(SessionEvent::Guest(GuestEvent::Ready));

        Ok(Box::new(SerialLink {
            input: Some(input_tx),
            reader,
            writer,
        }))
    }

    fn describe(&self) -> String {
        format!("serial {} @ {}", self.port_name, self.baud_rate)
    }
}

struct SerialLink {
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl GuestLink for SerialLink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), GuestError> {
        let input = self.input.as_ref().ok_or(GuestError::Closed)?;
        input.send(bytes.to_vec()).map_err(|_| GuestError::Closed)
    }

    fn shutdown(&mut self) {
        if self.input.take().is_none() {
            return;
        }
        self.reader.abort();
        self.writer.abort();
        tracing::info!("Guest serial link closed");
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}
