// src/guest/process.rs - Guest running as a child process (e.g. QEMU with -serial stdio)
use crate::communication::event_system::{EventSender, GuestEvent, SessionEvent};
use crate::guest::{GuestError, GuestLauncher, GuestLink};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const READ_CHUNK: usize = 1024;

#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    command: String,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

impl GuestLauncher for ProcessLauncher {
    fn launch(&self, events: EventSender) -> Result<Box<dyn GuestLink>, GuestError> {
        tracing::info!("Spawning guest: {} {}", self.command, self.args.join(" "));
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(GuestError::Spawn)?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(GuestError::Closed);
        };

        let reader_events = events.clone();
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; READ_CHUNK];
            let reason = loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break None,
                    Ok(n) => {
                        tracing::trace!("Guest RX {} bytes", n);
                        let event = SessionEvent::Guest(GuestEvent::Output(buf[..n].to_vec()));
                        if reader_events.send(event).is_err() {
                            return;
                        }
                    }
                    Err(e) => break Some(e.to_string()),
                }
            };
            tracing::info!("Guest output closed");
            let _ = reader_events.send(SessionEvent::Guest(GuestEvent::Exited(reason)));
        });

        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer = tokio::spawn(async move {
            while let Some(bytes) = input_rx.recv().await {
                if let Err(e) = stdin.write_all(&bytes).await {
                    tracing::error!("Guest TX failed: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Guest TX flush failed: {}", e);
                    break;
                }
            }
        });

        // The process is up as soon as its stdio is connected.
        let _ = events.send(SessionEvent::Guest(GuestEvent::Ready));

        Ok(Box::new(ProcessLink {
            child,
            input: Some(input_tx),
            reader,
            writer,
        }))
    }

    fn describe(&self) -> String {
        format!("process `{}`", self.command)
    }
}

struct ProcessLink {
    child: Child,
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl GuestLink for ProcessLink {
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
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Guest already gone: {}", e);
        }
        tracing::info!("Guest process stopped");
    }
}

impl Drop for ProcessLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}
