// src/main.rs - PiForge terminal: pseudo-shell or guest console over the GPIO bank
use clap::Parser;
use piforge::communication::event_system::{SessionEvent, event_channel};
use piforge::config::Config;
use piforge::console::terminal::StdoutTerminal;
use piforge::guest::{launcher_from_config, serial::SerialLauncher};
use piforge::session::Session;
use piforge_shared::BoardModel;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tokio::task::LocalSet;

#[derive(Debug, Parser)]
#[command(name = "piforge", version, about = "Virtual breadboard GPIO console")]
struct Cli {
    /// Configuration file (TOML). Missing file means defaults.
    #[arg(short, long, default_value = "piforge.toml")]
    config: PathBuf,

    /// Board model: RPi5, RPi4B, RPi3B+ or RPiZeroW
    #[arg(short, long)]
    board: Option<BoardModel>,

    /// Local pseudo-shell only; never start a guest
    #[arg(long)]
    mock: bool,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,

    /// List serial devices and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config).map_err(|e| {
        eprintln!("Failed to load config from '{}': {}", cli.config.display(), e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;
    if let Some(model) = cli.board {
        config.board.model = model;
    }
    if cli.mock {
        config.force_mock();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let level = config.logging.max_level().map_err(|e| {
        eprintln!("{}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if cli.config.exists() {
        tracing::info!("Configuration: {}", cli.config.display());
    } else {
        tracing::info!("No config at {}, using defaults", cli.config.display());
    }

    if cli.list_ports {
        for port in SerialLauncher::available_ports() {
            println!("{}", port);
        }
        return Ok(());
    }

    tracing::info!("Starting PiForge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Board: {} ({})",
        config.board.model.label(),
        config.board.model.soc()
    );

    let (events, mut event_rx) = event_channel();
    let launcher = launcher_from_config(&config.guest);
    let mut session = Session::new(&config, Box::new(StdoutTerminal), launcher, events.clone());
    session
        .console_mut()
        .set_echo_input(!std::io::stdin().is_terminal());

    // Forward stdin keystrokes as session events, read on a plain thread outside the runtime.
    let key_events = events.clone();
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let mut buf = [0u8; 256];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for byte in &buf[..n] {
                        if key_events.send(SessionEvent::Key(*byte)).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        let _ = key_events.send(SessionEvent::Shutdown);
    });

    let signal_events = events;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            let _ = signal_events.send(SessionEvent::Shutdown);
        }
    });

    // The session holds Rc-based listeners, so it runs on a LocalSet.
    let local = LocalSet::new();
    local
        .run_until(async move {
            session.start();
            session.run(&mut event_rx).await;
        })
        .await;

    Ok(())
}
