//! `RosterChat`: terminal chat client.
//!
//! Launches the TUI against the in-process loopback service, seeded with a
//! few demo contacts and a room. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/rosterchat/config.toml`).
//!
//! ```bash
//! cargo run --bin rosterchat -- --name alice --log-level debug
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use rosterchat::app::App;
use rosterchat::config::{CliArgs, ClientConfig};
use rosterchat::session::Session;
use rosterchat::settings::{MemoryStore, SettingsStore, TomlSettingsStore};
use rosterchat::transport::loopback::LoopbackService;
use rosterchat::transport::{ServiceEvent, Transport};
use rosterchat::ui::{self, TerminalView};
use rosterchat_proto::id::{IdError, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::{MemberRank, RosterEntry};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("rosterchat starting");

    let (service, events) = demo_service(&config.name).map_err(io::Error::other)?;
    let store: Box<dyn SettingsStore> = match &config.settings_path {
        Some(path) => Box::new(TomlSettingsStore::new(path.clone())),
        None => {
            tracing::warn!("no config directory, runtime settings will not be saved");
            Box::new(MemoryStore::new())
        }
    };
    let session = Session::new(
        service,
        TerminalView::new(),
        store,
        config.to_session_settings(),
    );
    let mut app = App::new(session, events);

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &mut app, &config);

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("rosterchat exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("rosterchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Offline service with a handful of contacts to try the client against.
fn demo_service(
    name: &str,
) -> Result<(LoopbackService, mpsc::UnboundedReceiver<ServiceEvent>), IdError> {
    let me = RosterEntry::new(
        PeerId::parse("76561190000000001")?,
        name,
        PresenceState::Offline,
    );
    let alice = RosterEntry::new(
        PeerId::parse("76561190000000002")?,
        "Alice",
        PresenceState::Online,
    );
    let bob = RosterEntry::new(PeerId::parse("76561190000000003")?, "Bob", PresenceState::Away)
        .with_game("Chess");
    let carol = RosterEntry::new(
        PeerId::parse("76561190000000004")?,
        "Carol",
        PresenceState::Offline,
    );
    let dave = RosterEntry::new(
        PeerId::parse("76561190000000005")?,
        "Dave",
        PresenceState::Online,
    );

    let (service, events) = LoopbackService::new(me);
    let service = service
        .with_friend(alice.clone())
        .with_friend(bob)
        .with_friend(carol)
        .with_pending_request(dave.clone())
        .with_room(
            RoomId::parse("103582791430000001")?,
            "Lobby",
            vec![(alice, MemberRank::Admin), (dave, MemberRank::Member)],
        );
    Ok((service, events))
}

/// Main application loop.
fn run_app<T, S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<T, S>,
    config: &ClientConfig,
) -> io::Result<()>
where
    T: Transport,
    S: SettingsStore,
{
    loop {
        // Step 1: Apply service events, deferred work and the clock tick.
        app.pump();

        // Step 2: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, app.view(), app.input()))?;

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key_event(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
