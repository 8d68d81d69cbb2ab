//! Configuration system for the `RosterChat` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/rosterchat/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.
//!
//! The same file receives settings changed at runtime, see
//! [`crate::settings::TomlSettingsStore`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use rosterchat_proto::id::RoomId;

use crate::command::MAX_USERLIST_WIDTH;
use crate::render::ViewLayout;
use crate::session::SessionSettings;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Could not determine the user's config directory.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    ui: UiFileConfig,
    session: SessionFileConfig,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    userlist_width: Option<u16>,
    scrollback: Option<usize>,
    timestamp_format: Option<String>,
    poll_timeout_ms: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    name: Option<String>,
    autojoin: Vec<String>,
    idle_away_secs: Option<u64>,
    debug: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // -- UI --
    /// Roster column width and scrollback.
    pub layout: ViewLayout,
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,

    // -- Session --
    /// Display name used in offline mode.
    pub name: String,
    /// Rooms joined after connecting.
    pub autojoin: Vec<RoomId>,
    /// Inactivity before going away. Zero disables.
    pub idle_away: Duration,
    /// Start with debug diagnostics mirrored into the log conversation.
    pub debug: bool,

    /// File runtime settings are written back to, if any.
    pub settings_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let session = SessionSettings::default();
        Self {
            layout: session.layout,
            timestamp_format: session.timestamp_format,
            poll_timeout: Duration::from_millis(50),
            name: "me".to_string(),
            autojoin: session.autojoin,
            idle_away: session.idle_away,
            debug: session.debug,
            settings_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/rosterchat/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// or if any config file exists but cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let path = cli.config.clone().or_else(|| config_path().ok());
        let file = load_config_file(cli.config.as_deref())?;
        let mut config = Self::resolve(cli, &file);
        config.settings_path = path;
        Ok(config)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Values out of range fall back to the
    /// default with a warning.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        let userlist_width = cli
            .userlist_width
            .or(file.ui.userlist_width)
            .filter(|w| {
                let ok = (1..=MAX_USERLIST_WIDTH).contains(w);
                if !ok {
                    tracing::warn!(width = w, "userlist_width out of range, using default");
                }
                ok
            })
            .unwrap_or(defaults.layout.userlist_width);
        let scrollback = file
            .ui
            .scrollback
            .filter(|s| *s > 0)
            .unwrap_or(defaults.layout.scrollback);

        let timestamp_format = cli
            .timestamp_format
            .as_deref()
            .or(file.ui.timestamp_format.as_deref())
            .filter(|f| {
                let ok = is_valid_format(f);
                if !ok {
                    tracing::warn!(
                        timestamp_format = f,
                        "invalid timestamp_format, using default"
                    );
                }
                ok
            })
            .map_or(defaults.timestamp_format, str::to_string);

        Self {
            layout: ViewLayout {
                userlist_width,
                scrollback,
            },
            timestamp_format,
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            name: cli
                .name
                .clone()
                .or_else(|| file.session.name.clone())
                .unwrap_or(defaults.name),
            autojoin: parse_autojoin(&file.session.autojoin),
            idle_away: file
                .session
                .idle_away_secs
                .map_or(defaults.idle_away, Duration::from_secs),
            debug: cli.debug || file.session.debug.unwrap_or(defaults.debug),
            settings_path: None,
        }
    }

    /// The settings the session starts with.
    #[must_use]
    pub fn to_session_settings(&self) -> SessionSettings {
        SessionSettings {
            layout: self.layout,
            autojoin: self.autojoin.clone(),
            timestamp_format: self.timestamp_format.clone(),
            idle_away: self.idle_away,
            debug: self.debug,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal chat client for a friends-and-rooms service")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/rosterchat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Display name used in offline mode.
    #[arg(long, env = "ROSTERCHAT_NAME")]
    pub name: Option<String>,

    /// Width of the roster column.
    #[arg(long)]
    pub userlist_width: Option<u16>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Mirror debug diagnostics into the log conversation.
    #[arg(long)]
    pub debug: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ROSTERCHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/rosterchat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Default config file location.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] when the platform has no config
/// directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("rosterchat").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Ok(path) = config_path() else {
            return Ok(ConfigFile::default());
        };
        path
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

fn parse_autojoin(raw: &[String]) -> Vec<RoomId> {
    let mut rooms: Vec<RoomId> = Vec::with_capacity(raw.len());
    for entry in raw {
        match RoomId::parse(entry) {
            Ok(room) if !rooms.contains(&room) => rooms.push(room),
            Ok(room) => tracing::warn!(%room, "duplicate autojoin entry skipped"),
            Err(err) => tracing::warn!(%err, "autojoin entry skipped"),
        }
    }
    rooms
}

/// chrono panics when formatting with an invalid specifier, so formats are
/// checked up front.
fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
