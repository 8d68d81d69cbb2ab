//! Persistence of settings changed at runtime.
//!
//! `/set` and `/autojoin` change a handful of values that should survive a
//! restart. The session hands the full set to a [`SettingsStore`] after each
//! change. [`TomlSettingsStore`] merges them into the config file, leaving
//! every other key in that file untouched. [`MemoryStore`] keeps them in
//! memory for tests and for setups without a config directory.

use std::path::{Path, PathBuf};

use rosterchat_proto::id::RoomId;
use serde::Serialize;

use crate::render::ViewLayout;

/// Errors that can occur when saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Failed to read the existing file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The existing file is not valid TOML.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// Failed to serialize the merged document.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Failed to write the file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The store refuses writes.
    #[error("settings store is read-only")]
    ReadOnly,
}

/// Values written back after a runtime change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSettings {
    /// Roster column width and scrollback.
    pub layout: ViewLayout,
    /// Rooms joined automatically on connect.
    pub autojoin: Vec<RoomId>,
}

/// Destination for runtime settings.
pub trait SettingsStore {
    /// Persists `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the settings could not be stored. The
    /// caller reports the failure and does not retry.
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), SettingsError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), SettingsError> {
        (**self).save(settings)
    }
}

/// Writes settings into the `[ui]` and `[session]` tables of a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Creates a store writing to `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The file this store writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> Result<toml::Table, SettingsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(toml::Table::new()),
            Err(source) => Err(SettingsError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Keys this store owns in the `[ui]` table.
#[derive(Serialize)]
struct UiSection {
    userlist_width: u16,
    scrollback: usize,
}

/// Keys this store owns in the `[session]` table.
#[derive(Serialize)]
struct SessionSection<'a> {
    autojoin: &'a [RoomId],
}

/// Serializes `section` and writes its keys over the sub-table `key`,
/// keeping any other keys already there.
fn merge_section<T: Serialize>(
    doc: &mut toml::Table,
    key: &str,
    section: &T,
) -> Result<(), SettingsError> {
    let mut table = match doc.remove(key) {
        Some(toml::Value::Table(table)) => table,
        _ => toml::Table::new(),
    };
    table.extend(toml::Table::try_from(section)?);
    doc.insert(key.into(), toml::Value::Table(table));
    Ok(())
}

impl SettingsStore for TomlSettingsStore {
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), SettingsError> {
        let mut doc = self.load_document()?;

        merge_section(
            &mut doc,
            "ui",
            &UiSection {
                userlist_width: settings.layout.userlist_width,
                scrollback: settings.layout.scrollback,
            },
        )?;
        merge_section(
            &mut doc,
            "session",
            &SessionSection {
                autojoin: &settings.autojoin,
            },
        )?;

        let contents = toml::to_string_pretty(&doc)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, contents).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Keeps every saved snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Vec<PersistedSettings>,
    read_only: bool,
}

impl MemoryStore {
    /// Creates an empty, writable store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects every save.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            saved: Vec::new(),
            read_only: true,
        }
    }

    /// The most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<&PersistedSettings> {
        self.saved.last()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saved.len()
    }
}

impl SettingsStore for MemoryStore {
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), SettingsError> {
        if self.read_only {
            return Err(SettingsError::ReadOnly);
        }
        self.saved.push(settings.clone());
        Ok(())
    }
}
