//! Run configuration and persisted account settings
//!
//! [`MirrorOptions`] is the value threaded through a sync run.
//! [`AccountSettings`] is what the binary remembers between runs; it is
//! loaded from and saved to the gmirror config directory.

use anyhow::{Context, Result, bail};
use config::ConfigDir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::MailboxNaming;
use crate::storage::Encoding;

/// Settings filename in the gmirror config directory
const SETTINGS_FILE: &str = "settings.json";

/// Environment variable holding the account password
pub const PASSWORD_ENV: &str = "GMIRROR_PASSWORD";

/// Default number of messages per fetch window
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Options fixed for the duration of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOptions {
    /// Encoding for newly stored messages
    pub encoding: Encoding,
    /// Messages per fetch window
    pub batch_size: usize,
    /// Wipe `labels/` before the label passes (the archive is never wiped)
    pub overwrite_labels: bool,
    /// Which mailbox is the archive
    pub naming: MailboxNaming,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            overwrite_labels: false,
            naming: MailboxNaming::default(),
        }
    }
}

impl MirrorOptions {
    /// Builder method to set the encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder method to set the window size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to enable wiping `labels/`
    pub fn with_overwrite_labels(mut self, overwrite: bool) -> Self {
        self.overwrite_labels = overwrite;
        self
    }

    /// Builder method to set mailbox naming
    pub fn with_naming(mut self, naming: MailboxNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("Batch size must be a positive number");
        }
        Ok(())
    }
}

/// Account settings remembered between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub username: Option<String>,
    pub directory: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Preferred encoding when no flag overrides it
    pub encoding: Option<Encoding>,
}

impl AccountSettings {
    /// Load settings from the gmirror config directory
    ///
    /// A missing file yields empty settings.
    pub fn load() -> Result<Self> {
        Self::load_from(&ConfigDir::locate()?)
    }

    pub fn load_from(dir: &ConfigDir) -> Result<Self> {
        dir.load_or_default(SETTINGS_FILE)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Save settings to the gmirror config directory
    pub fn save(&self) -> Result<PathBuf> {
        self.save_to(&ConfigDir::locate()?)
    }

    pub fn save_to(&self, dir: &ConfigDir) -> Result<PathBuf> {
        dir.save(SETTINGS_FILE, self)
    }

    /// Get the settings file path (~/.config/gmirror/settings.json)
    pub fn default_path() -> Option<PathBuf> {
        ConfigDir::locate().ok().map(|dir| dir.path(SETTINGS_FILE))
    }
}

/// Read the password from the environment, if set and non-empty
pub fn password_from_env() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}
