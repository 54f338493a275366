//! Settings files for gmirror
//!
//! JSON files live in one directory: `~/.config/gmirror/`, or
//! `$GMIRROR_CONFIG_DIR` when that is set. Saved files are replaced with a
//! rename and are readable by their owner only, since they name the mail
//! account.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const DIR_ENV: &str = "GMIRROR_CONFIG_DIR";

/// Name of the config directory under the platform config root
const APP_DIR: &str = "gmirror";

/// Permissions for saved files
const FILE_MODE: u32 = 0o600;

/// Initialize the gmirror config directory.
///
/// Creates it if it doesn't exist. Call this once at application startup.
pub fn init() -> Result<ConfigDir> {
    let dir = ConfigDir::locate()?;
    dir.ensure()?;
    Ok(dir)
}

/// A directory of JSON settings files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The gmirror config directory: `$GMIRROR_CONFIG_DIR` if set,
    /// otherwise `gmirror/` under the platform config root
    pub fn locate() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(Self::new(base.join(APP_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file in this directory
    pub fn path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Create the directory if it doesn't exist
    pub fn ensure(&self) -> Result<&Path> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create config directory: {}", self.root.display())
        })?;
        Ok(&self.root)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path(filename).exists()
    }

    /// Load and parse a JSON file
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.path(filename);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Like [`load`](Self::load), but a missing file yields `T::default()`
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> Result<T> {
        if self.exists(filename) {
            self.load(filename)
        } else {
            Ok(T::default())
        }
    }

    /// Save a value as pretty-printed JSON, returning the file's path
    pub fn save<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.path(filename);
        let temp_path = self.path(&format!(".{}.tmp", filename));
        let content = serde_json::to_string_pretty(value).context("Failed to serialize config")?;

        let written = write_private(&temp_path, content.as_bytes())
            .and_then(|_| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e)
                .with_context(|| format!("Failed to write config file: {}", path.display()));
        }
        Ok(path)
    }
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::os::unix::fs::PermissionsExt;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        username: String,
        directory: Option<String>,
    }

    #[test]
    fn test_path() {
        let dir = ConfigDir::new("/home/someone/.config/gmirror");
        assert_eq!(
            dir.path("settings.json"),
            PathBuf::from("/home/someone/.config/gmirror/settings.json")
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::new(temp.path().join("gmirror"));
        let value = Sample {
            username: "someone".to_string(),
            directory: Some("/tmp/mail".to_string()),
        };

        let path = dir.save("settings.json", &value).unwrap();
        let loaded: Sample = dir.load("settings.json").unwrap();

        assert_eq!(loaded, value);
        assert_eq!(path, dir.path("settings.json"));
        assert!(!dir.exists(".settings.json.tmp"));
    }

    #[test]
    fn test_saved_file_is_private() {
        let temp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::new(temp.path());

        let path = dir.save("settings.json", &Sample::default()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, FILE_MODE);
    }

    #[test]
    fn test_save_replaces_existing() {
        let temp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::new(temp.path());
        fs::write(dir.path("settings.json"), "not json").unwrap();

        let value = Sample {
            username: "new".to_string(),
            directory: None,
        };
        dir.save("settings.json", &value).unwrap();

        assert_eq!(dir.load::<Sample>("settings.json").unwrap(), value);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::new(temp.path());

        assert!(dir.load::<Sample>("absent.json").is_err());
        assert_eq!(
            dir.load_or_default::<Sample>("absent.json").unwrap(),
            Sample::default()
        );
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::new(temp.path());
        fs::write(dir.path("settings.json"), "{ broken").unwrap();

        assert!(dir.load_or_default::<Sample>("settings.json").is_err());
    }
}
