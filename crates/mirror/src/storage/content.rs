//! File-based content store: one file per message identifier

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use super::Encoding;
use crate::models::MessageIdentifier;

/// A message file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// File name inside the store directory
    pub file_name: String,
    /// Encoding implied by the file name's suffix
    pub encoding: Encoding,
}

impl StoredEntry {
    /// Name for a link to this entry, carrying the same compression marker
    pub fn link_name(&self, stem: &str) -> String {
        self.encoding.file_name(stem)
    }
}

/// Directory of stored messages, named by identifier
///
/// Directory structure:
/// ```text
/// All Mail/
///   abc@x.com.gz        # message stored under its Message-ID
///   3f786850e387....gz  # message without Message-ID, named by SHA-1
///   4711.gz -> 3f786850e387....gz
/// ```
///
/// Existence checks see every encoding, so switching the configured
/// encoding between runs never stores a message twice.
pub struct ContentStore {
    root: PathBuf,
    encoding: Encoding,
}

impl ContentStore {
    /// Open a store at the given directory, creating it if needed
    pub fn new(root: impl AsRef<Path>, encoding: Encoding) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create directory {}", root.display()))?;
        Ok(Self { root, encoding })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Check whether anything usable exists under `stem`, in any encoding
    ///
    /// Links count when their target exists; a dangling link does not.
    pub fn exists(&self, stem: &str) -> Result<bool> {
        for encoding in Encoding::ALL {
            let path = self.root.join(encoding.file_name(stem));
            let found = path
                .try_exists()
                .with_context(|| format!("Failed to check {}", path.display()))?;
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Find the stored file for `stem`
    ///
    /// Compressed forms are checked before the plain form. Only regular
    /// files are returned; links never are.
    pub fn locate(&self, stem: &str) -> Result<Option<StoredEntry>> {
        for encoding in self.encoding.probe_order() {
            let file_name = encoding.file_name(stem);
            let path = self.root.join(&file_name);
            match fs::symlink_metadata(&path) {
                Ok(meta) if meta.file_type().is_file() => {
                    return Ok(Some(StoredEntry {
                        file_name,
                        encoding,
                    }));
                }
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to inspect {}", path.display()));
                }
            }
        }
        Ok(None)
    }

    /// Write a new stored entry for `id` in the configured encoding
    ///
    /// The caller must have checked [`exists`](Self::exists) first. The
    /// content is written to a temporary file and renamed into place, so a
    /// failed write never leaves a file under the identifier's name.
    pub fn materialize(&self, id: &MessageIdentifier, raw: &[u8]) -> Result<StoredEntry> {
        let file_name = self.encoding.file_name(id.as_str());
        let path = self.root.join(&file_name);
        let temp_path = self.root.join(format!(".{}.tmp", file_name));

        let encoded = self.encoding.encode(raw)?;

        if let Err(e) = fs::write(&temp_path, &encoded) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to write {}", temp_path.display()));
        }
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to store {}", path.display()));
        }

        debug!("Stored {}", path.display());
        Ok(StoredEntry {
            file_name,
            encoding: self.encoding,
        })
    }

    /// Read and decode the message stored under `stem`
    ///
    /// Follows links, so placeholder names resolve to their content.
    pub fn read(&self, stem: &str) -> Result<Option<Vec<u8>>> {
        for encoding in self.encoding.probe_order() {
            let path = self.root.join(encoding.file_name(stem));
            match fs::read(&path) {
                Ok(data) => return encoding.decode(&data).map(Some),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn id(s: &str) -> MessageIdentifier {
        MessageIdentifier::new(s)
    }

    #[test]
    fn test_materialize_and_read() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("All Mail"), Encoding::Gzip).unwrap();

        let entry = store.materialize(&id("abc@x.com"), b"Hello, world!").unwrap();

        assert_eq!(entry.file_name, "abc@x.com.gz");
        assert!(dir.path().join("All Mail/abc@x.com.gz").is_file());
        assert_eq!(store.read("abc@x.com").unwrap().unwrap(), b"Hello, world!");
    }

    #[test]
    fn test_materialize_plain() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Plain).unwrap();

        store.materialize(&id("abc@x.com"), b"raw").unwrap();

        assert_eq!(fs::read(dir.path().join("abc@x.com")).unwrap(), b"raw");
    }

    #[test]
    fn test_materialize_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Zstd).unwrap();

        store.materialize(&id("abc@x.com"), b"data").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["abc@x.com.zst"]);
    }

    #[test]
    fn test_failed_materialize_leaves_nothing() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("store"), Encoding::Gzip).unwrap();
        fs::remove_dir(dir.path().join("store")).unwrap();

        assert!(store.materialize(&id("abc@x.com"), b"data").is_err());
        assert!(!store.exists("abc@x.com").unwrap());
    }

    #[test]
    fn test_exists_checks_every_form() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Gzip).unwrap();

        assert!(!store.exists("abc@x.com").unwrap());

        // Written by an earlier run with compression disabled
        fs::write(dir.path().join("abc@x.com"), b"raw").unwrap();
        assert!(store.exists("abc@x.com").unwrap());

        fs::write(dir.path().join("def@x.com.zst"), b"raw").unwrap();
        assert!(store.exists("def@x.com").unwrap());
    }

    #[test]
    fn test_exists_follows_links() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Gzip).unwrap();
        store.materialize(&id("deadbeef"), b"body").unwrap();

        symlink("deadbeef.gz", dir.path().join("17.gz")).unwrap();
        symlink("missing.gz", dir.path().join("18.gz")).unwrap();

        assert!(store.exists("17").unwrap());
        assert!(!store.exists("18").unwrap());
        assert_eq!(store.read("17").unwrap().unwrap(), b"body");
    }

    #[test]
    fn test_locate_prefers_compressed_form() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Gzip).unwrap();
        fs::write(dir.path().join("abc@x.com"), b"raw").unwrap();
        assert_eq!(
            store.locate("abc@x.com").unwrap().unwrap().file_name,
            "abc@x.com"
        );

        fs::write(dir.path().join("abc@x.com.gz"), b"gz").unwrap();
        let entry = store.locate("abc@x.com").unwrap().unwrap();
        assert_eq!(entry.file_name, "abc@x.com.gz");
        assert_eq!(entry.link_name("17"), "17.gz");
    }

    #[test]
    fn test_locate_ignores_links() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Gzip).unwrap();
        store.materialize(&id("deadbeef"), b"body").unwrap();
        symlink("deadbeef.gz", dir.path().join("17.gz")).unwrap();

        assert!(store.locate("17").unwrap().is_none());
        assert!(store.locate("deadbeef").unwrap().is_some());
    }

    #[test]
    fn test_read_missing() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path(), Encoding::Gzip).unwrap();
        assert!(store.read("nonexistent@x.com").unwrap().is_none());
    }
}
