//! Reference entries: symlinks standing in for stored messages

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{ContentStore, StoredEntry};
use crate::models::MessageIdentifier;

/// Result of trying to reference a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created
    Created,
    /// The correct link was already in place
    AlreadyLinked,
    /// Something else occupies the link name; left untouched
    Conflict,
    /// The message is not in the archive
    NotInArchive,
}

impl LinkOutcome {
    /// Whether the message needs no body fetch
    pub fn is_resolved(&self) -> bool {
        !matches!(self, LinkOutcome::NotInArchive)
    }
}

/// Create `dir/link_name -> target` unless it already exists
///
/// An existing link with the same target is left as is. Anything else at
/// that name is reported as a conflict and never overwritten.
pub fn place_link(dir: &Path, link_name: &str, target: &Path) -> Result<LinkOutcome> {
    let link_path = dir.join(link_name);

    match fs::symlink_metadata(&link_path) {
        Ok(meta) => {
            if meta.file_type().is_symlink() {
                let current = fs::read_link(&link_path)
                    .with_context(|| format!("Failed to read link {}", link_path.display()))?;
                if current == target {
                    return Ok(LinkOutcome::AlreadyLinked);
                }
            }
            warn!(
                "File already exists: {}, but doesn't point to {}",
                link_path.display(),
                target.display()
            );
            Ok(LinkOutcome::Conflict)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            symlink(target, &link_path).with_context(|| {
                format!(
                    "Failed to link {} -> {}",
                    link_path.display(),
                    target.display()
                )
            })?;
            debug!("Linked {} -> {}", link_path.display(), target.display());
            Ok(LinkOutcome::Created)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", link_path.display())),
    }
}

/// Links messages already in the archive into one label directory
pub struct LabelLinker<'a> {
    link_dir: PathBuf,
    archive: &'a ContentStore,
    /// Path of the archive directory as seen from `link_dir`
    archive_rel: PathBuf,
}

impl<'a> LabelLinker<'a> {
    pub fn new(link_dir: impl Into<PathBuf>, archive: &'a ContentStore, archive_rel: PathBuf) -> Self {
        Self {
            link_dir: link_dir.into(),
            archive,
            archive_rel,
        }
    }

    pub fn link_dir(&self) -> &Path {
        &self.link_dir
    }

    /// Find the archive entry for `id`
    pub fn locate(&self, id: &MessageIdentifier) -> Result<Option<StoredEntry>> {
        self.archive.locate(id.as_str())
    }

    /// Reference the archived copy of `id`, if there is one
    ///
    /// Returns `NotInArchive` when the message has to be fetched.
    pub fn link_if_present(&self, id: &MessageIdentifier) -> Result<LinkOutcome> {
        match self.locate(id)? {
            Some(entry) => self.link_entry(id.as_str(), &entry),
            None => Ok(LinkOutcome::NotInArchive),
        }
    }

    /// Link `link_stem` (plus the entry's compression marker) to an
    /// archive entry
    pub fn link_entry(&self, link_stem: &str, entry: &StoredEntry) -> Result<LinkOutcome> {
        let target = self.archive_rel.join(&entry.file_name);
        place_link(&self.link_dir, &entry.link_name(link_stem), &target)
    }
}
