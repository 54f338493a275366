//! Safety check before wiping the `labels/` tree

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory under `labels/` whose real files may be discarded
const TRASH_DIR: &str = "Trash";

/// List regular files under `labels_dir` that wiping it would destroy
///
/// Labels normally hold only links into the archive. Real files appear
/// when a labelled message was missing from the archive; those directly
/// inside `labels/Trash` are expected and not reported. A missing
/// `labels_dir` yields an empty list.
pub fn labels_overwrite_check(labels_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if labels_dir.is_dir() {
        collect_files(labels_dir, &labels_dir.join(TRASH_DIR), &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect_files(dir: &Path, trash_dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", path.display()))?;

        if file_type.is_dir() {
            collect_files(&path, trash_dir, found)?;
        } else if file_type.is_file() && dir != trash_dir {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_missing_labels_dir() {
        let dir = tempdir().unwrap();
        assert!(labels_overwrite_check(&dir.path().join("labels")).unwrap().is_empty());
    }

    #[test]
    fn test_links_and_trash_are_safe() {
        let dir = tempdir().unwrap();
        let labels = dir.path().join("labels");
        fs::create_dir_all(labels.join("Work/Clients")).unwrap();
        fs::create_dir_all(labels.join("Trash")).unwrap();
        symlink("../../All Mail/a@b.gz", labels.join("Work/a@b.gz")).unwrap();
        fs::write(labels.join("Trash/deleted@b.gz"), b"x").unwrap();

        assert!(labels_overwrite_check(&labels).unwrap().is_empty());
    }

    #[test]
    fn test_reports_real_files() {
        let dir = tempdir().unwrap();
        let labels = dir.path().join("labels");
        fs::create_dir_all(labels.join("Work/Trash")).unwrap();
        fs::create_dir_all(labels.join("Spam")).unwrap();
        fs::write(labels.join("Spam/junk@b.gz"), b"x").unwrap();
        fs::write(labels.join("Work/Trash/kept@b.gz"), b"x").unwrap();

        let found = labels_overwrite_check(&labels).unwrap();

        assert_eq!(
            found,
            [labels.join("Spam/junk@b.gz"), labels.join("Work/Trash/kept@b.gz")]
        );
    }
}
