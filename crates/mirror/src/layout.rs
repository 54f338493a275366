//! Local directory layout of a mirror
//!
//! ```text
//! <workdir>/
//!   All Mail/               stored messages
//!   labels/
//!     Work/                 links into ../../All Mail
//!     Work/Clients/         links into ../../../All Mail
//! ```

use std::path::{Path, PathBuf};

use crate::models::LabelPath;

/// Archive directory name
pub const ARCHIVE_DIR: &str = "All Mail";
/// Root of the label reference trees
pub const LABELS_DIR: &str = "labels";

/// Paths inside a mirror's working directory
#[derive(Debug, Clone)]
pub struct MirrorLayout {
    root: PathBuf,
}

impl MirrorLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join(LABELS_DIR)
    }

    pub fn label_dir(&self, label: &LabelPath) -> PathBuf {
        self.labels_dir().join(label.to_path())
    }

    /// Archive directory relative to a label directory
    ///
    /// One `..` per label level plus one for `labels/` itself.
    pub fn archive_rel(&self, label: &LabelPath) -> PathBuf {
        let mut rel: PathBuf = std::iter::repeat_n("..", label.depth() + 1).collect();
        rel.push(ARCHIVE_DIR);
        rel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MailboxNaming;

    #[test]
    fn test_dirs() {
        let layout = MirrorLayout::new("/mail");
        assert_eq!(layout.archive_dir(), PathBuf::from("/mail/All Mail"));
        assert_eq!(layout.labels_dir(), PathBuf::from("/mail/labels"));
    }

    #[test]
    fn test_label_dir_and_relative_archive() {
        let layout = MirrorLayout::new("/mail");
        let naming = MailboxNaming::gmail();

        let work = naming.label_path("Work");
        assert_eq!(layout.label_dir(&work), PathBuf::from("/mail/labels/Work"));
        assert_eq!(layout.archive_rel(&work), PathBuf::from("../../All Mail"));

        let nested = naming.label_path("Work/Clients/Acme");
        assert_eq!(
            layout.label_dir(&nested),
            PathBuf::from("/mail/labels/Work/Clients/Acme")
        );
        assert_eq!(
            layout.archive_rel(&nested),
            PathBuf::from("../../../../All Mail")
        );
    }

    #[test]
    fn test_relative_archive_resolves() {
        let layout = MirrorLayout::new("/mail");
        let label = MailboxNaming::gmail().label_path("[Gmail]/Sent Mail");

        let resolved = layout.label_dir(&label).join(layout.archive_rel(&label));
        let normalized: PathBuf = resolved.components().fold(PathBuf::new(), |mut acc, c| {
            match c {
                std::path::Component::ParentDir => {
                    acc.pop();
                }
                other => acc.push(other),
            }
            acc
        });
        assert_eq!(normalized, layout.archive_dir());
    }
}
