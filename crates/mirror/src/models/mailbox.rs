//! Mailbox naming: which remote mailbox is the archive and how label names
//! map onto local directories

use std::path::PathBuf;

/// Names of the distinguished mailboxes on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxNaming {
    /// Mailbox holding one copy of every message
    pub archive: String,
    /// Non-selectable parent of the system mailboxes
    pub umbrella: String,
    /// Hierarchy separator used in mailbox names
    pub separator: char,
}

impl MailboxNaming {
    /// Current Gmail naming (`[Gmail]/All Mail`)
    pub fn gmail() -> Self {
        Self::with_umbrella("[Gmail]")
    }

    /// Legacy naming used by some Gmail locales (`[Google Mail]/All Mail`)
    pub fn google_mail() -> Self {
        Self::with_umbrella("[Google Mail]")
    }

    fn with_umbrella(umbrella: &str) -> Self {
        Self {
            archive: format!("{}/All Mail", umbrella),
            umbrella: umbrella.to_string(),
            separator: '/',
        }
    }

    /// Whether a mailbox from the listing is synced as a label
    pub fn is_label(&self, mailbox: &str) -> bool {
        mailbox != self.archive && mailbox != self.umbrella
    }

    /// Local directory path for a label, relative to `labels/`
    ///
    /// The umbrella prefix is dropped, so `[Gmail]/Sent Mail` becomes
    /// `Sent Mail` and `Work/Clients` becomes `Work/Clients`.
    pub fn label_path(&self, mailbox: &str) -> LabelPath {
        let prefix = format!("{}{}", self.umbrella, self.separator);
        let name = mailbox.strip_prefix(&prefix).unwrap_or(mailbox);

        let components = name
            .split(self.separator)
            .filter(|c| !c.is_empty())
            .map(|c| match c {
                "." | ".." => format!("_{}", c),
                other => other.to_string(),
            })
            .collect();

        LabelPath(components)
    }
}

impl Default for MailboxNaming {
    fn default() -> Self {
        Self::gmail()
    }
}

/// Directory components of a label below `labels/`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelPath(Vec<String>);

impl LabelPath {
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Number of directory levels below `labels/`
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn to_path(&self) -> PathBuf {
        self.0.iter().collect()
    }
}
