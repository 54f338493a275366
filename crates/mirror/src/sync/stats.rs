//! Counters reported after each pass

use crate::storage::LinkOutcome;

/// Statistics from one mailbox pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MailboxStats {
    /// Mailbox name on the server
    pub mailbox: String,
    /// Message count reported by the server
    pub messages: u32,
    /// Windows processed
    pub windows: usize,
    /// Message bodies downloaded
    pub fetched: usize,
    /// New stored entries written
    pub stored: usize,
    /// Links created into the archive
    pub linked: usize,
    /// Messages already present locally
    pub skipped: usize,
    /// Messages without a Message-ID that were fetched and hashed
    pub placeholders: usize,
    /// Link names occupied by something else
    pub conflicts: usize,
    /// Positions the server returned no body for
    pub missing: usize,
    /// Duration of the pass
    pub duration_ms: u64,
}

impl MailboxStats {
    pub fn new(mailbox: &str) -> Self {
        Self {
            mailbox: mailbox.to_string(),
            ..Self::default()
        }
    }

    /// Count the result of a link attempt
    pub fn record_link(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.linked += 1,
            LinkOutcome::AlreadyLinked => self.skipped += 1,
            LinkOutcome::Conflict => self.conflicts += 1,
            LinkOutcome::NotInArchive => {}
        }
    }
}

/// Statistics from a full run
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    pub archive: MailboxStats,
    pub labels: Vec<MailboxStats>,
    pub duration_ms: u64,
}

impl SyncStats {
    /// Every pass, archive first
    pub fn passes(&self) -> impl Iterator<Item = &MailboxStats> {
        std::iter::once(&self.archive).chain(self.labels.iter())
    }

    pub fn total_stored(&self) -> usize {
        self.passes().map(|p| p.stored).sum()
    }

    pub fn total_fetched(&self) -> usize {
        self.passes().map(|p| p.fetched).sum()
    }

    pub fn total_linked(&self) -> usize {
        self.passes().map(|p| p.linked).sum()
    }

    pub fn total_conflicts(&self) -> usize {
        self.passes().map(|p| p.conflicts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_link() {
        let mut stats = MailboxStats::new("Work");
        stats.record_link(LinkOutcome::Created);
        stats.record_link(LinkOutcome::AlreadyLinked);
        stats.record_link(LinkOutcome::Conflict);
        stats.record_link(LinkOutcome::NotInArchive);

        assert_eq!(stats.linked, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.conflicts, 1);
    }

    #[test]
    fn test_totals() {
        let mut archive = MailboxStats::new("[Gmail]/All Mail");
        archive.stored = 3;
        let mut work = MailboxStats::new("Work");
        work.linked = 2;
        work.stored = 1;

        let stats = SyncStats {
            archive,
            labels: vec![work],
            duration_ms: 0,
        };

        assert_eq!(stats.total_stored(), 4);
        assert_eq!(stats.total_linked(), 2);
        assert_eq!(stats.total_conflicts(), 0);
        assert_eq!(stats.passes().count(), 2);
    }
}
