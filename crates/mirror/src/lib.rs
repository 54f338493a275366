//! Mirror crate - mirrors a remote mailbox tree into a local directory
//!
//! This crate provides:
//! - Message identity (Message-ID or content hash) and mailbox naming
//! - A mail server abstraction with IMAP and in-memory implementations
//! - A content-addressed store with one file per message
//! - Label directories made of links into the archive
//! - A resumable, idempotent sync engine
//!
//! One copy of every message lives under `All Mail/`; each label is a
//! directory of symlinks into it.

pub mod error;
pub mod layout;
pub mod models;
pub mod remote;
pub mod settings;
pub mod storage;
pub mod sync;

pub use error::{MirrorError, is_cancelled};
pub use layout::MirrorLayout;
pub use models::{LabelPath, MailboxNaming, MessageIdentifier, PendingId};
pub use remote::{ImapAccount, ImapServer, InMemoryServer, MailServer};
pub use settings::{AccountSettings, MirrorOptions, PASSWORD_ENV, password_from_env};
pub use storage::{ContentStore, Encoding, LabelLinker, LinkOutcome, labels_overwrite_check};
pub use sync::{CancelToken, MailboxStats, SyncContext, SyncStats, sync_all, sync_mailbox};
