//! Sync engine for mirroring a mailbox tree
//!
//! Provides idempotent sync operations that can be safely re-run after an
//! interruption: stored messages are skipped and label links are repaired
//! without refetching bodies.

mod batch;
mod cancel;
mod context;
mod driver;
mod identity;
mod progress;
mod stats;

pub use batch::{PassMode, sync_mailbox, windows};
pub use cancel::CancelToken;
pub use context::SyncContext;
pub use driver::sync_all;
pub use identity::resolve_identities;
pub use progress::{Progress, WindowMark};
pub use stats::{MailboxStats, SyncStats};
