//! Domain models for mirrored mail

mod mailbox;
mod message;

pub use mailbox::{LabelPath, MailboxNaming};
pub use message::{MessageIdentifier, PendingId};
