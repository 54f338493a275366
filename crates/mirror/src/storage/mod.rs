//! Local storage: the content-addressed archive and the reference trees
//! built over it

mod content;
mod encoding;
mod link;
mod overwrite;

pub use content::{ContentStore, StoredEntry};
pub use encoding::Encoding;
pub use link::{LabelLinker, LinkOutcome, place_link};
pub use overwrite::labels_overwrite_check;
