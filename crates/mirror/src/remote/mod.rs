//! Remote mail server access
//!
//! This module defines the protocol abstraction the sync engine talks to.
//! The trait-based design allows swapping the IMAP session for a scripted
//! in-memory server in tests.

mod imap_server;
mod memory;

pub use imap_server::{ImapAccount, ImapServer};
pub use memory::{InMemoryServer, Request};

use anyhow::Result;
use std::collections::HashMap;

/// Field fetched in the first identity phase
pub const MESSAGE_ID_FIELD: &str = "MESSAGE-ID";

/// Operations the sync engine needs from a mail server
///
/// All calls are made sequentially on one session. Positions are
/// 1-based sequence numbers in the currently selected mailbox.
pub trait MailServer {
    /// List every mailbox name, in server order
    fn list_mailboxes(&mut self) -> Result<Vec<String>>;

    /// Select a mailbox without write access and return its message count
    fn select_readonly(&mut self, mailbox: &str) -> Result<u32>;

    /// Fetch one header field for each position
    ///
    /// Positions without the field may be missing from the map or carry an
    /// empty header block.
    fn fetch_header_field(&mut self, positions: &[u32], field: &str)
    -> Result<HashMap<u32, Vec<u8>>>;

    /// Fetch the server-assigned UID for each position
    fn fetch_unique_id(&mut self, positions: &[u32]) -> Result<HashMap<u32, u32>>;

    /// Fetch the complete raw message for each position
    fn fetch_full_body(&mut self, positions: &[u32]) -> Result<HashMap<u32, Vec<u8>>>;

    /// End the session politely
    fn sign_off(&mut self) -> Result<()>;
}

/// Render positions as a compact IMAP sequence set (`1:4,7,9:10`)
pub fn sequence_set(positions: &[u32]) -> String {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(mut start) = iter.next() else {
        return String::new();
    };
    let mut end = start;

    for n in iter {
        if n == end + 1 {
            end = n;
            continue;
        }
        parts.push(render_run(start, end));
        start = n;
        end = n;
    }
    parts.push(render_run(start, end));

    parts.join(",")
}

fn render_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}:{}", start, end)
    }
}
