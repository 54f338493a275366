//! In-memory mail server
//!
//! A scripted [`MailServer`] used in tests. It keeps every request it
//! receives so tests can check exactly which round trips a sync made.

use anyhow::{Result, bail};
use std::collections::HashMap;

use super::MailServer;
use crate::sync::CancelToken;

/// A request received by [`InMemoryServer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Select(String),
    FetchHeader(Vec<u32>),
    FetchUid(Vec<u32>),
    FetchBody(Vec<u32>),
    SignOff,
}

struct Mailbox {
    name: String,
    /// (uid, raw message) in sequence order
    messages: Vec<(u32, Vec<u8>)>,
    next_uid: u32,
}

/// In-memory implementation of MailServer
pub struct InMemoryServer {
    mailboxes: Vec<Mailbox>,
    selected: Option<usize>,
    requests: Vec<Request>,
    /// Cancel this token once the given number of requests has been served
    trip: Option<(usize, CancelToken)>,
}

impl InMemoryServer {
    /// Create a server with no mailboxes
    pub fn new() -> Self {
        Self {
            mailboxes: Vec::new(),
            selected: None,
            requests: Vec::new(),
            trip: None,
        }
    }

    /// Add an empty mailbox (no-op if it already exists)
    pub fn add_mailbox(&mut self, name: &str) {
        if self.position(name).is_none() {
            self.mailboxes.push(Mailbox {
                name: name.to_string(),
                messages: Vec::new(),
                next_uid: 1,
            });
        }
    }

    /// Append a message to a mailbox, creating the mailbox if needed.
    /// Returns the UID assigned to it.
    pub fn add_message(&mut self, mailbox: &str, raw: &[u8]) -> u32 {
        self.add_mailbox(mailbox);
        let index = self.position(mailbox).unwrap_or_default();
        let mailbox = &mut self.mailboxes[index];
        let uid = mailbox.next_uid;
        mailbox.next_uid += 1;
        mailbox.messages.push((uid, raw.to_vec()));
        uid
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Forget recorded requests
    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    /// Positions fetched with full bodies, across all requests
    pub fn body_fetches(&self) -> Vec<u32> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::FetchBody(positions) => Some(positions.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Cancel `token` after `requests` requests have been served,
    /// simulating a user interrupt in the middle of a run
    pub fn cancel_after(&mut self, requests: usize, token: CancelToken) {
        self.trip = Some((requests, token));
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.mailboxes.iter().position(|m| m.name == name)
    }

    fn record(&mut self, request: Request) {
        self.requests.push(request);
        if let Some((limit, token)) = &self.trip {
            if self.requests.len() >= *limit {
                token.cancel();
            }
        }
    }

    fn selected_messages(&self) -> Result<&[(u32, Vec<u8>)]> {
        match self.selected {
            Some(index) => Ok(&self.mailboxes[index].messages),
            None => bail!("No mailbox selected"),
        }
    }

    fn message_at(&self, position: u32) -> Result<Option<&(u32, Vec<u8>)>> {
        let messages = self.selected_messages()?;
        Ok(position
            .checked_sub(1)
            .and_then(|i| messages.get(i as usize)))
    }
}

impl Default for InMemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MailServer for InMemoryServer {
    fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        self.record(Request::List);
        Ok(self.mailboxes.iter().map(|m| m.name.clone()).collect())
    }

    fn select_readonly(&mut self, mailbox: &str) -> Result<u32> {
        self.record(Request::Select(mailbox.to_string()));
        let Some(index) = self.position(mailbox) else {
            bail!("Mailbox {} does not exist", mailbox);
        };
        self.selected = Some(index);
        Ok(self.mailboxes[index].messages.len() as u32)
    }

    fn fetch_header_field(
        &mut self,
        positions: &[u32],
        field: &str,
    ) -> Result<HashMap<u32, Vec<u8>>> {
        self.record(Request::FetchHeader(positions.to_vec()));
        let mut result = HashMap::new();
        for &position in positions {
            if let Some((_, raw)) = self.message_at(position)? {
                result.insert(position, header_field(raw, field));
            }
        }
        Ok(result)
    }

    fn fetch_unique_id(&mut self, positions: &[u32]) -> Result<HashMap<u32, u32>> {
        self.record(Request::FetchUid(positions.to_vec()));
        let mut result = HashMap::new();
        for &position in positions {
            if let Some((uid, _)) = self.message_at(position)? {
                result.insert(position, *uid);
            }
        }
        Ok(result)
    }

    fn fetch_full_body(&mut self, positions: &[u32]) -> Result<HashMap<u32, Vec<u8>>> {
        self.record(Request::FetchBody(positions.to_vec()));
        let mut result = HashMap::new();
        for &position in positions {
            if let Some((_, raw)) = self.message_at(position)? {
                result.insert(position, raw.clone());
            }
        }
        Ok(result)
    }

    fn sign_off(&mut self) -> Result<()> {
        self.record(Request::SignOff);
        self.selected = None;
        Ok(())
    }
}

/// Render one header field the way `BODY[HEADER.FIELDS (...)]` does:
/// the matching lines (with continuations) followed by a blank line.
fn header_field(raw: &[u8], field: &str) -> Vec<u8> {
    let text = String::from_utf8_lossy(raw);
    let prefix = format!("{}:", field.to_ascii_lowercase());
    let mut out = String::new();
    let mut in_field = false;

    for line in text.split("\r\n").flat_map(|l| l.split('\n')) {
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if in_field {
                out.push_str(line);
                out.push_str("\r\n");
            }
            continue;
        }
        in_field = line.to_ascii_lowercase().starts_with(&prefix);
        if in_field {
            out.push_str(line);
            out.push_str("\r\n");
        }
    }

    out.push_str("\r\n");
    out.into_bytes()
}
