//! Identity resolution for one window of sequence numbers
//!
//! Phase 1 fetches only the Message-ID header for the whole window. Phase 2
//! fetches UIDs for just the messages whose header was missing or unusable;
//! those stand in as placeholders until the body is hashed.

use anyhow::Result;
use log::{debug, warn};
use std::collections::HashSet;

use super::CancelToken;
use crate::models::{MessageIdentifier, PendingId};
use crate::remote::{MESSAGE_ID_FIELD, MailServer};

/// Resolve an identity for every position in `window`
///
/// Returns `(identity, position)` pairs. Each identity appears at most once;
/// a Message-ID repeated inside the window keeps its first position.
pub fn resolve_identities<S: MailServer + ?Sized>(
    server: &mut S,
    window: &[u32],
    cancel: &CancelToken,
) -> Result<Vec<(PendingId, u32)>> {
    cancel.checkpoint()?;
    let headers = server.fetch_header_field(window, MESSAGE_ID_FIELD)?;

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(window.len());
    let mut idless = Vec::new();

    for &position in window {
        match headers
            .get(&position)
            .and_then(|h| MessageIdentifier::from_header(h))
        {
            Some(id) => {
                if seen.insert(id.clone()) {
                    resolved.push((PendingId::Header(id), position));
                } else {
                    debug!("Duplicate Message-ID {} at position {}", id, position);
                }
            }
            None => idless.push(position),
        }
    }

    if idless.is_empty() {
        return Ok(resolved);
    }

    cancel.checkpoint()?;
    let uids = server.fetch_unique_id(&idless)?;

    for position in idless {
        match uids.get(&position) {
            Some(&uid) => resolved.push((PendingId::Placeholder(uid), position)),
            None => warn!("Server returned no UID for message {}, skipping", position),
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{InMemoryServer, Request};

    fn server_with(messages: &[&[u8]]) -> InMemoryServer {
        let mut server = InMemoryServer::new();
        for raw in messages {
            server.add_message("INBOX", raw);
        }
        server.select_readonly("INBOX").unwrap();
        server.clear_requests();
        server
    }

    #[test]
    fn test_all_headers_resolve_in_one_round_trip() {
        let mut server = server_with(&[
            b"Message-ID: <a@x.com>\r\n\r\nA",
            b"Message-ID: <b/c@x.com>\r\n\r\nB",
        ]);

        let resolved = resolve_identities(&mut server, &[1, 2], &CancelToken::new()).unwrap();

        assert_eq!(
            resolved,
            [
                (PendingId::Header(MessageIdentifier::new("a@x.com")), 1),
                (PendingId::Header(MessageIdentifier::new("b_c@x.com")), 2),
            ]
        );
        assert_eq!(server.requests(), [Request::FetchHeader(vec![1, 2])]);
    }

    #[test]
    fn test_missing_header_falls_back_to_uid() {
        let mut server = server_with(&[
            b"Message-ID: <a@x.com>\r\n\r\nA",
            b"Subject: no id\r\n\r\nB",
        ]);

        let resolved = resolve_identities(&mut server, &[1, 2], &CancelToken::new()).unwrap();

        assert_eq!(
            resolved,
            [
                (PendingId::Header(MessageIdentifier::new("a@x.com")), 1),
                (PendingId::Placeholder(2), 2),
            ]
        );
        // Only the idless position reaches phase 2
        assert_eq!(
            server.requests(),
            [Request::FetchHeader(vec![1, 2]), Request::FetchUid(vec![2])]
        );
    }

    #[test]
    fn test_duplicate_message_id_in_window() {
        let mut server = server_with(&[
            b"Message-ID: <a@x.com>\r\n\r\nfirst",
            b"Message-ID: <a@x.com>\r\n\r\nsecond",
        ]);

        let resolved = resolve_identities(&mut server, &[1, 2], &CancelToken::new()).unwrap();

        assert_eq!(
            resolved,
            [(PendingId::Header(MessageIdentifier::new("a@x.com")), 1)]
        );
    }

    #[test]
    fn test_cancelled_before_request() {
        let mut server = server_with(&[b"Message-ID: <a@x.com>\r\n\r\nA"]);
        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(resolve_identities(&mut server, &[1], &cancel).is_err());
        assert!(server.requests().is_empty());
    }
}
