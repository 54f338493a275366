//! Message identity
//!
//! A message is named on disk by its Message-ID header, or by the SHA-1 of
//! its raw content when the header is missing.

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::sync::LazyLock;

static MESSAGE_ID_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Message-ID:\s*<?(\S+@[^\s>]+)>?\s*$").expect("valid Message-ID pattern")
});

/// Filename-safe identifier of a message's content
///
/// Never contains a path separator, so it is always a single
/// filename segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageIdentifier(String);

impl MessageIdentifier {
    /// Create an identifier, escaping path separators
    pub fn new(id: impl Into<String>) -> Self {
        Self(escape(&id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the identifier from a fetched `Message-ID` header block
    ///
    /// Returns `None` when the header is absent or does not look like
    /// `local@domain`.
    pub fn from_header(raw: &[u8]) -> Option<Self> {
        let captures = MESSAGE_ID_HEADER.captures(raw)?;
        let value = std::str::from_utf8(captures.get(1)?.as_bytes()).ok()?;
        Some(Self::new(value))
    }

    /// Content identifier: lowercase hex SHA-1 of the raw message
    pub fn from_body(raw: &[u8]) -> Self {
        Self(format!("{:x}", Sha1::digest(raw)))
    }
}

impl fmt::Display for MessageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace hierarchical separators so the value is one path segment
fn escape(value: &str) -> String {
    value.replace('/', "_")
}

/// Identity of a message as known before its body is fetched
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingId {
    /// Resolved from the Message-ID header
    Header(MessageIdentifier),
    /// No usable Message-ID; the server UID stands in until the body is
    /// hashed. Only meaningful inside the mailbox it came from.
    Placeholder(u32),
}

impl PendingId {
    /// Name checked for an existing entry in the current directory
    pub fn file_stem(&self) -> String {
        match self {
            PendingId::Header(id) => id.as_str().to_string(),
            PendingId::Placeholder(uid) => uid.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_with_brackets() {
        let raw = b"Message-ID: <abc@x.com>\r\n\r\n";
        let id = MessageIdentifier::from_header(raw).unwrap();
        assert_eq!(id.as_str(), "abc@x.com");
    }

    #[test]
    fn test_from_header_case_insensitive() {
        let raw = b"message-id: <CAF+123@mail.example.org>\r\n";
        let id = MessageIdentifier::from_header(raw).unwrap();
        assert_eq!(id.as_str(), "CAF+123@mail.example.org");
    }

    #[test]
    fn test_from_header_without_brackets() {
        let raw = b"Message-Id:   plain.id@host \r\n";
        let id = MessageIdentifier::from_header(raw).unwrap();
        assert_eq!(id.as_str(), "plain.id@host");
    }

    #[test]
    fn test_from_header_folded() {
        let raw = b"Message-ID:\r\n <folded@example.com>\r\n\r\n";
        let id = MessageIdentifier::from_header(raw).unwrap();
        assert_eq!(id.as_str(), "folded@example.com");
    }

    #[test]
    fn test_from_header_escapes_slashes() {
        let raw = b"Message-ID: <a/b/c@x.com>\r\n";
        let id = MessageIdentifier::from_header(raw).unwrap();
        assert_eq!(id.as_str(), "a_b_c@x.com");
        assert!(!id.as_str().contains('/'));
    }

    #[test]
    fn test_from_header_missing() {
        assert!(MessageIdentifier::from_header(b"\r\n").is_none());
        assert!(MessageIdentifier::from_header(b"").is_none());
    }

    #[test]
    fn test_from_header_malformed() {
        // No '@' means the value is not a usable identifier
        assert!(MessageIdentifier::from_header(b"Message-ID: <nonsense>\r\n").is_none());
    }

    #[test]
    fn test_from_body_is_sha1_hex() {
        let id = MessageIdentifier::from_body(b"abc");
        assert_eq!(id.as_str(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_from_body_is_stable() {
        let raw = b"Subject: hi\r\n\r\nbody\r\n";
        assert_eq!(
            MessageIdentifier::from_body(raw),
            MessageIdentifier::from_body(raw)
        );
    }

    #[test]
    fn test_pending_file_stem() {
        let header = PendingId::Header(MessageIdentifier::new("abc@x.com"));
        assert_eq!(header.file_stem(), "abc@x.com");
        assert_eq!(PendingId::Placeholder(42).file_stem(), "42");
    }
}
