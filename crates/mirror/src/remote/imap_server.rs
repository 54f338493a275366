//! IMAP implementation of [`MailServer`]
//!
//! Uses the synchronous `imap` crate over native-tls (IMAPS), so the whole
//! run stays on one thread with one outstanding request at a time.

use anyhow::{Context, Result};
use log::debug;
use native_tls::TlsStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::TcpStream;

use super::{MailServer, sequence_set};
use crate::error::MirrorError;

/// Connection parameters for an IMAP account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImapAccount {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl ImapAccount {
    /// Gmail IMAP host
    pub const GMAIL_HOST: &'static str = "imap.gmail.com";
    /// IMAPS port
    pub const IMAPS_PORT: u16 = 993;

    /// Gmail account; a bare user name gets `@gmail.com` appended
    pub fn gmail(username: &str) -> Self {
        Self {
            host: Self::GMAIL_HOST.to_string(),
            port: Self::IMAPS_PORT,
            username: qualify_username(username),
        }
    }
}

/// Append the Gmail domain to user names that have none
pub fn qualify_username(username: &str) -> String {
    if username.contains('@') {
        username.to_string()
    } else {
        format!("{}@gmail.com", username)
    }
}

/// An authenticated IMAP session
pub struct ImapServer {
    session: imap::Session<TlsStream<TcpStream>>,
}

impl ImapServer {
    /// Connect over TLS and log in
    ///
    /// # Errors
    /// Returns `MirrorError::Authentication` if the server rejects the
    /// credentials.
    pub fn connect(account: &ImapAccount, password: &str) -> Result<Self> {
        let tls = native_tls::TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;

        let client = imap::connect(
            (account.host.as_str(), account.port),
            &account.host,
            &tls,
        )
        .with_context(|| format!("Failed to connect to {}:{}", account.host, account.port))?;

        let session = client
            .login(&account.username, password)
            .map_err(|(e, _client)| MirrorError::Authentication(e.to_string()))?;

        debug!("Logged in to {} as {}", account.host, account.username);
        Ok(Self { session })
    }
}

impl MailServer for ImapServer {
    fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        let names = self
            .session
            .list(Some(""), Some("*"))
            .context("Failed to list mailboxes")?;

        Ok(names.iter().map(|n| n.name().to_string()).collect())
    }

    fn select_readonly(&mut self, mailbox: &str) -> Result<u32> {
        let selected = self
            .session
            .examine(mailbox)
            .with_context(|| format!("Failed to examine mailbox {}", mailbox))?;

        Ok(selected.exists)
    }

    fn fetch_header_field(
        &mut self,
        positions: &[u32],
        field: &str,
    ) -> Result<HashMap<u32, Vec<u8>>> {
        if positions.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!("BODY.PEEK[HEADER.FIELDS ({})]", field);
        let fetches = self
            .session
            .fetch(sequence_set(positions), &query)
            .context("Failed to fetch message headers")?;

        Ok(fetches
            .iter()
            .filter_map(|f| f.header().map(|h| (f.message, h.to_vec())))
            .collect())
    }

    fn fetch_unique_id(&mut self, positions: &[u32]) -> Result<HashMap<u32, u32>> {
        if positions.is_empty() {
            return Ok(HashMap::new());
        }

        let fetches = self
            .session
            .fetch(sequence_set(positions), "UID")
            .context("Failed to fetch message UIDs")?;

        Ok(fetches
            .iter()
            .filter_map(|f| f.uid.map(|uid| (f.message, uid)))
            .collect())
    }

    fn fetch_full_body(&mut self, positions: &[u32]) -> Result<HashMap<u32, Vec<u8>>> {
        if positions.is_empty() {
            return Ok(HashMap::new());
        }

        let fetches = self
            .session
            .fetch(sequence_set(positions), "RFC822")
            .context("Failed to fetch message bodies")?;

        Ok(fetches
            .iter()
            .filter_map(|f| f.body().map(|b| (f.message, b.to_vec())))
            .collect())
    }

    fn sign_off(&mut self) -> Result<()> {
        self.session.logout().context("Failed to log out")?;
        Ok(())
    }
}
