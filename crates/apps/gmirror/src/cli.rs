//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use mirror::settings::DEFAULT_BATCH_SIZE;
use mirror::{AccountSettings, Encoding, ImapAccount, MailboxNaming, MirrorOptions};

/// Mirror a Gmail account into a local directory
///
/// Every message is stored once under `All Mail/`; each label becomes a
/// directory of symlinks under `labels/`. Re-running only fetches what is new.
#[derive(Debug, Parser)]
#[command(name = "gmirror", version)]
pub struct Cli {
    /// Store messages uncompressed
    #[arg(short = 'u', long, conflicts_with = "zstd")]
    pub uncompressed: bool,

    /// Compress new messages with zstd instead of gzip
    #[arg(long)]
    pub zstd: bool,

    /// Remove and rebuild the labels/ directory
    #[arg(short = 'D', long)]
    pub overwrite_labels: bool,

    /// Gmail user; `@gmail.com` is appended when no domain is given
    #[arg(long)]
    pub user: Option<String>,

    /// Directory to mirror into
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Messages per fetch request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// IMAP host
    #[arg(long)]
    pub host: Option<String>,

    /// IMAP port
    #[arg(long)]
    pub port: Option<u16>,

    /// Use the legacy "[Google Mail]" folder names
    #[arg(long)]
    pub google_mail: bool,

    /// Do not ask before overwriting labels/
    #[arg(short = 'y', long)]
    pub yes: bool,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// Encoding for new messages: flags win over the saved preference
    pub fn encoding(&self, saved: Option<Encoding>) -> Encoding {
        if self.uncompressed {
            Encoding::Plain
        } else if self.zstd {
            Encoding::Zstd
        } else {
            saved.unwrap_or_default()
        }
    }

    pub fn options(&self, settings: &AccountSettings) -> MirrorOptions {
        let naming = if self.google_mail {
            MailboxNaming::google_mail()
        } else {
            MailboxNaming::gmail()
        };

        MirrorOptions::default()
            .with_encoding(self.encoding(settings.encoding))
            .with_batch_size(self.batch_size)
            .with_overwrite_labels(self.overwrite_labels)
            .with_naming(naming)
    }

    /// Connection parameters: flags, then saved settings, then Gmail defaults
    pub fn account(&self, username: &str, settings: &AccountSettings) -> ImapAccount {
        let mut account = ImapAccount::gmail(username);
        if let Some(host) = self.host.clone().or_else(|| settings.host.clone()) {
            account.host = host;
        }
        if let Some(port) = self.port.or(settings.port) {
            account.port = port;
        }
        account
    }
}
