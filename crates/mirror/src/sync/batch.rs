//! Per-mailbox pass: windows of identities, dedup against local state,
//! then one body fetch per window for whatever is genuinely new
//!
//! This operation is idempotent - running it again against the same
//! mailbox fetches nothing and changes nothing on disk.

use anyhow::Result;
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use super::{MailboxStats, SyncContext, WindowMark, resolve_identities};
use crate::models::{MessageIdentifier, PendingId};
use crate::remote::MailServer;
use crate::storage::{ContentStore, LabelLinker, place_link};

/// How a pass treats messages it has not seen in its own directory
#[derive(Clone, Copy)]
pub enum PassMode<'a> {
    /// Store every new message
    Archive,
    /// Link to the archive where possible, store only what it lacks
    Label(&'a LabelLinker<'a>),
}

/// Split sequence numbers `1..=count` into consecutive windows of `size`
///
/// The last window is shorter when `size` does not divide `count`.
pub fn windows(count: u32, size: usize) -> impl Iterator<Item = Vec<u32>> {
    let size = u32::try_from(size.max(1)).unwrap_or(u32::MAX);
    (0..count.div_ceil(size)).map(move |i| {
        let start = i * size + 1;
        let end = start.saturating_add(size - 1).min(count);
        (start..=end).collect()
    })
}

/// Mirror one mailbox into `store`
///
/// # Arguments
/// * `server` - Session to fetch from
/// * `mailbox` - Remote mailbox name
/// * `store` - Directory this mailbox's entries go to
/// * `mode` - Archive or label pass
/// * `ctx` - Options, progress output and cancellation
pub fn sync_mailbox<S: MailServer + ?Sized, W: Write>(
    server: &mut S,
    mailbox: &str,
    store: &ContentStore,
    mode: PassMode<'_>,
    ctx: &mut SyncContext<W>,
) -> Result<MailboxStats> {
    let start = Instant::now();
    let mut stats = MailboxStats::new(mailbox);
    let batch_size = ctx.options.batch_size;

    ctx.checkpoint()?;
    let count = server.select_readonly(mailbox)?;
    stats.messages = count;

    if let PassMode::Archive = mode {
        ctx.progress.note(&format!(
            "{} contains {} mails. Downloading in blocks of {}.",
            mailbox, count, batch_size
        ))?;
    }
    ctx.progress.begin_mailbox();

    for window in windows(count, batch_size) {
        let resolved = resolve_identities(server, &window, &ctx.cancel)?;

        let mut pending = Vec::new();
        for (id, position) in resolved {
            if store.exists(&id.file_stem())? {
                stats.skipped += 1;
                continue;
            }
            // Placeholders are mailbox-scoped UIDs and never name an
            // archive entry, so only real Message-IDs are looked up
            if let (PassMode::Label(linker), PendingId::Header(message_id)) = (mode, &id) {
                let outcome = linker.link_if_present(message_id)?;
                if outcome.is_resolved() {
                    stats.record_link(outcome);
                    continue;
                }
            }
            pending.push((id, position));
        }

        stats.windows += 1;
        ctx.progress
            .mark(WindowMark::for_window(pending.len(), window.len()))?;

        if pending.is_empty() {
            continue;
        }

        debug!(
            "Will get {} of {}..{} in {}",
            pending.len(),
            window[0],
            window[window.len() - 1],
            mailbox
        );

        ctx.checkpoint()?;
        let positions: Vec<u32> = pending.iter().map(|(_, p)| *p).collect();
        let bodies = server.fetch_full_body(&positions)?;

        for (id, position) in pending {
            let Some(raw) = bodies.get(&position) else {
                warn!("Server returned no body for message {} in {}", position, mailbox);
                stats.missing += 1;
                continue;
            };
            stats.fetched += 1;

            match id {
                PendingId::Header(message_id) => {
                    store.materialize(&message_id, raw)?;
                    stats.stored += 1;
                }
                PendingId::Placeholder(uid) => {
                    store_without_message_id(uid, raw, store, mode, &mut stats)?;
                }
            }
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "{}: {} messages, {} fetched, {} stored, {} linked, {} skipped, {} conflicts ({} ms)",
        mailbox,
        stats.messages,
        stats.fetched,
        stats.stored,
        stats.linked,
        stats.skipped,
        stats.conflicts,
        stats.duration_ms
    );
    Ok(stats)
}

/// Store a message that has no Message-ID under the hash of its content
///
/// The placeholder name (UID plus compression marker) becomes a link to the
/// hash-named entry so later runs find it without refetching. In a label
/// pass the archive copy is preferred and both links point straight at it.
fn store_without_message_id(
    uid: u32,
    raw: &[u8],
    store: &ContentStore,
    mode: PassMode<'_>,
    stats: &mut MailboxStats,
) -> Result<()> {
    let hash = MessageIdentifier::from_body(raw);
    let placeholder = uid.to_string();
    stats.placeholders += 1;
    debug!("Email without Message-ID: UID {} is {}", uid, hash);

    if let PassMode::Label(linker) = mode {
        if let Some(entry) = linker.locate(&hash)? {
            stats.record_link(linker.link_entry(hash.as_str(), &entry)?);
            linker.link_entry(&placeholder, &entry)?;
            return Ok(());
        }
    }

    if store.exists(hash.as_str())? {
        stats.skipped += 1;
    } else {
        store.materialize(&hash, raw)?;
        stats.stored += 1;
    }

    match store.locate(hash.as_str())? {
        Some(entry) => {
            place_link(
                store.root(),
                &entry.link_name(&placeholder),
                Path::new(&entry.file_name),
            )?;
        }
        None => warn!(
            "{} in {} is not a stored file, not linking UID {}",
            hash,
            store.root().display(),
            uid
        ),
    }
    Ok(())
}
