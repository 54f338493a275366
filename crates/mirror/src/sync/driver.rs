//! Full run: the archive pass, then one pass per label

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::time::Instant;

use super::{PassMode, SyncContext, SyncStats, sync_mailbox};
use crate::error::{MirrorError, is_cancelled};
use crate::layout::MirrorLayout;
use crate::remote::MailServer;
use crate::storage::{ContentStore, LabelLinker};

/// Mirror every mailbox on the server into `layout`
///
/// The session is signed off on every exit path. When the run was
/// cancelled an abort notice is printed first; whatever was already stored
/// stays, and the next run picks up from there.
///
/// # Errors
/// * `MirrorError::ArchiveMissing` if the archive mailbox is not listed
/// * `MirrorError::Cancelled` if the cancel token was triggered
/// * any remote or filesystem failure
pub fn sync_all<S: MailServer + ?Sized, W: Write>(
    server: &mut S,
    layout: &MirrorLayout,
    ctx: &mut SyncContext<W>,
) -> Result<SyncStats> {
    let result = run_passes(server, layout, ctx);

    if let Err(e) = &result {
        if is_cancelled(e) {
            if let Err(e) = ctx.progress.abort() {
                warn!("Failed to print abort notice: {:#}", e);
            }
        }
    }

    if let Err(e) = server.sign_off() {
        warn!("Failed to sign off: {:#}", e);
    }
    if let Err(e) = ctx.progress.finish() {
        warn!("Failed to finish progress output: {:#}", e);
    }

    result
}

fn run_passes<S: MailServer + ?Sized, W: Write>(
    server: &mut S,
    layout: &MirrorLayout,
    ctx: &mut SyncContext<W>,
) -> Result<SyncStats> {
    let start = Instant::now();
    ctx.options.validate()?;
    let naming = ctx.options.naming.clone();

    ctx.checkpoint()?;
    let mailboxes = server.list_mailboxes()?;
    if !mailboxes.contains(&naming.archive) {
        return Err(MirrorError::ArchiveMissing {
            archive: naming.archive,
        }
        .into());
    }

    // 1. Archive pass: every new message is stored
    let archive = ContentStore::new(layout.archive_dir(), ctx.options.encoding)?;
    let archive_stats = sync_mailbox(server, &naming.archive, &archive, PassMode::Archive, ctx)
        .with_context(|| format!("Failed to sync {}", naming.archive))?;

    // 2. Label passes: links into the archive
    let labels_dir = layout.labels_dir();
    if ctx.options.overwrite_labels && labels_dir.exists() {
        info!("Removing {}", labels_dir.display());
        fs::remove_dir_all(&labels_dir)
            .with_context(|| format!("Failed to remove {}", labels_dir.display()))?;
    }
    fs::create_dir_all(&labels_dir)
        .with_context(|| format!("Failed to create {}", labels_dir.display()))?;

    let mut label_stats = Vec::new();
    for mailbox in mailboxes.iter().filter(|m| naming.is_label(m)) {
        let label = naming.label_path(mailbox);
        if label.depth() == 0 {
            warn!("Mailbox {} has no usable label name, skipping", mailbox);
            continue;
        }

        ctx.progress.note(&format!("Handling label {}", mailbox))?;

        let store = ContentStore::new(layout.label_dir(&label), ctx.options.encoding)?;
        let linker = LabelLinker::new(store.root(), &archive, layout.archive_rel(&label));
        let stats = sync_mailbox(server, mailbox, &store, PassMode::Label(&linker), ctx)
            .with_context(|| format!("Failed to sync label {}", mailbox))?;
        label_stats.push(stats);
    }

    let stats = SyncStats {
        archive: archive_stats,
        labels: label_stats,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Sync complete: {} stored, {} linked, {} conflicts across {} mailboxes ({} ms)",
        stats.total_stored(),
        stats.total_linked(),
        stats.total_conflicts(),
        stats.passes().count(),
        stats.duration_ms
    );
    Ok(stats)
}
