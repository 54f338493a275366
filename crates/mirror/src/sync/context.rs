//! Per-run state passed explicitly to every sync step

use anyhow::Result;
use std::io::Write;

use super::{CancelToken, Progress};
use crate::settings::MirrorOptions;

/// Options, progress output and cancellation for one run
pub struct SyncContext<W: Write> {
    pub options: MirrorOptions,
    pub progress: Progress<W>,
    pub cancel: CancelToken,
}

impl<W: Write> SyncContext<W> {
    pub fn new(options: MirrorOptions, out: W, cancel: CancelToken) -> Self {
        Self {
            options,
            progress: Progress::new(out),
            cancel,
        }
    }

    /// Fail if the user asked to stop; call before each remote round trip
    pub fn checkpoint(&self) -> Result<()> {
        self.cancel.checkpoint()
    }
}
