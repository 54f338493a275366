//! Text progress display: one mark per window

use anyhow::{Context, Result};
use std::io::Write;

/// Marks per output line
const MARKS_PER_LINE: usize = 56;
/// Marks per space-separated group
const MARKS_PER_GROUP: usize = 4;

/// How much of a window needed a body fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMark {
    /// Nothing fetched
    Skipped,
    /// Some messages fetched
    Partial,
    /// Every message fetched
    Full,
}

impl WindowMark {
    pub fn for_window(fetched: usize, window_len: usize) -> Self {
        if fetched == 0 {
            WindowMark::Skipped
        } else if fetched < window_len {
            WindowMark::Partial
        } else {
            WindowMark::Full
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            WindowMark::Skipped => '.',
            WindowMark::Partial => ':',
            WindowMark::Full => '*',
        }
    }
}

/// Progress output for a run
///
/// ```text
/// [Gmail]/All Mail contains 600 mails. Downloading in blocks of 128.
///   **** :
/// Handling label Work
///   ..
/// ```
pub struct Progress<W: Write> {
    out: W,
    /// Marks printed for the current mailbox
    column: usize,
    /// Whether the current line has any text on it
    line_open: bool,
}

impl<W: Write> Progress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            column: 0,
            line_open: false,
        }
    }

    /// Start counting marks for a new mailbox
    pub fn begin_mailbox(&mut self) {
        self.column = 0;
    }

    /// Print a line of text, starting on a fresh line
    pub fn note(&mut self, text: &str) -> Result<()> {
        self.break_line()?;
        write!(self.out, "{}", text).context("Failed to write progress")?;
        self.line_open = true;
        self.flush()
    }

    pub fn mark(&mut self, mark: WindowMark) -> Result<()> {
        if self.column % MARKS_PER_LINE == 0 {
            write!(self.out, "\n  ")
        } else if self.column % MARKS_PER_GROUP == 0 {
            write!(self.out, " ")
        } else {
            Ok(())
        }
        .context("Failed to write progress")?;

        write!(self.out, "{}", mark.as_char()).context("Failed to write progress")?;
        self.column += 1;
        self.line_open = true;
        self.flush()
    }

    /// Report that the run was interrupted
    pub fn abort(&mut self) -> Result<()> {
        write!(self.out, " Abort.").context("Failed to write progress")?;
        self.line_open = true;
        self.flush()
    }

    /// Terminate the last line
    pub fn finish(&mut self) -> Result<()> {
        self.break_line()?;
        self.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn break_line(&mut self) -> Result<()> {
        if self.line_open {
            writeln!(self.out).context("Failed to write progress")?;
            self.line_open = false;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush progress")
    }
}
