//! Collaborator interface: how code outside the core moves bytes in and out
//! of the current window.
//!
//! Inbound calls never take an undo snapshot; a command that wants its bulk
//! insert to be undoable snapshots first. Outbound calls never mutate.

use crate::EditorEngine;
use core_state::{AddressError, CapacityError, EditResult, WindowFlags, WindowMode};
use core_text::{DirSuffix, TextLine, join_lines, split_blob};
use tracing::trace;

impl EditorEngine {
    fn check_line(&self, line: usize) -> EditResult<()> {
        if line == 0 || line > self.window().dol() {
            return Err(AddressError::LineOutOfRange(line).into());
        }
        Ok(())
    }

    /// Fails with `TooManyLines` unless `adding` more lines fit in the
    /// current window.
    pub fn check_capacity(&self, adding: usize) -> EditResult<()> {
        let limit = self.limits().max_lines;
        if self.window().dol() + adding > limit {
            return Err(CapacityError::TooManyLines { limit }.into());
        }
        Ok(())
    }

    /// Split `blob` on newlines and insert the lines after `at`. Returns the
    /// number of lines inserted; dot lands on the last of them.
    pub fn insert_bulk(&mut self, at: usize, blob: &[u8]) -> EditResult<usize> {
        let dol = self.window().dol();
        if at > dol {
            return Err(AddressError::LineOutOfRange(at).into());
        }
        let split = split_blob(blob);
        self.check_capacity(split.lines.len())?;
        let parts = self.parts();
        if split.has_nul {
            parts.window.flags.insert(WindowFlags::BINARY);
        }
        let n = parts.window.insert_lines(parts.pool, at, split.lines);
        if at == dol && n > 0 && !split.final_newline {
            parts.window.flags.insert(WindowFlags::NO_FINAL_NEWLINE);
        }
        trace!(target: "text.pool", at, lines = n, bytes = blob.len(), "insert_bulk");
        Ok(n)
    }

    /// Insert directory entries after `at` and put the window in directory
    /// mode.
    pub fn insert_directory(
        &mut self,
        at: usize,
        entries: Vec<(Vec<u8>, Option<DirSuffix>)>,
    ) -> EditResult<usize> {
        if at > self.window().dol() {
            return Err(AddressError::LineOutOfRange(at).into());
        }
        self.check_capacity(entries.len())?;
        let parts = self.parts();
        parts.window.flags.insert(WindowFlags::DIRECTORY);
        let entries = entries
            .into_iter()
            .map(|(name, suffix)| (TextLine::new(name), suffix))
            .collect();
        Ok(parts.window.insert_entries(parts.pool, at, entries))
    }

    /// Replace line `line` with `bytes` (a form field value pushed back by the
    /// browsing layer). Embedded newlines split the value into several lines.
    pub fn update_line(&mut self, line: usize, bytes: &[u8]) -> EditResult<()> {
        self.check_line(line)?;
        let mut lines: Vec<TextLine> = bytes.split(|b| *b == b'\n').map(TextLine::new).collect();
        if lines.is_empty() {
            lines.push(TextLine::default());
        }
        self.check_capacity(lines.len() - 1)?;
        let parts = self.parts();
        parts.window.replace_lines(parts.pool, line, line, lines);
        if parts.window.mode() != WindowMode::Browse {
            parts.window.mark_changed();
        }
        Ok(())
    }

    /// Bytes of lines `start..=end`, newline-terminated except when the range
    /// ends on a last line that had no newline. On an empty buffer the only
    /// valid range is `0..=0` (or `1..=0`), yielding nothing.
    pub fn extract_range(&self, start: usize, end: usize) -> EditResult<Vec<u8>> {
        let w = self.window();
        let dol = w.dol();
        if dol == 0 {
            if end == 0 && start <= 1 {
                return Ok(Vec::new());
            }
            return Err(AddressError::LineOutOfRange(end.max(start)).into());
        }
        if start == 0 {
            return Err(AddressError::LineOutOfRange(0).into());
        }
        if end > dol {
            return Err(AddressError::LineOutOfRange(end).into());
        }
        if start > end {
            return Err(AddressError::BadRange.into());
        }
        let final_newline = !(end == dol && w.flags.contains(WindowFlags::NO_FINAL_NEWLINE));
        let pool = self.pool();
        let lines = (start..=end).filter_map(|n| w.line(pool, n)).map(TextLine::raw);
        Ok(join_lines(lines, final_newline))
    }

    /// Raw bytes of one line.
    pub fn fetch_line(&self, line: usize) -> EditResult<Vec<u8>> {
        self.check_line(line)?;
        let w = self.window();
        Ok(w
            .line(self.pool(), line)
            .map(|l| l.raw().to_vec())
            .unwrap_or_default())
    }
}
