//! One buffer's full editing state.
//!
//! Invariants (hold after every public call):
//! * `dot <= dol`, and `dot == 0` exactly when the buffer is empty.
//! * `dol == map.len()`; there is no separately stored line count.
//! * Every label is unset or names a line in `1..=dol`.
//!
//! All structural edits funnel through [`Window::splice`] or
//! [`Window::move_lines`], which renumber labels alongside the map so the two
//! can never drift apart.

use bitflags::bitflags;
use core_text::{DirSuffix, LineEntry, LineMap, LinePool, TextLine};
use std::path::PathBuf;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u8 {
        const BINARY           = 0b0000_0001;
        const DIRECTORY        = 0b0000_0010;
        const BROWSING         = 0b0000_0100;
        const CHANGED          = 0b0000_1000;
        const HAS_UNDO         = 0b0001_0000;
        const NO_FINAL_NEWLINE = 0b0010_0000;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Which command allow-list applies to a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowMode {
    Normal,
    Browse,
    Directory,
}

impl WindowMode {
    pub fn name(self) -> &'static str {
        match self {
            WindowMode::Normal => "normal",
            WindowMode::Browse => "browse",
            WindowMode::Directory => "directory",
        }
    }
}

/// The 26 letter labels `'a`..`'z`; 0 means unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Labels([usize; 26]);

impl Labels {
    pub fn index(name: char) -> Option<usize> {
        name.is_ascii_lowercase().then(|| (name as u8 - b'a') as usize)
    }

    /// Line a label points at, `None` when unset or not a label name.
    pub fn get(&self, name: char) -> Option<usize> {
        Self::index(name)
            .map(|i| self.0[i])
            .filter(|line| *line != 0)
    }

    pub fn set(&mut self, name: char, line: usize) -> bool {
        match Self::index(name) {
            Some(i) => {
                self.0[i] = line;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, l)| **l != 0)
            .map(|(i, l)| ((b'a' + i as u8) as char, *l))
    }

    /// Apply `f` to every set label; a result of 0 clears it.
    fn remap(&mut self, f: impl Fn(usize) -> usize) {
        for slot in self.0.iter_mut().filter(|l| **l != 0) {
            *slot = f(*slot);
        }
    }
}

#[derive(Debug)]
pub struct Window {
    id: WindowId,
    dot: usize,
    map: LineMap,
    labels: Labels,
    pub flags: WindowFlags,
    pub file_name: Option<PathBuf>,
    pub last_search: Option<String>,
    pub last_replacement: Option<String>,
}

impl Window {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            dot: 0,
            map: LineMap::new(),
            labels: Labels::default(),
            flags: WindowFlags::empty(),
            file_name: None,
            last_search: None,
            last_replacement: None,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn dol(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn set_dot(&mut self, line: usize) {
        debug_assert!(line <= self.dol(), "dot {line} beyond dol {}", self.dol());
        self.dot = line.min(self.dol());
    }

    pub fn map(&self) -> &LineMap {
        &self.map
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn set_label(&mut self, name: char, line: usize) -> bool {
        line <= self.dol() && self.labels.set(name, line)
    }

    pub fn mode(&self) -> WindowMode {
        if self.flags.contains(WindowFlags::DIRECTORY) {
            WindowMode::Directory
        } else if self.flags.contains(WindowFlags::BROWSING) {
            WindowMode::Browse
        } else {
            WindowMode::Normal
        }
    }

    pub fn is_changed(&self) -> bool {
        self.flags.contains(WindowFlags::CHANGED)
    }

    pub fn mark_changed(&mut self) {
        self.flags.insert(WindowFlags::CHANGED);
    }

    pub fn line<'p>(&self, pool: &'p LinePool, n: usize) -> Option<&'p TextLine> {
        let entry = self.map.get(n.checked_sub(1)?)?;
        Some(pool.get(entry.handle))
    }

    /// Human-facing bytes of line `n`: markup skipped and, in directory mode,
    /// the entry suffix appended.
    pub fn display_line(&self, pool: &LinePool, n: usize) -> Option<Vec<u8>> {
        let entry = self.map.get(n.checked_sub(1)?)?;
        let mut out = pool.get(entry.handle).display().into_owned();
        if self.flags.contains(WindowFlags::DIRECTORY)
            && let Some(suffix) = entry.suffix
        {
            out.extend_from_slice(suffix.as_bytes());
        }
        Some(out)
    }

    pub fn is_marked(&self, n: usize) -> bool {
        n.checked_sub(1)
            .and_then(|i| self.map.get(i))
            .is_some_and(|e| e.marked)
    }

    pub fn set_mark(&mut self, n: usize, marked: bool) {
        if let Some(e) = n.checked_sub(1).and_then(|i| self.map.get_mut(i)) {
            e.marked = marked;
        }
    }

    pub fn clear_marks(&mut self) {
        self.map.clear_marks();
    }

    pub fn marked_count(&self) -> usize {
        self.map.marked_count()
    }

    /// Replace `remove` lines following the first `at` lines with `insert`,
    /// renumbering labels by the net delta. Labels inside the removed run are
    /// cleared. Dot is clamped but otherwise left for the caller to place.
    ///
    /// `NO_FINAL_NEWLINE` only describes the line that was last when it was
    /// set; any splice that removes that line or appends after it clears it.
    pub fn splice(
        &mut self,
        pool: &mut LinePool,
        at: usize,
        remove: usize,
        insert: Vec<LineEntry>,
    ) -> usize {
        let added = insert.len();
        if (remove > 0 || added > 0) && at + remove >= self.dol() {
            self.flags.remove(WindowFlags::NO_FINAL_NEWLINE);
        }
        let reclaimed = self.map.splice(pool, at, remove, insert);
        self.labels.remap(|l| {
            if l <= at {
                l
            } else if l <= at + remove {
                0
            } else {
                l - remove + added
            }
        });
        self.dot = self.dot.min(self.dol());
        if self.dot == 0 && self.dol() > 0 {
            self.dot = 1;
        }
        reclaimed
    }

    /// Insert `lines` after line `after`; dot lands on the last inserted line.
    pub fn insert_lines(
        &mut self,
        pool: &mut LinePool,
        after: usize,
        lines: Vec<TextLine>,
    ) -> usize {
        let handles = pool.append(lines);
        let n = handles.len();
        self.splice(pool, after, 0, handles.into_iter().map(LineEntry::new).collect());
        if n > 0 {
            self.dot = after + n;
        }
        n
    }

    /// Insert directory entries after line `after`, each with its suffix.
    pub fn insert_entries(
        &mut self,
        pool: &mut LinePool,
        after: usize,
        entries: Vec<(TextLine, Option<DirSuffix>)>,
    ) -> usize {
        let n = entries.len();
        let insert = entries
            .into_iter()
            .map(|(line, suffix)| LineEntry {
                suffix,
                ..LineEntry::new(pool.insert(line))
            })
            .collect();
        self.splice(pool, after, 0, insert);
        if n > 0 {
            self.dot = after + n;
        }
        n
    }

    /// Delete lines `start..=end`; dot moves to the line that followed the
    /// range, or the new last line.
    pub fn delete_lines(&mut self, pool: &mut LinePool, start: usize, end: usize) {
        debug_assert!(start >= 1 && start <= end && end <= self.dol());
        self.splice(pool, start - 1, end - start + 1, Vec::new());
        self.dot = if start <= self.dol() { start } else { self.dol() };
    }

    /// Replace lines `start..=end` with `lines`; dot lands on the last
    /// replacement line (or as for a delete when `lines` is empty).
    pub fn replace_lines(
        &mut self,
        pool: &mut LinePool,
        start: usize,
        end: usize,
        lines: Vec<TextLine>,
    ) -> usize {
        if lines.is_empty() {
            self.delete_lines(pool, start, end);
            return 0;
        }
        let handles = pool.append(lines);
        let n = handles.len();
        self.splice(
            pool,
            start - 1,
            end - start + 1,
            handles.into_iter().map(LineEntry::new).collect(),
        );
        self.dot = start - 1 + n;
        n
    }

    /// Rewrite line `n` as `lines` (one or more). Labels naming `n` stay on
    /// the first replacement line instead of being cleared.
    pub fn rewrite_line(&mut self, pool: &mut LinePool, n: usize, lines: Vec<TextLine>) -> usize {
        let held: Vec<char> = self
            .labels
            .iter()
            .filter(|(_, l)| *l == n)
            .map(|(c, _)| c)
            .collect();
        let count = self.replace_lines(pool, n, n, lines);
        if count > 0 {
            for name in held {
                self.labels.set(name, n);
            }
        }
        count
    }

    /// Duplicate lines `start..=end` after line `after`, sharing pool lines.
    pub fn copy_lines(
        &mut self,
        pool: &mut LinePool,
        start: usize,
        end: usize,
        after: usize,
    ) -> usize {
        let copies: Vec<LineEntry> = self.map.entries()[start - 1..end]
            .iter()
            .map(|e| LineEntry {
                marked: false,
                ..*e
            })
            .collect();
        pool.retain_all(copies.iter().map(|e| e.handle));
        let n = copies.len();
        self.splice(pool, after, 0, copies);
        self.dot = after + n;
        n
    }

    /// Move lines `start..=end` to follow line `after`. Labels travel with
    /// their lines. The caller rejects destinations inside the range.
    pub fn move_lines(&mut self, start: usize, end: usize, after: usize) {
        let count = end - start + 1;
        debug_assert!(after < start || after >= end);
        if end == self.dol() || after == self.dol() {
            self.flags.remove(WindowFlags::NO_FINAL_NEWLINE);
        }
        self.map.relocate(start - 1, count, after);
        if after >= end {
            self.labels.remap(|l| {
                if (start..=end).contains(&l) {
                    l + (after - end)
                } else if l > end && l <= after {
                    l - count
                } else {
                    l
                }
            });
            self.dot = after;
        } else {
            self.labels.remap(|l| {
                if (start..=end).contains(&l) {
                    l - (start - 1 - after)
                } else if l > after && l < start {
                    l + count
                } else {
                    l
                }
            });
            self.dot = after + count;
        }
    }

    pub(crate) fn swap_state(
        &mut self,
        dot: &mut usize,
        labels: &mut Labels,
        map: &mut LineMap,
        no_final_newline: &mut bool,
    ) {
        std::mem::swap(&mut self.dot, dot);
        std::mem::swap(&mut self.labels, labels);
        std::mem::swap(&mut self.map, map);
        let live = self.flags.contains(WindowFlags::NO_FINAL_NEWLINE);
        self.flags.set(WindowFlags::NO_FINAL_NEWLINE, *no_final_newline);
        *no_final_newline = live;
    }

    /// Give every line reference back to the pool.
    pub fn release(self, pool: &mut LinePool) -> usize {
        self.map.release(pool)
    }

    /// Checks the documented invariants.
    pub fn invariants_hold(&self) -> bool {
        let dol = self.dol();
        self.dot <= dol
            && (self.dot == 0) == (dol == 0)
            && self.labels.iter().all(|(_, l)| l <= dol)
    }
}
