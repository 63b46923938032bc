//! Ordered list of pool handles describing what one buffer looks like.
//!
//! Indices in this module are 0-based; the window layer translates 1-based
//! line numbers. Splicing and relocation touch only the affected span (plus a
//! block move of the tail), never re-encode the whole map.

use crate::pool::{LineHandle, LinePool};

/// Up to two bytes appended after a directory entry (`/`, `@`, `*`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DirSuffix {
    bytes: [u8; 2],
    len: u8,
}

impl DirSuffix {
    pub fn new(s: &[u8]) -> Option<Self> {
        if s.is_empty() || s.len() > 2 {
            return None;
        }
        let mut bytes = [0u8; 2];
        bytes[..s.len()].copy_from_slice(s);
        Some(Self {
            bytes,
            len: s.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEntry {
    pub handle: LineHandle,
    /// Set by the global command while it walks the buffer.
    pub marked: bool,
    pub suffix: Option<DirSuffix>,
}

impl LineEntry {
    pub fn new(handle: LineHandle) -> Self {
        Self {
            handle,
            marked: false,
            suffix: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineMap {
    entries: Vec<LineEntry>,
}

impl LineMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map that takes ownership of one reference per handle.
    pub fn from_handles(handles: Vec<LineHandle>) -> Self {
        Self {
            entries: handles.into_iter().map(LineEntry::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&LineEntry> {
        self.entries.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut LineEntry> {
        self.entries.get_mut(idx)
    }

    pub fn handles(&self) -> impl Iterator<Item = LineHandle> + '_ {
        self.entries.iter().map(|e| e.handle)
    }

    /// Structural equality of the handle sequence (marks and suffixes ignored).
    pub fn same_lines(&self, other: &LineMap) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.handle == b.handle)
    }

    /// Replace `remove` entries starting at `at` with `insert`. Inserted
    /// entries hand over one reference each; removed entries are released.
    pub fn splice(
        &mut self,
        pool: &mut LinePool,
        at: usize,
        remove: usize,
        insert: Vec<LineEntry>,
    ) -> usize {
        let removed: Vec<LineEntry> = self.entries.splice(at..at + remove, insert).collect();
        pool.release_all(removed.into_iter().map(|e| e.handle))
    }

    /// Move the run `start..start + count` so it follows the first `after`
    /// entries of the current map. `after` must not fall strictly inside
    /// the run.
    pub fn relocate(&mut self, start: usize, count: usize, after: usize) {
        let end = start + count;
        debug_assert!(after <= start || after >= end);
        if after >= end {
            self.entries[start..after].rotate_left(count);
        } else {
            self.entries[after..end].rotate_right(count);
        }
    }

    /// Copy of this map holding its own references, marks cleared.
    pub fn share(&self, pool: &mut LinePool) -> LineMap {
        pool.retain_all(self.handles());
        LineMap {
            entries: self
                .entries
                .iter()
                .map(|e| LineEntry {
                    marked: false,
                    ..*e
                })
                .collect(),
        }
    }

    /// Give back every reference this map holds.
    pub fn release(self, pool: &mut LinePool) -> usize {
        pool.release_all(self.entries.into_iter().map(|e| e.handle))
    }

    pub fn clear_marks(&mut self) {
        for e in &mut self.entries {
            e.marked = false;
        }
    }

    pub fn marked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.marked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextLine;
    use pretty_assertions::assert_eq;

    fn build(pool: &mut LinePool, lines: &[&str]) -> LineMap {
        LineMap::from_handles(pool.append(lines.iter().map(|s| TextLine::from(*s))))
    }

    fn texts(pool: &LinePool, map: &LineMap) -> Vec<String> {
        map.handles()
            .map(|h| pool.get(h).display_string())
            .collect()
    }

    #[test]
    fn splice_releases_removed_lines() {
        let mut pool = LinePool::new();
        let mut map = build(&mut pool, &["a", "b", "c"]);
        let new = pool.insert(TextLine::from("x"));
        let reclaimed = map.splice(&mut pool, 1, 1, vec![LineEntry::new(new)]);
        assert_eq!(reclaimed, 1);
        assert_eq!(texts(&pool, &map), vec!["a", "x", "c"]);
        assert_eq!(pool.live(), 3);
    }

    #[test]
    fn shared_lines_survive_splice() {
        let mut pool = LinePool::new();
        let mut map = build(&mut pool, &["a", "b"]);
        let copy = map.share(&mut pool);
        assert_eq!(map.splice(&mut pool, 0, 2, Vec::new()), 0);
        assert_eq!(texts(&pool, &copy), vec!["a", "b"]);
        assert_eq!(copy.release(&mut pool), 2);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn relocate_forward_and_backward() {
        let mut pool = LinePool::new();
        let mut map = build(&mut pool, &["1", "2", "3", "4", "5"]);
        map.relocate(0, 2, 4);
        assert_eq!(texts(&pool, &map), vec!["3", "4", "1", "2", "5"]);
        map.relocate(2, 2, 0);
        assert_eq!(texts(&pool, &map), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn same_lines_ignores_marks() {
        let mut pool = LinePool::new();
        let mut map = build(&mut pool, &["a"]);
        let copy = map.share(&mut pool);
        map.get_mut(0).unwrap().marked = true;
        assert!(map.same_lines(&copy));
        assert_eq!(map.marked_count(), 1);
        map.clear_marks();
        assert_eq!(map.marked_count(), 0);
    }

    #[test]
    fn suffix_bounds() {
        assert!(DirSuffix::new(b"").is_none());
        assert!(DirSuffix::new(b"abc").is_none());
        assert_eq!(DirSuffix::new(b"/").unwrap().as_bytes(), b"/");
    }
}
