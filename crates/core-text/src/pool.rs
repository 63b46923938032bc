//! Append-only store of immutable lines addressed by integer handle.
//!
//! Each live slot carries an explicit reference count. A handle stays valid
//! (and its slot unreused) until the count reaches zero, at which point the
//! line is dropped and the slot goes on the free list. Looking up a reclaimed
//! handle is an internal-consistency bug and panics.

use crate::TextLine;
use std::fmt;
use tracing::trace;

/// Stable reference to one line in a [`LinePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineHandle(u32);

impl LineHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
enum Slot {
    Live { line: TextLine, refs: u32 },
    Free,
}

#[derive(Debug, Default)]
pub struct LinePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl LinePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `line`, returning a handle that carries one reference owned by
    /// the caller.
    pub fn insert(&mut self, line: TextLine) -> LineHandle {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Slot::Live { line, refs: 1 };
            return LineHandle(idx);
        }
        let idx = u32::try_from(self.slots.len()).expect("line pool exhausted u32 handle space");
        self.slots.push(Slot::Live { line, refs: 1 });
        LineHandle(idx)
    }

    /// Store a batch of lines, one owned reference per returned handle.
    pub fn append<I>(&mut self, lines: I) -> Vec<LineHandle>
    where
        I: IntoIterator<Item = TextLine>,
    {
        let handles: Vec<LineHandle> = lines.into_iter().map(|l| self.insert(l)).collect();
        trace!(target: "text.pool", appended = handles.len(), live = self.live, "append");
        handles
    }

    pub fn try_get(&self, h: LineHandle) -> Option<&TextLine> {
        match self.slots.get(h.index()) {
            Some(Slot::Live { line, .. }) => Some(line),
            _ => None,
        }
    }

    pub fn get(&self, h: LineHandle) -> &TextLine {
        match self.try_get(h) {
            Some(line) => line,
            None => panic!("line map references reclaimed pool handle {h}"),
        }
    }

    /// Current reference count (0 for a reclaimed or unknown handle).
    pub fn refs(&self, h: LineHandle) -> u32 {
        match self.slots.get(h.index()) {
            Some(Slot::Live { refs, .. }) => *refs,
            _ => 0,
        }
    }

    pub fn retain(&mut self, h: LineHandle) {
        match self.slots.get_mut(h.index()) {
            Some(Slot::Live { refs, .. }) => *refs += 1,
            _ => panic!("retain of reclaimed pool handle {h}"),
        }
    }

    /// Drop one reference. Returns true when this reclaimed the slot.
    pub fn release(&mut self, h: LineHandle) -> bool {
        let Some(slot) = self.slots.get_mut(h.index()) else {
            panic!("release of unknown pool handle {h}");
        };
        let Slot::Live { refs, .. } = slot else {
            panic!("release of reclaimed pool handle {h}");
        };
        *refs -= 1;
        if *refs > 0 {
            return false;
        }
        *slot = Slot::Free;
        self.free.push(h.0);
        self.live -= 1;
        true
    }

    pub fn retain_all<I: IntoIterator<Item = LineHandle>>(&mut self, handles: I) {
        for h in handles {
            self.retain(h);
        }
    }

    /// Release every handle, returning how many slots were reclaimed.
    pub fn release_all<I: IntoIterator<Item = LineHandle>>(&mut self, handles: I) -> usize {
        let mut reclaimed = 0;
        for h in handles {
            if self.release(h) {
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            trace!(target: "text.pool", reclaimed, live = self.live, "release_all");
        }
        reclaimed
    }

    /// Number of live lines.
    pub fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_release_cycle() {
        let mut pool = LinePool::new();
        let h = pool.insert(TextLine::from("one"));
        assert_eq!(pool.get(h).raw(), b"one");
        assert_eq!(pool.refs(h), 1);
        pool.retain(h);
        assert!(!pool.release(h));
        assert_eq!(pool.live(), 1);
        assert!(pool.release(h));
        assert_eq!(pool.live(), 0);
        assert!(pool.try_get(h).is_none());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut pool = LinePool::new();
        let a = pool.insert(TextLine::from("a"));
        let b = pool.insert(TextLine::from("b"));
        pool.release(a);
        let c = pool.insert(TextLine::from("c"));
        assert_eq!(c, a);
        assert_eq!(pool.get(b).raw(), b"b");
        assert_eq!(pool.get(c).raw(), b"c");
    }

    #[test]
    #[should_panic(expected = "reclaimed")]
    fn double_release_panics() {
        let mut pool = LinePool::new();
        let h = pool.insert(TextLine::from("x"));
        pool.release(h);
        pool.release(h);
    }

    #[test]
    fn release_all_counts_reclaimed() {
        let mut pool = LinePool::new();
        let hs = pool.append(["a", "b", "c"].map(TextLine::from));
        pool.retain(hs[1]);
        assert_eq!(pool.release_all(hs.iter().copied()), 2);
        assert_eq!(pool.live(), 1);
    }
}
