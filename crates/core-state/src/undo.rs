use crate::error::StateError;
use crate::window::{Labels, Window, WindowFlags, WindowId};
use core_text::{LineMap, LinePool};
use tracing::trace;

/// The one retained pre-edit state of a session.
#[derive(Debug)]
pub struct UndoSnapshot {
    pub window: WindowId,
    pub dot: usize,
    pub labels: Labels,
    pub map: LineMap,
    pub no_final_newline: bool,
}

/// Single-level undo record shared by every window of a session.
///
/// Capturing overwrites the previous record; undoing swaps the record with
/// the live window state, so a second undo redoes the first. The record
/// holds its own pool references, which is what keeps lines deleted by the
/// last edit alive until the next capture.
#[derive(Debug, Default)]
pub struct UndoSlot {
    record: Option<UndoSnapshot>,
    /// Captures that reused the previous map because the handle sequence was
    /// unchanged.
    skipped: u64,
}

impl UndoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&UndoSnapshot> {
        self.record.as_ref()
    }

    pub fn holds(&self, id: WindowId) -> bool {
        self.record.as_ref().is_some_and(|r| r.window == id)
    }

    pub fn snapshots_skipped(&self) -> u64 {
        self.skipped
    }

    /// Record `window`'s current state as the undo point.
    pub fn capture(&mut self, window: &mut Window, pool: &mut LinePool) {
        window.flags.insert(WindowFlags::HAS_UNDO);
        if let Some(rec) = self.record.as_mut()
            && rec.window == window.id()
            && rec.map.same_lines(window.map())
        {
            rec.dot = window.dot();
            rec.labels = *window.labels();
            rec.no_final_newline = window.flags.contains(WindowFlags::NO_FINAL_NEWLINE);
            self.skipped += 1;
            trace!(target: "state.undo", window = window.id().0, lines = window.dol(), skipped = self.skipped, "snapshot_dedupe_skip");
            return;
        }
        let snap = UndoSnapshot {
            window: window.id(),
            dot: window.dot(),
            labels: *window.labels(),
            map: window.map().share(pool),
            no_final_newline: window.flags.contains(WindowFlags::NO_FINAL_NEWLINE),
        };
        if let Some(old) = self.record.replace(snap) {
            let reclaimed = old.map.release(pool);
            trace!(target: "state.undo", reclaimed, "snapshot_replaced");
        }
        trace!(target: "state.undo", window = window.id().0, lines = window.dol(), live = pool.live(), "capture");
    }

    /// Swap the record with `window`'s live state.
    pub fn undo(&mut self, window: &mut Window) -> Result<(), StateError> {
        let rec = self
            .record
            .as_mut()
            .filter(|r| r.window == window.id())
            .ok_or(StateError::NothingToUndo)?;
        window.swap_state(
            &mut rec.dot,
            &mut rec.labels,
            &mut rec.map,
            &mut rec.no_final_newline,
        );
        trace!(target: "state.undo", window = window.id().0, dol = window.dol(), dot = window.dot(), "undo_swap");
        Ok(())
    }

    /// Drop the record, releasing its references.
    pub fn discard(&mut self, pool: &mut LinePool) {
        if let Some(old) = self.record.take() {
            let reclaimed = old.map.release(pool);
            trace!(target: "state.undo", reclaimed, "discard");
        }
    }

    /// Drop the record only if it belongs to `id`.
    pub fn discard_for(&mut self, id: WindowId, pool: &mut LinePool) {
        if self.holds(id) {
            self.discard(pool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::TextLine;

    fn window(pool: &mut LinePool, lines: &[&str]) -> Window {
        let mut w = Window::new(WindowId(7));
        w.insert_lines(pool, 0, lines.iter().map(|s| TextLine::from(*s)).collect());
        w
    }

    fn texts(pool: &LinePool, w: &Window) -> Vec<String> {
        (1..=w.dol())
            .map(|n| w.line(pool, n).unwrap().display_string())
            .collect()
    }

    #[test]
    fn undo_twice_is_identity() {
        let mut pool = LinePool::new();
        let mut w = window(&mut pool, &["a", "b", "c"]);
        let mut slot = UndoSlot::new();
        slot.capture(&mut w, &mut pool);
        w.delete_lines(&mut pool, 2, 2);
        assert_eq!(texts(&pool, &w), vec!["a", "c"]);
        slot.undo(&mut w).unwrap();
        assert_eq!(texts(&pool, &w), vec!["a", "b", "c"]);
        slot.undo(&mut w).unwrap();
        assert_eq!(texts(&pool, &w), vec!["a", "c"]);
        assert!(w.invariants_hold());
    }

    #[test]
    fn undo_restores_final_newline_flag() {
        let mut pool = LinePool::new();
        let mut w = window(&mut pool, &["a", "b"]);
        w.flags.insert(WindowFlags::NO_FINAL_NEWLINE);
        let mut slot = UndoSlot::new();
        slot.capture(&mut w, &mut pool);
        w.delete_lines(&mut pool, 2, 2);
        assert!(!w.flags.contains(WindowFlags::NO_FINAL_NEWLINE));
        slot.undo(&mut w).unwrap();
        assert!(w.flags.contains(WindowFlags::NO_FINAL_NEWLINE));
        slot.undo(&mut w).unwrap();
        assert!(!w.flags.contains(WindowFlags::NO_FINAL_NEWLINE));
    }

    #[test]
    fn deleted_lines_live_until_next_capture() {
        let mut pool = LinePool::new();
        let mut w = window(&mut pool, &["a", "b"]);
        let mut slot = UndoSlot::new();
        slot.capture(&mut w, &mut pool);
        w.delete_lines(&mut pool, 1, 1);
        assert_eq!(pool.live(), 2);
        slot.capture(&mut w, &mut pool);
        assert_eq!(pool.live(), 1);
        slot.discard(&mut pool);
        w.release(&mut pool);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn unchanged_map_is_not_recopied() {
        let mut pool = LinePool::new();
        let mut w = window(&mut pool, &["a"]);
        let mut slot = UndoSlot::new();
        slot.capture(&mut w, &mut pool);
        slot.capture(&mut w, &mut pool);
        assert_eq!(slot.snapshots_skipped(), 1);
        let h = w.map().entries()[0].handle;
        assert_eq!(pool.refs(h), 2);
    }

    #[test]
    fn undo_rejects_other_window() {
        let mut pool = LinePool::new();
        let mut w = window(&mut pool, &["a"]);
        let mut other = Window::new(WindowId(8));
        let mut slot = UndoSlot::new();
        assert_eq!(slot.undo(&mut w), Err(StateError::NothingToUndo));
        slot.capture(&mut w, &mut pool);
        assert_eq!(slot.undo(&mut other), Err(StateError::NothingToUndo));
        slot.discard_for(WindowId(8), &mut pool);
        assert!(slot.holds(w.id()));
    }
}
