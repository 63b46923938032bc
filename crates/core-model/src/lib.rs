//! High-level editor model: the `EditorEngine` root object.
//!
//! The engine owns everything mutable in the process: the line pool, the
//! session table and the number of the current session. Every operation takes
//! the engine by reference; there is no other global state.
//!
//! Core invariants (must hold after every public call):
//! * The current session slot is always active and its window stack is never
//!   empty.
//! * Each pool line's reference count equals the number of map entries naming
//!   it across every window of every session plus every session's undo
//!   record (`EditorEngine::pool_balanced` checks this).
//! * Every window satisfies `Window::invariants_hold`.
//!
//! Collaborators outside the core (file readers, the browsing layer, form
//! handling) reach buffers only through the methods in `collab`.

use core_config::{Config, EffectiveLimits};
use core_state::{
    EditResult, Interrupt, Session, SessionTable, StateError, UndoSlot, Window, WindowFlags,
    WindowId,
};
use core_text::{LineHandle, LinePool, TextLine};
use std::collections::HashMap;
use tracing::debug;

mod collab;

/// Capacity limits enforced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_sessions: usize,
    pub max_lines: usize,
    pub max_line_length: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            max_lines: 1_000_000,
            max_line_length: 50_000,
        }
    }
}

impl From<EffectiveLimits> for EngineLimits {
    fn from(l: EffectiveLimits) -> Self {
        Self {
            max_sessions: l.max_sessions,
            max_lines: l.max_lines,
            max_line_length: l.max_line_length,
        }
    }
}

/// Text being typed after `a`, `i` or `c`, committed when a lone `.` arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub window: WindowId,
    /// Lines are inserted after this line.
    pub after: usize,
    /// Range removed at commit time (for `c`).
    pub replace: Option<(usize, usize)>,
    pub lines: Vec<TextLine>,
}

/// Outcome of closing the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionClose {
    /// Another session became current.
    Switched(usize),
    /// The closed session was the last one; the caller should exit.
    LastSession,
}

/// Disjoint borrows of everything a command handler touches.
pub struct ActiveParts<'a> {
    pub pool: &'a mut LinePool,
    pub window: &'a mut Window,
    pub undo: &'a mut UndoSlot,
    pub limits: &'a EngineLimits,
    pub interrupt: &'a Interrupt,
}

#[derive(Debug)]
pub struct EditorEngine {
    pool: LinePool,
    sessions: SessionTable,
    current: usize,
    limits: EngineLimits,
    interrupt: Interrupt,
    next_window: u64,
    entry: Option<TextEntry>,
    quit_armed: bool,
}

impl Default for EditorEngine {
    fn default() -> Self {
        Self::new(EngineLimits::default())
    }
}

impl EditorEngine {
    /// Engine with session 1 open on an empty window.
    pub fn new(limits: EngineLimits) -> Self {
        let mut engine = Self {
            pool: LinePool::new(),
            sessions: SessionTable::new(limits.max_sessions.max(1)),
            current: 1,
            limits,
            interrupt: Interrupt::new(),
            next_window: 1,
            entry: None,
            quit_armed: false,
        };
        let window = engine.alloc_window(WindowFlags::empty());
        engine
            .sessions
            .open(1, Session::new(window))
            .expect("session table always has slot 1");
        engine
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.limits().into())
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn pool(&self) -> &LinePool {
        &self.pool
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn current_session(&self) -> usize {
        self.current
    }

    fn session(&self) -> &Session {
        self.sessions
            .get(self.current)
            .expect("current session slot is always active")
    }

    fn session_mut(&mut self) -> &mut Session {
        self.sessions
            .get_mut(self.current)
            .expect("current session slot is always active")
    }

    pub fn window(&self) -> &Window {
        self.session().current()
    }

    pub fn window_mut(&mut self) -> &mut Window {
        self.session_mut().current_mut()
    }

    pub fn window_depth(&self) -> usize {
        self.session().depth()
    }

    pub fn parts(&mut self) -> ActiveParts<'_> {
        let session = self
            .sessions
            .get_mut(self.current)
            .expect("current session slot is always active");
        let (window, undo) = session.split_current();
        ActiveParts {
            pool: &mut self.pool,
            window,
            undo,
            limits: &self.limits,
            interrupt: &self.interrupt,
        }
    }

    fn alloc_window(&mut self, flags: WindowFlags) -> Window {
        let mut w = Window::new(WindowId(self.next_window));
        self.next_window += 1;
        w.flags = flags;
        w
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.entry.as_ref()
    }

    pub fn text_entry_mut(&mut self) -> Option<&mut TextEntry> {
        self.entry.as_mut()
    }

    pub fn begin_text_entry(&mut self, entry: TextEntry) {
        self.entry = Some(entry);
    }

    pub fn take_text_entry(&mut self) -> Option<TextEntry> {
        self.entry.take()
    }

    pub fn quit_armed(&self) -> bool {
        self.quit_armed
    }

    pub fn set_quit_armed(&mut self, armed: bool) {
        self.quit_armed = armed;
    }

    /// Record the current window as the session's undo point.
    pub fn snapshot(&mut self) {
        let parts = self.parts();
        parts.undo.capture(parts.window, parts.pool);
    }

    /// Swap the current window with the session's undo record.
    pub fn undo(&mut self) -> EditResult<()> {
        let parts = self.parts();
        parts.undo.undo(parts.window)?;
        Ok(())
    }

    /// Make session `n` current, opening it on an empty window first if it
    /// is unused. Returns true when the session was created.
    pub fn switch_session(&mut self, n: usize) -> EditResult<bool> {
        self.sessions.check_slot(n)?;
        let created = !self.sessions.is_active(n);
        if created {
            let window = self.alloc_window(WindowFlags::empty());
            self.sessions.open(n, Session::new(window))?;
        }
        self.current = n;
        self.entry = None;
        debug!(target: "state.session", slot = n, created, "switch");
        Ok(created)
    }

    /// Close the current session. The last session is never removed: the
    /// caller is told to exit instead.
    pub fn close_session(&mut self) -> EditResult<SessionClose> {
        let next = self.sessions.active().find(|n| *n != self.current);
        let Some(next) = next else {
            return Ok(SessionClose::LastSession);
        };
        let closed = self.sessions.take(self.current)?;
        let reclaimed = closed.release(&mut self.pool);
        debug!(target: "state.session", slot = self.current, next, reclaimed, "quit");
        self.current = next;
        self.entry = None;
        Ok(SessionClose::Switched(next))
    }

    /// Move the current session to slot `to`, or the first free slot.
    pub fn move_session(&mut self, to: Option<usize>) -> EditResult<usize> {
        let to = match to {
            Some(n) => n,
            None => self.sessions.first_free().ok_or(StateError::NoSessionsFree)?,
        };
        self.sessions.check_slot(to)?;
        if self.sessions.is_active(to) {
            return Err(StateError::SessionActive(to).into());
        }
        let session = self.sessions.take(self.current)?;
        self.sessions.open(to, session)?;
        debug!(target: "state.session", from = self.current, to, "move");
        self.current = to;
        Ok(to)
    }

    /// Push an empty window with `flags` onto the current session's stack.
    pub fn push_window(&mut self, flags: WindowFlags) -> WindowId {
        let window = self.alloc_window(flags);
        let id = window.id();
        self.session_mut().push(window);
        self.entry = None;
        debug!(target: "state.session", window = id.0, depth = self.window_depth(), "push_window");
        id
    }

    /// Replace the current window with an empty one carrying `flags`.
    pub fn replace_window(&mut self, flags: WindowFlags) -> WindowId {
        let fresh = self.alloc_window(flags);
        let id = fresh.id();
        let session = self
            .sessions
            .get_mut(self.current)
            .expect("current session slot is always active");
        let old = std::mem::replace(session.current_mut(), fresh);
        session.undo.discard_for(old.id(), &mut self.pool);
        let reclaimed = old.release(&mut self.pool);
        self.entry = None;
        debug!(target: "state.session", window = id.0, reclaimed, "replace_window");
        id
    }

    /// Pop the current window, returning to the one beneath it.
    pub fn pop_window(&mut self) -> EditResult<()> {
        let session = self
            .sessions
            .get_mut(self.current)
            .expect("current session slot is always active");
        let popped = session.pop().ok_or(StateError::NoPreviousWindow)?;
        session.undo.discard_for(popped.id(), &mut self.pool);
        let reclaimed = popped.release(&mut self.pool);
        self.entry = None;
        debug!(target: "state.session", reclaimed, depth = self.window_depth(), "pop_window");
        Ok(())
    }

    /// Display text of every line of the current window.
    pub fn display_lines(&self) -> Vec<String> {
        let w = self.window();
        (1..=w.dol())
            .filter_map(|n| w.display_line(&self.pool, n))
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .collect()
    }

    /// True when every pool reference is accounted for by some map.
    pub fn pool_balanced(&self) -> bool {
        let mut counts: HashMap<LineHandle, u32> = HashMap::new();
        for n in self.sessions.active() {
            let Some(session) = self.sessions.get(n) else {
                continue;
            };
            let undo_map = session.undo.record().map(|r| &r.map);
            let maps = session.windows().map(Window::map).chain(undo_map);
            for map in maps {
                for h in map.handles() {
                    *counts.entry(h).or_default() += 1;
                }
            }
        }
        counts.len() == self.pool.live()
            && counts.iter().all(|(h, c)| self.pool.refs(*h) == *c)
    }

    /// Invariants of every window in every session.
    pub fn windows_consistent(&self) -> bool {
        self.sessions.active().all(|n| {
            self.sessions
                .get(n)
                .is_some_and(|s| s.windows().all(Window::invariants_hold))
        })
    }
}
