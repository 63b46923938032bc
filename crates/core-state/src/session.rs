//! Sessions: independently navigable window stacks, indexed by slot.
//!
//! A session's stack is never empty; its last window is the current one.
//! The slot table is fixed-size with slots `1..=max`; slot 0 is invalid.

use crate::error::StateError;
use crate::undo::UndoSlot;
use crate::window::Window;
use core_text::LinePool;
use tracing::debug;

#[derive(Debug)]
pub struct Session {
    windows: Vec<Window>,
    pub undo: UndoSlot,
}

impl Session {
    pub fn new(window: Window) -> Self {
        Self {
            windows: vec![window],
            undo: UndoSlot::new(),
        }
    }

    pub fn current(&self) -> &Window {
        self.windows.last().expect("session window stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut Window {
        self.windows
            .last_mut()
            .expect("session window stack is never empty")
    }

    /// Current window together with the session's undo record.
    pub fn split_current(&mut self) -> (&mut Window, &mut UndoSlot) {
        let window = self
            .windows
            .last_mut()
            .expect("session window stack is never empty");
        (window, &mut self.undo)
    }

    pub fn depth(&self) -> usize {
        self.windows.len()
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn push(&mut self, window: Window) {
        self.windows.push(window);
    }

    /// Pop the current window, unless it is the bottom of the stack.
    pub fn pop(&mut self) -> Option<Window> {
        if self.windows.len() > 1 {
            self.windows.pop()
        } else {
            None
        }
    }

    /// Release every window and the undo record.
    pub fn release(mut self, pool: &mut LinePool) -> usize {
        self.undo.discard(pool);
        self.windows.into_iter().map(|w| w.release(pool)).sum()
    }
}

#[derive(Debug)]
pub struct SessionTable {
    slots: Vec<Option<Session>>,
}

impl SessionTable {
    pub fn new(max: usize) -> Self {
        let mut slots = Vec::with_capacity(max + 1);
        slots.resize_with(max + 1, || None);
        Self { slots }
    }

    pub fn max(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn check_slot(&self, n: usize) -> Result<(), StateError> {
        if n == 0 || n > self.max() {
            Err(StateError::BadSession(n))
        } else {
            Ok(())
        }
    }

    pub fn is_active(&self, n: usize) -> bool {
        self.slots.get(n).is_some_and(Option::is_some) && n != 0
    }

    pub fn get(&self, n: usize) -> Option<&Session> {
        if n == 0 {
            return None;
        }
        self.slots.get(n)?.as_ref()
    }

    pub fn get_mut(&mut self, n: usize) -> Option<&mut Session> {
        if n == 0 {
            return None;
        }
        self.slots.get_mut(n)?.as_mut()
    }

    /// Install `session` in the free slot `n`.
    pub fn open(&mut self, n: usize, session: Session) -> Result<(), StateError> {
        self.check_slot(n)?;
        if self.is_active(n) {
            return Err(StateError::SessionActive(n));
        }
        self.slots[n] = Some(session);
        debug!(target: "state.session", slot = n, "open");
        Ok(())
    }

    /// Remove the session in slot `n`.
    pub fn take(&mut self, n: usize) -> Result<Session, StateError> {
        self.check_slot(n)?;
        let session = self.slots[n].take().ok_or(StateError::SessionInactive(n))?;
        debug!(target: "state.session", slot = n, "close");
        Ok(session)
    }

    pub fn first_free(&self) -> Option<usize> {
        (1..=self.max()).find(|n| !self.is_active(*n))
    }

    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.max()).filter(|n| self.is_active(*n))
    }
}
