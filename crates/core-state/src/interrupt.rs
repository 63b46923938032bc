//! Process-wide cancellation flag.
//!
//! Raised from outside the editing thread (a signal handler or a UI key) and
//! consumed by the long-running loops: the global command walk and the
//! address search. Consuming clears the flag.

use crate::error::EditError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// `Err(Interrupted)` (clearing the flag) when raised.
    pub fn check(&self) -> Result<(), EditError> {
        if self.take() {
            Err(EditError::Interrupted)
        } else {
            Ok(())
        }
    }
}
