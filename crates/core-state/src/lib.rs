//! Editor state: windows, session stacks, the one-level undo record, the
//! cancellation flag and the error taxonomy shared by every layer above.
//!
//! Nothing here parses commands. This crate owns the data model and the
//! primitive mutations that keep its invariants (dot/dol/labels in step with
//! the line map, pool references balanced across live maps and the undo
//! record). Command semantics live in `core-actions`.

pub mod error;
pub mod interrupt;
pub mod session;
pub mod undo;
pub mod window;

pub use error::{
    AddressError, CapacityError, EditError, EditResult, ModeViolation, PatternError, StateError,
};
pub use interrupt::Interrupt;
pub use session::{Session, SessionTable};
pub use undo::{UndoSlot, UndoSnapshot};
pub use window::{Labels, Window, WindowFlags, WindowId, WindowMode};
