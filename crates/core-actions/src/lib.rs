//! Command layer: everything between a typed command line and the engine.
//!
//! * [`address`] turns `.`, `$`, `'x`, `/re/`, `?re?` and offsets into line
//!   numbers.
//! * [`pattern`] scans delimited patterns and compiles them.
//! * [`substitute`] rewrites one line for `s`.
//! * [`io_ops`] is the file collaborator used by `e`, `r` and `w`.
//! * The dispatcher ([`dispatch`]) parses a command, checks it against the
//!   window's mode and runs it as one transaction.

pub mod address;
mod dispatcher;
pub mod io_ops;
pub mod pattern;
pub mod substitute;

pub use dispatcher::{
    CommandParser, DispatchResult, ParsedCommand, PrintStyle, dispatch, list_escape,
};
