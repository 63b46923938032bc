//! Error taxonomy for every recoverable editing failure.
//!
//! Errors are grouped by cause. Each one renders as a single descriptive line
//! and leaves the window exactly as it was before the failing command.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("bad range: second address precedes the first")]
    BadRange,
    #[error("line {0} is out of range")]
    LineOutOfRange(usize),
    #[error("negative line number")]
    NegativeLine,
    #[error("label '{0} is not set")]
    LabelNotSet(char),
    #[error("bad label name {0:?}")]
    BadLabel(char),
    #[error("search string not found")]
    PatternNotFound,
    #[error("address expected")]
    MissingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeViolation {
    #[error("zero line number")]
    ZeroLine,
    #[error("command {cmd} is not available in {mode} mode")]
    NotInMode { cmd: char, mode: &'static str },
    #[error("command {0} cannot be used inside a global command")]
    NotInGlobal(char),
    #[error("destination lies inside the range being moved")]
    DestinationInRange,
    #[error("unexpected text after command {0}")]
    TrailingText(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("bad regular expression: {0}")]
    Malformed(String),
    #[error("empty match cannot be combined with a global or numbered replacement")]
    EmptyMatchRepeat,
    #[error("no remembered search string")]
    NoRememberedPattern,
    #[error("no remembered replacement string")]
    NoRememberedReplacement,
    #[error("bad delimiter {0:?}")]
    BadDelimiter(char),
    #[error("cannot alter or remove a hyperlink or form field")]
    MarkupAltered,
    #[error("unexpected substitute flags {0:?}")]
    BadFlags(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("line exceeds {limit} bytes after replacement")]
    ResultTooLong { limit: usize },
    #[error("buffer limit of {limit} lines reached")]
    TooManyLines { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("session {0} is already active")]
    SessionActive(usize),
    #[error("session {0} is not active")]
    SessionInactive(usize),
    #[error("session {0} is out of range")]
    BadSession(usize),
    #[error("no previous window")]
    NoPreviousWindow,
    #[error("expecting `w'")]
    UnsavedChanges,
    #[error("no file name")]
    NoFileName,
    #[error("no free sessions")]
    NoSessionsFree,
    #[error("not entering text")]
    NotEnteringText,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Mode(#[from] ModeViolation),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("interrupted")]
    Interrupted,
    #[error("unknown command {0:?}")]
    UnknownCommand(char),
    #[error("no match")]
    NoMatch,
    #[error("no lines match the global pattern")]
    NoLinesMarked,
    #[error("{}", partial_global_message(.cause, .last_modified))]
    PartialGlobalFailure {
        cause: Box<EditError>,
        last_modified: Option<usize>,
    },
    #[error("{0}")]
    Io(String),
}

fn partial_global_message(cause: &EditError, last_modified: &Option<usize>) -> String {
    match last_modified {
        Some(line) => format!("global command stopped: {cause} (last change at line {line})"),
        None => format!("global command stopped: {cause}"),
    }
}

pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_causes_render_single_line() {
        let e: EditError = AddressError::LabelNotSet('x').into();
        assert_eq!(e.to_string(), "label 'x is not set");
        let e: EditError = ModeViolation::ZeroLine.into();
        assert_eq!(e.to_string(), "zero line number");
    }

    #[test]
    fn partial_global_reports_last_line() {
        let e = EditError::PartialGlobalFailure {
            cause: Box::new(EditError::Interrupted),
            last_modified: Some(4),
        };
        assert_eq!(
            e.to_string(),
            "global command stopped: interrupted (last change at line 4)"
        );
    }
}
