//! Command legality by window mode, at line zero and inside `g`/`v`.
//!
//! A `None` command is a line holding only an address (or nothing); it is
//! legal everywhere a print would be.

use core_state::{EditError, ModeViolation, WindowMode};

const KNOWN: &str = "acdijJmtsgvkpnl=uqe^Mfrw";
const BROWSE: &str = "pnl=kuqe^Mfwgvs";
const DIRECTORY: &str = "pnl=kuqe^Mfwgv";
const AT_ZERO: &str = "aireq^Muwf=";
const IN_GLOBAL: &str = "pnl=djJmtsk";

pub(crate) fn check_known(cmd: Option<char>) -> Result<(), EditError> {
    match cmd {
        Some(c) if !KNOWN.contains(c) => Err(EditError::UnknownCommand(c)),
        _ => Ok(()),
    }
}

pub(crate) fn check_mode(cmd: Option<char>, mode: WindowMode) -> Result<(), ModeViolation> {
    let Some(cmd) = cmd else {
        return Ok(());
    };
    let allowed = match mode {
        WindowMode::Normal => return Ok(()),
        WindowMode::Browse => BROWSE,
        WindowMode::Directory => DIRECTORY,
    };
    if allowed.contains(cmd) {
        Ok(())
    } else {
        Err(ModeViolation::NotInMode {
            cmd,
            mode: mode.name(),
        })
    }
}

pub(crate) fn check_zero(cmd: Option<char>, start: usize) -> Result<(), ModeViolation> {
    if start > 0 || cmd.is_some_and(|c| AT_ZERO.contains(c)) {
        Ok(())
    } else {
        Err(ModeViolation::ZeroLine)
    }
}

pub(crate) fn check_global(cmd: Option<char>) -> Result<(), ModeViolation> {
    match cmd {
        Some(c) if !IN_GLOBAL.contains(c) => Err(ModeViolation::NotInGlobal(c)),
        _ => Ok(()),
    }
}
