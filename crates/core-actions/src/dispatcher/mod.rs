//! Dispatcher executing one command line against the editor engine.
//!
//! One call to [`dispatch`] is one transaction: parse the range and command
//! letter, check the command against the window's mode (and against line
//! zero, and against the global allow-list when running under `g`/`v`),
//! then hand off to a handler. Handlers stage everything that can fail
//! before their first mutation, so an error leaves the window as it was.
//!
//! Handlers are grouped by concern:
//! * `display` - `p n l =` and the bare-address / blank-line print
//! * `edit`    - text input (`a i c`), `d j J m t k`
//! * `subst`   - `s`
//! * `global`  - `g v`
//! * `session` - `e q ^ M f`
//! * `file`    - `r w`
//! * `undo`    - `u`

use crate::address::{LineRange, Resolver};
use core_model::EditorEngine;
use core_state::{AddressError, EditResult, Window, WindowMode};
use tracing::{debug, trace};

mod command_parser;
mod display;
mod edit;
mod file;
mod global;
mod mode;
mod session;
mod subst;
mod undo;

pub use command_parser::{CommandParser, ParsedCommand, PrintStyle};
pub use display::list_escape;

/// What a command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// Lines to show the user, in order.
    pub output: Vec<String>,
    /// The buffer's content was modified.
    pub changed: bool,
    /// Lines were inserted, deleted or moved, so line numbers after the
    /// edit point no longer name the same lines.
    pub shape_changed: bool,
    /// The last session was closed; the caller should exit.
    pub quit: bool,
}

impl DispatchResult {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn changed(shape_changed: bool) -> Self {
        Self {
            changed: true,
            shape_changed,
            ..Self::default()
        }
    }

    pub fn quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn output(lines: Vec<String>) -> Self {
        Self {
            output: lines,
            ..Self::default()
        }
    }

    fn with_output(mut self, lines: Vec<String>) -> Self {
        self.output.extend(lines);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Ctx {
    pub in_global: bool,
}

/// Execute one line of input. While text input is active the line is
/// collected (or, if it is a lone `.`, commits the collected text).
pub fn dispatch(engine: &mut EditorEngine, line: &str) -> EditResult<DispatchResult> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if engine.text_entry().is_some() {
        return edit::text_input(engine, line);
    }
    let result = execute(engine, line, Ctx::default());
    match &result {
        Ok(r) => trace!(
            target: "actions.dispatch",
            line,
            changed = r.changed,
            shape = r.shape_changed,
            dot = engine.window().dot(),
            dol = engine.window().dol(),
            "dispatched"
        ),
        Err(e) => debug!(target: "actions.dispatch", line, error = %e, "command_failed"),
    }
    result
}

pub(crate) fn execute(engine: &mut EditorEngine, line: &str, ctx: Ctx) -> EditResult<DispatchResult> {
    let parsed = CommandParser::parse(line)?;
    let cmd = parsed.cmd;
    mode::check_known(cmd)?;
    if !ctx.in_global && !matches!(cmd, Some('q' | 'e')) {
        engine.set_quit_armed(false);
    }
    mode::check_mode(cmd, engine.window().mode())?;
    if ctx.in_global {
        mode::check_global(cmd)?;
    }
    let given = {
        let parts = engine.parts();
        Resolver::new(parts.window, parts.pool, parts.interrupt).range(&parsed.range)?
    };
    let range = effective_range(engine.window(), cmd, given, ctx)?;
    mode::check_zero(cmd, range.start)?;

    let tail = parsed.tail;
    match cmd {
        None => display::show(engine, range),
        Some(c @ ('p' | 'n' | 'l')) => display::print(engine, c, range, tail),
        Some('=') => display::line_number(range, tail),
        Some(c @ ('a' | 'i' | 'c')) => edit::begin_input(engine, c, range, tail),
        Some('d') => edit::delete(engine, range, tail, ctx),
        Some(c @ ('j' | 'J')) => edit::join(engine, c, range, tail, ctx),
        Some(c @ ('m' | 't')) => edit::transfer(engine, c, range, tail, ctx),
        Some('k') => edit::label(engine, range, tail),
        Some('s') => subst::substitute(engine, range, tail, ctx),
        Some(c @ ('g' | 'v')) => global::global(engine, c, range, tail),
        Some('u') => undo::handle_undo(engine, tail),
        Some('e') => session::edit(engine, tail),
        Some('q') => session::quit(engine, tail),
        Some('^') => session::back(engine, tail),
        Some('M') => session::move_session(engine, tail),
        Some('f') => session::file_name(engine, tail),
        Some('r') => file::read(engine, range, tail),
        Some('w') => file::write(engine, range, tail),
        Some(c) => Err(core_state::EditError::UnknownCommand(c)),
    }
}

/// Fill in the command's default range when none was typed.
fn effective_range(
    window: &Window,
    cmd: Option<char>,
    given: Option<LineRange>,
    ctx: Ctx,
) -> EditResult<LineRange> {
    let dot = window.dot();
    let dol = window.dol();
    let (start, end, given) = match (given, cmd) {
        (Some(r), Some('j' | 'J')) if r.given == 1 && r.start > 0 => (r.start, r.start + 1, 1),
        (Some(r), _) => return Ok(r),
        (None, None) if ctx.in_global => (dot, dot, 0),
        (None, None) => (dot + 1, dot + 1, 0),
        (None, Some('j' | 'J')) if dot > 0 => (dot, dot + 1, 0),
        (None, Some('g' | 'v' | 'w')) => (dol.min(1), dol, 0),
        (None, Some('r' | '=')) => (dol, dol, 0),
        (None, Some(_)) => (dot, dot, 0),
    };
    if end > dol {
        return Err(AddressError::LineOutOfRange(end).into());
    }
    Ok(LineRange { start, end, given })
}

/// Take the session's undo snapshot, unless a global command already did.
fn snapshot(engine: &mut EditorEngine, ctx: Ctx) {
    if !ctx.in_global {
        engine.snapshot();
    }
}

/// Browse buffers are views of a page, not documents; editing them does not
/// make them unsaved.
fn mark_changed(window: &mut Window) {
    if window.mode() != WindowMode::Browse {
        window.mark_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::{EditError, ModeViolation};
    use pretty_assertions::assert_eq;

    fn engine(text: &str) -> EditorEngine {
        let mut engine = EditorEngine::default();
        engine.insert_bulk(0, text.as_bytes()).unwrap();
        engine
    }

    fn run(engine: &mut EditorEngine, line: &str) -> DispatchResult {
        dispatch(engine, line).unwrap_or_else(|e| panic!("{line:?} failed: {e}"))
    }

    #[test]
    fn blank_line_advances_and_prints() {
        let mut e = engine("one\ntwo\n");
        run(&mut e, "1");
        assert_eq!(run(&mut e, "").output, vec!["two"]);
        assert_eq!(e.window().dot(), 2);
        assert_eq!(
            dispatch(&mut e, ""),
            Err(EditError::Address(AddressError::LineOutOfRange(3)))
        );
    }

    #[test]
    fn empty_buffer_rejects_delete_but_accepts_append() {
        let mut e = EditorEngine::default();
        assert_eq!(
            dispatch(&mut e, "d"),
            Err(EditError::Mode(ModeViolation::ZeroLine))
        );
        for join in ["j", "J", "0j"] {
            assert_eq!(
                dispatch(&mut e, join),
                Err(EditError::Mode(ModeViolation::ZeroLine))
            );
        }
        run(&mut e, "a");
        run(&mut e, "first");
        run(&mut e, ".");
        assert_eq!(e.display_lines(), vec!["first"]);
        assert_eq!(e.window().dot(), 1);
    }

    #[test]
    fn unknown_command() {
        let mut e = engine("x\n");
        assert_eq!(dispatch(&mut e, "x"), Err(EditError::UnknownCommand('x')));
        assert_eq!(dispatch(&mut e, "1Z"), Err(EditError::UnknownCommand('Z')));
    }

    #[test]
    fn join_defaults_to_next_line() {
        let mut e = engine("a\nb\nc\n");
        run(&mut e, "1");
        run(&mut e, "J");
        assert_eq!(e.display_lines(), vec!["a b", "c"]);
        run(&mut e, "1j");
        assert_eq!(e.display_lines(), vec!["a bc"]);
        assert_eq!(
            dispatch(&mut e, "j"),
            Err(EditError::Address(AddressError::LineOutOfRange(2)))
        );
    }

    #[test]
    fn failed_command_leaves_buffer_untouched() {
        let mut e = engine("a\nb\n");
        run(&mut e, "1d");
        assert_eq!(
            dispatch(&mut e, "s/zzz/y/"),
            Err(EditError::NoMatch)
        );
        run(&mut e, "u");
        assert_eq!(e.display_lines(), vec!["a", "b"]);
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let mut e = engine("a\nb\n");
        assert_eq!(run(&mut e, "2p\n").output, vec!["b"]);
    }
}
