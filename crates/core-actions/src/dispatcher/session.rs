//! Session and window-stack control: `e`, `q`, `^`, `M`, `f`.

use super::DispatchResult;
use super::command_parser::CommandParser;
use crate::io_ops::{self, Loaded};
use core_model::{EditorEngine, SessionClose};
use core_state::{CapacityError, EditResult, ModeViolation, StateError, Window, WindowFlags};
use core_text::count_lines;
use std::path::PathBuf;
use tracing::debug;

/// Refuse to discard unsaved edits the first time; a repeated `q` or `e`
/// goes through.
fn guard_unsaved(engine: &mut EditorEngine, changed: bool) -> EditResult<()> {
    if changed && !engine.quit_armed() {
        engine.set_quit_armed(true);
        return Err(StateError::UnsavedChanges.into());
    }
    engine.set_quit_armed(false);
    Ok(())
}

fn session_changed(engine: &EditorEngine) -> bool {
    engine
        .sessions()
        .get(engine.current_session())
        .is_some_and(|s| s.windows().any(Window::is_changed))
}

/// `e` prints the session number, `e N` switches sessions, `e path` loads a
/// file or directory listing.
pub(crate) fn edit(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    let arg = tail.trim();
    if arg.is_empty() {
        return Ok(DispatchResult::output(vec![engine.current_session().to_string()]));
    }
    if arg.bytes().all(|b| b.is_ascii_digit()) {
        let n = arg
            .parse::<usize>()
            .map_err(|_| StateError::BadSession(usize::MAX))?;
        let created = engine.switch_session(n)?;
        engine.set_quit_armed(false);
        let line = match &engine.window().file_name {
            _ if created => "new session".to_string(),
            Some(name) => name.display().to_string(),
            None => "no file".to_string(),
        };
        return Ok(DispatchResult {
            output: vec![line],
            shape_changed: true,
            ..DispatchResult::clean()
        });
    }

    let browsing = engine.window().flags.contains(WindowFlags::BROWSING);
    if !browsing {
        let changed = engine.window().is_changed();
        guard_unsaved(engine, changed)?;
    }
    let path = PathBuf::from(arg);
    let loaded = io_ops::load_path(&path)?;
    let incoming = match &loaded {
        Loaded::File(bytes) => count_lines(bytes),
        Loaded::Directory(entries) => entries.len(),
    };
    let limit = engine.limits().max_lines;
    if incoming > limit {
        return Err(CapacityError::TooManyLines { limit }.into());
    }

    if browsing {
        engine.push_window(WindowFlags::empty());
    } else {
        engine.replace_window(WindowFlags::empty());
    }
    let summary = match loaded {
        Loaded::File(bytes) => {
            engine.insert_bulk(0, &bytes)?;
            bytes.len()
        }
        Loaded::Directory(entries) => engine.insert_directory(0, entries)?,
    };
    engine.window_mut().file_name = Some(path);
    debug!(target: "actions.dispatch", path = arg, lines = engine.window().dol(), "edit_file");
    Ok(DispatchResult {
        output: vec![summary.to_string()],
        shape_changed: true,
        ..DispatchResult::clean()
    })
}

pub(crate) fn quit(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    CommandParser::no_tail('q', tail)?;
    let changed = session_changed(engine);
    guard_unsaved(engine, changed)?;
    match engine.close_session()? {
        SessionClose::Switched(n) => Ok(DispatchResult {
            output: vec![n.to_string()],
            shape_changed: true,
            ..DispatchResult::clean()
        }),
        SessionClose::LastSession => Ok(DispatchResult::quit()),
    }
}

/// `^`: return to the window beneath the current one.
pub(crate) fn back(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    CommandParser::no_tail('^', tail)?;
    engine.pop_window()?;
    Ok(DispatchResult {
        shape_changed: true,
        ..DispatchResult::clean()
    })
}

/// `M [N]`: move this session to slot N, or the first free one.
pub(crate) fn move_session(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    let arg = tail.trim();
    let to = if arg.is_empty() {
        None
    } else if arg.bytes().all(|b| b.is_ascii_digit()) {
        Some(
            arg.parse::<usize>()
                .map_err(|_| StateError::BadSession(usize::MAX))?,
        )
    } else {
        return Err(ModeViolation::TrailingText('M').into());
    };
    let slot = engine.move_session(to)?;
    Ok(DispatchResult::output(vec![slot.to_string()]))
}

/// `f` prints the file name, `f name` sets it.
pub(crate) fn file_name(engine: &mut EditorEngine, tail: &str) -> EditResult<DispatchResult> {
    let arg = tail.trim();
    let w = engine.window_mut();
    if !arg.is_empty() {
        w.file_name = Some(PathBuf::from(arg));
    }
    let name = w.file_name.as_ref().ok_or(StateError::NoFileName)?;
    Ok(DispatchResult::output(vec![name.display().to_string()]))
}
