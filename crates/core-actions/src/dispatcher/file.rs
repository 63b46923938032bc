//! `r` and `w`: moving bytes between the window and files.

use super::{DispatchResult, mark_changed};
use crate::address::LineRange;
use crate::io_ops;
use core_model::EditorEngine;
use core_state::{EditResult, StateError, WindowFlags};
use core_text::count_lines;
use std::path::PathBuf;
use tracing::debug;

/// The named file, or the window's remembered one.
fn target(engine: &EditorEngine, arg: &str) -> EditResult<PathBuf> {
    let arg = arg.trim();
    if !arg.is_empty() {
        return Ok(PathBuf::from(arg));
    }
    engine
        .window()
        .file_name
        .clone()
        .ok_or_else(|| StateError::NoFileName.into())
}

/// `[addr]r [file]`: insert the file's lines after `addr` (default `$`).
pub(crate) fn read(
    engine: &mut EditorEngine,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    let path = target(engine, tail)?;
    let bytes = io_ops::read_file(&path)?;
    engine.check_capacity(count_lines(&bytes))?;
    if engine.window().file_name.is_none() {
        engine.window_mut().file_name = Some(path);
    }
    if bytes.is_empty() {
        return Ok(DispatchResult::output(vec!["0".into()]));
    }
    engine.snapshot();
    let added = engine.insert_bulk(range.end, &bytes)?;
    mark_changed(engine.window_mut());
    debug!(target: "actions.dispatch", at = range.end, lines = added, bytes = bytes.len(), "read_file");
    Ok(DispatchResult::changed(true).with_output(vec![bytes.len().to_string()]))
}

/// `[range]w [file]` writes, `[range]w+ [file]` appends. Writing the whole
/// buffer to a file clears the changed flag.
pub(crate) fn write(
    engine: &mut EditorEngine,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    let (append, rest) = match tail.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, tail),
    };
    let path = target(engine, rest)?;
    let bytes = engine.extract_range(range.start, range.end)?;
    let written = io_ops::write_file(&path, &bytes, append)?;

    let whole = range.start <= 1 && range.end == engine.window().dol();
    let w = engine.window_mut();
    if w.file_name.is_none() {
        w.file_name = Some(path);
    }
    if whole && !append {
        w.flags.remove(WindowFlags::CHANGED);
    }
    debug!(target: "actions.dispatch", start = range.start, end = range.end, written, append, "write_file");
    Ok(DispatchResult::output(vec![written.to_string()]))
}
