//! Buffer mutation: text input, delete, join, move, copy and labels.

use super::command_parser::CommandParser;
use super::display::suffix_output;
use super::{Ctx, DispatchResult, mark_changed, snapshot};
use crate::address::{LineRange, Resolver, parse_address};
use core_model::{EditorEngine, TextEntry};
use core_state::{AddressError, CapacityError, EditResult, ModeViolation, StateError};
use core_text::TextLine;
use tracing::debug;

/// `a`, `i`, `c`: start collecting input lines. Nothing changes until the
/// closing `.` arrives.
pub(crate) fn begin_input(
    engine: &mut EditorEngine,
    cmd: char,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    CommandParser::no_tail(cmd, tail)?;
    let (after, replace) = match cmd {
        'a' => (range.end, None),
        // `0i` inserts before line 1, the same place `0a` appends after.
        'i' => (range.end.saturating_sub(1), None),
        _ => (range.start - 1, Some((range.start, range.end))),
    };
    let window = engine.window().id();
    engine.begin_text_entry(TextEntry {
        window,
        after,
        replace,
        lines: Vec::new(),
    });
    debug!(target: "actions.dispatch", cmd = %cmd, after, "text_input_begin");
    Ok(DispatchResult::clean())
}

/// One line of typed text, or the lone `.` that commits it.
pub(crate) fn text_input(engine: &mut EditorEngine, line: &str) -> EditResult<DispatchResult> {
    if line != "." {
        if let Some(entry) = engine.text_entry_mut() {
            entry.lines.push(TextLine::from(line));
        }
        return Ok(DispatchResult::clean());
    }
    let entry = engine
        .take_text_entry()
        .ok_or(StateError::NotEnteringText)?;
    commit_input(engine, entry)
}

fn commit_input(engine: &mut EditorEngine, entry: TextEntry) -> EditResult<DispatchResult> {
    if entry.window != engine.window().id() {
        return Ok(DispatchResult::clean());
    }
    let removed = entry.replace.map_or(0, |(s, e)| e - s + 1);
    let added = entry.lines.len();
    if added == 0 && removed == 0 {
        return Ok(DispatchResult::clean());
    }
    if added > removed {
        engine.check_capacity(added - removed)?;
    }
    engine.snapshot();
    let parts = engine.parts();
    match entry.replace {
        Some((start, end)) => {
            parts.window.replace_lines(parts.pool, start, end, entry.lines);
        }
        None => {
            parts.window.insert_lines(parts.pool, entry.after, entry.lines);
        }
    }
    mark_changed(parts.window);
    debug!(target: "actions.dispatch", added, removed, dot = parts.window.dot(), "text_input_commit");
    Ok(DispatchResult::changed(true))
}

pub(crate) fn delete(
    engine: &mut EditorEngine,
    range: LineRange,
    tail: &str,
    ctx: Ctx,
) -> EditResult<DispatchResult> {
    let print = CommandParser::print_suffix('d', tail)?;
    snapshot(engine, ctx);
    let parts = engine.parts();
    parts.window.delete_lines(parts.pool, range.start, range.end);
    mark_changed(parts.window);
    let out = suffix_output(engine, print);
    Ok(DispatchResult::changed(true).with_output(out))
}

/// `j` joins the range into one line; `J` puts a space between the pieces.
pub(crate) fn join(
    engine: &mut EditorEngine,
    cmd: char,
    range: LineRange,
    tail: &str,
    ctx: Ctx,
) -> EditResult<DispatchResult> {
    let print = CommandParser::print_suffix(cmd, tail)?;
    if range.start == range.end {
        engine.window_mut().set_dot(range.start);
        return Ok(DispatchResult::output(suffix_output(engine, print)));
    }
    let sep: &[u8] = if cmd == 'J' { b" " } else { b"" };
    let mut joined = Vec::new();
    {
        let w = engine.window();
        for n in range.start..=range.end {
            if n > range.start {
                joined.extend_from_slice(sep);
            }
            joined.extend_from_slice(w.line(engine.pool(), n).map(TextLine::raw).unwrap_or_default());
        }
    }
    let limit = engine.limits().max_line_length;
    if joined.len() > limit {
        return Err(CapacityError::ResultTooLong { limit }.into());
    }
    snapshot(engine, ctx);
    let parts = engine.parts();
    parts
        .window
        .replace_lines(parts.pool, range.start, range.end, vec![TextLine::new(joined)]);
    mark_changed(parts.window);
    let out = suffix_output(engine, print);
    Ok(DispatchResult::changed(true).with_output(out))
}

/// `m` moves and `t` copies the range to follow a destination address.
pub(crate) fn transfer(
    engine: &mut EditorEngine,
    cmd: char,
    range: LineRange,
    tail: &str,
    ctx: Ctx,
) -> EditResult<DispatchResult> {
    let (dest, rest) = parse_address(tail.trim_start())?.ok_or(AddressError::MissingAddress)?;
    let print = CommandParser::print_suffix(cmd, rest)?;
    let dest = {
        let parts = engine.parts();
        Resolver::new(parts.window, parts.pool, parts.interrupt).address(&dest)?
    };
    let LineRange { start, end, .. } = range;

    if cmd == 'm' {
        if dest >= start && dest < end {
            return Err(ModeViolation::DestinationInRange.into());
        }
        if dest == end || dest + 1 == start {
            engine.window_mut().set_dot(end);
            return Ok(DispatchResult::output(suffix_output(engine, print)));
        }
        snapshot(engine, ctx);
        let w = engine.window_mut();
        w.move_lines(start, end, dest);
        mark_changed(w);
    } else {
        engine.check_capacity(end - start + 1)?;
        snapshot(engine, ctx);
        let parts = engine.parts();
        parts.window.copy_lines(parts.pool, start, end, dest);
        mark_changed(parts.window);
    }
    let out = suffix_output(engine, print);
    Ok(DispatchResult::changed(true).with_output(out))
}

/// `kx` labels the addressed line `x`.
pub(crate) fn label(
    engine: &mut EditorEngine,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    let name = tail.trim();
    let mut chars = name.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => c,
        (Some(c), _) => return Err(AddressError::BadLabel(c).into()),
        (None, _) => return Err(AddressError::BadLabel(' ').into()),
    };
    engine.window_mut().set_label(c, range.end);
    Ok(DispatchResult::clean())
}
