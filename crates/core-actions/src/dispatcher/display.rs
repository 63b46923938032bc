//! Read-only display commands: `p`, `n`, `l`, `=`, and the bare address.

use super::command_parser::{CommandParser, PrintStyle};
use super::DispatchResult;
use crate::address::LineRange;
use core_model::EditorEngine;
use core_state::EditResult;

/// Render line `n` of the current window in `style`.
pub(crate) fn render(engine: &EditorEngine, n: usize, style: PrintStyle) -> Option<String> {
    let bytes = engine.window().display_line(engine.pool(), n)?;
    Some(match style {
        PrintStyle::Plain => String::from_utf8_lossy(&bytes).into_owned(),
        PrintStyle::Numbered => format!("{n}\t{}", String::from_utf8_lossy(&bytes)),
        PrintStyle::Listed => list_escape(&bytes),
    })
}

/// The current line, when a command carried a print suffix.
pub(crate) fn suffix_output(engine: &EditorEngine, style: Option<PrintStyle>) -> Vec<String> {
    let dot = engine.window().dot();
    style
        .and_then(|s| render(engine, dot, s))
        .into_iter()
        .collect()
}

pub(crate) fn print(
    engine: &mut EditorEngine,
    cmd: char,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    CommandParser::no_tail(cmd, tail)?;
    let style = PrintStyle::from_char(cmd).unwrap_or(PrintStyle::Plain);
    let mut out = Vec::with_capacity(range.end + 1 - range.start);
    for n in range.start..=range.end {
        engine.interrupt().check()?;
        out.extend(render(engine, n, style));
    }
    engine.window_mut().set_dot(range.end);
    Ok(DispatchResult::output(out))
}

/// A line with only an address, or nothing at all: move there and print.
pub(crate) fn show(engine: &mut EditorEngine, range: LineRange) -> EditResult<DispatchResult> {
    engine.window_mut().set_dot(range.end);
    let out = render(engine, range.end, PrintStyle::Plain);
    Ok(DispatchResult::output(out.into_iter().collect()))
}

pub(crate) fn line_number(range: LineRange, tail: &str) -> EditResult<DispatchResult> {
    CommandParser::no_tail('=', tail)?;
    Ok(DispatchResult::output(vec![range.end.to_string()]))
}

/// Unambiguous rendering for `l`: tab, backspace and backslash as C-style
/// escapes, other control bytes and invalid UTF-8 as three-digit octal, and
/// `$` marking the end of the line.
pub fn list_escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 1);
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '\t' => out.push_str("\\t"),
                '\u{8}' => out.push_str("\\b"),
                '\\' => out.push_str("\\\\"),
                c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
                c => out.push(c),
            }
        }
        for b in chunk.invalid() {
            out.push_str(&format!("\\{b:03o}"));
        }
    }
    out.push('$');
    out
}
