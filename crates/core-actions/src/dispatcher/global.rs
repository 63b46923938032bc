//! `g/re/cmd` and `v/re/cmd`.
//!
//! Two phases. First every line of the range whose displayed text matches
//! (for `v`, does not match) is marked. Then the buffer is scanned from line
//! 1 for marked lines; each one is unmarked, made current and handed to the
//! dispatcher with the subcommand. When the subcommand changed the shape of
//! the buffer the same line number is examined again, since a different
//! line may have shifted into it. Scans repeat until no marks remain.
//!
//! The undo snapshot is taken once, before the first subcommand, so `u`
//! reverts the whole global command.

use super::{Ctx, DispatchResult, execute};
use crate::address::LineRange;
use crate::pattern::{check_delimiter, compile_for, remember_search, resolve_search, scan_delimited};
use core_model::EditorEngine;
use core_state::{EditError, EditResult, PatternError};
use tracing::{debug, trace};

pub(crate) fn global(
    engine: &mut EditorEngine,
    cmd: char,
    range: LineRange,
    tail: &str,
) -> EditResult<DispatchResult> {
    let invert = cmd == 'v';
    let mut chars = tail.chars();
    let delim = chars.next().ok_or(PatternError::BadDelimiter('\n'))?;
    let delim = check_delimiter(delim)?;
    let scanned = scan_delimited(chars.as_str(), delim);
    let sub = match scanned.rest.trim() {
        "" => "p",
        s => s,
    }
    .to_string();

    let source = resolve_search(engine.window(), scanned.body)?;
    let re = compile_for(engine.window(), &source, false)?;
    remember_search(engine.window_mut(), &source);

    let marked = mark_lines(engine, range, |text| re.is_match(text) != invert);
    let marked = match marked {
        Ok(0) => return Err(EditError::NoLinesMarked),
        Ok(n) => n,
        Err(e) => {
            engine.window_mut().clear_marks();
            return Err(e);
        }
    };
    debug!(target: "actions.global", %source, invert, marked, sub = %sub, "marked");

    engine.snapshot();
    let outcome = run_marked(engine, &sub);
    engine.window_mut().clear_marks();
    outcome
}

fn mark_lines(
    engine: &mut EditorEngine,
    range: LineRange,
    hit: impl Fn(&[u8]) -> bool,
) -> EditResult<usize> {
    let parts = engine.parts();
    parts.window.clear_marks();
    let mut count = 0;
    for n in range.start..=range.end {
        parts.interrupt.check()?;
        let matched = parts
            .window
            .display_line(parts.pool, n)
            .is_some_and(|text| hit(&text));
        parts.window.set_mark(n, matched);
        count += usize::from(matched);
    }
    Ok(count)
}

fn run_marked(engine: &mut EditorEngine, sub: &str) -> EditResult<DispatchResult> {
    let ctx = Ctx { in_global: true };
    let mut result = DispatchResult::clean();
    let mut last_modified = None;
    let mut passes = 0;

    loop {
        passes += 1;
        let mut progressed = false;
        let mut n = 1;
        while n <= engine.window().dol() {
            engine.interrupt().check()?;
            if !engine.window().is_marked(n) {
                n += 1;
                continue;
            }
            progressed = true;
            let w = engine.window_mut();
            w.set_mark(n, false);
            w.set_dot(n);
            match execute(engine, sub, ctx) {
                Ok(r) => {
                    result.output.extend(r.output);
                    if r.changed {
                        result.changed = true;
                        last_modified = Some(engine.window().dot());
                    }
                    if r.shape_changed {
                        result.shape_changed = true;
                        // Whatever slid into line n has not been looked at yet.
                        continue;
                    }
                }
                // A substitution that finds nothing on one marked line is not
                // a failure of the global command.
                Err(EditError::NoMatch) => {}
                Err(cause) => {
                    debug!(target: "actions.global", line = n, error = %cause, ?last_modified, "subcommand_failed");
                    return Err(EditError::PartialGlobalFailure {
                        cause: Box::new(cause),
                        last_modified,
                    });
                }
            }
            n += 1;
        }
        trace!(target: "actions.global", passes, remaining = engine.window().marked_count(), "pass_done");
        if !progressed || engine.window().marked_count() == 0 {
            break;
        }
    }
    Ok(result)
}
