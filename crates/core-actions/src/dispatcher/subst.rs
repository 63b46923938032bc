//! The `s/pattern/replacement/flags` command.
//!
//! Every line of the range is rewritten into a staging list first; the
//! window is only touched once all of them succeeded. Flags: `g` (every
//! match), a number `n` (only the nth match), `i` (ignore case) and a
//! trailing print suffix.

use super::command_parser::PrintStyle;
use super::display::suffix_output;
use super::{Ctx, DispatchResult, mark_changed, snapshot};
use crate::address::LineRange;
use crate::pattern::{check_delimiter, compile_for, remember_search, resolve_search, scan_delimited};
use crate::substitute::{Occurrence, SubstituteOutcome, check_repeatable, substitute as apply};
use core_model::EditorEngine;
use core_state::{EditError, EditResult, PatternError, Window};
use core_text::{TextLine, markup};
use regex::bytes::Regex;
use tracing::debug;

struct Request {
    regex: Regex,
    template: Vec<u8>,
    which: Occurrence,
    print: Option<PrintStyle>,
}

#[derive(Debug, Default)]
struct Flags {
    which: Option<Occurrence>,
    ignore_case: bool,
    print: Option<PrintStyle>,
}

fn parse_flags(text: &str) -> EditResult<Flags> {
    let bad = || EditError::from(PatternError::BadFlags(text.to_string()));
    let mut flags = Flags::default();
    let mut digits = String::new();
    for c in text.trim().chars() {
        match c {
            'g' if flags.which.is_none() => flags.which = Some(Occurrence::All),
            'i' => flags.ignore_case = true,
            '0'..='9' => digits.push(c),
            c => match PrintStyle::from_char(c) {
                Some(style) if flags.print.is_none() => flags.print = Some(style),
                _ => return Err(bad()),
            },
        }
    }
    if !digits.is_empty() {
        if flags.which.is_some() {
            return Err(bad());
        }
        let n = digits.parse::<usize>().map_err(|_| bad())?;
        if n == 0 {
            return Err(bad());
        }
        flags.which = Some(Occurrence::Nth(n));
    }
    Ok(flags)
}

fn parse_request(window: &mut Window, tail: &str) -> EditResult<Request> {
    let mut chars = tail.chars();
    let delim = chars.next().ok_or(PatternError::BadDelimiter('\n'))?;
    let delim = check_delimiter(delim)?;
    let pattern = scan_delimited(chars.as_str(), delim);
    if !pattern.closed {
        return Err(PatternError::Malformed("missing replacement".into()).into());
    }
    let replacement = scan_delimited(pattern.rest, delim);
    let flags = parse_flags(if replacement.closed {
        replacement.rest
    } else {
        ""
    })?;

    let source = resolve_search(window, pattern.body)?;
    let template = if replacement.body == "%" {
        window
            .last_replacement
            .clone()
            .ok_or(PatternError::NoRememberedReplacement)?
    } else {
        replacement.body
    };
    let regex = compile_for(window, &source, flags.ignore_case)?;
    let which = flags.which.unwrap_or(Occurrence::Nth(1));
    check_repeatable(&regex, which)?;

    remember_search(window, &source);
    window.last_replacement = Some(template.clone());
    Ok(Request {
        regex,
        template: template.into_bytes(),
        which,
        print: flags.print,
    })
}

pub(crate) fn substitute(
    engine: &mut EditorEngine,
    range: LineRange,
    tail: &str,
    ctx: Ctx,
) -> EditResult<DispatchResult> {
    let req = parse_request(engine.window_mut(), tail)?;
    let max_len = engine.limits().max_line_length;

    let mut staged: Vec<(usize, Vec<TextLine>)> = Vec::new();
    {
        let w = engine.window();
        let pool = engine.pool();
        for n in range.start..=range.end {
            engine.interrupt().check()?;
            let Some(line) = w.line(pool, n) else {
                continue;
            };
            let raw = line.raw();
            let SubstituteOutcome::Replaced(bytes) =
                apply(raw, &req.regex, &req.template, req.which, max_len)?
            else {
                continue;
            };
            if !markup::same_tokens(raw, &bytes) {
                return Err(PatternError::MarkupAltered.into());
            }
            let pieces = bytes.split(|b| *b == b'\n').map(TextLine::new).collect();
            staged.push((n, pieces));
        }
    }
    if staged.is_empty() {
        return Err(EditError::NoMatch);
    }
    let extra: usize = staged.iter().map(|(_, lines)| lines.len() - 1).sum();
    engine.check_capacity(extra)?;

    snapshot(engine, ctx);
    let count = staged.len();
    let parts = engine.parts();
    let mut shift = 0;
    let mut last = 0;
    for (n, lines) in staged {
        let at = n + shift;
        let written = parts.window.rewrite_line(parts.pool, at, lines);
        shift += written - 1;
        last = at + written - 1;
    }
    parts.window.set_dot(last);
    mark_changed(parts.window);
    debug!(target: "actions.substitute", lines = count, extra, dot = last, "substituted");
    let out = suffix_output(engine, req.print);
    Ok(DispatchResult::changed(extra > 0).with_output(out))
}
