//! Line addresses and ranges.
//!
//! Parsing is pure: [`parse_range`] turns the front of a command line into a
//! [`RangeExpr`] and hands back the unparsed remainder. Resolution needs the
//! window (for dot, dol, labels and pattern searches) and is done by
//! [`Resolver`].
//!
//! Grammar, each base optionally followed by any number of `+n` / `-n`
//! (a bare sign counts as 1, and offsets alone are relative to dot):
//!
//! ```text
//! <digits>   absolute line
//! .          dot
//! $          last line
//! 'x         label x
//! /re/ ?re?  next line forward / backward whose displayed text matches
//! ```
//!
//! Ranges are `a`, `a,b` or `a;b` (the latter evaluates `b` with dot at `a`),
//! plus the shorthands `,` / `%` (whole buffer) and `;` (dot through dol).

use crate::pattern::{compile_for, remember_search, resolve_search, scan_delimited};
use core_state::{AddressError, EditResult, Interrupt, Window};
use core_text::LinePool;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    Line(usize),
    Dot,
    Dol,
    Label(char),
    Forward(String),
    Backward(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrExpr {
    pub base: Base,
    pub offset: i64,
}

impl AddrExpr {
    pub fn line(n: usize) -> Self {
        Self {
            base: Base::Line(n),
            offset: 0,
        }
    }

    pub fn dot() -> Self {
        Self {
            base: Base::Dot,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeExpr {
    /// No address given; each command supplies its own default.
    Default,
    Whole,
    DotToEnd,
    One(AddrExpr),
    Two {
        first: AddrExpr,
        second: AddrExpr,
        /// `a;b`: dot moves to `a` before `b` is evaluated.
        from_first: bool,
    },
}

/// A resolved range and how many addresses the user actually typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
    pub given: u8,
}

fn take_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse one address from the front of `s`.
pub fn parse_address(s: &str) -> EditResult<Option<(AddrExpr, &str)>> {
    let mut rest = s;
    let base = match rest.chars().next() {
        Some(c) if c.is_ascii_digit() => {
            let (digits, after) = take_digits(rest);
            rest = after;
            let n = digits
                .parse::<usize>()
                .map_err(|_| AddressError::LineOutOfRange(usize::MAX))?;
            Some(Base::Line(n))
        }
        Some('.') => {
            rest = &rest[1..];
            Some(Base::Dot)
        }
        Some('$') => {
            rest = &rest[1..];
            Some(Base::Dol)
        }
        Some('\'') => match rest[1..].chars().next() {
            Some(c) if c.is_ascii_lowercase() => {
                rest = &rest[2..];
                Some(Base::Label(c))
            }
            Some(c) => return Err(AddressError::BadLabel(c).into()),
            None => return Err(AddressError::MissingAddress.into()),
        },
        Some(d @ ('/' | '?')) => {
            let scanned = scan_delimited(&rest[1..], d);
            rest = scanned.rest;
            Some(if d == '/' {
                Base::Forward(scanned.body)
            } else {
                Base::Backward(scanned.body)
            })
        }
        _ => None,
    };

    let mut offset: i64 = 0;
    let mut has_offset = false;
    while let Some(sign @ ('+' | '-')) = rest.chars().next() {
        let (digits, after) = take_digits(&rest[1..]);
        rest = after;
        let n = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<i64>()
                .map_err(|_| AddressError::LineOutOfRange(usize::MAX))?
        };
        offset = if sign == '+' {
            offset.saturating_add(n)
        } else {
            offset.saturating_sub(n)
        };
        has_offset = true;
    }

    match base {
        Some(base) => Ok(Some((AddrExpr { base, offset }, rest))),
        None if has_offset => Ok(Some((
            AddrExpr {
                base: Base::Dot,
                offset,
            },
            rest,
        ))),
        None => Ok(None),
    }
}

/// Parse the range at the front of a command line.
pub fn parse_range(s: &str) -> EditResult<(RangeExpr, &str)> {
    if let Some(rest) = s.strip_prefix('%') {
        return Ok((RangeExpr::Whole, rest));
    }
    if let Some(rest) = s.strip_prefix(',') {
        return Ok(match parse_address(rest)? {
            Some((second, rest)) => (
                RangeExpr::Two {
                    first: AddrExpr::line(1),
                    second,
                    from_first: false,
                },
                rest,
            ),
            None => (RangeExpr::Whole, rest),
        });
    }
    if let Some(rest) = s.strip_prefix(';') {
        return Ok(match parse_address(rest)? {
            Some((second, rest)) => (
                RangeExpr::Two {
                    first: AddrExpr::dot(),
                    second,
                    from_first: false,
                },
                rest,
            ),
            None => (RangeExpr::DotToEnd, rest),
        });
    }
    let Some((first, rest)) = parse_address(s)? else {
        return Ok((RangeExpr::Default, s));
    };
    let Some(sep @ (',' | ';')) = rest.chars().next() else {
        return Ok((RangeExpr::One(first), rest));
    };
    match parse_address(&rest[1..])? {
        Some((second, rest)) => Ok((
            RangeExpr::Two {
                first,
                second,
                from_first: sep == ';',
            },
            rest,
        )),
        None => Ok((RangeExpr::One(first), &rest[1..])),
    }
}

/// Resolves address expressions against one window.
pub struct Resolver<'a> {
    window: &'a mut Window,
    pool: &'a LinePool,
    interrupt: &'a Interrupt,
    dot: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(window: &'a mut Window, pool: &'a LinePool, interrupt: &'a Interrupt) -> Self {
        let dot = window.dot();
        Self {
            window,
            pool,
            interrupt,
            dot,
        }
    }

    pub fn address(&mut self, expr: &AddrExpr) -> EditResult<usize> {
        let dol = self.window.dol();
        let base = match &expr.base {
            Base::Line(n) => *n,
            Base::Dot => self.dot,
            Base::Dol => dol,
            Base::Label(c) => self
                .window
                .labels()
                .get(*c)
                .ok_or(AddressError::LabelNotSet(*c))?,
            Base::Forward(p) => self.search(p.clone(), true)?,
            Base::Backward(p) => self.search(p.clone(), false)?,
        };
        let line = i64::try_from(base)
            .unwrap_or(i64::MAX)
            .saturating_add(expr.offset);
        if line < 0 {
            return Err(AddressError::NegativeLine.into());
        }
        let line = usize::try_from(line).unwrap_or(usize::MAX);
        if line > dol {
            return Err(AddressError::LineOutOfRange(line).into());
        }
        Ok(line)
    }

    /// Resolve `range`; `None` for [`RangeExpr::Default`].
    pub fn range(&mut self, range: &RangeExpr) -> EditResult<Option<LineRange>> {
        let dol = self.window.dol();
        let (start, end, given) = match range {
            RangeExpr::Default => return Ok(None),
            RangeExpr::Whole => (dol.min(1), dol, 2),
            RangeExpr::DotToEnd => (self.dot, dol, 2),
            RangeExpr::One(a) => {
                let n = self.address(a)?;
                (n, n, 1)
            }
            RangeExpr::Two {
                first,
                second,
                from_first,
            } => {
                let start = self.address(first)?;
                if *from_first {
                    self.dot = start;
                }
                (start, self.address(second)?, 2)
            }
        };
        if end < start {
            return Err(AddressError::BadRange.into());
        }
        Ok(Some(LineRange { start, end, given }))
    }

    /// Nearest line after (or before) dot whose displayed text matches,
    /// wrapping around the buffer. Dot itself is never a match.
    fn search(&mut self, pattern: String, forward: bool) -> EditResult<usize> {
        let pattern = resolve_search(self.window, pattern)?;
        let re = compile_for(self.window, &pattern, false)?;
        remember_search(self.window, &pattern);
        let dol = self.window.dol();
        let mut n = self.dot;
        for _ in 0..dol {
            self.interrupt.check()?;
            n = match (forward, n) {
                (true, n) if n >= dol => 1,
                (true, n) => n + 1,
                (false, n) if n <= 1 => dol,
                (false, n) => n - 1,
            };
            if n == self.dot {
                break;
            }
            let Some(text) = self.window.display_line(self.pool, n) else {
                continue;
            };
            if re.is_match(&text) {
                trace!(target: "actions.dispatch", %pattern, forward, line = n, "search_hit");
                return Ok(n);
            }
        }
        Err(AddressError::PatternNotFound.into())
    }
}
