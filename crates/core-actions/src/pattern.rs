//! Delimited pattern scanning and regex compilation shared by searches,
//! substitution and the global command.

use core_state::{EditError, EditResult, PatternError, Window, WindowFlags};
use regex::bytes::{Regex, RegexBuilder};

/// Text up to the next unescaped `delim`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimited<'a> {
    pub body: String,
    pub rest: &'a str,
    /// False when the input ran out before a closing delimiter.
    pub closed: bool,
}

/// Scan `s` up to an unescaped `delim`. An escaped delimiter loses its
/// backslash; every other escape is kept verbatim for the regex or template
/// parser downstream.
pub fn scan_delimited(s: &str, delim: char) -> Delimited<'_> {
    let mut body = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delim {
            return Delimited {
                body,
                rest: &s[i + c.len_utf8()..],
                closed: true,
            };
        }
        if c == '\\' {
            match chars.next() {
                Some((_, next)) if next == delim => body.push(next),
                Some((_, next)) => {
                    body.push('\\');
                    body.push(next);
                }
                None => body.push('\\'),
            }
            continue;
        }
        body.push(c);
    }
    Delimited {
        body,
        rest: "",
        closed: false,
    }
}

/// Check that `c` may delimit a pattern.
pub fn check_delimiter(c: char) -> EditResult<char> {
    if c.is_alphanumeric() || c.is_whitespace() || c == '\\' {
        return Err(PatternError::BadDelimiter(c).into());
    }
    Ok(c)
}

/// The pattern an empty `body` stands for: the window's remembered search.
/// Nothing is stored here; callers remember the source with
/// [`remember_search`] once their whole request is known to be valid.
pub fn resolve_search(window: &Window, body: String) -> EditResult<String> {
    if body.is_empty() {
        return window
            .last_search
            .clone()
            .ok_or_else(|| PatternError::NoRememberedPattern.into());
    }
    Ok(body)
}

pub fn remember_search(window: &mut Window, source: &str) {
    if window.last_search.as_deref() != Some(source) {
        window.last_search = Some(source.to_string());
    }
}

/// Compile `source` for matching against line bytes. Buffers holding binary
/// data match byte-wise so `.` and classes accept any byte.
pub fn compile(source: &str, ignore_case: bool, binary: bool) -> EditResult<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(ignore_case)
        .unicode(!binary)
        .build()
        .map_err(|e| malformed(&e))
}

pub fn compile_for(window: &Window, source: &str, ignore_case: bool) -> EditResult<Regex> {
    compile(
        source,
        ignore_case,
        window.flags.contains(WindowFlags::BINARY),
    )
}

fn malformed(e: &regex::Error) -> EditError {
    // The parser's message spans several lines; its last line names the fault.
    let text = e.to_string();
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("invalid pattern")
        .trim()
        .trim_start_matches("error: ")
        .to_string();
    PatternError::Malformed(line).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::WindowId;

    #[test]
    fn escaped_delimiter_is_unescaped() {
        let d = scan_delimited(r"a\/b/rest", '/');
        assert_eq!(d.body, "a/b");
        assert_eq!(d.rest, "rest");
        assert!(d.closed);
    }

    #[test]
    fn other_escapes_survive() {
        let d = scan_delimited(r"\d+\\/x", '/');
        assert_eq!(d.body, r"\d+\\");
        assert_eq!(d.rest, "x");
    }

    #[test]
    fn unterminated_runs_to_end() {
        let d = scan_delimited("abc", '/');
        assert_eq!(d.body, "abc");
        assert!(!d.closed);
        assert_eq!(d.rest, "");
    }

    #[test]
    fn delimiters_exclude_letters_and_space() {
        assert!(check_delimiter('#').is_ok());
        assert_eq!(
            check_delimiter('a'),
            Err(PatternError::BadDelimiter('a').into())
        );
        assert!(check_delimiter(' ').is_err());
    }

    #[test]
    fn empty_pattern_uses_remembered_search() {
        let mut w = Window::new(WindowId(1));
        assert_eq!(
            resolve_search(&w, String::new()),
            Err(PatternError::NoRememberedPattern.into())
        );
        assert_eq!(resolve_search(&w, "fo+".into()).unwrap(), "fo+");
        assert_eq!(w.last_search, None);
        remember_search(&mut w, "fo+");
        assert_eq!(resolve_search(&w, String::new()).unwrap(), "fo+");
    }

    #[test]
    fn malformed_pattern_is_one_line() {
        let err = compile("a(b", false, false).unwrap_err();
        let EditError::Pattern(PatternError::Malformed(msg)) = err else {
            panic!("expected malformed pattern, got {err:?}");
        };
        assert!(!msg.contains('\n'));
    }

    #[test]
    fn binary_patterns_match_raw_bytes() {
        let re = compile("a.b", false, true).unwrap();
        assert!(re.is_match(b"a\xffb"));
        let re = compile("A", true, false).unwrap();
        assert!(re.is_match(b"xa"));
    }
}
