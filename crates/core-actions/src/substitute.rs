//! Regex substitution over one line's raw bytes.
//!
//! The engine never touches a buffer. It walks successive non-overlapping
//! matches, expands the replacement template for the chosen occurrence(s)
//! and reports the rewritten bytes. Splitting a result that now contains
//! newlines back into lines is the caller's job.
//!
//! Template syntax:
//! * `$0`..`$9` insert a capture group (a group the pattern lacks, or one
//!   that did not participate, inserts nothing);
//! * `\n \t \b \r \f \a` insert the control byte, `\0`..`\7` start an octal
//!   byte of up to three digits, and any other escaped character is literal;
//! * a template that is exactly `lc`, `uc` or `mc` replaces the match with
//!   itself lower-cased, upper-cased or capitalized word by word.

use core_state::{CapacityError, EditResult, PatternError};
use regex::bytes::{CaptureLocations, Regex};
use tracing::trace;

/// Which matches to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Only the nth match (1-based).
    Nth(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstituteOutcome {
    NoMatch,
    Replaced(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseShift {
    Lower,
    Upper,
    Mixed,
}

fn case_shift(template: &[u8]) -> Option<CaseShift> {
    match template {
        b"lc" => Some(CaseShift::Lower),
        b"uc" => Some(CaseShift::Upper),
        b"mc" => Some(CaseShift::Mixed),
        _ => None,
    }
}

/// Reject requests whose result would depend on where empty matches fall.
pub fn check_repeatable(re: &Regex, which: Occurrence) -> EditResult<()> {
    let repeats = !matches!(which, Occurrence::Nth(1));
    if repeats && re.is_match(b"") {
        return Err(PatternError::EmptyMatchRepeat.into());
    }
    Ok(())
}

/// Apply `re` to `line`, replacing the requested occurrence(s) with the
/// expanded `template`. Fails with `ResultTooLong` once the output would
/// exceed `max_len` bytes.
pub fn substitute(
    line: &[u8],
    re: &Regex,
    template: &[u8],
    which: Occurrence,
    max_len: usize,
) -> EditResult<SubstituteOutcome> {
    let shift = case_shift(template);
    let mut locs = re.capture_locations();
    let mut out = Vec::with_capacity(line.len());
    let mut copied = 0;
    let mut seen = 0;
    let mut replaced = 0;
    let mut at = 0;

    while at <= line.len() {
        let Some(m) = re.captures_read_at(&mut locs, line, at) else {
            break;
        };
        seen += 1;
        let wanted = match which {
            Occurrence::All => true,
            Occurrence::Nth(n) => seen == n,
        };
        if wanted {
            out.extend_from_slice(&line[copied..m.start()]);
            match shift {
                Some(shift) => apply_shift(&line[m.range()], shift, &mut out),
                None => expand(template, line, &locs, &mut out),
            }
            copied = m.end();
            replaced += 1;
            if out.len() > max_len {
                return Err(CapacityError::ResultTooLong { limit: max_len }.into());
            }
            if matches!(which, Occurrence::Nth(_)) {
                break;
            }
        }
        // An empty match steps one byte so the walk always terminates.
        at = if m.end() == m.start() {
            m.end() + 1
        } else {
            m.end()
        };
    }

    if replaced == 0 {
        trace!(target: "actions.substitute", seen, "no_match");
        return Ok(SubstituteOutcome::NoMatch);
    }
    out.extend_from_slice(&line[copied..]);
    if out.len() > max_len {
        return Err(CapacityError::ResultTooLong { limit: max_len }.into());
    }
    trace!(target: "actions.substitute", replaced, len = out.len(), "replaced");
    Ok(SubstituteOutcome::Replaced(out))
}

fn expand(template: &[u8], line: &[u8], locs: &CaptureLocations, out: &mut Vec<u8>) {
    let mut i = 0;
    while i < template.len() {
        let b = template[i];
        match b {
            b'$' if template.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                let group = usize::from(template[i + 1] - b'0');
                if let Some((s, e)) = locs.get(group) {
                    out.extend_from_slice(&line[s..e]);
                }
                i += 2;
            }
            b'\\' if i + 1 < template.len() => {
                let c = template[i + 1];
                i += 2;
                match c {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'r' => out.push(b'\r'),
                    b'f' => out.push(0x0c),
                    b'a' => out.push(0x07),
                    b'0'..=b'7' => {
                        let mut value = u32::from(c - b'0');
                        let mut digits = 1;
                        while digits < 3
                            && let Some(d @ b'0'..=b'7') = template.get(i).copied()
                        {
                            value = value * 8 + u32::from(d - b'0');
                            digits += 1;
                            i += 1;
                        }
                        out.push((value & 0xff) as u8);
                    }
                    other => out.push(other),
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
}

fn apply_shift(matched: &[u8], shift: CaseShift, out: &mut Vec<u8>) {
    match shift {
        CaseShift::Lower => out.extend(matched.iter().map(u8::to_ascii_lowercase)),
        CaseShift::Upper => out.extend(matched.iter().map(u8::to_ascii_uppercase)),
        CaseShift::Mixed => {
            let mut word_start = true;
            for &b in matched {
                if b.is_ascii_alphabetic() {
                    out.push(if word_start {
                        b.to_ascii_uppercase()
                    } else {
                        b.to_ascii_lowercase()
                    });
                    word_start = false;
                } else {
                    out.push(b);
                    word_start = !b.is_ascii_alphanumeric() && b != b'\'';
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::EditError;
    use pretty_assertions::assert_eq;

    fn run(line: &str, re: &str, template: &str, which: Occurrence) -> SubstituteOutcome {
        let re = Regex::new(re).unwrap();
        substitute(line.as_bytes(), &re, template.as_bytes(), which, 1024).unwrap()
    }

    fn replaced(s: &str) -> SubstituteOutcome {
        SubstituteOutcome::Replaced(s.as_bytes().to_vec())
    }

    #[test]
    fn first_occurrence_by_default() {
        assert_eq!(
            run("hello world", "world", "there", Occurrence::Nth(1)),
            replaced("hello there")
        );
        assert_eq!(
            run("a-a-a", "a", "b", Occurrence::Nth(1)),
            replaced("b-a-a")
        );
    }

    #[test]
    fn nth_and_all() {
        assert_eq!(run("a-a-a", "a", "b", Occurrence::Nth(2)), replaced("a-b-a"));
        assert_eq!(run("a-a-a", "a", "b", Occurrence::All), replaced("b-b-b"));
    }

    #[test]
    fn nth_beyond_count_is_no_match() {
        assert_eq!(
            run("x and x", "x", "y", Occurrence::Nth(3)),
            SubstituteOutcome::NoMatch
        );
        assert_eq!(
            run("abc", "z", "y", Occurrence::All),
            SubstituteOutcome::NoMatch
        );
    }

    #[test]
    fn backreferences_and_missing_groups() {
        assert_eq!(
            run("john smith", r"(\w+) (\w+)", "$2, $1$7", Occurrence::Nth(1)),
            replaced("smith, john")
        );
        assert_eq!(
            run("cost", "cost", "$$0", Occurrence::Nth(1)),
            replaced("$cost")
        );
    }

    #[test]
    fn escapes_and_octal() {
        assert_eq!(
            run("a,b", ",", r"\n", Occurrence::Nth(1)),
            replaced("a\nb")
        );
        assert_eq!(
            run("x", "x", r"\t\101\0", Occurrence::Nth(1)),
            SubstituteOutcome::Replaced(b"\tA\0".to_vec())
        );
        assert_eq!(
            run("x", "x", r"\$1\\", Occurrence::Nth(1)),
            replaced(r"$1\")
        );
    }

    #[test]
    fn case_directives_apply_to_whole_match() {
        assert_eq!(
            run("say HELLO there", "HELLO THERE|HELLO", "lc", Occurrence::Nth(1)),
            replaced("say hello there")
        );
        assert_eq!(
            run("big deal", "big deal", "uc", Occurrence::All),
            replaced("BIG DEAL")
        );
        assert_eq!(
            run("new YORK city", ".*", "mc", Occurrence::Nth(1)),
            replaced("New York City")
        );
    }

    #[test]
    fn empty_matches_advance() {
        assert_eq!(run("abc", "x*", "-", Occurrence::All), replaced("-a-b-c-"));
        assert_eq!(run("abc", "^", ">", Occurrence::Nth(1)), replaced(">abc"));
    }

    #[test]
    fn repeat_of_empty_match_is_rejected() {
        let re = Regex::new("x*").unwrap();
        assert_eq!(
            check_repeatable(&re, Occurrence::All),
            Err(EditError::Pattern(PatternError::EmptyMatchRepeat))
        );
        assert_eq!(
            check_repeatable(&re, Occurrence::Nth(2)),
            Err(EditError::Pattern(PatternError::EmptyMatchRepeat))
        );
        assert!(check_repeatable(&re, Occurrence::Nth(1)).is_ok());
        let re = Regex::new("x+").unwrap();
        assert!(check_repeatable(&re, Occurrence::All).is_ok());
    }

    #[test]
    fn result_length_is_capped() {
        let re = Regex::new("a").unwrap();
        assert_eq!(
            substitute(b"aaaa", &re, b"bbbb", Occurrence::All, 10),
            Err(EditError::Capacity(CapacityError::ResultTooLong { limit: 10 }))
        );
    }

    #[test]
    fn nul_bytes_pass_through() {
        let re = regex::bytes::RegexBuilder::new("b")
            .unicode(false)
            .build()
            .unwrap();
        assert_eq!(
            substitute(b"a\0b\0", &re, b"B", Occurrence::All, 64).unwrap(),
            SubstituteOutcome::Replaced(b"a\0B\0".to_vec())
        );
    }
}
