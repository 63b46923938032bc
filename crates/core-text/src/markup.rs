//! Out-of-band markup tokens embedded in line bytes.
//!
//! The browsing layer marks hyperlink and form boundaries with a token of the
//! shape `LEAD digits terminator`, where `LEAD` is the byte `0x80`, `digits`
//! is one or more ASCII digits naming the tag, and `terminator` is one of
//! `{ } < > * #`. The meaning of a token belongs to that layer. The core only
//! needs two things from it:
//! * a human-facing rendering that drops the lead byte and tag number, keeping
//!   bracket terminators as visible delimiters and dropping `*`/`#` entirely;
//! * a way to confirm that a byte rewrite left every token intact.
//!
//! A lead byte that does not start a well-formed token is ordinary data.

use std::borrow::Cow;
use std::ops::Range;

pub const MARKUP_LEAD: u8 = 0x80;

const TERMINATORS: &[u8] = b"{}<>*#";

/// Length of the token starting at `at`, if one does.
fn token_len(raw: &[u8], at: usize) -> Option<usize> {
    if raw.get(at) != Some(&MARKUP_LEAD) {
        return None;
    }
    let digits = raw[at + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let term = *raw.get(at + 1 + digits)?;
    TERMINATORS.contains(&term).then_some(digits + 2)
}

/// Byte ranges of every well-formed token in `raw`, in order.
pub fn tokens(raw: &[u8]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        match token_len(raw, i) {
            Some(n) => {
                out.push(i..i + n);
                i += n;
            }
            None => i += 1,
        }
    }
    out
}

pub fn has_markup(raw: &[u8]) -> bool {
    raw.contains(&MARKUP_LEAD) && !tokens(raw).is_empty()
}

/// Human-facing rendering of `raw`.
pub fn strip(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&MARKUP_LEAD) {
        return Cow::Borrowed(raw);
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    let mut touched = false;
    while i < raw.len() {
        if let Some(n) = token_len(raw, i) {
            let term = raw[i + n - 1];
            if matches!(term, b'{' | b'}' | b'<' | b'>') {
                out.push(term);
            }
            i += n;
            touched = true;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    if touched {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(raw)
    }
}

/// True when `before` and `after` carry the same token sequence, byte for
/// byte.
pub fn same_tokens(before: &[u8], after: &[u8]) -> bool {
    let a = tokens(before);
    let b = tokens(after);
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| before[x.clone()] == after[y.clone()])
}
