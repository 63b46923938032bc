//! Line storage primitives: immutable text lines, the refcounted line pool and
//! the per-window line map.
//!
//! Lines are byte sequences, not strings. They may carry embedded NUL bytes,
//! invalid UTF-8 and out-of-band markup tokens inserted by the browsing layer.
//! Nothing in this crate ever mutates a line in place: an edit produces a new
//! `TextLine`, appends it to the `LinePool` and splices its handle into a
//! `LineMap`.
//!
//! Ownership model:
//! * Every live pool slot carries a reference count equal to the number of
//!   map entries (current maps plus the retained undo map) naming it.
//! * `LinePool::insert` hands the caller one reference; `LineMap::splice`
//!   takes ownership of the references carried by inserted entries and
//!   releases the references of removed entries.
//! * A slot is reclaimed exactly once, when its count drops to zero.

use std::borrow::Cow;
use std::fmt;

pub mod map;
pub mod markup;
pub mod pool;

pub use map::{DirSuffix, LineEntry, LineMap};
pub use pool::{LineHandle, LinePool};

/// An immutable, NUL-safe line of text. The logical newline terminator is not
/// stored.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct TextLine {
    bytes: Box<[u8]>,
}

impl TextLine {
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::new(s.as_bytes())
    }

    /// Raw bytes exactly as stored, markup tokens included.
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes as a human should see them (markup tokens skipped).
    pub fn display(&self) -> Cow<'_, [u8]> {
        markup::strip(&self.bytes)
    }

    /// Lossy UTF-8 rendering of [`TextLine::display`].
    pub fn display_string(&self) -> String {
        String::from_utf8_lossy(&self.display()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for TextLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextLine({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

impl From<&str> for TextLine {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<Vec<u8>> for TextLine {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

/// Result of splitting a byte blob on newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitBlob {
    pub lines: Vec<TextLine>,
    /// False when the blob was non-empty and its last line had no `\n`.
    pub final_newline: bool,
    /// True when any byte of the blob was NUL.
    pub has_nul: bool,
}

/// Split `blob` into lines. A trailing `\n` terminates the last line rather
/// than opening an empty one; an empty blob yields no lines.
pub fn split_blob(blob: &[u8]) -> SplitBlob {
    let has_nul = blob.contains(&0);
    if blob.is_empty() {
        return SplitBlob {
            lines: Vec::new(),
            final_newline: true,
            has_nul,
        };
    }
    let final_newline = blob.last() == Some(&b'\n');
    let body = if final_newline {
        &blob[..blob.len() - 1]
    } else {
        blob
    };
    let lines = body.split(|b| *b == b'\n').map(TextLine::new).collect();
    SplitBlob {
        lines,
        final_newline,
        has_nul,
    }
}

/// Number of lines `split_blob` would produce, without allocating them.
pub fn count_lines(blob: &[u8]) -> usize {
    let newlines = blob.iter().filter(|b| **b == b'\n').count();
    match blob.last() {
        None | Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    }
}

/// Join lines back into a blob, newline-terminating every line except
/// possibly the last.
pub fn join_lines<'a, I>(lines: I, final_newline: bool) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut out = Vec::new();
    let mut any = false;
    for line in lines {
        if any {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
        any = true;
    }
    if any && final_newline {
        out.push(b'\n');
    }
    out
}
