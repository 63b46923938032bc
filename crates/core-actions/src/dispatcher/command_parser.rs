//! Structured command line parsing.
//!
//! Splits one input line into its range expression, command letter and the
//! command-specific tail. No window state is consulted here; addresses are
//! resolved later by the dispatcher, and each handler interprets its own
//! tail.

use crate::address::{RangeExpr, parse_range};
use core_state::{EditResult, ModeViolation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub range: RangeExpr,
    /// `None` for a line holding only an address (or nothing at all).
    pub cmd: Option<char>,
    pub tail: &'a str,
}

/// How a command with a print suffix shows its resulting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStyle {
    Plain,
    Numbered,
    Listed,
}

impl PrintStyle {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(Self::Plain),
            'n' => Some(Self::Numbered),
            'l' => Some(Self::Listed),
            _ => None,
        }
    }
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> EditResult<ParsedCommand<'_>> {
        let line = raw.trim_start();
        let (range, rest) = parse_range(line)?;
        let rest = rest.trim_start();
        let mut chars = rest.chars();
        let cmd = chars.next();
        Ok(ParsedCommand {
            range,
            cmd,
            tail: chars.as_str(),
        })
    }

    /// Optional `p`/`n`/`l` after a command that takes nothing else.
    pub fn print_suffix(cmd: char, tail: &str) -> EditResult<Option<PrintStyle>> {
        let tail = tail.trim();
        let mut chars = tail.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(None),
            (Some(c), None) if PrintStyle::from_char(c).is_some() => {
                Ok(PrintStyle::from_char(c))
            }
            _ => Err(ModeViolation::TrailingText(cmd).into()),
        }
    }

    /// A tail that must be empty.
    pub fn no_tail(cmd: char, tail: &str) -> EditResult<()> {
        if tail.trim().is_empty() {
            Ok(())
        } else {
            Err(ModeViolation::TrailingText(cmd).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddrExpr;
    use core_state::EditError;

    #[test]
    fn parse_bare_command() {
        let p = CommandParser::parse("p").unwrap();
        assert_eq!(p.range, RangeExpr::Default);
        assert_eq!(p.cmd, Some('p'));
        assert_eq!(p.tail, "");
    }

    #[test]
    fn parse_range_and_tail() {
        let p = CommandParser::parse("  2,3s/a/b/g").unwrap();
        assert_eq!(
            p.range,
            RangeExpr::Two {
                first: AddrExpr::line(2),
                second: AddrExpr::line(3),
                from_first: false
            }
        );
        assert_eq!(p.cmd, Some('s'));
        assert_eq!(p.tail, "/a/b/g");
    }

    #[test]
    fn parse_address_only_and_blank() {
        let p = CommandParser::parse("5").unwrap();
        assert_eq!(p.range, RangeExpr::One(AddrExpr::line(5)));
        assert_eq!(p.cmd, None);
        let p = CommandParser::parse("").unwrap();
        assert_eq!(p.range, RangeExpr::Default);
        assert_eq!(p.cmd, None);
    }

    #[test]
    fn parse_file_command_keeps_spacing() {
        let p = CommandParser::parse("w+ out.txt").unwrap();
        assert_eq!(p.cmd, Some('w'));
        assert_eq!(p.tail, "+ out.txt");
    }

    #[test]
    fn print_suffixes() {
        assert_eq!(CommandParser::print_suffix('d', ""), Ok(None));
        assert_eq!(
            CommandParser::print_suffix('d', "n"),
            Ok(Some(PrintStyle::Numbered))
        );
        assert_eq!(
            CommandParser::print_suffix('d', "x"),
            Err(EditError::Mode(ModeViolation::TrailingText('d')))
        );
        assert!(CommandParser::no_tail('q', "  ").is_ok());
        assert!(CommandParser::no_tail('q', "!").is_err());
    }
}
