//! Parse program files.
//!
//! A program file holds one byte per line, written in base 2 (with an optional `0b` prefix).
//! Anything after a `#` is a comment. Lines without a byte, like blank or comment-only lines,
//! are skipped and do not use an address.

use nom::{
    bytes::complete::{tag_no_case, take_while1},
    combinator::{all_consuming, opt},
    sequence::preceded,
    IResult,
};
use thiserror::Error;
use tracing::trace;

use crate::constants::Word;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramParseError {
    #[error("line {line}: 0b{literal} does not fit in a byte")]
    Overflow { line: usize, literal: String },
}

/// Check if character is a binary digit
fn is_bin_digit(c: char) -> bool {
    c.is_digit(2)
}

/// Extract the digits of a binary literal spanning the whole input
fn take_binary_literal(input: &str) -> IResult<&str, &str> {
    all_consuming(preceded(opt(tag_no_case("0b")), take_while1(is_bin_digit)))(input)
}

/// Remove the comment from a line, and the whitespaces around what is left
fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _comment)| code).trim()
}

/// Parse a single line, returning `None` if it holds no byte
fn parse_line(line: &str, number: usize) -> Result<Option<Word>, ProgramParseError> {
    let Ok((_, digits)) = take_binary_literal(strip_comment(line)) else {
        return Ok(None);
    };

    Word::from_str_radix(digits, 2)
        .map(Some)
        .map_err(|_| ProgramParseError::Overflow {
            line: number,
            literal: digits.to_owned(),
        })
}

/// Parse a program file into the bytes to load in memory
///
/// # Errors
///
/// Fails if a line holds a binary number which does not fit in a byte.
pub fn parse_program(input: &str) -> Result<Vec<Word>, ProgramParseError> {
    let mut program = Vec::new();

    for (index, line) in input.lines().enumerate() {
        if let Some(byte) = parse_line(line, index + 1)? {
            trace!(address = program.len(), byte, "Parsed program byte");
            program.push(byte);
        }
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strip_comment_test() {
        assert_eq!(strip_comment("10000010 # LDI R0,8"), "10000010");
        assert_eq!(strip_comment("  00000001  "), "00000001");
        assert_eq!(strip_comment("# only a comment"), "");
        assert_eq!(strip_comment(""), "");
    }

    #[test]
    fn is_bin_digit_test() {
        assert!(is_bin_digit('0'));
        assert!(is_bin_digit('1'));
        for c in ('2'..='9').chain('a'..='z') {
            assert!(!is_bin_digit(c));
        }
    }

    #[test]
    fn parse_line_test() {
        assert_eq!(parse_line("10000010", 1), Ok(Some(0b1000_0010)));
        assert_eq!(parse_line("0b00001000 # 8", 1), Ok(Some(8)));
        assert_eq!(parse_line("   ", 1), Ok(None));
        assert_eq!(parse_line("# LDI", 1), Ok(None));
        assert_eq!(parse_line("LDI 1", 1), Ok(None));
        assert_eq!(parse_line("0102", 1), Ok(None));
        assert_eq!(
            parse_line("100000000", 7),
            Err(ProgramParseError::Overflow {
                line: 7,
                literal: "100000000".to_owned()
            })
        );
    }

    #[test]
    fn parse_program_test() {
        let input = indoc::indoc! {r"
            # print8.ls8: Print the number 8 on the screen

            10000010 # LDI R0,8
            00000000
            00001000
            01000111 # PRN R0
            00000000
            00000001 # HLT
        "};

        assert_eq!(
            parse_program(input),
            Ok(vec![
                0b1000_0010,
                0b0000_0000,
                0b0000_1000,
                0b0100_0111,
                0b0000_0000,
                0b0000_0001,
            ])
        );
    }

    #[test]
    fn parse_empty_program_test() {
        assert_eq!(parse_program(""), Ok(vec![]));
        assert_eq!(parse_program("# nothing\n\n"), Ok(vec![]));
    }
}
