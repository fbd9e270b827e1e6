//! Tokenizing MIPS assembly.
//!
//! This module holds the tokens that characterize MIPS assembly ([`Token`]).
//! It is used by the parser to facilitate the conversion of source lines
//! into statements.
//!
//! Tokenization is line-oriented: the parser runs one lexer per source
//! line, so no token ever spans a line boundary.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

use crate::isa;

/// A unit of information in one line of MIPS source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r]+", error = LexErr)]
pub enum Token {
    // Note, these regexes span over tokens that are technically invalid
    // (e.g., $q8 matches for a register even though it shouldn't).
    // This is intended.
    // These regexes collect what would be considered one discernable unit
    // and validates it using the validator function.

    /// A register reference (e.g., `$t1`, `$9`), resolved to its number.
    #[regex(r"\$\w*", lex_reg)]
    Reg(u8),

    /// An integer literal: decimal or hexadecimal, optionally negative
    /// (e.g., `1024`, `-4`, `0x7fff`).
    #[regex(r"-?\d\w*", lex_int)]
    Int(i64),

    /// An identifier: an instruction mnemonic or a label name.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().to_string())]
    Ident(String),

    /// A comma, which delineates operands of an instruction.
    #[token(",")]
    Comma,

    /// A colon, which terminates a label.
    #[token(":")]
    Colon,

    /// Open parenthesis of a `offset($base)` operand.
    #[token("(")]
    LParen,

    /// Close parenthesis of a `offset($base)` operand.
    #[token(")")]
    RParen,

    /// An optional statement terminator.
    #[token(";")]
    Semi,

    /// A comment, which starts with `#` and spans the remaining part of the line.
    #[regex(r"#.*")]
    Comment,
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of a 32-bit machine word.
    DoesNotFitWord,
    /// Numeric literal has invalid digits (i.e., not 0-9).
    InvalidNumeric,
    /// Hex literal (starting with 0x) has invalid hex digits.
    InvalidHex,
    /// Hex literal (starting with 0x) doesn't have digits after it.
    InvalidHexEmpty,
    /// Int parsing failed but the reason why is unknown.
    UnknownIntErr,
    /// Token had the format `$reg`, but `reg` is neither a register name
    /// nor a number 0-31.
    InvalidReg,
    /// A symbol was used which is not allowed in MIPS assembly files.
    #[default]
    InvalidSymbol,
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitWord => f.write_str("numeric literal does not fit in a 32-bit word"),
            LexErr::InvalidNumeric => f.write_str("invalid decimal literal"),
            LexErr::InvalidHex     => f.write_str("invalid hex literal"),
            LexErr::InvalidHexEmpty => f.write_str("invalid hex literal"),
            LexErr::UnknownIntErr  => f.write_str("could not parse integer"),
            LexErr::InvalidReg     => f.write_str("invalid register"),
            LexErr::InvalidSymbol  => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn line(&self) -> Option<usize> {
        None
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitWord  => Some(format!("the valid range for a literal is [{}, {}]", i32::MIN, u32::MAX).into()),
            LexErr::InvalidNumeric  => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidHex      => Some("a hex literal starts with '0x' and consists of 0-9, A-F".into()),
            LexErr::InvalidHexEmpty => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::UnknownIntErr   => None,
            LexErr::InvalidReg      => Some("this must be one of the 32 register names or $0-$31".into()),
            LexErr::InvalidSymbol   => Some("this char does not occur in any token in MIPS assembly".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
fn convert_int_error(e: &IntErrorKind, invalid_digits_err: LexErr, empty_err: LexErr) -> LexErr {
    match e {
        IntErrorKind::Empty => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow => LexErr::DoesNotFitWord,
        IntErrorKind::NegOverflow => LexErr::DoesNotFitWord,
        _ => LexErr::UnknownIntErr,
    }
}

fn lex_int(lx: &Lexer<'_, Token>) -> Result<i64, LexErr> {
    let slice = lx.slice();
    let (neg, body) = match slice.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, slice),
    };

    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16)
            .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidHex, LexErr::InvalidHexEmpty)),
        None => body.parse::<i64>()
            .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidNumeric)),
    }?;

    let value = match neg {
        true => -magnitude,
        false => magnitude,
    };
    // Bound literals to the machine word; whether a value fits its
    // instruction field is checked by the encoder.
    match (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        true => Ok(value),
        false => Err(LexErr::DoesNotFitWord),
    }
}

fn lex_reg(lx: &Lexer<'_, Token>) -> Result<u8, LexErr> {
    let name = &lx.slice()[1..];
    match isa::reg_number(name) {
        Some(no) => Ok(no),
        None => name.parse::<u8>().ok()
            .filter(|&no| no < 32)
            .ok_or(LexErr::InvalidReg),
    }
}
