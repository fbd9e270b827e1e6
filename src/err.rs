//! Error types for the assembler.
//!
//! Every diagnostic the crate produces implements the [`Error`] trait,
//! which ties the error back to a 1-based source line (when one is known)
//! and optionally offers a help message.
//!
//! The concrete error types are:
//! - [`AsmErr`]: an error kind paired with the source line it occurred on
//! - [`LexErr`]: a tokenization error (re-exported from [`crate::parse::lex`])
//! - [`OffsetNewErr`]: a bit-width range error (re-exported from [`crate::ast`])

use std::borrow::Cow;

pub use crate::ast::OffsetNewErr;
pub use crate::parse::lex::LexErr;

use crate::isa::Role;

/// Unified error interface for this crate.
pub trait Error: std::error::Error {
    /// The 1-based source line this error is tied to, if known.
    ///
    /// Errors coming out of the lexer do not know their line;
    /// the parser wraps them into an [`AsmErr`] which does.
    fn line(&self) -> Option<usize>;

    /// A short message to help resolve the error, if there is one.
    fn help(&self) -> Option<Cow<str>>;
}

/// The four classes of assembly errors.
///
/// Every [`AsmErrKind`] maps onto exactly one class (see [`AsmErrKind::class`]),
/// which callers can use to decide how to report or count a diagnostic
/// without matching on every kind.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrClass {
    /// Operand shape/count mismatch, malformed literal, bad terminator.
    Syntax,
    /// A numeric value does not fit the bit field it must be packed into.
    Range,
    /// Duplicate label definition or unresolved label reference.
    Symbol,
    /// The mnemonic is not part of the supported instruction set.
    Unsupported,
}

/// Kinds of errors that can occur while assembling a program.
///
/// See [`AsmErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AsmErrKind {
    /// Line does not start with a label or an instruction mnemonic.
    ExpectedMnemonic,
    /// The mnemonic is not in the instruction table.
    UnknownMnemonic(String),
    /// The instruction requires an operand that is not present.
    MissingOperand(Role),
    /// An operand is present but does not have the required shape.
    BadOperand(Role),
    /// Operands must be separated by commas.
    ExpectedComma,
    /// Text after the final operand that is not a terminator or comment.
    TrailingTokens,
    /// A token could not be lexed.
    Lex(LexErr),
    /// A value does not fit the bit field it is packed into.
    OutOfRange(OffsetNewErr),
    /// The same label was defined more than once (pass 1).
    DuplicateLabel(String),
    /// A label operand has no entry in the symbol table (pass 2).
    UnresolvedLabel(String),
}

impl AsmErrKind {
    /// The class of this error kind.
    pub fn class(&self) -> ErrClass {
        match self {
            Self::UnknownMnemonic(_) => ErrClass::Unsupported,
            Self::OutOfRange(_) => ErrClass::Range,
            Self::DuplicateLabel(_) | Self::UnresolvedLabel(_) => ErrClass::Symbol,
            _ => ErrClass::Syntax,
        }
    }
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedMnemonic   => f.write_str("expected an instruction mnemonic"),
            Self::UnknownMnemonic(m) => write!(f, "unsupported instruction '{m}'"),
            Self::MissingOperand(r)  => write!(f, "missing {r} operand"),
            Self::BadOperand(r)      => write!(f, "malformed {r} operand"),
            Self::ExpectedComma      => f.write_str("expected comma between operands"),
            Self::TrailingTokens     => f.write_str("unexpected text after operands"),
            Self::Lex(e)             => e.fmt(f),
            Self::OutOfRange(e)      => e.fmt(f),
            Self::DuplicateLabel(l)  => write!(f, "label '{l}' was defined multiple times"),
            Self::UnresolvedLabel(l) => write!(f, "label '{l}' could not be found"),
        }
    }
}

/// Error from assembling a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// What went wrong.
    pub kind: AsmErrKind,
    /// The 1-based source line the error occurred on.
    pub line: usize,
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new(kind: AsmErrKind, line: usize) -> Self {
        AsmErr { kind, line }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::Lex(e) => Some(e),
            AsmErrKind::OutOfRange(e) => Some(e),
            _ => None,
        }
    }
}
impl Error for AsmErr {
    fn line(&self) -> Option<usize> {
        Some(self.line)
    }

    fn help(&self) -> Option<Cow<str>> {
        match &self.kind {
            AsmErrKind::ExpectedMnemonic   => None,
            AsmErrKind::UnknownMnemonic(_) => Some("check the spelling; mnemonics are lowercase".into()),
            AsmErrKind::MissingOperand(r)  => Some(format!("add a {r} operand").into()),
            AsmErrKind::BadOperand(_)      => None,
            AsmErrKind::ExpectedComma      => None,
            AsmErrKind::TrailingTokens     => Some("only a ';' and a '#' comment may follow the operands".into()),
            AsmErrKind::Lex(e)             => e.help(),
            AsmErrKind::OutOfRange(e)      => e.help(),
            AsmErrKind::DuplicateLabel(_)  => Some("labels must be unique within a program, try renaming one of them".into()),
            AsmErrKind::UnresolvedLabel(_) => Some("try adding this label before an instruction".into()),
        }
    }
}
