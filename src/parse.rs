//! Parsing MIPS assembly source into statements.
//!
//! This module converts source text into [`Stmt`]s, which can be fed into
//! the assembler (see [`crate::asm`]).
//!
//! Parsing is line-oriented, matching the grammar
//! `(label ':')* [mnemonic operands] [';'] [comment]`:
//! - [`parse_program`] parses a full source string, producing one [`Stmt`]
//!   per line;
//! - [`parse_line`] parses a single line.
//!
//! A line that fails to parse does not poison its neighbors: the error is
//! captured in the statement (see [`StmtKind::Malformed`]) so the second
//! assembler pass can report it alongside everything else.

pub mod lex;

use logos::Logos;

use crate::ast::{ImmOrLabel, Instr, Label, Operands, Reg, Stmt, StmtKind};
use crate::err::{AsmErr, AsmErrKind};
use crate::isa::{self, InstrDesc, Role};
use lex::Token;

/// Parses a source string into one [`Stmt`] per line.
///
/// This never fails as a whole; per-line errors are captured in the
/// returned statements.
///
/// ## Example
/// ```
/// use mips_asm::parse::parse_program;
///
/// let stmts = parse_program("loop: addiu $t0, $t0, 1\n      j loop");
/// assert_eq!(stmts.len(), 2);
/// assert_eq!(stmts[0].labels[0].name, "loop");
/// ```
pub fn parse_program(src: &str) -> Vec<Stmt> {
    src.lines()
        .enumerate()
        .map(|(no, line)| parse_line(line, no + 1))
        .collect()
}

/// Parses a single source line into a [`Stmt`].
///
/// `lineno` is the 1-based line number recorded on the statement, its
/// labels, and any error produced for it.
pub fn parse_line(line: &str, lineno: usize) -> Stmt {
    let mut tokens = Vec::new();
    let mut lex_err = None;
    for token in Token::lexer(line) {
        match token {
            // a comment always runs to the end of the line
            Ok(Token::Comment) => break,
            Ok(t) => tokens.push(t),
            Err(e) => {
                lex_err = Some(e);
                break;
            }
        }
    }

    // Labels are split off before the error check so that a line whose
    // body is garbage still defines its labels in pass 1.
    let (labels, body) = split_labels(tokens, lineno);

    let kind = match lex_err {
        Some(e) => StmtKind::Malformed(AsmErr::new(AsmErrKind::Lex(e), lineno)),
        None if body.is_empty() || body == [Token::Semi] => StmtKind::Empty,
        None => match parse_instr(body, lineno) {
            Ok(instr) => StmtKind::Instr(instr),
            Err(e) => StmtKind::Malformed(e),
        },
    };

    Stmt { line: lineno, labels, kind }
}

/// Strips zero or more `label:` prefixes off the front of the token list.
fn split_labels(mut tokens: Vec<Token>, lineno: usize) -> (Vec<Label>, Vec<Token>) {
    let mut labels = Vec::new();
    let mut pos = 0;
    while let (Some(Token::Ident(name)), Some(Token::Colon)) = (tokens.get(pos), tokens.get(pos + 1)) {
        labels.push(Label::new(name.clone(), lineno));
        pos += 2;
    }
    let body = tokens.split_off(pos);
    (labels, body)
}

fn parse_instr(tokens: Vec<Token>, line: usize) -> Result<Instr, AsmErr> {
    let mut parser = LineParser { tokens: tokens.into_iter(), line };

    let desc = parser.mnemonic()?;
    let mut operands = Operands::default();
    for (i, &role) in desc.shape.iter().enumerate() {
        if i > 0 {
            parser.comma(role)?;
        }
        parser.operand(role, &mut operands)?;
    }
    parser.finish()?;

    Ok(Instr { desc, operands })
}

/// Cursor over the tokens of one line's instruction body.
struct LineParser {
    tokens: std::vec::IntoIter<Token>,
    line: usize,
}

impl LineParser {
    fn err(&self, kind: AsmErrKind) -> AsmErr {
        AsmErr::new(kind, self.line)
    }

    fn mnemonic(&mut self) -> Result<&'static InstrDesc, AsmErr> {
        match self.tokens.next() {
            Some(Token::Ident(name)) => {
                isa::lookup(&name).ok_or_else(|| self.err(AsmErrKind::UnknownMnemonic(name)))
            }
            _ => Err(self.err(AsmErrKind::ExpectedMnemonic)),
        }
    }

    fn comma(&mut self, role: Role) -> Result<(), AsmErr> {
        match self.tokens.next() {
            Some(Token::Comma) => Ok(()),
            None => Err(self.err(AsmErrKind::MissingOperand(role))),
            Some(_) => Err(self.err(AsmErrKind::ExpectedComma)),
        }
    }

    /// Parses one operand for `role` into its slot(s) in `operands`.
    fn operand(&mut self, role: Role, operands: &mut Operands) -> Result<(), AsmErr> {
        match role {
            Role::Rd => operands.rd = Some(self.reg(role)?),
            Role::Rs => operands.rs = Some(self.reg(role)?),
            Role::Rt => operands.rt = Some(self.reg(role)?),
            Role::Shamt => match self.tokens.next() {
                Some(Token::Int(v)) => operands.shamt = Some(v),
                None => return Err(self.err(AsmErrKind::MissingOperand(role))),
                Some(_) => return Err(self.err(AsmErrKind::BadOperand(role))),
            },
            Role::Imm => operands.imm = Some(self.imm_or_label(role)?),
            Role::Address => operands.target = Some(self.imm_or_label(role)?),
            // the one fused role: `offset($base)` fills both imm and rs
            Role::BaseOffset => {
                let offset = match self.tokens.next() {
                    Some(Token::Int(v)) => v,
                    None => return Err(self.err(AsmErrKind::MissingOperand(role))),
                    Some(_) => return Err(self.err(AsmErrKind::BadOperand(role))),
                };
                self.expect(Token::LParen, role)?;
                let base = self.reg(role)?;
                self.expect(Token::RParen, role)?;
                operands.imm = Some(ImmOrLabel::Imm(offset));
                operands.rs = Some(base);
            }
        }
        Ok(())
    }

    fn reg(&mut self, role: Role) -> Result<Reg, AsmErr> {
        match self.tokens.next() {
            Some(Token::Reg(no)) => Ok(Reg(no)),
            None => Err(self.err(AsmErrKind::MissingOperand(role))),
            Some(_) => Err(self.err(AsmErrKind::BadOperand(role))),
        }
    }

    fn imm_or_label(&mut self, role: Role) -> Result<ImmOrLabel, AsmErr> {
        match self.tokens.next() {
            Some(Token::Int(v)) => Ok(ImmOrLabel::Imm(v)),
            Some(Token::Ident(name)) => Ok(ImmOrLabel::Label(Label::new(name, self.line))),
            None => Err(self.err(AsmErrKind::MissingOperand(role))),
            Some(_) => Err(self.err(AsmErrKind::BadOperand(role))),
        }
    }

    fn expect(&mut self, token: Token, role: Role) -> Result<(), AsmErr> {
        match self.tokens.next() {
            Some(t) if t == token => Ok(()),
            _ => Err(self.err(AsmErrKind::BadOperand(role))),
        }
    }

    /// Consumes the optional `;` terminator and requires the line to end.
    fn finish(mut self) -> Result<(), AsmErr> {
        match self.tokens.next() {
            None => Ok(()),
            Some(Token::Semi) => match self.tokens.next() {
                None => Ok(()),
                Some(_) => Err(self.err(AsmErrKind::TrailingTokens)),
            },
            Some(_) => Err(self.err(AsmErrKind::TrailingTokens)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ImmOrLabel, Reg, StmtKind};
    use crate::err::{AsmErrKind, ErrClass, LexErr};
    use crate::isa::Role;

    use super::{parse_line, parse_program};

    fn instr(line: &str) -> crate::ast::Instr {
        match parse_line(line, 1).kind {
            StmtKind::Instr(i) => i,
            kind => panic!("expected {line:?} to parse, got {kind:?}"),
        }
    }
    fn parse_err(line: &str) -> AsmErrKind {
        match parse_line(line, 1).kind {
            StmtKind::Malformed(e) => e.kind,
            kind => panic!("expected {line:?} to fail, got {kind:?}"),
        }
    }

    #[test]
    fn test_rtype_shapes() {
        let i = instr("add $t0, $t1, $t2");
        assert_eq!(i.desc.mnemonic, "add");
        assert_eq!(i.operands.rd, Some(Reg(8)));
        assert_eq!(i.operands.rs, Some(Reg(9)));
        assert_eq!(i.operands.rt, Some(Reg(10)));

        let i = instr("sll $t0, $t1, 4");
        assert_eq!(i.operands.rd, Some(Reg(8)));
        assert_eq!(i.operands.rt, Some(Reg(9)));
        assert_eq!(i.operands.shamt, Some(4));
        assert_eq!(i.operands.rs, None);

        let i = instr("jr $t2");
        assert_eq!(i.operands.rs, Some(Reg(10)));
        assert_eq!(i.operands.rd, None);
        assert_eq!(i.operands.rt, None);
    }

    #[test]
    fn test_itype_operand_order() {
        // the first written register of a 3-operand I-type is rt
        let i = instr("addiu $t1, $t2, 1024");
        assert_eq!(i.operands.rt, Some(Reg(9)));
        assert_eq!(i.operands.rs, Some(Reg(10)));
        assert_eq!(i.operands.imm, Some(ImmOrLabel::Imm(1024)));
    }

    #[test]
    fn test_base_offset() {
        let i = instr("lw $t0, 4($sp)");
        assert_eq!(i.operands.rt, Some(Reg(8)));
        assert_eq!(i.operands.rs, Some(Reg(29)));
        assert_eq!(i.operands.imm, Some(ImmOrLabel::Imm(4)));

        let i = instr("sw $a0, -12($fp)");
        assert_eq!(i.operands.rt, Some(Reg(4)));
        assert_eq!(i.operands.rs, Some(Reg(30)));
        assert_eq!(i.operands.imm, Some(ImmOrLabel::Imm(-12)));

        assert_eq!(parse_err("lw $t0, 4"), AsmErrKind::BadOperand(Role::BaseOffset));
        assert_eq!(parse_err("lw $t0, 4($sp"), AsmErrKind::BadOperand(Role::BaseOffset));
        assert_eq!(parse_err("lw $t0, ($sp)"), AsmErrKind::BadOperand(Role::BaseOffset));
    }

    #[test]
    fn test_branch_label_operand() {
        let i = instr("beq $t0, $t1, done");
        assert_eq!(i.operands.rt, Some(Reg(8)));
        assert_eq!(i.operands.rs, Some(Reg(9)));
        match &i.operands.imm {
            Some(ImmOrLabel::Label(l)) => assert_eq!(l.name, "done"),
            other => panic!("expected label operand, got {other:?}"),
        }
    }

    #[test]
    fn test_jump_operand() {
        let i = instr("j loop");
        match &i.operands.target {
            Some(ImmOrLabel::Label(l)) => assert_eq!(l.name, "loop"),
            other => panic!("expected label operand, got {other:?}"),
        }

        let i = instr("j 64");
        assert_eq!(i.operands.target, Some(ImmOrLabel::Imm(64)));
    }

    #[test]
    fn test_labels() {
        let stmt = parse_line("loop: addiu $t0, $t0, 1", 7);
        assert_eq!(stmt.labels.len(), 1);
        assert_eq!(stmt.labels[0].name, "loop");
        assert_eq!(stmt.labels[0].line(), 7);
        assert!(matches!(stmt.kind, StmtKind::Instr(_)));

        // several labels may pile up on one line
        let stmt = parse_line("a: b: c: jr $ra", 1);
        let names: Vec<_> = stmt.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        // label-only lines have no body
        let stmt = parse_line("done:", 1);
        assert_eq!(stmt.labels[0].name, "done");
        assert_eq!(stmt.kind, StmtKind::Empty);
        assert!(!stmt.occupies_slot());
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(parse_line("", 1).kind, StmtKind::Empty);
        assert_eq!(parse_line("   \t", 1).kind, StmtKind::Empty);
        assert_eq!(parse_line("# just a comment", 1).kind, StmtKind::Empty);
        assert_eq!(parse_line("  ;", 1).kind, StmtKind::Empty);
        assert_eq!(parse_line("here: # comment", 1).kind, StmtKind::Empty);
    }

    #[test]
    fn test_terminator_and_comment() {
        assert!(matches!(parse_line("jr $ra ;", 1).kind, StmtKind::Instr(_)));
        assert!(matches!(parse_line("jr $ra ; # return", 1).kind, StmtKind::Instr(_)));
        assert!(matches!(parse_line("jr $ra# return", 1).kind, StmtKind::Instr(_)));
        assert_eq!(parse_err("jr $ra extra"), AsmErrKind::TrailingTokens);
        assert_eq!(parse_err("jr $ra ; extra"), AsmErrKind::TrailingTokens);
        assert_eq!(parse_err("jr $ra, $t0"), AsmErrKind::TrailingTokens);
    }

    #[test]
    fn test_operand_errors() {
        assert_eq!(parse_err("add $t0, $t1"), AsmErrKind::MissingOperand(Role::Rt));
        assert_eq!(parse_err("add $t0"), AsmErrKind::MissingOperand(Role::Rs));
        assert_eq!(parse_err("jr"), AsmErrKind::MissingOperand(Role::Rs));
        assert_eq!(parse_err("add $t0, $t1, 5"), AsmErrKind::BadOperand(Role::Rt));
        assert_eq!(parse_err("sll $t0, $t1, $t2"), AsmErrKind::BadOperand(Role::Shamt));
        assert_eq!(parse_err("add $t0 $t1 $t2"), AsmErrKind::ExpectedComma);
        assert_eq!(parse_err("j $t0"), AsmErrKind::BadOperand(Role::Address));
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert_eq!(parse_err("frobnicate $t0"), AsmErrKind::UnknownMnemonic("frobnicate".to_string()));
        // mnemonics are case-sensitive
        assert_eq!(parse_err("ADD $t0, $t1, $t2"), AsmErrKind::UnknownMnemonic("ADD".to_string()));
        assert_eq!(parse_err(", $t0"), AsmErrKind::ExpectedMnemonic);
        assert_eq!(parse_err("42"), AsmErrKind::ExpectedMnemonic);
    }

    #[test]
    fn test_lex_error_keeps_labels() {
        let stmt = parse_line("foo: addi $t1, $qq, 4", 3);
        assert_eq!(stmt.labels[0].name, "foo");
        match stmt.kind {
            StmtKind::Malformed(e) => {
                assert_eq!(e.kind, AsmErrKind::Lex(LexErr::InvalidReg));
                assert_eq!(e.kind.class(), ErrClass::Syntax);
                assert_eq!(e.line, 3);
            }
            kind => panic!("expected lex error, got {kind:?}"),
        }
    }

    #[test]
    fn test_line_numbers() {
        let stmts = parse_program("jr $ra\n\nbad $t0\n");
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].line, 1);
        assert_eq!(stmts[2].line, 3);
        match &stmts[2].kind {
            StmtKind::Malformed(e) => assert_eq!(e.line, 3),
            kind => panic!("expected error, got {kind:?}"),
        }
    }

    #[test]
    fn test_malformed_occupies_slot() {
        // a broken instruction line still advances the instruction counter
        let stmts = parse_program("add $t0, $t1\njr $ra");
        assert!(stmts[0].occupies_slot());
        assert!(stmts[1].occupies_slot());
    }
}
