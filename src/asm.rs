//! Assembling parsed statements into 32-bit machine words.
//!
//! This module converts statement lists (`Vec<`[`Stmt`]`>`, see
//! [`crate::parse`]) into machine words with the classic two-pass scheme:
//!
//! 1. [`SymbolTable::new`] scans the statements once and records the
//!    instruction index each label binds to. A duplicate label aborts the
//!    run here; without a complete table the second pass cannot run safely.
//! 2. [`assemble`] walks the statements again, resolves label operands
//!    through the table, and yields one [`LineResult`] per statement.
//!
//! The passes are strictly sequential; the table is written only by the
//! first and read only by the second. Per-line errors in the second pass
//! do not stop the run: they are collected in the [`Assembly`] so a caller
//! can report every diagnostic at once.
//!
//! [`Stmt`]: crate::ast::Stmt

mod encode;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::ast::{Stmt, StmtKind};
use crate::err::{AsmErr, AsmErrKind};
use crate::parse::parse_program;

/// Assembles a statement list into machine words.
///
/// This fails as a whole only if the first pass fails (a duplicate label);
/// any error after that is recorded per line in the returned [`Assembly`].
///
/// # Example
/// ```
/// use mips_asm::parse::parse_program;
/// use mips_asm::asm::assemble;
///
/// let stmts = parse_program("addiu $t1, $t2, 1024");
/// let asm = assemble(&stmts).unwrap();
///
/// assert!(!asm.has_errors());
/// assert_eq!(asm.words().collect::<Vec<_>>(), [0x25490400]);
/// ```
pub fn assemble(stmts: &[Stmt]) -> Result<Assembly, AsmErr> {
    let sym = SymbolTable::new(stmts)?;
    Ok(encode_program(stmts, &sym))
}

/// Parses a source string and assembles it.
///
/// Convenience for [`parse_program`] followed by [`assemble`].
///
/// # Example
/// ```
/// use mips_asm::asm::assemble_src;
///
/// let asm = assemble_src("jr $t2").unwrap();
/// assert_eq!(asm.hex_dump(), "01400008\n");
/// ```
pub fn assemble_src(src: &str) -> Result<Assembly, AsmErr> {
    assemble(&parse_program(src))
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Symbol {
    index: u32,
    line: usize,
}

/// The symbol table created in the first assembler pass, mapping each
/// label to the instruction index it binds to.
///
/// A label binds to the index of the *next instruction to be assigned*:
/// a label sharing its line with an instruction binds to that instruction,
/// and a label-only line binds to whatever instruction follows, even
/// across a run of label-only lines. Instruction indices count
/// instructions, not source lines; the byte address of an instruction is
/// its index times four.
///
/// The table is write-once: pass 2 only reads it, and it is discarded
/// when the assembly run ends.
///
/// ## Example
/// ```
/// use mips_asm::parse::parse_program;
/// use mips_asm::asm::SymbolTable;
///
/// let stmts = parse_program("
/// start:  addiu $t0, $zero, 1
/// loop:
/// more:   addiu $t0, $t0, 1
///         j loop
/// ");
///
/// let sym = SymbolTable::new(&stmts).unwrap();
/// assert_eq!(sym.lookup("start"), Some(0));
/// assert_eq!(sym.lookup("loop"), Some(1));
/// assert_eq!(sym.lookup("more"), Some(1));
/// assert_eq!(sym.lookup("missing"), None);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Creates a new symbol table from a statement list (the first
    /// assembler pass).
    ///
    /// Fails with a [`AsmErrKind::DuplicateLabel`] error at the second
    /// defining line if any label is defined twice.
    pub fn new(stmts: &[Stmt]) -> Result<Self, AsmErr> {
        let mut map = HashMap::new();
        // The running instruction counter. Advanced by every statement
        // that occupies a slot, including malformed instruction lines, so
        // that pass 2 assigns the same indices.
        let mut index: u32 = 0;

        for stmt in stmts {
            for label in &stmt.labels {
                match map.entry(label.name.clone()) {
                    Entry::Occupied(_) => {
                        return Err(AsmErr::new(AsmErrKind::DuplicateLabel(label.name.clone()), label.line()));
                    }
                    Entry::Vacant(e) => {
                        e.insert(Symbol { index, line: label.line() });
                    }
                }
            }
            if stmt.occupies_slot() {
                index += 1;
            }
        }

        Ok(SymbolTable { map })
    }

    /// Gets the instruction index a label is bound to (if it exists).
    pub fn lookup(&self, label: &str) -> Option<u32> {
        self.map.get(label).map(|sym| sym.index)
    }

    /// Gets the 1-based source line a label was defined on (if it exists).
    pub fn def_line(&self, label: &str) -> Option<usize> {
        self.map.get(label).map(|sym| sym.line)
    }

    /// Gets an iterable of the mapping from labels to instruction indices.
    pub fn label_iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.map.iter().map(|(name, sym)| (name.as_str(), sym.index))
    }
}

/// The outcome of assembling one source line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LineResult {
    /// The line encoded to a machine word.
    Word(u32),
    /// The line held no instruction (blank, comment-only, or label-only).
    Skip,
    /// The line failed to assemble.
    Error(AsmErr),
}

/// The output of an assembly run: one [`LineResult`] per source line,
/// in source order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Assembly {
    results: Vec<LineResult>,
}

impl Assembly {
    /// The per-line results, in source order.
    pub fn line_results(&self) -> &[LineResult] {
        &self.results
    }

    /// Iterates over the encoded words, in source order.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.results.iter().filter_map(|r| match r {
            LineResult::Word(word) => Some(*word),
            _ => None,
        })
    }

    /// Iterates over the diagnostics collected during the run.
    pub fn errors(&self) -> impl Iterator<Item = &AsmErr> + '_ {
        self.results.iter().filter_map(|r| match r {
            LineResult::Error(e) => Some(e),
            _ => None,
        })
    }

    /// Whether any line failed to assemble.
    ///
    /// A driver should exit non-zero if this is true, even though words
    /// were produced for the lines that did assemble.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Renders the encoded words as 8 lowercase hex digits each, one per
    /// line, in source order.
    pub fn hex_dump(&self) -> String {
        self.words().map(|word| format!("{word:08x}\n")).collect()
    }
}

/// The second assembler pass: encodes every statement against the table.
fn encode_program(stmts: &[Stmt], sym: &SymbolTable) -> Assembly {
    let mut results = Vec::with_capacity(stmts.len());
    let mut index: u32 = 0;

    for stmt in stmts {
        let result = match &stmt.kind {
            StmtKind::Empty => LineResult::Skip,
            StmtKind::Instr(instr) => match encode::encode(instr, index, sym, stmt.line) {
                Ok(word) => LineResult::Word(word),
                Err(e) => LineResult::Error(e),
            },
            StmtKind::Malformed(e) => LineResult::Error(e.clone()),
        };
        if stmt.occupies_slot() {
            index += 1;
        }
        results.push(result);
    }

    Assembly { results }
}
