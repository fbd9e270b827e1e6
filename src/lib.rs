//! A MIPS parser and assembler.
//!
//! This crate translates a subset of MIPS assembly into 32-bit machine
//! words using the classic two-pass scheme: a first pass builds the symbol
//! table so forward-referenced labels resolve, and a second pass encodes
//! each instruction against it.
//!
//! # Usage
//!
//! To convert source code to machine words, it must be parsed and assembled:
//! ```
//! use mips_asm::parse::parse_program;
//! use mips_asm::asm::assemble;
//!
//! let code = "
//! start:  addiu $t0, $zero, 1
//! loop:   addiu $t0, $t0, 1       # increment
//!         bne $t0, $s0, loop
//!         jr $ra
//! ";
//! let stmts = parse_program(code);
//!
//! let asm = assemble(&stmts).unwrap();
//! assert!(!asm.has_errors());
//!
//! let words: Vec<u32> = asm.words().collect();
//! assert_eq!(words, [0x24080001, 0x25080001, 0x1608FFFE, 0x03E00008]);
//! ```
//!
//! Or, in one step with [`asm::assemble_src`], rendered in the hex text
//! format drivers typically write to disk:
//! ```
//! use mips_asm::asm::assemble_src;
//!
//! let asm = assemble_src("addiu $t1, $t2, 1024").unwrap();
//! assert_eq!(asm.hex_dump(), "25490400\n");
//! ```
//!
//! Assembly does not stop at the first bad line: the second pass records a
//! diagnostic per failing line and keeps going, so every error of a run
//! can be reported at once (see [`asm::Assembly`]). Only a first-pass
//! failure — a duplicate label — aborts a run outright.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod isa;
pub mod asm;
pub mod err;
