//! The supported instruction set: mnemonic descriptors and register names.
//!
//! Both tables are constructed once and never mutated:
//! - [`lookup`] resolves a mnemonic to its [`InstrDesc`] (format, opcode,
//!   function code, and operand shape),
//! - [`reg_number`]/[`reg_name`] translate between the 32 canonical
//!   register names and their 5-bit numbers.

use std::collections::HashMap;

use bimap::BiMap;
use once_cell::sync::Lazy;

/// The three MIPS instruction formats.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Format {
    /// `opcode(6) rs(5) rt(5) rd(5) shamt(5) funct(6)`
    Register,
    /// `opcode(6) rs(5) rt(5) immediate(16)`
    Immediate,
    /// `opcode(6) address(26)`
    Jump,
}

/// An operand role in a mnemonic's shape.
///
/// A shape is an ordered slice of roles; the parser consumes one
/// comma-separated operand per role. [`Role::BaseOffset`] is the one
/// fused role: a single `offset($base)` token group that fills both the
/// immediate field and the `rs` field.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Role {
    #[allow(missing_docs)]
    Rd,
    #[allow(missing_docs)]
    Rs,
    #[allow(missing_docs)]
    Rt,
    /// 5-bit shift amount.
    Shamt,
    /// 16-bit immediate; a label here resolves to a branch offset.
    Imm,
    /// `offset($base)`: a 16-bit offset fused with a base register.
    BaseOffset,
    /// 26-bit jump target; a label here resolves to an instruction index.
    Address,
}
impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Rd => f.write_str("rd"),
            Role::Rs => f.write_str("rs"),
            Role::Rt => f.write_str("rt"),
            Role::Shamt => f.write_str("shift amount"),
            Role::Imm => f.write_str("immediate"),
            Role::BaseOffset => f.write_str("offset(base)"),
            Role::Address => f.write_str("jump target"),
        }
    }
}

/// Encoding metadata for one mnemonic.
#[derive(Debug, PartialEq, Eq)]
pub struct InstrDesc {
    /// The instruction's textual name.
    pub mnemonic: &'static str,
    /// The instruction's format.
    pub format: Format,
    /// 6-bit primary opcode.
    pub opcode: u8,
    /// 6-bit function code. Only meaningful for [`Format::Register`].
    pub funct: u8,
    /// The ordered operand shape.
    pub shape: &'static [Role],
    /// Whether the immediate field is zero-extended (logical immediates)
    /// rather than sign-extended.
    pub zero_ext: bool,
}

const fn r(mnemonic: &'static str, funct: u8, shape: &'static [Role]) -> InstrDesc {
    InstrDesc { mnemonic, format: Format::Register, opcode: 0x00, funct, shape, zero_ext: false }
}
const fn i(mnemonic: &'static str, opcode: u8, shape: &'static [Role]) -> InstrDesc {
    InstrDesc { mnemonic, format: Format::Immediate, opcode, funct: 0x00, shape, zero_ext: false }
}
const fn iu(mnemonic: &'static str, opcode: u8, shape: &'static [Role]) -> InstrDesc {
    InstrDesc { mnemonic, format: Format::Immediate, opcode, funct: 0x00, shape, zero_ext: true }
}
const fn j(mnemonic: &'static str, opcode: u8) -> InstrDesc {
    InstrDesc { mnemonic, format: Format::Jump, opcode, funct: 0x00, shape: &[Role::Address], zero_ext: false }
}

/// Every supported instruction.
///
/// `addi` assembles identically to `addiu`; the assembler does not model
/// the overflow trap that separates them at execution time.
static INSTRUCTIONS: &[InstrDesc] = {
    use Role::*;
    &[
        r("sll",   0x00, &[Rd, Rt, Shamt]),
        r("srl",   0x02, &[Rd, Rt, Shamt]),
        r("sra",   0x03, &[Rd, Rt, Shamt]),
        r("sllv",  0x04, &[Rd, Rt, Rs]),
        r("srlv",  0x06, &[Rd, Rt, Rs]),
        r("srav",  0x07, &[Rd, Rt, Rs]),
        r("jr",    0x08, &[Rs]),
        r("mfhi",  0x10, &[Rd]),
        r("mflo",  0x12, &[Rd]),
        r("mult",  0x18, &[Rs, Rt]),
        r("multu", 0x19, &[Rs, Rt]),
        r("div",   0x1A, &[Rs, Rt]),
        r("divu",  0x1B, &[Rs, Rt]),
        r("add",   0x20, &[Rd, Rs, Rt]),
        r("addu",  0x21, &[Rd, Rs, Rt]),
        r("sub",   0x22, &[Rd, Rs, Rt]),
        r("subu",  0x23, &[Rd, Rs, Rt]),
        r("and",   0x24, &[Rd, Rs, Rt]),
        r("or",    0x25, &[Rd, Rs, Rt]),
        r("xor",   0x26, &[Rd, Rs, Rt]),
        r("nor",   0x27, &[Rd, Rs, Rt]),
        r("slt",   0x2A, &[Rd, Rs, Rt]),
        r("sltu",  0x2B, &[Rd, Rs, Rt]),
        // coprocessor move: R format with a primary opcode and no funct
        InstrDesc { mnemonic: "mfc0", format: Format::Register, opcode: 0x16, funct: 0x00, shape: &[Rd, Rs], zero_ext: false },
        i("beq",   0x04, &[Rt, Rs, Imm]),
        i("bne",   0x05, &[Rt, Rs, Imm]),
        i("addi",  0x09, &[Rt, Rs, Imm]),
        i("addiu", 0x09, &[Rt, Rs, Imm]),
        i("slti",  0x0A, &[Rt, Rs, Imm]),
        i("sltiu", 0x0B, &[Rt, Rs, Imm]),
        iu("andi", 0x0C, &[Rt, Rs, Imm]),
        iu("ori",  0x0D, &[Rt, Rs, Imm]),
        iu("lui",  0x0F, &[Rt, Imm]),
        i("lw",    0x23, &[Rt, BaseOffset]),
        i("lbu",   0x24, &[Rt, BaseOffset]),
        i("lhu",   0x25, &[Rt, BaseOffset]),
        i("sb",    0x28, &[Rt, BaseOffset]),
        i("sh",    0x29, &[Rt, BaseOffset]),
        i("sw",    0x2B, &[Rt, BaseOffset]),
        j("j",     0x02),
        j("jal",   0x03),
    ]
};

static MNEMONICS: Lazy<HashMap<&'static str, &'static InstrDesc>> = Lazy::new(|| {
    INSTRUCTIONS.iter().map(|desc| (desc.mnemonic, desc)).collect()
});

/// Looks up the descriptor for a mnemonic.
///
/// Lookup is exact-match and case-sensitive; `None` means the token is not
/// an instruction (the caller decides whether that is an error).
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    MNEMONICS.get(mnemonic).copied()
}

/// Iterates over every descriptor in the instruction table.
pub fn instructions() -> impl Iterator<Item = &'static InstrDesc> {
    INSTRUCTIONS.iter()
}

/// The canonical register names, indexed by register number.
static REG_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3",
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
    "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
];

static REGISTERS: Lazy<BiMap<&'static str, u8>> = Lazy::new(|| {
    REG_NAMES.iter().enumerate().map(|(no, &name)| (name, no as u8)).collect()
});

/// Resolves a canonical register name (without the `$` sigil) to its number.
pub fn reg_number(name: &str) -> Option<u8> {
    REGISTERS.get_by_left(name).copied()
}

/// Gets the canonical name of a register number.
pub fn reg_name(number: u8) -> Option<&'static str> {
    REGISTERS.get_by_right(&number).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let add = lookup("add").unwrap();
        assert_eq!(add.format, Format::Register);
        assert_eq!(add.funct, 0x20);
        assert_eq!(add.shape, [Role::Rd, Role::Rs, Role::Rt]);

        let lw = lookup("lw").unwrap();
        assert_eq!(lw.format, Format::Immediate);
        assert_eq!(lw.opcode, 0x23);
        assert_eq!(lw.shape, [Role::Rt, Role::BaseOffset]);

        let jal = lookup("jal").unwrap();
        assert_eq!(jal.format, Format::Jump);
        assert_eq!(jal.opcode, 0x03);

        assert_eq!(lookup("nop"), None);
    }

    #[test]
    fn test_lookup_case_sensitive() {
        assert!(lookup("add").is_some());
        assert_eq!(lookup("ADD"), None);
        assert_eq!(lookup("Add"), None);
    }

    #[test]
    fn test_shapes_match_formats() {
        for desc in INSTRUCTIONS {
            for role in desc.shape {
                let allowed: &[Role] = match desc.format {
                    Format::Register => &[Role::Rd, Role::Rs, Role::Rt, Role::Shamt],
                    Format::Immediate => &[Role::Rd, Role::Rs, Role::Rt, Role::Imm, Role::BaseOffset],
                    Format::Jump => &[Role::Address],
                };
                assert!(allowed.contains(role), "{}: role {role:?} not valid for {:?}", desc.mnemonic, desc.format);
            }
        }
    }

    #[test]
    fn test_register_table() {
        assert_eq!(reg_number("zero"), Some(0));
        assert_eq!(reg_number("t1"), Some(9));
        assert_eq!(reg_number("t2"), Some(10));
        assert_eq!(reg_number("sp"), Some(29));
        assert_eq!(reg_number("ra"), Some(31));
        assert_eq!(reg_number("r1"), None);
        assert_eq!(reg_number("ZERO"), None);

        for no in 0..32u8 {
            let name = reg_name(no).unwrap();
            assert_eq!(reg_number(name), Some(no));
        }
        assert_eq!(reg_name(32), None);
    }
}
