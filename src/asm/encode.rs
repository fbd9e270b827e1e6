//! Bit-level encoding of instructions into 32-bit words.
//!
//! Each of the three formats is the concatenation of fixed-width fields,
//! most-significant field first. Operand roles the mnemonic's shape does
//! not name are packed as zero. Every field value is range-checked before
//! it is truncated to its field width; overflow is an error, never a
//! silent wrap.

use crate::ast::{ImmOrLabel, Instr, Label, Offset, OffsetNewErr, Reg};
use crate::err::{AsmErr, AsmErrKind};
use crate::isa::Format;

use super::SymbolTable;

/// Encodes one instruction at instruction index `index`.
///
/// `line` is the 1-based source line, used to tag any diagnostic.
pub(super) fn encode(instr: &Instr, index: u32, sym: &SymbolTable, line: usize) -> Result<u32, AsmErr> {
    let desc = instr.desc;
    let ops = &instr.operands;

    match desc.format {
        Format::Register => {
            let shamt = match ops.shamt {
                Some(v) => unsigned_field::<5>(v, line)? as u8,
                None => 0,
            };
            Ok(pack_register(desc.opcode, field(ops.rs), field(ops.rt), field(ops.rd), shamt, desc.funct))
        }
        Format::Immediate => {
            let imm = match &ops.imm {
                Some(op) => immediate_bits(op, desc.zero_ext, index, sym, line)?,
                None => 0,
            };
            Ok(pack_immediate(desc.opcode, field(ops.rs), field(ops.rt), imm))
        }
        Format::Jump => {
            let address = match &ops.target {
                Some(ImmOrLabel::Imm(v)) => unsigned_field::<26>(*v, line)?,
                Some(ImmOrLabel::Label(l)) => unsigned_field::<26>(i64::from(resolve(sym, l, line)?), line)?,
                None => 0,
            };
            Ok(pack_jump(desc.opcode, address))
        }
    }
}

/// The register number for a field, zero when the role is absent.
fn field(reg: Option<Reg>) -> u8 {
    reg.map(Reg::reg_no).unwrap_or(0)
}

/// The 16-bit immediate field: a checked literal, or a label resolved to a
/// branch offset relative to the instruction *following* the branch.
fn immediate_bits(op: &ImmOrLabel, zero_ext: bool, index: u32, sym: &SymbolTable, line: usize) -> Result<u16, AsmErr> {
    match op {
        ImmOrLabel::Imm(v) => match zero_ext {
            true => Ok(unsigned_field::<16>(*v, line)? as u16),
            false => Ok(signed_field::<16>(*v, line)? as u16),
        },
        ImmOrLabel::Label(l) => {
            let target = resolve(sym, l, line)?;
            let offset = i64::from(target) - (i64::from(index) + 1);
            Ok(signed_field::<16>(offset, line)? as u16)
        }
    }
}

/// The absolute instruction index a label is bound to.
fn resolve(sym: &SymbolTable, label: &Label, line: usize) -> Result<u32, AsmErr> {
    sym.lookup(&label.name)
        .ok_or_else(|| AsmErr::new(AsmErrKind::UnresolvedLabel(label.name.clone()), line))
}

/// Range-checks `v` against an unsigned `N`-bit field.
fn unsigned_field<const N: u32>(v: i64, line: usize) -> Result<u32, AsmErr> {
    u32::try_from(v).ok()
        .and_then(|u| Offset::<u32, N>::new(u).ok())
        .map(|off| off.get())
        .ok_or_else(|| AsmErr::new(AsmErrKind::OutOfRange(OffsetNewErr::CannotFitUnsigned(N)), line))
}

/// Range-checks `v` against a signed `N`-bit field, keeping its
/// two's-complement bit pattern.
fn signed_field<const N: u32>(v: i64, line: usize) -> Result<i32, AsmErr> {
    i32::try_from(v).ok()
        .and_then(|s| Offset::<i32, N>::new(s).ok())
        .map(|off| off.get())
        .ok_or_else(|| AsmErr::new(AsmErrKind::OutOfRange(OffsetNewErr::CannotFitSigned(N)), line))
}

fn pack_register(opcode: u8, rs: u8, rt: u8, rd: u8, shamt: u8, funct: u8) -> u32 {
    u32::from(opcode) << 26
        | u32::from(rs) << 21
        | u32::from(rt) << 16
        | u32::from(rd) << 11
        | u32::from(shamt) << 6
        | u32::from(funct)
}

fn pack_immediate(opcode: u8, rs: u8, rt: u8, imm: u16) -> u32 {
    u32::from(opcode) << 26
        | u32::from(rs) << 21
        | u32::from(rt) << 16
        | u32::from(imm)
}

fn pack_jump(opcode: u8, address: u32) -> u32 {
    u32::from(opcode) << 26 | address
}

#[cfg(test)]
mod tests {
    use crate::ast::{ImmOrLabel, Instr, Operands, Reg};
    use crate::asm::SymbolTable;
    use crate::err::{AsmErrKind, ErrClass, OffsetNewErr};
    use crate::isa::{self, Format, Role};

    use super::encode;

    // Distinct per-role sample values, so a field packed from the wrong
    // role is caught.
    const RD: u8 = 11;
    const RS: u8 = 12;
    const RT: u8 = 13;
    const SHAMT: i64 = 7;
    const IMM: i64 = 1234;
    const TARGET: i64 = 987;

    fn sample_operands(shape: &[Role]) -> Operands {
        let mut ops = Operands::default();
        for role in shape {
            match role {
                Role::Rd => ops.rd = Some(Reg(RD)),
                Role::Rs => ops.rs = Some(Reg(RS)),
                Role::Rt => ops.rt = Some(Reg(RT)),
                Role::Shamt => ops.shamt = Some(SHAMT),
                Role::Imm => ops.imm = Some(ImmOrLabel::Imm(IMM)),
                Role::BaseOffset => {
                    ops.imm = Some(ImmOrLabel::Imm(IMM));
                    ops.rs = Some(Reg(RS));
                }
                Role::Address => ops.target = Some(ImmOrLabel::Imm(TARGET)),
            }
        }
        ops
    }

    /// Every mnemonic: encode a valid instance, then pull the fixed-width
    /// fields back out and check they recover the operand values exactly.
    #[test]
    fn test_field_round_trip() {
        let sym = SymbolTable::new(&[]).unwrap();

        for desc in isa::instructions() {
            let instr = Instr { desc, operands: sample_operands(desc.shape) };
            let word = encode(&instr, 0, &sym, 1).unwrap_or_else(|e| {
                panic!("{}: failed to encode: {e}", desc.mnemonic)
            });

            let has = |role: Role| desc.shape.contains(&role);
            assert_eq!(word >> 26, u32::from(desc.opcode), "{}: opcode", desc.mnemonic);
            match desc.format {
                Format::Register => {
                    assert_eq!(word >> 21 & 0x1F, if has(Role::Rs) { u32::from(RS) } else { 0 }, "{}: rs", desc.mnemonic);
                    assert_eq!(word >> 16 & 0x1F, if has(Role::Rt) { u32::from(RT) } else { 0 }, "{}: rt", desc.mnemonic);
                    assert_eq!(word >> 11 & 0x1F, if has(Role::Rd) { u32::from(RD) } else { 0 }, "{}: rd", desc.mnemonic);
                    assert_eq!(word >> 6 & 0x1F, if has(Role::Shamt) { SHAMT as u32 } else { 0 }, "{}: shamt", desc.mnemonic);
                    assert_eq!(word & 0x3F, u32::from(desc.funct), "{}: funct", desc.mnemonic);
                }
                Format::Immediate => {
                    let rs = if has(Role::Rs) || has(Role::BaseOffset) { u32::from(RS) } else { 0 };
                    assert_eq!(word >> 21 & 0x1F, rs, "{}: rs", desc.mnemonic);
                    assert_eq!(word >> 16 & 0x1F, if has(Role::Rt) { u32::from(RT) } else { 0 }, "{}: rt", desc.mnemonic);
                    assert_eq!(word & 0xFFFF, IMM as u32, "{}: immediate", desc.mnemonic);
                }
                Format::Jump => {
                    assert_eq!(word & 0x03FF_FFFF, TARGET as u32, "{}: address", desc.mnemonic);
                }
            }
        }
    }

    #[test]
    fn test_negative_immediate_bit_pattern() {
        let sym = SymbolTable::new(&[]).unwrap();
        let desc = isa::lookup("addi").unwrap();
        let instr = Instr {
            desc,
            operands: Operands {
                rt: Some(Reg(8)),
                rs: Some(Reg(8)),
                imm: Some(ImmOrLabel::Imm(-4)),
                ..Default::default()
            },
        };
        let word = encode(&instr, 0, &sym, 1).unwrap();
        assert_eq!(word & 0xFFFF, 0xFFFC);
    }

    #[test]
    fn test_shamt_out_of_range() {
        let sym = SymbolTable::new(&[]).unwrap();
        let desc = isa::lookup("sll").unwrap();
        for (shamt, expect_ok) in [(0, true), (31, true), (32, false), (-1, false)] {
            let instr = Instr {
                desc,
                operands: Operands {
                    rd: Some(Reg(8)),
                    rt: Some(Reg(9)),
                    shamt: Some(shamt),
                    ..Default::default()
                },
            };
            let result = encode(&instr, 0, &sym, 1);
            match expect_ok {
                true => assert!(result.is_ok(), "shamt {shamt}"),
                false => {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind, AsmErrKind::OutOfRange(OffsetNewErr::CannotFitUnsigned(5)), "shamt {shamt}");
                    assert_eq!(err.kind.class(), ErrClass::Range);
                }
            }
        }
    }
}
