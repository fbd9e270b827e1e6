//! Components representing the pieces of a parsed assembly statement.
//!
//! These components together are used to construct...
//! - [`Stmt`] (one source line: its labels and its instruction, if any),
//! - [`Instr`] (a mnemonic descriptor plus its decoded operands),
//! - and [`Offset`] (a bit-width-checked field value used by the encoder).

use std::fmt::Write as _;
use std::num::TryFromIntError;
use offset_base::OffsetBacking;

use crate::err::AsmErr;
use crate::isa;

/// A register reference. Must be between 0 and 31.
///
/// A `Reg` comes out of the lexer, which resolves both spellings of a
/// register token (`$t1` and `$9` refer to the same register).
/// It can also be constructed from a raw number with [`Reg::try_from`].
///
/// ## Examples
///
/// ```text
/// addiu $t1, $t2, 1024
///       ~~~  ~~~
/// lw $t0, 4($sp)
///    ~~~    ~~~
/// jr $ra
///    ~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Reg(pub(crate) u8);

impl Reg {
    /// Gets the register number of this [`Reg`]. This is always between 0 and 31.
    pub fn reg_no(self) -> u8 {
        self.0
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('$')?;
        match isa::reg_name(self.0) {
            Some(name) => f.write_str(name),
            None => self.0.fmt(f),
        }
    }
}
impl From<Reg> for u8 {
    fn from(value: Reg) -> Self {
        value.0
    }
}
impl TryFrom<u8> for Reg {
    type Error = TryFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=31 => Ok(Reg(value)),
            // HACKy, but there's no other way to create this error
            _ => u8::try_from(256).map(|_| unreachable!("should've been TryFromIntError")),
        }
    }
}

/// A value representing an offset or an immediate value.
///
/// The `OFF` type represents the backing type of this offset.
/// The signedness of this offset type is dependent on the signedness of the `OFF` type:
/// - `Offset<i32, _>`: signed field (sign-extended immediates, branch offsets)
/// - `Offset<u32, _>`: unsigned field (shift amounts, jump targets, logical immediates)
///
/// `N` indicates the maximum bit size of this offset/immediate value.
///
/// ## Examples
///
/// - `Offset<i32, 16>` is the immediate field of `addi` and the resolved
///     offset of `beq`/`bne`.
/// - `Offset<u32, 5>` is the shift amount of `sll`/`srl`/`sra`.
/// - `Offset<u32, 26>` is the target field of `j`/`jal`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Offset<OFF, const N: u32>(OFF);

impl<OFF: std::fmt::Display, const N: u32> std::fmt::Display for Offset<OFF, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
impl<OFF: std::fmt::LowerHex, const N: u32> std::fmt::LowerHex for Offset<OFF, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("0x")?;
        self.0.fmt(f)
    }
}

/// The errors that can result from calling [`Offset::new`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OffsetNewErr {
    /// The provided value cannot fit an unsigned integer of the given bitsize.
    CannotFitUnsigned(u32),
    /// The provided value cannot fit a signed integer of the given bitsize.
    CannotFitSigned(u32),
}

impl std::fmt::Display for OffsetNewErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetNewErr::CannotFitUnsigned(n) => write!(f, "value does not fit in an unsigned {n}-bit field"),
            OffsetNewErr::CannotFitSigned(n) => write!(f, "value does not fit in a signed {n}-bit field"),
        }
    }
}
impl std::error::Error for OffsetNewErr {}
impl crate::err::Error for OffsetNewErr {
    fn line(&self) -> Option<usize> {
        None
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        use std::borrow::Cow;

        let error = match self {
            OffsetNewErr::CannotFitUnsigned(n) => Cow::from(format!("the range for an unsigned {n}-bit field is [0, {}]", (1u64 << n) - 1)),
            OffsetNewErr::CannotFitSigned(n) => Cow::from(format!("the range for a signed {n}-bit field is [{}, {}]", -(1i64 << (n - 1)), (1i64 << (n - 1)) - 1)),
        };

        Some(error)
    }
}

mod offset_base {
    use super::OffsetNewErr;

    /// Any type that could store a value for [`Offset`].
    ///
    /// [`Offset`]: super::Offset
    pub trait OffsetBacking: Copy + Eq {
        /// How many bits are contained within this backing.
        ///
        /// For example, `u32` has 32 bits and thus BITS == 32.
        const BITS: u32;

        /// Truncates the given value to the provided `bit_size`.
        ///
        /// This bit size is always known to be less than BITS.
        fn truncate(self, bit_size: u32) -> Self;

        /// The error to raise if a given value doesn't match
        /// its provided value when truncated to a given `bit_size`.
        fn does_not_fit_error(bit_size: u32) -> OffsetNewErr;
    }

    macro_rules! impl_offset_backing_for_ints {
        ($($Int:ty: $Err:ident),*) => {
            $(
                impl OffsetBacking for $Int {
                    const BITS: u32 = Self::BITS;

                    fn truncate(self, bit_size: u32) -> Self {
                        (self << (Self::BITS - bit_size)) >> (Self::BITS - bit_size)
                    }

                    fn does_not_fit_error(bit_size: u32) -> OffsetNewErr {
                        OffsetNewErr::$Err(bit_size)
                    }
                }
            )*
        }
    }
    impl_offset_backing_for_ints! {
        u32: CannotFitUnsigned,
        i32: CannotFitSigned
    }
}

impl<OFF: OffsetBacking, const N: u32> Offset<OFF, N> {
    /// Creates a new offset value.
    /// This must fit within `N` bits of the representation, otherwise an error is raised.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mips_asm::ast::Offset;
    /// #
    /// // Signed:
    /// let neg = Offset::<i32, 16>::new(-32768);
    /// let pos = Offset::<i32, 16>::new(32767);
    /// let too_big = Offset::<i32, 16>::new(32768);
    /// assert!(neg.is_ok());
    /// assert!(pos.is_ok());
    /// assert!(too_big.is_err());
    ///
    /// // Unsigned:
    /// let pos = Offset::<u32, 5>::new(31);
    /// let too_big = Offset::<u32, 5>::new(32);
    /// assert!(pos.is_ok());
    /// assert!(too_big.is_err());
    /// ```
    ///
    /// # Panics
    ///
    /// This will panic if `N` is larger than the offset backing (e.g., for backing `u32`, larger than 32).
    pub fn new(n: OFF) -> Result<Self, OffsetNewErr> {
        assert!(N <= OFF::BITS, "bit size {N} exceeds size of backing ({})", OFF::BITS);
        match n == n.truncate(N) {
            true => Ok(Offset(n)),
            false => Err(OFF::does_not_fit_error(N)),
        }
    }

    /// Creates a new offset by keeping the first N bits of the integer
    /// and discarding the rest.
    ///
    /// The extension back to the backing width is sign-extended if the
    /// backing is signed, and zero-extended if the backing is unsigned.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mips_asm::ast::Offset;
    /// #
    /// let wrapped = Offset::<i32, 16>::new_trunc(65535);
    /// assert_eq!(wrapped.get(), -1);
    /// ```
    pub fn new_trunc(n: OFF) -> Self {
        assert!(N <= OFF::BITS, "bit size {N} exceeds size of backing ({})", OFF::BITS);
        Self(n.truncate(N))
    }

    /// Gets the value of the offset.
    pub fn get(&self) -> OFF {
        self.0
    }
}

/// A label.
///
/// This struct stores the name of the label (accessible by the `name` field)
/// and the 1-based source line the label appears on.
///
/// # Examples
/// ```text
/// loop: addiu $t0, $t0, 1
/// ~~~~
///       bne $t0, $t1, loop
///                     ~~~~
/// done:
/// ~~~~
///       jr $ra
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Label {
    /// The label's identifier.
    pub name: String,

    /// The 1-based source line the label appears on.
    line: usize,
}
impl Label {
    /// Creates a new label.
    pub fn new(name: String, line: usize) -> Self {
        Label { name, line }
    }
    /// Returns the 1-based source line the label appears on.
    pub fn line(&self) -> usize {
        self.line
    }
}
impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

/// An immediate literal or a label standing in for one.
///
/// This is used for the `immediate` and `address` operand roles, both of
/// which accept a label in source. During the second assembler pass, the
/// label is resolved through the symbol table: to a relative offset in the
/// `immediate` role (branches) and to an absolute instruction index in the
/// `address` role (jumps).
///
/// ## Examples
/// ```text
/// addi $t0, $t0, -4
///                ~~
/// beq $t0, $zero, done
///                 ~~~~
/// j loop
///   ~~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ImmOrLabel {
    #[allow(missing_docs)]
    Imm(i64),
    #[allow(missing_docs)]
    Label(Label),
}
impl std::fmt::Display for ImmOrLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImmOrLabel::Imm(imm) => imm.fmt(f),
            ImmOrLabel::Label(label) => label.fmt(f),
        }
    }
}

/// The decoded operands of one instruction, keyed by role.
///
/// The parser fills exactly the slots named by the mnemonic's shape
/// (a `base-offset` operand fills both `imm` and `rs`); the encoder
/// packs any slot left as `None` as a zero field.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Operands {
    /// Destination register.
    pub rd: Option<Reg>,
    /// First source register (also the base register of a `base-offset` operand).
    pub rs: Option<Reg>,
    /// Second source / target register.
    pub rt: Option<Reg>,
    /// Shift amount. Range-checked against 5 bits at encode time.
    pub shamt: Option<i64>,
    /// Immediate field value. Range-checked against 16 bits at encode time.
    pub imm: Option<ImmOrLabel>,
    /// Jump target. Range-checked against 26 bits at encode time.
    pub target: Option<ImmOrLabel>,
}

/// One parsed instruction: its table descriptor and its decoded operands.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Instr {
    /// The instruction table entry for the mnemonic.
    pub desc: &'static isa::InstrDesc,
    /// The decoded operands.
    pub operands: Operands,
}
impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.desc.mnemonic)
    }
}

/// What a source line holds once its labels have been stripped.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StmtKind {
    /// Nothing: the line was blank, comment-only, or label-only.
    Empty,
    /// A parsed instruction.
    Instr(Instr),
    /// The line should hold an instruction, but it did not parse.
    ///
    /// The error is kept with the statement so the second pass can report
    /// it while the surrounding lines continue to assemble.
    Malformed(AsmErr),
}

/// One source line: its label prefixes and its body.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stmt {
    /// The 1-based source line number.
    pub line: usize,
    /// The labels defined at the start of this line (possibly none).
    pub labels: Vec<Label>,
    /// The body of the line.
    pub kind: StmtKind,
}
impl Stmt {
    /// Whether this statement occupies an instruction index.
    ///
    /// Label-only and blank lines do not; instruction lines do, even when
    /// the instruction failed to parse. Both assembler passes rely on this
    /// predicate so that label indices and encoding indices stay in step.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self.kind, StmtKind::Empty)
    }
}
