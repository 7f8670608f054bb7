/*!
 * Descriptor types for the instruction set and the process-wide catalog that owns the
 * two opcode tables. The tables themselves live in `opcode_table`.
 */

use std::borrow::Cow;

use log::{debug, error};
use once_cell::sync::Lazy;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::cpu::opcode_table;
use crate::cpu::register::{Flag, Reg, WReg};
use crate::error::{Error, Result};

/// Opcode byte that escapes into the prefixed table.
pub const PREFIX_OPCODE: u8 = 0xcb;

/// Which opcode space a byte is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Table {
    Primary,
    Prefixed,
}

impl Table {
    /// Bytes that precede the opcode for instructions of this table.
    pub fn prefix_bytes(self) -> u8 {
        match self {
            Table::Primary => 0,
            Table::Prefixed => 1,
        }
    }
}

/// The semantic family of an instruction. Every opcode of a family shares one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InstructionClass {
    /* Core operations */
    Adc,
    Add,
    And,
    Call,
    Ccf,
    Cp,
    Cpl,
    Daa,
    Dec,
    Di,
    Ei,
    Halt,
    Inc,
    Jp,
    Jr,
    Ld,
    Ldd,
    Ldh,
    Ldhl,
    Ldi,
    Nop,
    Or,
    Pop,
    Prefix,
    Push,
    Ret,
    Reti,
    Rst,
    Sbc,
    Scf,
    Stop,
    Sub,
    Xor,
    /* Prefixed operations, plus the accumulator-only rotates */
    Bit,
    Res,
    Rl,
    Rla,
    Rlc,
    Rlca,
    Rr,
    Rra,
    Rrc,
    Rrca,
    Set,
    Sla,
    Sra,
    Srl,
    Swap,
    /// Opcodes the chip does not implement.
    Invalid,
}

/// Branch condition tested against the flag register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Condition {
    #[strum(serialize = "NZ")]
    NotZero,
    #[strum(serialize = "Z")]
    Zero,
    #[strum(serialize = "NC")]
    NotCarry,
    #[strum(serialize = "C")]
    Carry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OperandType {
    None,
    Imm8,
    Imm16,
    Disp8,
    Reg8,
    Reg16,
    Bit,
    Vector,
    Condition,
}

/// The identity of an operand: which register, which bit, which vector, or which kind of
/// trailing immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Reg8(Reg),
    Reg16(WReg),
    Imm8,
    Imm16,
    Disp8,
    Bit(u8),
    Vector(u16),
    Condition(Condition),
}

impl Operand {
    pub const fn operand_type(&self) -> OperandType {
        match self {
            Operand::None => OperandType::None,
            Operand::Reg8(_) => OperandType::Reg8,
            Operand::Reg16(_) => OperandType::Reg16,
            Operand::Imm8 => OperandType::Imm8,
            Operand::Imm16 => OperandType::Imm16,
            Operand::Disp8 => OperandType::Disp8,
            Operand::Bit(_) => OperandType::Bit,
            Operand::Vector(_) => OperandType::Vector,
            Operand::Condition(_) => OperandType::Condition,
        }
    }

    /// Number of bytes following the opcode that encode this operand.
    pub const fn trailing_bytes(&self) -> u8 {
        match self {
            Operand::Imm8 | Operand::Disp8 => 1,
            Operand::Imm16 => 2,
            _ => 0,
        }
    }
}

/// How an operand is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Access {
    /// The register or immediate value itself.
    Direct,
    /// A byte read from the address the operand names.
    MemRead8,
    /// A byte written (or read, modified and written back) at the address the operand names.
    MemWrite8,
    MemRead16,
    MemWrite16,
    /// The operand is the sub-opcode of a prefixed instruction.
    Prefix,
}

/// An operand slot of a descriptor: (type, identity, access modifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSpec {
    pub operand: Operand,
    pub access: Access,
}

impl OperandSpec {
    pub const fn new(operand: Operand, access: Access) -> Self {
        Self { operand, access }
    }

    pub const fn kind(&self) -> OperandType {
        self.operand.operand_type()
    }

    pub const fn is_memory(&self) -> bool {
        matches!(
            self.access,
            Access::MemRead8 | Access::MemWrite8 | Access::MemRead16 | Access::MemWrite16
        )
    }

    /// Whether the value this operand yields or accepts is 16 bits wide.
    pub const fn is_wide(&self) -> bool {
        match self.access {
            Access::MemRead16 | Access::MemWrite16 => true,
            Access::MemRead8 | Access::MemWrite8 | Access::Prefix => false,
            Access::Direct => matches!(self.operand, Operand::Reg16(_) | Operand::Imm16),
        }
    }

    pub const fn trailing_bytes(&self) -> u8 {
        self.operand.trailing_bytes()
    }
}

/// What an instruction does to one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FlagModifier {
    Reset,
    Set,
    Computed,
    Unchanged,
}

impl FlagModifier {
    /// Reads one column of the usual `Z N H C` notation: `0`, `1`, `-` or the flag letter.
    const fn from_symbol(symbol: u8) -> Self {
        match symbol {
            b'0' => FlagModifier::Reset,
            b'1' => FlagModifier::Set,
            b'-' => FlagModifier::Unchanged,
            b'Z' | b'N' | b'H' | b'C' => FlagModifier::Computed,
            _ => panic!("flag notation symbols are 0, 1, - or Z/N/H/C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagPolicy {
    pub zero: FlagModifier,
    pub subtract: FlagModifier,
    pub half_carry: FlagModifier,
    pub carry: FlagModifier,
}

impl FlagPolicy {
    /// Parses a four character `Z N H C` column string, e.g. `"Z0HC"` or `"----"`.
    pub const fn from_notation(notation: &str) -> Self {
        let symbols = notation.as_bytes();
        assert!(symbols.len() == 4, "flag notation has four columns");
        Self {
            zero: FlagModifier::from_symbol(symbols[0]),
            subtract: FlagModifier::from_symbol(symbols[1]),
            half_carry: FlagModifier::from_symbol(symbols[2]),
            carry: FlagModifier::from_symbol(symbols[3]),
        }
    }

    pub fn modifier(&self, flag: Flag) -> FlagModifier {
        match flag {
            Flag::Zero => self.zero,
            Flag::Subtract => self.subtract,
            Flag::HalfCarry => self.half_carry,
            Flag::Carry => self.carry,
        }
    }

    /// Bits of F this policy may write.
    pub const fn mask(&self) -> u8 {
        const fn touched(modifier: FlagModifier, bit: u8) -> u8 {
            match modifier {
                FlagModifier::Unchanged => 0,
                _ => 1 << bit,
            }
        }
        touched(self.zero, 7)
            | touched(self.subtract, 6)
            | touched(self.half_carry, 5)
            | touched(self.carry, 4)
    }
}

/// Whether a conditional control transfer took its branch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Branch,
    #[default]
    NoBranch,
}

/// Cycle counts in T-cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub taken: u8,
    pub not_taken: u8,
}

impl Timing {
    pub const fn new(taken: u8, not_taken: u8) -> Self {
        Self { taken, not_taken }
    }

    pub fn select(&self, branch_status: BranchStatus) -> u8 {
        match branch_status {
            BranchStatus::Branch => self.taken,
            BranchStatus::NoBranch => self.not_taken,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub mnemonic: &'static str,
    pub assembly: Cow<'static, str>,
    pub opcode: u8,
    /// Encoded length in bytes, counting the prefix byte of prefixed instructions.
    pub byte_length: u8,
    pub timing: Timing,
    pub operand_a: OperandSpec,
    pub operand_b: OperandSpec,
    pub flags: FlagPolicy,
    pub flag_mask: u8,
    pub class: InstructionClass,
    pub is_prefix: bool,
}

impl InstructionDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        mnemonic: &'static str,
        assembly: Cow<'static, str>,
        opcode: u8,
        class: InstructionClass,
        operand_a: OperandSpec,
        operand_b: OperandSpec,
        byte_length: u8,
        timing: Timing,
        flags: FlagPolicy,
    ) -> Self {
        Self {
            mnemonic,
            assembly,
            opcode,
            byte_length,
            timing,
            operand_a,
            operand_b,
            flag_mask: flags.mask(),
            flags,
            is_prefix: matches!(class, InstructionClass::Prefix),
            class,
        }
    }

    pub fn operands(&self) -> [&OperandSpec; 2] {
        [&self.operand_a, &self.operand_b]
    }

    /// Length implied by the operand shape: prefix, opcode and trailing operand bytes.
    pub fn expected_length(&self, table: Table) -> u8 {
        table.prefix_bytes()
            + 1
            + self.operand_a.trailing_bytes()
            + self.operand_b.trailing_bytes()
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self.operand_a.operand, Operand::Condition(_))
    }
}

pub struct Catalog {
    primary: &'static [InstructionDescriptor; 256],
    prefixed: [InstructionDescriptor; 256],
}

impl Catalog {
    pub fn build() -> Result<Self> {
        let catalog = Self {
            primary: &opcode_table::PRIMARY_TABLE,
            prefixed: opcode_table::build_prefixed_table(),
        };
        catalog.validate(Table::Primary)?;
        catalog.validate(Table::Prefixed)?;
        debug!("Instruction catalog built");
        Ok(catalog)
    }

    pub fn get(&self, table: Table, opcode: u8) -> &InstructionDescriptor {
        match table {
            Table::Primary => &self.primary[usize::from(opcode)],
            Table::Prefixed => &self.prefixed[usize::from(opcode)],
        }
    }

    fn validate(&self, table: Table) -> Result<()> {
        let descriptors = match table {
            Table::Primary => &self.primary[..],
            Table::Prefixed => &self.prefixed[..],
        };

        for (index, descriptor) in descriptors.iter().enumerate() {
            if usize::from(descriptor.opcode) != index {
                return Err(Error::catalog_defect(format!(
                    "{} table slot {:#04x} holds opcode {:#04x}",
                    table, index, descriptor.opcode
                )));
            }

            let expected_length = descriptor.expected_length(table);
            if descriptor.byte_length != expected_length {
                return Err(Error::catalog_defect(format!(
                    "{} opcode {:#04x} ({}) declares {} bytes but its operands need {}",
                    table, index, descriptor.assembly, descriptor.byte_length, expected_length
                )));
            }

            let should_be_prefix = table == Table::Primary && descriptor.opcode == PREFIX_OPCODE;
            if descriptor.is_prefix != should_be_prefix {
                return Err(Error::catalog_defect(format!(
                    "{} opcode {:#04x} has the wrong prefix marker",
                    table, index
                )));
            }

            let conditional = descriptor.timing.taken != descriptor.timing.not_taken;
            if conditional && !descriptor.is_conditional() {
                return Err(Error::catalog_defect(format!(
                    "{} opcode {:#04x} has split timing without a condition",
                    table, index
                )));
            }
        }

        Ok(())
    }
}

static CATALOG: Lazy<Catalog> = Lazy::new(|| match Catalog::build() {
    Ok(catalog) => catalog,
    Err(err) => {
        error!("{}", err);
        panic!("{}", err);
    }
});

/// Looks up the descriptor for `opcode`. Total over both tables.
pub fn lookup(table: Table, opcode: u8) -> &'static InstructionDescriptor {
    CATALOG.get(table, opcode)
}
