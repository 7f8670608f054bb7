use strum_macros::{Display, EnumIter};

/// The 8-bit registers, numbered by their slot in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Reg {
    B = 0,
    C = 1,
    D = 2,
    E = 3,
    H = 4,
    L = 5,
    F = 6,
    A = 7,
}

/// The 16-bit registers: the four pairs backed by the register file, plus SP and PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum WReg {
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

/// The eight 8-bit CPU registers. Does not include the 16-bit SP and PC registers.
/// B/C, D/E, H/L and A/F pair up into 16-bit views over the same storage.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    slots: [u8; 8],
}

/// Only the upper nibble of F holds flags. The lower nibble always reads as zero.
const FLAG_REGISTER_MASK: u8 = 0xf0;

/// Macro to generate a function that gets the value in a joint register.
macro_rules! get_joint_register {
    ($name:ident, $first:ident, $second:ident) => {
        #[doc = concat!("Gets the joint register ", stringify!($first), stringify!($second), ".")]
        pub fn $name(&self) -> u16 {
            u16::from_be_bytes([self.read(Reg::$first), self.read(Reg::$second)])
        }
    };
}

/// Macro to generate a function that sets the value in a joint register.
macro_rules! set_joint_register {
    ($name:ident, $first:ident, $second:ident) => {
        #[doc = concat!("Sets the joint register ", stringify!($first), stringify!($second), ".")]
        pub fn $name(&mut self, value: u16) {
            let [high, low] = value.to_be_bytes();
            self.write(Reg::$first, high);
            self.write(Reg::$second, low);
        }
    };
}

impl RegisterFile {
    pub fn read(&self, reg: Reg) -> u8 {
        self.slots[reg as usize]
    }

    pub fn write(&mut self, reg: Reg, value: u8) {
        self.slots[reg as usize] = match reg {
            Reg::F => value & FLAG_REGISTER_MASK,
            _ => value,
        };
    }

    // AF
    get_joint_register!(get_af, A, F);
    set_joint_register!(set_af, A, F);

    // BC
    get_joint_register!(get_bc, B, C);
    set_joint_register!(set_bc, B, C);

    // DE
    get_joint_register!(get_de, D, E);
    set_joint_register!(set_de, D, E);

    // HL
    get_joint_register!(get_hl, H, L);
    set_joint_register!(set_hl, H, L);

    pub fn flags(&self) -> Flags {
        self.read(Reg::F).into()
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.write(Reg::F, flags.into());
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.flags().get(flag)
    }
}

/// One of the four condition bits held in the upper nibble of F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Flag {
    Zero,
    Subtract,
    HalfCarry,
    Carry,
}

const ZERO_FLAG_BYTE_POSITION: u8 = 7;
const SUBTRACT_FLAG_BYTE_POSITION: u8 = 6;
const HALF_CARRY_FLAG_BYTE_POSITION: u8 = 5;
const CARRY_FLAG_BYTE_POSITION: u8 = 4;

impl Flag {
    /// Position of the flag inside F.
    pub fn bit(self) -> u8 {
        match self {
            Flag::Zero => ZERO_FLAG_BYTE_POSITION,
            Flag::Subtract => SUBTRACT_FLAG_BYTE_POSITION,
            Flag::HalfCarry => HALF_CARRY_FLAG_BYTE_POSITION,
            Flag::Carry => CARRY_FLAG_BYTE_POSITION,
        }
    }
}

/// Decoded view of the flag register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    /// Set when the result of a math op is zero or two values match when using the CP
    /// instruction.
    pub zero: bool,

    /// Set if a subtraction was performed in the last math operation.
    pub subtract: bool,

    /// Set if a carry occurred from the lower nibble in the last math operation.
    pub half_carry: bool,

    /// Set if a carry occurred from the last math operation or if register A is the
    /// smaller value when executing the CP instruction.
    pub carry: bool,
}

impl Flags {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Zero => self.zero,
            Flag::Subtract => self.subtract,
            Flag::HalfCarry => self.half_carry,
            Flag::Carry => self.carry,
        }
    }
}

impl std::convert::From<Flags> for u8 {
    fn from(flag: Flags) -> u8 {
        u8::from(flag.zero) << ZERO_FLAG_BYTE_POSITION
            | u8::from(flag.subtract) << SUBTRACT_FLAG_BYTE_POSITION
            | u8::from(flag.half_carry) << HALF_CARRY_FLAG_BYTE_POSITION
            | u8::from(flag.carry) << CARRY_FLAG_BYTE_POSITION
    }
}

impl std::convert::From<u8> for Flags {
    fn from(byte: u8) -> Self {
        let zero = ((byte >> ZERO_FLAG_BYTE_POSITION) & 0b1) == 1;
        let subtract = ((byte >> SUBTRACT_FLAG_BYTE_POSITION) & 0b1) == 1;
        let half_carry = ((byte >> HALF_CARRY_FLAG_BYTE_POSITION) & 0b1) == 1;
        let carry = ((byte >> CARRY_FLAG_BYTE_POSITION) & 0b1) == 1;

        Self {
            zero,
            subtract,
            half_carry,
            carry,
        }
    }
}
