/*!
 * Execution of decoded instructions. Each instruction class has one handler; the handler
 * performs the data movement and reports the flag values it computed, and `execute`
 * applies the descriptor's flag policy and selects the cycle count.
 */

use log::warn;
use strum::IntoEnumIterator;

use crate::component::{Addressable, ElapsedTime};
use crate::cpu::alu::{self, NIBBLE_MASK_16, NIBBLE_MASK_8};
use crate::cpu::catalog::{
    Access, BranchStatus, FlagModifier, InstructionClass, InstructionDescriptor, Operand,
    OperandSpec,
};
use crate::cpu::cpu::{Cpu, RunState};
use crate::cpu::decoder::{DecodedInstruction, OperandValue};
use crate::cpu::register::{Flag, Flags, Reg, WReg};
use crate::error::{Error, Result};
use crate::utils::BitField;

/// Base of the page addressed by LDH and `LD (C),A`.
const HIGH_PAGE: u16 = 0xff00;

/// What a handler reports back to the dispatcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Values for the flags the policy marks as computed. Other fields are ignored.
    pub flags: Flags,
    pub branch: BranchStatus,
}

impl Outcome {
    fn none() -> Self {
        Self::default()
    }

    fn with_flags(flags: Flags) -> Self {
        Self {
            flags,
            branch: BranchStatus::NoBranch,
        }
    }

    fn branch(taken: bool) -> Self {
        Self {
            flags: Flags::default(),
            branch: if taken {
                BranchStatus::Branch
            } else {
                BranchStatus::NoBranch
            },
        }
    }
}

type Handler = fn(&mut Cpu, &mut dyn Addressable, &DecodedInstruction) -> Result<Outcome>;

/// The handler for an instruction class. The prefix escape has none: the decoder always
/// replaces it with the prefixed instruction.
pub fn handler_for(class: InstructionClass) -> Option<Handler> {
    use InstructionClass::*;

    let handler: Handler = match class {
        Ld => Cpu::load,
        Ldh => Cpu::load_high,
        Ldi => Cpu::load_increment,
        Ldd => Cpu::load_decrement,
        Ldhl => Cpu::load_hl_sp_offset,
        Push => Cpu::push_pair,
        Pop => Cpu::pop_pair,

        Add => Cpu::add,
        Adc => Cpu::add_with_carry,
        Sub => Cpu::subtract,
        Sbc => Cpu::subtract_with_carry,
        And => Cpu::and,
        Or => Cpu::or,
        Xor => Cpu::xor,
        Cp => Cpu::compare,
        Inc => Cpu::increment,
        Dec => Cpu::decrement,

        Daa => Cpu::decimal_adjust,
        Cpl => Cpu::complement,
        Ccf => Cpu::complement_carry,
        Scf => Cpu::set_carry,
        Nop => Cpu::no_operation,
        Halt => Cpu::halt,
        Stop => Cpu::stop,
        Di => Cpu::disable_interrupts,
        Ei => Cpu::enable_interrupts,

        Jp => Cpu::jump,
        Jr => Cpu::jump_relative,
        Call => Cpu::call,
        Ret => Cpu::ret,
        Reti => Cpu::ret_interrupt,
        Rst => Cpu::restart,

        Rlca | Rla | Rrca | Rra => Cpu::rotate_accumulator,
        Rlc | Rrc | Rl | Rr | Sla | Sra | Swap | Srl => Cpu::shift_operand,
        Bit => Cpu::test_bit,
        Res => Cpu::reset_bit,
        Set => Cpu::set_bit,

        Invalid => Cpu::illegal,
        Prefix => return None,
    };
    Some(handler)
}

/// Where an 8-bit operand lives once its address has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Register(Reg),
    Memory(u16),
    Immediate(u8),
}

fn operand_mismatch(instruction: &DecodedInstruction, spec: &OperandSpec) -> Error {
    Error::catalog_defect(format!(
        "{} ({}) cannot use {} operand {:?} with {} access",
        instruction.descriptor().assembly,
        instruction.descriptor().class,
        spec.kind(),
        spec.operand,
        spec.access
    ))
}

fn read_word_at(memory: &mut dyn Addressable, address: u16) -> Result<u16> {
    let bytes = [
        memory.read_u8(address.into())?,
        memory.read_u8(address.wrapping_add(1).into())?,
    ];
    Ok(u16::from_le_bytes(bytes))
}

fn write_word_at(memory: &mut dyn Addressable, address: u16, value: u16) -> Result<()> {
    let [low, high] = value.to_le_bytes();
    memory.write_u8(address.into(), low)?;
    memory.write_u8(address.wrapping_add(1).into(), high)
}

fn zero_flags(value: u8) -> Flags {
    Flags {
        zero: value == 0,
        ..Flags::default()
    }
}

impl Cpu {
    /// Executes one decoded instruction and returns the T-cycles it took.
    pub fn execute(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<ElapsedTime> {
        let descriptor = instruction.descriptor();
        let handler = handler_for(descriptor.class).ok_or(Error::UnimplementedInstructionClass {
            class: descriptor.class,
            address: instruction.address(),
        })?;

        // A failed handler leaves the core as it was before the fetch.
        let saved = self.clone();
        self.pc = instruction.next_address();
        let outcome = match handler(self, memory, instruction) {
            Ok(outcome) => outcome,
            Err(err) => {
                *self = saved;
                return Err(err);
            }
        };
        self.apply_flag_policy(descriptor, outcome.flags);

        Ok(descriptor.timing.select(outcome.branch).into())
    }

    fn apply_flag_policy(&mut self, descriptor: &InstructionDescriptor, computed: Flags) {
        if descriptor.flag_mask == 0 {
            return;
        }

        let mut f = BitField(self.registers.read(Reg::F));
        for flag in Flag::iter() {
            let value = match descriptor.flags.modifier(flag) {
                FlagModifier::Reset => false,
                FlagModifier::Set => true,
                FlagModifier::Computed => computed.get(flag),
                FlagModifier::Unchanged => continue,
            };
            f.set_bit(flag.bit(), value);
        }
        self.registers.write(Reg::F, f.0);
    }

    /* Operand access */

    fn byte_location(
        &self,
        instruction: &DecodedInstruction,
        spec: &OperandSpec,
        value: OperandValue,
    ) -> Result<Location> {
        let location = match (spec.access, spec.operand, value) {
            (Access::Direct, Operand::Reg8(reg), _) => Location::Register(reg),
            (Access::Direct, Operand::Imm8, OperandValue::Byte(byte)) => Location::Immediate(byte),
            (Access::MemRead8 | Access::MemWrite8, Operand::Reg16(pair), _) => {
                Location::Memory(self.get_word_register(pair))
            }
            (Access::MemRead8 | Access::MemWrite8, Operand::Imm16, OperandValue::Word(address)) => {
                Location::Memory(address)
            }
            (Access::MemRead8 | Access::MemWrite8, Operand::Reg8(reg), _) => {
                Location::Memory(HIGH_PAGE + u16::from(self.get_register(reg)))
            }
            (Access::MemRead8 | Access::MemWrite8, Operand::Imm8, OperandValue::Byte(offset)) => {
                Location::Memory(HIGH_PAGE + u16::from(offset))
            }
            _ => return Err(operand_mismatch(instruction, spec)),
        };
        Ok(location)
    }

    fn read_location(&self, memory: &mut dyn Addressable, location: Location) -> Result<u8> {
        match location {
            Location::Register(reg) => Ok(self.get_register(reg)),
            Location::Memory(address) => memory.read_u8(address.into()),
            Location::Immediate(byte) => Ok(byte),
        }
    }

    fn write_location(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        location: Location,
        value: u8,
    ) -> Result<()> {
        match location {
            Location::Register(reg) => {
                self.set_register(reg, value);
                Ok(())
            }
            Location::Memory(address) => memory.write_u8(address.into(), value),
            Location::Immediate(_) => Err(Error::catalog_defect(format!(
                "{} writes to an immediate",
                instruction.descriptor().assembly
            ))),
        }
    }

    fn read_byte_operand(
        &self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        index: usize,
    ) -> Result<u8> {
        let (spec, value) = instruction.operand_values()[index];
        let location = self.byte_location(instruction, spec, value)?;
        self.read_location(memory, location)
    }

    fn write_byte_operand(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        index: usize,
        value: u8,
    ) -> Result<()> {
        let (spec, operand_value) = instruction.operand_values()[index];
        let location = self.byte_location(instruction, spec, operand_value)?;
        self.write_location(memory, instruction, location, value)
    }

    fn read_word_operand(
        &self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        index: usize,
    ) -> Result<u16> {
        let (spec, value) = instruction.operand_values()[index];
        match (spec.access, spec.operand, value) {
            (Access::Direct, Operand::Reg16(pair), _) => Ok(self.get_word_register(pair)),
            (Access::Direct, Operand::Imm16, OperandValue::Word(word)) => Ok(word),
            (Access::MemRead16, Operand::Reg16(pair), _) => {
                read_word_at(memory, self.get_word_register(pair))
            }
            (Access::MemRead16, Operand::Imm16, OperandValue::Word(address)) => {
                read_word_at(memory, address)
            }
            _ => Err(operand_mismatch(instruction, spec)),
        }
    }

    fn write_word_operand(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        index: usize,
        value: u16,
    ) -> Result<()> {
        let (spec, operand_value) = instruction.operand_values()[index];
        match (spec.access, spec.operand, operand_value) {
            (Access::Direct, Operand::Reg16(pair), _) => {
                self.set_word_register(pair, value);
                Ok(())
            }
            (Access::MemWrite16, Operand::Reg16(pair), _) => {
                write_word_at(memory, self.get_word_register(pair), value)
            }
            (Access::MemWrite16, Operand::Imm16, OperandValue::Word(address)) => {
                write_word_at(memory, address, value)
            }
            _ => Err(operand_mismatch(instruction, spec)),
        }
    }

    fn expect_operand(
        instruction: &DecodedInstruction,
        index: usize,
        operand: Operand,
    ) -> Result<()> {
        let spec = instruction.descriptor().operands()[index];
        if spec.operand == operand && spec.access == Access::Direct {
            Ok(())
        } else {
            Err(operand_mismatch(instruction, spec))
        }
    }

    /// The source of an accumulator instruction, after checking A is the destination.
    fn accumulator_source(
        &self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<u8> {
        Self::expect_operand(instruction, 0, Operand::Reg8(Reg::A))?;
        self.read_byte_operand(memory, instruction, 1)
    }

    /// The condition of a conditional control transfer and the index of its target operand.
    fn branch_condition(&self, instruction: &DecodedInstruction) -> (bool, usize) {
        match instruction.descriptor().operand_a.operand {
            Operand::Condition(condition) => (self.condition_holds(condition), 1),
            _ => (true, 0),
        }
    }

    fn bit_index(instruction: &DecodedInstruction) -> Result<u8> {
        match instruction.descriptor().operand_a.operand {
            Operand::Bit(index) if index < 8 => Ok(index),
            _ => Err(operand_mismatch(
                instruction,
                &instruction.descriptor().operand_a,
            )),
        }
    }

    /* Loads */

    fn transfer_byte(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<()> {
        let value = self.read_byte_operand(memory, instruction, 1)?;
        self.write_byte_operand(memory, instruction, 0, value)
    }

    fn load(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let descriptor = instruction.descriptor();
        if descriptor.operand_a.is_wide() || descriptor.operand_b.is_wide() {
            let value = self.read_word_operand(memory, instruction, 1)?;
            self.write_word_operand(memory, instruction, 0, value)?;
        } else {
            self.transfer_byte(memory, instruction)?;
        }
        Ok(Outcome::none())
    }

    fn load_high(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let descriptor = instruction.descriptor();
        let high_page = |spec: &OperandSpec| {
            spec.is_memory() && matches!(spec.operand, Operand::Imm8 | Operand::Reg8(_))
        };
        if !high_page(&descriptor.operand_a) && !high_page(&descriptor.operand_b) {
            return Err(operand_mismatch(instruction, &descriptor.operand_a));
        }
        self.transfer_byte(memory, instruction)?;
        Ok(Outcome::none())
    }

    fn load_via_hl(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        step: i16,
    ) -> Result<Outcome> {
        let via_hl = instruction
            .descriptor()
            .operands()
            .iter()
            .any(|spec| spec.is_memory() && spec.operand == Operand::Reg16(WReg::HL));
        if !via_hl {
            return Err(operand_mismatch(
                instruction,
                &instruction.descriptor().operand_a,
            ));
        }

        self.transfer_byte(memory, instruction)?;
        let hl = self.registers.get_hl();
        self.registers.set_hl(hl.wrapping_add_signed(step));
        Ok(Outcome::none())
    }

    fn load_increment(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.load_via_hl(memory, instruction, 1)
    }

    fn load_decrement(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.load_via_hl(memory, instruction, -1)
    }

    fn load_hl_sp_offset(
        &mut self,
        _memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        Self::expect_operand(instruction, 0, Operand::Reg16(WReg::SP))?;
        let OperandValue::Displacement(displacement) = instruction.operand_b() else {
            return Err(operand_mismatch(
                instruction,
                &instruction.descriptor().operand_b,
            ));
        };

        let result = alu::offset_sp(self.sp, displacement);
        self.registers.set_hl(result.value);
        Ok(Outcome::with_flags(Flags {
            zero: false,
            subtract: false,
            half_carry: result.half_carry,
            carry: result.carry,
        }))
    }

    fn stack_pair(instruction: &DecodedInstruction) -> Result<WReg> {
        match instruction.descriptor().operand_a.operand {
            Operand::Reg16(pair @ (WReg::AF | WReg::BC | WReg::DE | WReg::HL)) => Ok(pair),
            _ => Err(operand_mismatch(
                instruction,
                &instruction.descriptor().operand_a,
            )),
        }
    }

    fn push_pair(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let pair = Self::stack_pair(instruction)?;
        let value = self.get_word_register(pair);
        self.push_word(memory, value)?;
        Ok(Outcome::none())
    }

    fn pop_pair(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let pair = Self::stack_pair(instruction)?;
        let value = self.pop_word(memory)?;
        self.set_word_register(pair, value);
        // POP AF is the only pop whose policy computes flags: they are the popped F.
        Ok(Outcome::with_flags(self.registers.flags()))
    }

    /* Arithmetic */

    fn add(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        match instruction.descriptor().operand_a.operand {
            Operand::Reg16(WReg::HL) => {
                let value = self.read_word_operand(memory, instruction, 1)?;
                let result = alu::add(self.registers.get_hl(), value, false, NIBBLE_MASK_16);
                self.registers.set_hl(result.value);
                Ok(Outcome::with_flags(Flags {
                    zero: false,
                    subtract: false,
                    half_carry: result.half_carry,
                    carry: result.carry,
                }))
            }
            Operand::Reg16(WReg::SP) => {
                let OperandValue::Displacement(displacement) = instruction.operand_b() else {
                    return Err(operand_mismatch(
                        instruction,
                        &instruction.descriptor().operand_b,
                    ));
                };
                let result = alu::offset_sp(self.sp, displacement);
                self.sp = result.value;
                Ok(Outcome::with_flags(Flags {
                    zero: false,
                    subtract: false,
                    half_carry: result.half_carry,
                    carry: result.carry,
                }))
            }
            _ => self.add_to_accumulator(memory, instruction, false),
        }
    }

    fn add_with_carry(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let carry = self.flag(Flag::Carry);
        self.add_to_accumulator(memory, instruction, carry)
    }

    fn add_to_accumulator(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        carry: bool,
    ) -> Result<Outcome> {
        let value = self.accumulator_source(memory, instruction)?;
        let result = alu::add(self.get_register(Reg::A), value, carry, NIBBLE_MASK_8);
        self.set_register(Reg::A, result.value);
        Ok(Outcome::with_flags(Flags {
            zero: result.value == 0,
            subtract: false,
            half_carry: result.half_carry,
            carry: result.carry,
        }))
    }

    /// A minus the source (and borrow). Stores the difference unless this is a compare.
    fn subtract_from_accumulator(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        borrow: bool,
        store: bool,
    ) -> Result<Outcome> {
        let value = self.accumulator_source(memory, instruction)?;
        let result = alu::sub(self.get_register(Reg::A), value, borrow, NIBBLE_MASK_8);
        if store {
            self.set_register(Reg::A, result.value);
        }
        Ok(Outcome::with_flags(Flags {
            zero: result.value == 0,
            subtract: true,
            half_carry: result.half_carry,
            carry: result.carry,
        }))
    }

    fn subtract(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.subtract_from_accumulator(memory, instruction, false, true)
    }

    fn subtract_with_carry(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let carry = self.flag(Flag::Carry);
        self.subtract_from_accumulator(memory, instruction, carry, true)
    }

    fn compare(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.subtract_from_accumulator(memory, instruction, false, false)
    }

    fn logical(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        op: fn(u8, u8) -> u8,
    ) -> Result<Outcome> {
        let value = self.accumulator_source(memory, instruction)?;
        let result = op(self.get_register(Reg::A), value);
        self.set_register(Reg::A, result);
        Ok(Outcome::with_flags(zero_flags(result)))
    }

    fn and(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.logical(memory, instruction, |a, b| a & b)
    }

    fn or(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.logical(memory, instruction, |a, b| a | b)
    }

    fn xor(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.logical(memory, instruction, |a, b| a ^ b)
    }

    fn step_operand(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        decrement: bool,
    ) -> Result<Outcome> {
        if instruction.descriptor().operand_a.is_wide() {
            let value = self.read_word_operand(memory, instruction, 0)?;
            let value = if decrement {
                value.wrapping_sub(1)
            } else {
                value.wrapping_add(1)
            };
            self.write_word_operand(memory, instruction, 0, value)?;
            return Ok(Outcome::none());
        }

        let value = self.read_byte_operand(memory, instruction, 0)?;
        let result = if decrement {
            alu::sub(value, 1, false, NIBBLE_MASK_8)
        } else {
            alu::add(value, 1, false, NIBBLE_MASK_8)
        };
        self.write_byte_operand(memory, instruction, 0, result.value)?;
        Ok(Outcome::with_flags(Flags {
            zero: result.value == 0,
            subtract: decrement,
            half_carry: result.half_carry,
            carry: false,
        }))
    }

    fn increment(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.step_operand(memory, instruction, false)
    }

    fn decrement(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.step_operand(memory, instruction, true)
    }

    /* Miscellaneous */

    fn decimal_adjust(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let flags = self.registers.flags();
        let (value, carry) = alu::decimal_adjust(
            self.get_register(Reg::A),
            flags.subtract,
            flags.half_carry,
            flags.carry,
        );
        self.set_register(Reg::A, value);
        Ok(Outcome::with_flags(Flags {
            zero: value == 0,
            carry,
            ..flags
        }))
    }

    fn complement(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.set_register(Reg::A, !self.get_register(Reg::A));
        Ok(Outcome::none())
    }

    fn complement_carry(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        Ok(Outcome::with_flags(Flags {
            carry: !self.flag(Flag::Carry),
            ..Flags::default()
        }))
    }

    fn set_carry(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        Ok(Outcome::none())
    }

    fn no_operation(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        Ok(Outcome::none())
    }

    fn halt(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.set_run_state(RunState::Halted);
        Ok(Outcome::none())
    }

    fn stop(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.set_run_state(RunState::Stopped);
        Ok(Outcome::none())
    }

    fn disable_interrupts(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.interrupt_enabled = false;
        Ok(Outcome::none())
    }

    fn enable_interrupts(
        &mut self,
        _memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.interrupt_enabled = true;
        Ok(Outcome::none())
    }

    /* Control flow */

    fn jump(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let (taken, target_index) = self.branch_condition(instruction);
        let target = self.read_word_operand(memory, instruction, target_index)?;
        if taken {
            self.pc = target;
        }
        Ok(Outcome::branch(taken))
    }

    fn jump_relative(
        &mut self,
        _memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let (taken, target_index) = self.branch_condition(instruction);
        let (spec, value) = instruction.operand_values()[target_index];
        let OperandValue::Displacement(displacement) = value else {
            return Err(operand_mismatch(instruction, spec));
        };
        if taken {
            self.pc = self.pc.wrapping_add_signed(displacement.into());
        }
        Ok(Outcome::branch(taken))
    }

    fn call(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let (taken, target_index) = self.branch_condition(instruction);
        let target = self.read_word_operand(memory, instruction, target_index)?;
        if taken {
            self.push_word(memory, self.pc)?;
            self.pc = target;
        }
        Ok(Outcome::branch(taken))
    }

    fn ret(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let (taken, _) = self.branch_condition(instruction);
        if taken {
            self.pc = self.pop_word(memory)?;
        }
        Ok(Outcome::branch(taken))
    }

    fn ret_interrupt(
        &mut self,
        memory: &mut dyn Addressable,
        _instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.pc = self.pop_word(memory)?;
        self.interrupt_enabled = true;
        Ok(Outcome::none())
    }

    fn restart(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let Operand::Vector(vector) = instruction.descriptor().operand_a.operand else {
            return Err(operand_mismatch(
                instruction,
                &instruction.descriptor().operand_a,
            ));
        };
        self.push_word(memory, self.pc)?;
        self.pc = vector;
        Ok(Outcome::none())
    }

    /* Rotates, shifts and bit operations */

    fn rotate(&self, instruction: &DecodedInstruction, value: u8) -> Result<(u8, bool)> {
        let class = instruction.descriptor().class;
        alu::shift(class, value, self.flag(Flag::Carry)).ok_or_else(|| {
            Error::catalog_defect(format!("{} is not a rotate or shift", class))
        })
    }

    fn rotate_accumulator(
        &mut self,
        _memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let (result, carry) = self.rotate(instruction, self.get_register(Reg::A))?;
        self.set_register(Reg::A, result);
        Ok(Outcome::with_flags(Flags {
            carry,
            ..Flags::default()
        }))
    }

    fn shift_operand(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let value = self.read_byte_operand(memory, instruction, 0)?;
        let (result, carry) = self.rotate(instruction, value)?;
        self.write_byte_operand(memory, instruction, 0, result)?;
        Ok(Outcome::with_flags(Flags {
            zero: result == 0,
            carry,
            ..Flags::default()
        }))
    }

    fn test_bit(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let index = Self::bit_index(instruction)?;
        let value = self.read_byte_operand(memory, instruction, 1)?;
        Ok(Outcome::with_flags(Flags {
            zero: !BitField(value).get_bit(index),
            ..Flags::default()
        }))
    }

    fn write_bit(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
        bit: bool,
    ) -> Result<Outcome> {
        let index = Self::bit_index(instruction)?;
        let value = self.read_byte_operand(memory, instruction, 1)?;
        let value = BitField(value).with_bit(index, bit);
        self.write_byte_operand(memory, instruction, 1, value.0)?;
        Ok(Outcome::none())
    }

    fn reset_bit(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.write_bit(memory, instruction, false)
    }

    fn set_bit(
        &mut self,
        memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        self.write_bit(memory, instruction, true)
    }

    fn illegal(
        &mut self,
        _memory: &mut dyn Addressable,
        instruction: &DecodedInstruction,
    ) -> Result<Outcome> {
        let opcode = instruction.descriptor().opcode;
        let address = instruction.address();
        warn!("Illegal opcode {:#04x} at {:#06x}", opcode, address);
        Err(Error::IllegalInstruction { opcode, address })
    }
}
