mod alu;
mod catalog;
#[allow(clippy::module_inception)]
mod cpu;
mod decoder;
mod instruction;
mod opcode_table;
mod register;

pub use catalog::{
    lookup, Access, BranchStatus, Condition, FlagModifier, FlagPolicy, InstructionClass,
    InstructionDescriptor, Operand, OperandSpec, OperandType, Table, Timing, PREFIX_OPCODE,
};
pub use cpu::{Cpu, RunState};
pub use decoder::{decode, disassemble, DecodedInstruction, Decoder, OperandValue};
pub use instruction::{handler_for, Outcome};
pub use register::{Flag, Flags, Reg, RegisterFile, WReg};
