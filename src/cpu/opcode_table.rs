/*!
 * Opcode tables. The primary table is written out row by row in opcode order using the
 * `Z N H C` flag notation of the published opcode charts; timings are in T-cycles
 * `(taken, not taken)`. The prefixed table is generated from the opcode bit fields.
 */

use std::borrow::Cow;

use crate::cpu::catalog::{
    Access, Condition, FlagPolicy, InstructionClass, InstructionDescriptor, Operand,
    OperandSpec, Timing,
};
use crate::cpu::register::{Reg, WReg};

use Condition::*;
use Reg::*;
use WReg::*;

const NONE: OperandSpec = OperandSpec::new(Operand::None, Access::Direct);
const D8: OperandSpec = OperandSpec::new(Operand::Imm8, Access::Direct);
const D16: OperandSpec = OperandSpec::new(Operand::Imm16, Access::Direct);
const R8: OperandSpec = OperandSpec::new(Operand::Disp8, Access::Direct);
const PREFIX: OperandSpec = OperandSpec::new(Operand::Imm8, Access::Prefix);

// High page: 0xff00 + 8-bit immediate or C.
const A8_LOAD: OperandSpec = OperandSpec::new(Operand::Imm8, Access::MemRead8);
const A8_STORE: OperandSpec = OperandSpec::new(Operand::Imm8, Access::MemWrite8);
const C_LOAD: OperandSpec = OperandSpec::new(Operand::Reg8(C), Access::MemRead8);
const C_STORE: OperandSpec = OperandSpec::new(Operand::Reg8(C), Access::MemWrite8);

const A16_LOAD: OperandSpec = OperandSpec::new(Operand::Imm16, Access::MemRead8);
const A16_STORE: OperandSpec = OperandSpec::new(Operand::Imm16, Access::MemWrite8);
const A16_STORE16: OperandSpec = OperandSpec::new(Operand::Imm16, Access::MemWrite16);

const fn reg(reg: Reg) -> OperandSpec {
    OperandSpec::new(Operand::Reg8(reg), Access::Direct)
}

const fn pair(pair: WReg) -> OperandSpec {
    OperandSpec::new(Operand::Reg16(pair), Access::Direct)
}

/// Byte read through a register pair, e.g. `(HL)` as a source.
const fn load(pair: WReg) -> OperandSpec {
    OperandSpec::new(Operand::Reg16(pair), Access::MemRead8)
}

/// Byte written through a register pair, e.g. `(HL)` as a destination.
const fn store(pair: WReg) -> OperandSpec {
    OperandSpec::new(Operand::Reg16(pair), Access::MemWrite8)
}

const fn cond(condition: Condition) -> OperandSpec {
    OperandSpec::new(Operand::Condition(condition), Access::Direct)
}

const fn vector(address: u16) -> OperandSpec {
    OperandSpec::new(Operand::Vector(address), Access::Direct)
}

macro_rules! op {
    ($opcode:literal, $mnemonic:literal, $assembly:literal, $class:ident, $a:expr, $b:expr, $len:literal, ($taken:literal, $not_taken:literal), $flags:literal) => {
        InstructionDescriptor::new(
            $mnemonic,
            Cow::Borrowed($assembly),
            $opcode,
            InstructionClass::$class,
            $a,
            $b,
            $len,
            Timing::new($taken, $not_taken),
            FlagPolicy::from_notation($flags),
        )
    };
    ($opcode:literal, $mnemonic:literal, $assembly:literal, $class:ident, $a:expr, $b:expr, $len:literal, $cycles:literal, $flags:literal) => {
        op!($opcode, $mnemonic, $assembly, $class, $a, $b, $len, ($cycles, $cycles), $flags)
    };
}

macro_rules! invalid {
    ($opcode:literal) => {
        op!($opcode, "ILLEGAL", "ILLEGAL", Invalid, NONE, NONE, 1, 4, "----")
    };
}

#[rustfmt::skip]
pub static PRIMARY_TABLE: [InstructionDescriptor; 256] = [
    op!(0x00, "NOP", "NOP", Nop, NONE, NONE, 1, 4, "----"),
    op!(0x01, "LD", "LD BC,d16", Ld, pair(BC), D16, 3, 12, "----"),
    op!(0x02, "LD", "LD (BC),A", Ld, store(BC), reg(A), 1, 8, "----"),
    op!(0x03, "INC", "INC BC", Inc, pair(BC), NONE, 1, 8, "----"),
    op!(0x04, "INC", "INC B", Inc, reg(B), NONE, 1, 4, "Z0H-"),
    op!(0x05, "DEC", "DEC B", Dec, reg(B), NONE, 1, 4, "Z1H-"),
    op!(0x06, "LD", "LD B,d8", Ld, reg(B), D8, 2, 8, "----"),
    op!(0x07, "RLCA", "RLCA", Rlca, NONE, NONE, 1, 4, "000C"),
    op!(0x08, "LD", "LD (a16),SP", Ld, A16_STORE16, pair(SP), 3, 20, "----"),
    op!(0x09, "ADD", "ADD HL,BC", Add, pair(HL), pair(BC), 1, 8, "-0HC"),
    op!(0x0A, "LD", "LD A,(BC)", Ld, reg(A), load(BC), 1, 8, "----"),
    op!(0x0B, "DEC", "DEC BC", Dec, pair(BC), NONE, 1, 8, "----"),
    op!(0x0C, "INC", "INC C", Inc, reg(C), NONE, 1, 4, "Z0H-"),
    op!(0x0D, "DEC", "DEC C", Dec, reg(C), NONE, 1, 4, "Z1H-"),
    op!(0x0E, "LD", "LD C,d8", Ld, reg(C), D8, 2, 8, "----"),
    op!(0x0F, "RRCA", "RRCA", Rrca, NONE, NONE, 1, 4, "000C"),
    op!(0x10, "STOP", "STOP 0", Stop, D8, NONE, 2, 4, "----"),
    op!(0x11, "LD", "LD DE,d16", Ld, pair(DE), D16, 3, 12, "----"),
    op!(0x12, "LD", "LD (DE),A", Ld, store(DE), reg(A), 1, 8, "----"),
    op!(0x13, "INC", "INC DE", Inc, pair(DE), NONE, 1, 8, "----"),
    op!(0x14, "INC", "INC D", Inc, reg(D), NONE, 1, 4, "Z0H-"),
    op!(0x15, "DEC", "DEC D", Dec, reg(D), NONE, 1, 4, "Z1H-"),
    op!(0x16, "LD", "LD D,d8", Ld, reg(D), D8, 2, 8, "----"),
    op!(0x17, "RLA", "RLA", Rla, NONE, NONE, 1, 4, "000C"),
    op!(0x18, "JR", "JR r8", Jr, R8, NONE, 2, 12, "----"),
    op!(0x19, "ADD", "ADD HL,DE", Add, pair(HL), pair(DE), 1, 8, "-0HC"),
    op!(0x1A, "LD", "LD A,(DE)", Ld, reg(A), load(DE), 1, 8, "----"),
    op!(0x1B, "DEC", "DEC DE", Dec, pair(DE), NONE, 1, 8, "----"),
    op!(0x1C, "INC", "INC E", Inc, reg(E), NONE, 1, 4, "Z0H-"),
    op!(0x1D, "DEC", "DEC E", Dec, reg(E), NONE, 1, 4, "Z1H-"),
    op!(0x1E, "LD", "LD E,d8", Ld, reg(E), D8, 2, 8, "----"),
    op!(0x1F, "RRA", "RRA", Rra, NONE, NONE, 1, 4, "000C"),
    op!(0x20, "JR", "JR NZ,r8", Jr, cond(NotZero), R8, 2, (12, 8), "----"),
    op!(0x21, "LD", "LD HL,d16", Ld, pair(HL), D16, 3, 12, "----"),
    op!(0x22, "LD", "LD (HL+),A", Ldi, store(HL), reg(A), 1, 8, "----"),
    op!(0x23, "INC", "INC HL", Inc, pair(HL), NONE, 1, 8, "----"),
    op!(0x24, "INC", "INC H", Inc, reg(H), NONE, 1, 4, "Z0H-"),
    op!(0x25, "DEC", "DEC H", Dec, reg(H), NONE, 1, 4, "Z1H-"),
    op!(0x26, "LD", "LD H,d8", Ld, reg(H), D8, 2, 8, "----"),
    op!(0x27, "DAA", "DAA", Daa, NONE, NONE, 1, 4, "Z-0C"),
    op!(0x28, "JR", "JR Z,r8", Jr, cond(Zero), R8, 2, (12, 8), "----"),
    op!(0x29, "ADD", "ADD HL,HL", Add, pair(HL), pair(HL), 1, 8, "-0HC"),
    op!(0x2A, "LD", "LD A,(HL+)", Ldi, reg(A), load(HL), 1, 8, "----"),
    op!(0x2B, "DEC", "DEC HL", Dec, pair(HL), NONE, 1, 8, "----"),
    op!(0x2C, "INC", "INC L", Inc, reg(L), NONE, 1, 4, "Z0H-"),
    op!(0x2D, "DEC", "DEC L", Dec, reg(L), NONE, 1, 4, "Z1H-"),
    op!(0x2E, "LD", "LD L,d8", Ld, reg(L), D8, 2, 8, "----"),
    op!(0x2F, "CPL", "CPL", Cpl, NONE, NONE, 1, 4, "-11-"),
    op!(0x30, "JR", "JR NC,r8", Jr, cond(NotCarry), R8, 2, (12, 8), "----"),
    op!(0x31, "LD", "LD SP,d16", Ld, pair(SP), D16, 3, 12, "----"),
    op!(0x32, "LD", "LD (HL-),A", Ldd, store(HL), reg(A), 1, 8, "----"),
    op!(0x33, "INC", "INC SP", Inc, pair(SP), NONE, 1, 8, "----"),
    op!(0x34, "INC", "INC (HL)", Inc, store(HL), NONE, 1, 12, "Z0H-"),
    op!(0x35, "DEC", "DEC (HL)", Dec, store(HL), NONE, 1, 12, "Z1H-"),
    op!(0x36, "LD", "LD (HL),d8", Ld, store(HL), D8, 2, 12, "----"),
    op!(0x37, "SCF", "SCF", Scf, NONE, NONE, 1, 4, "-001"),
    op!(0x38, "JR", "JR C,r8", Jr, cond(Carry), R8, 2, (12, 8), "----"),
    op!(0x39, "ADD", "ADD HL,SP", Add, pair(HL), pair(SP), 1, 8, "-0HC"),
    op!(0x3A, "LD", "LD A,(HL-)", Ldd, reg(A), load(HL), 1, 8, "----"),
    op!(0x3B, "DEC", "DEC SP", Dec, pair(SP), NONE, 1, 8, "----"),
    op!(0x3C, "INC", "INC A", Inc, reg(A), NONE, 1, 4, "Z0H-"),
    op!(0x3D, "DEC", "DEC A", Dec, reg(A), NONE, 1, 4, "Z1H-"),
    op!(0x3E, "LD", "LD A,d8", Ld, reg(A), D8, 2, 8, "----"),
    op!(0x3F, "CCF", "CCF", Ccf, NONE, NONE, 1, 4, "-00C"),
    op!(0x40, "LD", "LD B,B", Ld, reg(B), reg(B), 1, 4, "----"),
    op!(0x41, "LD", "LD B,C", Ld, reg(B), reg(C), 1, 4, "----"),
    op!(0x42, "LD", "LD B,D", Ld, reg(B), reg(D), 1, 4, "----"),
    op!(0x43, "LD", "LD B,E", Ld, reg(B), reg(E), 1, 4, "----"),
    op!(0x44, "LD", "LD B,H", Ld, reg(B), reg(H), 1, 4, "----"),
    op!(0x45, "LD", "LD B,L", Ld, reg(B), reg(L), 1, 4, "----"),
    op!(0x46, "LD", "LD B,(HL)", Ld, reg(B), load(HL), 1, 8, "----"),
    op!(0x47, "LD", "LD B,A", Ld, reg(B), reg(A), 1, 4, "----"),
    op!(0x48, "LD", "LD C,B", Ld, reg(C), reg(B), 1, 4, "----"),
    op!(0x49, "LD", "LD C,C", Ld, reg(C), reg(C), 1, 4, "----"),
    op!(0x4A, "LD", "LD C,D", Ld, reg(C), reg(D), 1, 4, "----"),
    op!(0x4B, "LD", "LD C,E", Ld, reg(C), reg(E), 1, 4, "----"),
    op!(0x4C, "LD", "LD C,H", Ld, reg(C), reg(H), 1, 4, "----"),
    op!(0x4D, "LD", "LD C,L", Ld, reg(C), reg(L), 1, 4, "----"),
    op!(0x4E, "LD", "LD C,(HL)", Ld, reg(C), load(HL), 1, 8, "----"),
    op!(0x4F, "LD", "LD C,A", Ld, reg(C), reg(A), 1, 4, "----"),
    op!(0x50, "LD", "LD D,B", Ld, reg(D), reg(B), 1, 4, "----"),
    op!(0x51, "LD", "LD D,C", Ld, reg(D), reg(C), 1, 4, "----"),
    op!(0x52, "LD", "LD D,D", Ld, reg(D), reg(D), 1, 4, "----"),
    op!(0x53, "LD", "LD D,E", Ld, reg(D), reg(E), 1, 4, "----"),
    op!(0x54, "LD", "LD D,H", Ld, reg(D), reg(H), 1, 4, "----"),
    op!(0x55, "LD", "LD D,L", Ld, reg(D), reg(L), 1, 4, "----"),
    op!(0x56, "LD", "LD D,(HL)", Ld, reg(D), load(HL), 1, 8, "----"),
    op!(0x57, "LD", "LD D,A", Ld, reg(D), reg(A), 1, 4, "----"),
    op!(0x58, "LD", "LD E,B", Ld, reg(E), reg(B), 1, 4, "----"),
    op!(0x59, "LD", "LD E,C", Ld, reg(E), reg(C), 1, 4, "----"),
    op!(0x5A, "LD", "LD E,D", Ld, reg(E), reg(D), 1, 4, "----"),
    op!(0x5B, "LD", "LD E,E", Ld, reg(E), reg(E), 1, 4, "----"),
    op!(0x5C, "LD", "LD E,H", Ld, reg(E), reg(H), 1, 4, "----"),
    op!(0x5D, "LD", "LD E,L", Ld, reg(E), reg(L), 1, 4, "----"),
    op!(0x5E, "LD", "LD E,(HL)", Ld, reg(E), load(HL), 1, 8, "----"),
    op!(0x5F, "LD", "LD E,A", Ld, reg(E), reg(A), 1, 4, "----"),
    op!(0x60, "LD", "LD H,B", Ld, reg(H), reg(B), 1, 4, "----"),
    op!(0x61, "LD", "LD H,C", Ld, reg(H), reg(C), 1, 4, "----"),
    op!(0x62, "LD", "LD H,D", Ld, reg(H), reg(D), 1, 4, "----"),
    op!(0x63, "LD", "LD H,E", Ld, reg(H), reg(E), 1, 4, "----"),
    op!(0x64, "LD", "LD H,H", Ld, reg(H), reg(H), 1, 4, "----"),
    op!(0x65, "LD", "LD H,L", Ld, reg(H), reg(L), 1, 4, "----"),
    op!(0x66, "LD", "LD H,(HL)", Ld, reg(H), load(HL), 1, 8, "----"),
    op!(0x67, "LD", "LD H,A", Ld, reg(H), reg(A), 1, 4, "----"),
    op!(0x68, "LD", "LD L,B", Ld, reg(L), reg(B), 1, 4, "----"),
    op!(0x69, "LD", "LD L,C", Ld, reg(L), reg(C), 1, 4, "----"),
    op!(0x6A, "LD", "LD L,D", Ld, reg(L), reg(D), 1, 4, "----"),
    op!(0x6B, "LD", "LD L,E", Ld, reg(L), reg(E), 1, 4, "----"),
    op!(0x6C, "LD", "LD L,H", Ld, reg(L), reg(H), 1, 4, "----"),
    op!(0x6D, "LD", "LD L,L", Ld, reg(L), reg(L), 1, 4, "----"),
    op!(0x6E, "LD", "LD L,(HL)", Ld, reg(L), load(HL), 1, 8, "----"),
    op!(0x6F, "LD", "LD L,A", Ld, reg(L), reg(A), 1, 4, "----"),
    op!(0x70, "LD", "LD (HL),B", Ld, store(HL), reg(B), 1, 8, "----"),
    op!(0x71, "LD", "LD (HL),C", Ld, store(HL), reg(C), 1, 8, "----"),
    op!(0x72, "LD", "LD (HL),D", Ld, store(HL), reg(D), 1, 8, "----"),
    op!(0x73, "LD", "LD (HL),E", Ld, store(HL), reg(E), 1, 8, "----"),
    op!(0x74, "LD", "LD (HL),H", Ld, store(HL), reg(H), 1, 8, "----"),
    op!(0x75, "LD", "LD (HL),L", Ld, store(HL), reg(L), 1, 8, "----"),
    op!(0x76, "HALT", "HALT", Halt, NONE, NONE, 1, 4, "----"),
    op!(0x77, "LD", "LD (HL),A", Ld, store(HL), reg(A), 1, 8, "----"),
    op!(0x78, "LD", "LD A,B", Ld, reg(A), reg(B), 1, 4, "----"),
    op!(0x79, "LD", "LD A,C", Ld, reg(A), reg(C), 1, 4, "----"),
    op!(0x7A, "LD", "LD A,D", Ld, reg(A), reg(D), 1, 4, "----"),
    op!(0x7B, "LD", "LD A,E", Ld, reg(A), reg(E), 1, 4, "----"),
    op!(0x7C, "LD", "LD A,H", Ld, reg(A), reg(H), 1, 4, "----"),
    op!(0x7D, "LD", "LD A,L", Ld, reg(A), reg(L), 1, 4, "----"),
    op!(0x7E, "LD", "LD A,(HL)", Ld, reg(A), load(HL), 1, 8, "----"),
    op!(0x7F, "LD", "LD A,A", Ld, reg(A), reg(A), 1, 4, "----"),
    op!(0x80, "ADD", "ADD A,B", Add, reg(A), reg(B), 1, 4, "Z0HC"),
    op!(0x81, "ADD", "ADD A,C", Add, reg(A), reg(C), 1, 4, "Z0HC"),
    op!(0x82, "ADD", "ADD A,D", Add, reg(A), reg(D), 1, 4, "Z0HC"),
    op!(0x83, "ADD", "ADD A,E", Add, reg(A), reg(E), 1, 4, "Z0HC"),
    op!(0x84, "ADD", "ADD A,H", Add, reg(A), reg(H), 1, 4, "Z0HC"),
    op!(0x85, "ADD", "ADD A,L", Add, reg(A), reg(L), 1, 4, "Z0HC"),
    op!(0x86, "ADD", "ADD A,(HL)", Add, reg(A), load(HL), 1, 8, "Z0HC"),
    op!(0x87, "ADD", "ADD A,A", Add, reg(A), reg(A), 1, 4, "Z0HC"),
    op!(0x88, "ADC", "ADC A,B", Adc, reg(A), reg(B), 1, 4, "Z0HC"),
    op!(0x89, "ADC", "ADC A,C", Adc, reg(A), reg(C), 1, 4, "Z0HC"),
    op!(0x8A, "ADC", "ADC A,D", Adc, reg(A), reg(D), 1, 4, "Z0HC"),
    op!(0x8B, "ADC", "ADC A,E", Adc, reg(A), reg(E), 1, 4, "Z0HC"),
    op!(0x8C, "ADC", "ADC A,H", Adc, reg(A), reg(H), 1, 4, "Z0HC"),
    op!(0x8D, "ADC", "ADC A,L", Adc, reg(A), reg(L), 1, 4, "Z0HC"),
    op!(0x8E, "ADC", "ADC A,(HL)", Adc, reg(A), load(HL), 1, 8, "Z0HC"),
    op!(0x8F, "ADC", "ADC A,A", Adc, reg(A), reg(A), 1, 4, "Z0HC"),
    op!(0x90, "SUB", "SUB B", Sub, reg(A), reg(B), 1, 4, "Z1HC"),
    op!(0x91, "SUB", "SUB C", Sub, reg(A), reg(C), 1, 4, "Z1HC"),
    op!(0x92, "SUB", "SUB D", Sub, reg(A), reg(D), 1, 4, "Z1HC"),
    op!(0x93, "SUB", "SUB E", Sub, reg(A), reg(E), 1, 4, "Z1HC"),
    op!(0x94, "SUB", "SUB H", Sub, reg(A), reg(H), 1, 4, "Z1HC"),
    op!(0x95, "SUB", "SUB L", Sub, reg(A), reg(L), 1, 4, "Z1HC"),
    op!(0x96, "SUB", "SUB (HL)", Sub, reg(A), load(HL), 1, 8, "Z1HC"),
    op!(0x97, "SUB", "SUB A", Sub, reg(A), reg(A), 1, 4, "Z1HC"),
    op!(0x98, "SBC", "SBC A,B", Sbc, reg(A), reg(B), 1, 4, "Z1HC"),
    op!(0x99, "SBC", "SBC A,C", Sbc, reg(A), reg(C), 1, 4, "Z1HC"),
    op!(0x9A, "SBC", "SBC A,D", Sbc, reg(A), reg(D), 1, 4, "Z1HC"),
    op!(0x9B, "SBC", "SBC A,E", Sbc, reg(A), reg(E), 1, 4, "Z1HC"),
    op!(0x9C, "SBC", "SBC A,H", Sbc, reg(A), reg(H), 1, 4, "Z1HC"),
    op!(0x9D, "SBC", "SBC A,L", Sbc, reg(A), reg(L), 1, 4, "Z1HC"),
    op!(0x9E, "SBC", "SBC A,(HL)", Sbc, reg(A), load(HL), 1, 8, "Z1HC"),
    op!(0x9F, "SBC", "SBC A,A", Sbc, reg(A), reg(A), 1, 4, "Z1HC"),
    op!(0xA0, "AND", "AND B", And, reg(A), reg(B), 1, 4, "Z010"),
    op!(0xA1, "AND", "AND C", And, reg(A), reg(C), 1, 4, "Z010"),
    op!(0xA2, "AND", "AND D", And, reg(A), reg(D), 1, 4, "Z010"),
    op!(0xA3, "AND", "AND E", And, reg(A), reg(E), 1, 4, "Z010"),
    op!(0xA4, "AND", "AND H", And, reg(A), reg(H), 1, 4, "Z010"),
    op!(0xA5, "AND", "AND L", And, reg(A), reg(L), 1, 4, "Z010"),
    op!(0xA6, "AND", "AND (HL)", And, reg(A), load(HL), 1, 8, "Z010"),
    op!(0xA7, "AND", "AND A", And, reg(A), reg(A), 1, 4, "Z010"),
    op!(0xA8, "XOR", "XOR B", Xor, reg(A), reg(B), 1, 4, "Z000"),
    op!(0xA9, "XOR", "XOR C", Xor, reg(A), reg(C), 1, 4, "Z000"),
    op!(0xAA, "XOR", "XOR D", Xor, reg(A), reg(D), 1, 4, "Z000"),
    op!(0xAB, "XOR", "XOR E", Xor, reg(A), reg(E), 1, 4, "Z000"),
    op!(0xAC, "XOR", "XOR H", Xor, reg(A), reg(H), 1, 4, "Z000"),
    op!(0xAD, "XOR", "XOR L", Xor, reg(A), reg(L), 1, 4, "Z000"),
    op!(0xAE, "XOR", "XOR (HL)", Xor, reg(A), load(HL), 1, 8, "Z000"),
    op!(0xAF, "XOR", "XOR A", Xor, reg(A), reg(A), 1, 4, "Z000"),
    op!(0xB0, "OR", "OR B", Or, reg(A), reg(B), 1, 4, "Z000"),
    op!(0xB1, "OR", "OR C", Or, reg(A), reg(C), 1, 4, "Z000"),
    op!(0xB2, "OR", "OR D", Or, reg(A), reg(D), 1, 4, "Z000"),
    op!(0xB3, "OR", "OR E", Or, reg(A), reg(E), 1, 4, "Z000"),
    op!(0xB4, "OR", "OR H", Or, reg(A), reg(H), 1, 4, "Z000"),
    op!(0xB5, "OR", "OR L", Or, reg(A), reg(L), 1, 4, "Z000"),
    op!(0xB6, "OR", "OR (HL)", Or, reg(A), load(HL), 1, 8, "Z000"),
    op!(0xB7, "OR", "OR A", Or, reg(A), reg(A), 1, 4, "Z000"),
    op!(0xB8, "CP", "CP B", Cp, reg(A), reg(B), 1, 4, "Z1HC"),
    op!(0xB9, "CP", "CP C", Cp, reg(A), reg(C), 1, 4, "Z1HC"),
    op!(0xBA, "CP", "CP D", Cp, reg(A), reg(D), 1, 4, "Z1HC"),
    op!(0xBB, "CP", "CP E", Cp, reg(A), reg(E), 1, 4, "Z1HC"),
    op!(0xBC, "CP", "CP H", Cp, reg(A), reg(H), 1, 4, "Z1HC"),
    op!(0xBD, "CP", "CP L", Cp, reg(A), reg(L), 1, 4, "Z1HC"),
    op!(0xBE, "CP", "CP (HL)", Cp, reg(A), load(HL), 1, 8, "Z1HC"),
    op!(0xBF, "CP", "CP A", Cp, reg(A), reg(A), 1, 4, "Z1HC"),
    op!(0xC0, "RET", "RET NZ", Ret, cond(NotZero), NONE, 1, (20, 8), "----"),
    op!(0xC1, "POP", "POP BC", Pop, pair(BC), NONE, 1, 12, "----"),
    op!(0xC2, "JP", "JP NZ,a16", Jp, cond(NotZero), D16, 3, (16, 12), "----"),
    op!(0xC3, "JP", "JP a16", Jp, D16, NONE, 3, 16, "----"),
    op!(0xC4, "CALL", "CALL NZ,a16", Call, cond(NotZero), D16, 3, (24, 12), "----"),
    op!(0xC5, "PUSH", "PUSH BC", Push, pair(BC), NONE, 1, 16, "----"),
    op!(0xC6, "ADD", "ADD A,d8", Add, reg(A), D8, 2, 8, "Z0HC"),
    op!(0xC7, "RST", "RST 00H", Rst, vector(0x00), NONE, 1, 16, "----"),
    op!(0xC8, "RET", "RET Z", Ret, cond(Zero), NONE, 1, (20, 8), "----"),
    op!(0xC9, "RET", "RET", Ret, NONE, NONE, 1, 16, "----"),
    op!(0xCA, "JP", "JP Z,a16", Jp, cond(Zero), D16, 3, (16, 12), "----"),
    op!(0xCB, "PREFIX", "PREFIX CB", Prefix, PREFIX, NONE, 2, 4, "----"),
    op!(0xCC, "CALL", "CALL Z,a16", Call, cond(Zero), D16, 3, (24, 12), "----"),
    op!(0xCD, "CALL", "CALL a16", Call, D16, NONE, 3, 24, "----"),
    op!(0xCE, "ADC", "ADC A,d8", Adc, reg(A), D8, 2, 8, "Z0HC"),
    op!(0xCF, "RST", "RST 08H", Rst, vector(0x08), NONE, 1, 16, "----"),
    op!(0xD0, "RET", "RET NC", Ret, cond(NotCarry), NONE, 1, (20, 8), "----"),
    op!(0xD1, "POP", "POP DE", Pop, pair(DE), NONE, 1, 12, "----"),
    op!(0xD2, "JP", "JP NC,a16", Jp, cond(NotCarry), D16, 3, (16, 12), "----"),
    invalid!(0xD3),
    op!(0xD4, "CALL", "CALL NC,a16", Call, cond(NotCarry), D16, 3, (24, 12), "----"),
    op!(0xD5, "PUSH", "PUSH DE", Push, pair(DE), NONE, 1, 16, "----"),
    op!(0xD6, "SUB", "SUB d8", Sub, reg(A), D8, 2, 8, "Z1HC"),
    op!(0xD7, "RST", "RST 10H", Rst, vector(0x10), NONE, 1, 16, "----"),
    op!(0xD8, "RET", "RET C", Ret, cond(Carry), NONE, 1, (20, 8), "----"),
    op!(0xD9, "RETI", "RETI", Reti, NONE, NONE, 1, 16, "----"),
    op!(0xDA, "JP", "JP C,a16", Jp, cond(Carry), D16, 3, (16, 12), "----"),
    invalid!(0xDB),
    op!(0xDC, "CALL", "CALL C,a16", Call, cond(Carry), D16, 3, (24, 12), "----"),
    invalid!(0xDD),
    op!(0xDE, "SBC", "SBC A,d8", Sbc, reg(A), D8, 2, 8, "Z1HC"),
    op!(0xDF, "RST", "RST 18H", Rst, vector(0x18), NONE, 1, 16, "----"),
    op!(0xE0, "LDH", "LDH (a8),A", Ldh, A8_STORE, reg(A), 2, 12, "----"),
    op!(0xE1, "POP", "POP HL", Pop, pair(HL), NONE, 1, 12, "----"),
    op!(0xE2, "LD", "LD (C),A", Ldh, C_STORE, reg(A), 1, 8, "----"),
    invalid!(0xE3),
    invalid!(0xE4),
    op!(0xE5, "PUSH", "PUSH HL", Push, pair(HL), NONE, 1, 16, "----"),
    op!(0xE6, "AND", "AND d8", And, reg(A), D8, 2, 8, "Z010"),
    op!(0xE7, "RST", "RST 20H", Rst, vector(0x20), NONE, 1, 16, "----"),
    op!(0xE8, "ADD", "ADD SP,r8", Add, pair(SP), R8, 2, 16, "00HC"),
    op!(0xE9, "JP", "JP HL", Jp, pair(HL), NONE, 1, 4, "----"),
    op!(0xEA, "LD", "LD (a16),A", Ld, A16_STORE, reg(A), 3, 16, "----"),
    invalid!(0xEB),
    invalid!(0xEC),
    invalid!(0xED),
    op!(0xEE, "XOR", "XOR d8", Xor, reg(A), D8, 2, 8, "Z000"),
    op!(0xEF, "RST", "RST 28H", Rst, vector(0x28), NONE, 1, 16, "----"),
    op!(0xF0, "LDH", "LDH A,(a8)", Ldh, reg(A), A8_LOAD, 2, 12, "----"),
    op!(0xF1, "POP", "POP AF", Pop, pair(AF), NONE, 1, 12, "ZNHC"),
    op!(0xF2, "LD", "LD A,(C)", Ldh, reg(A), C_LOAD, 1, 8, "----"),
    op!(0xF3, "DI", "DI", Di, NONE, NONE, 1, 4, "----"),
    invalid!(0xF4),
    op!(0xF5, "PUSH", "PUSH AF", Push, pair(AF), NONE, 1, 16, "----"),
    op!(0xF6, "OR", "OR d8", Or, reg(A), D8, 2, 8, "Z000"),
    op!(0xF7, "RST", "RST 30H", Rst, vector(0x30), NONE, 1, 16, "----"),
    op!(0xF8, "LD", "LD HL,SP+r8", Ldhl, pair(SP), R8, 2, 12, "00HC"),
    op!(0xF9, "LD", "LD SP,HL", Ld, pair(SP), pair(HL), 1, 8, "----"),
    op!(0xFA, "LD", "LD A,(a16)", Ld, reg(A), A16_LOAD, 3, 16, "----"),
    op!(0xFB, "EI", "EI", Ei, NONE, NONE, 1, 4, "----"),
    invalid!(0xFC),
    invalid!(0xFD),
    op!(0xFE, "CP", "CP d8", Cp, reg(A), D8, 2, 8, "Z1HC"),
    op!(0xFF, "RST", "RST 38H", Rst, vector(0x38), NONE, 1, 16, "----"),
];

/// Operand order of the `z` field (bits 2:0) in prefixed opcodes. The empty slot is `(HL)`.
const PREFIXED_TARGETS: [Option<Reg>; 8] = [
    Some(B),
    Some(C),
    Some(D),
    Some(E),
    Some(H),
    Some(L),
    None,
    Some(A),
];

/// Rotate and shift operations selected by the `y` field (bits 5:3) when `x` is 0.
const ROTATIONS: [(&str, InstructionClass, &str); 8] = [
    ("RLC", InstructionClass::Rlc, "Z00C"),
    ("RRC", InstructionClass::Rrc, "Z00C"),
    ("RL", InstructionClass::Rl, "Z00C"),
    ("RR", InstructionClass::Rr, "Z00C"),
    ("SLA", InstructionClass::Sla, "Z00C"),
    ("SRA", InstructionClass::Sra, "Z00C"),
    ("SWAP", InstructionClass::Swap, "Z000"),
    ("SRL", InstructionClass::Srl, "Z00C"),
];

/// Builds the 0xCB-prefixed table, resolving the x/y/z opcode fields into explicit
/// operands.
pub fn build_prefixed_table() -> [InstructionDescriptor; 256] {
    std::array::from_fn(|index| prefixed_descriptor(index as u8))
}

fn prefixed_descriptor(opcode: u8) -> InstructionDescriptor {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0b111;
    let z = opcode & 0b111;

    let target = PREFIXED_TARGETS[usize::from(z)];
    let (target_name, read_target, write_target) = match target {
        Some(target) => (target.to_string(), reg(target), reg(target)),
        None => (String::from("(HL)"), load(HL), store(HL)),
    };

    let (mnemonic, class, operand_a, operand_b, flags, memory_cycles) = match x {
        0 => {
            let (mnemonic, class, flags) = ROTATIONS[usize::from(y)];
            (mnemonic, class, write_target, NONE, flags, 16)
        }
        1 => ("BIT", InstructionClass::Bit, bit(y), read_target, "Z01-", 12),
        2 => ("RES", InstructionClass::Res, bit(y), write_target, "----", 16),
        _ => ("SET", InstructionClass::Set, bit(y), write_target, "----", 16),
    };

    let assembly = if x == 0 {
        format!("{} {}", mnemonic, target_name)
    } else {
        format!("{} {},{}", mnemonic, y, target_name)
    };
    let cycles = if target.is_none() { memory_cycles } else { 8 };

    InstructionDescriptor::new(
        mnemonic,
        Cow::Owned(assembly),
        opcode,
        class,
        operand_a,
        operand_b,
        2,
        Timing::new(cycles, cycles),
        FlagPolicy::from_notation(flags),
    )
}

const fn bit(index: u8) -> OperandSpec {
    OperandSpec::new(Operand::Bit(index), Access::Direct)
}
