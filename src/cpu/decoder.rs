use std::fmt;

use log::trace;

use crate::component::Addressable;
use crate::cpu::catalog::{
    lookup, InstructionClass, InstructionDescriptor, OperandSpec, OperandType, Table,
};
use crate::error::{Error, Result};

/// An immediate value read from the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandValue {
    None,
    Byte(u8),
    Word(u16),
    Displacement(i8),
}

/// One fetched instruction: its descriptor plus the immediates that followed the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    descriptor: &'static InstructionDescriptor,
    address: u16,
    length: u8,
    operands: [OperandValue; 2],
}

impl DecodedInstruction {
    /// Builds a decoded instruction directly, taking the length from the descriptor.
    pub fn from_parts(
        descriptor: &'static InstructionDescriptor,
        address: u16,
        operands: [OperandValue; 2],
    ) -> Self {
        Self {
            descriptor,
            address,
            length: descriptor.byte_length,
            operands,
        }
    }

    pub fn descriptor(&self) -> &'static InstructionDescriptor {
        self.descriptor
    }

    /// Address of the first byte (the opcode, or the prefix byte).
    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    /// Address of the byte following this instruction.
    pub fn next_address(&self) -> u16 {
        self.address.wrapping_add(self.length.into())
    }

    pub fn operand_a(&self) -> OperandValue {
        self.operands[0]
    }

    pub fn operand_b(&self) -> OperandValue {
        self.operands[1]
    }

    pub fn operand_values(&self) -> [(&'static OperandSpec, OperandValue); 2] {
        [
            (&self.descriptor.operand_a, self.operands[0]),
            (&self.descriptor.operand_b, self.operands[1]),
        ]
    }
}

impl fmt::Display for DecodedInstruction {
    /// Assembly text with the immediates filled in.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.descriptor.assembly.to_string();
        for value in self.operands {
            text = match value {
                OperandValue::None => text,
                OperandValue::Byte(byte) => {
                    replace_placeholder(&text, &["d8", "a8"], &format!("${:02X}", byte))
                }
                OperandValue::Word(word) => {
                    replace_placeholder(&text, &["d16", "a16"], &format!("${:04X}", word))
                }
                // Relative jumps show their target, SP arithmetic shows the signed offset.
                OperandValue::Displacement(displacement)
                    if self.descriptor.class == InstructionClass::Jr =>
                {
                    let target = self.next_address().wrapping_add_signed(displacement.into());
                    replace_placeholder(&text, &["r8"], &format!("${:04X}", target))
                }
                OperandValue::Displacement(displacement) => {
                    replace_placeholder(&text, &["+r8", "r8"], &format!("{:+}", displacement))
                }
            };
        }
        write!(f, "{}", text)
    }
}

fn replace_placeholder(text: &str, placeholders: &[&str], value: &str) -> String {
    placeholders
        .iter()
        .find(|placeholder| text.contains(*placeholder))
        .map(|placeholder| text.replacen(placeholder, value, 1))
        .unwrap_or_else(|| text.to_string())
}

/// Reads an instruction stream from memory through an advancing cursor.
pub struct Decoder<'a> {
    memory: &'a mut dyn Addressable,
    start: u16,
    cursor: u16,
}

impl<'a> Decoder<'a> {
    pub fn new(memory: &'a mut dyn Addressable, start: u16) -> Self {
        Self {
            memory,
            start,
            cursor: start,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        let byte = self.memory.read_u8(self.cursor.into())?;
        self.cursor = self.cursor.wrapping_add(1);
        Ok(byte)
    }

    fn next_word(&mut self) -> Result<u16> {
        let bytes = [self.next_byte()?, self.next_byte()?];
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_operand(&mut self, spec: &OperandSpec) -> Result<OperandValue> {
        let value = match spec.kind() {
            OperandType::Imm8 => OperandValue::Byte(self.next_byte()?),
            OperandType::Disp8 => OperandValue::Displacement(self.next_byte()? as i8),
            OperandType::Imm16 => OperandValue::Word(self.next_word()?),
            _ => OperandValue::None,
        };
        Ok(value)
    }

    /// Decodes the instruction at the start address.
    pub fn decode(mut self) -> Result<DecodedInstruction> {
        let opcode = self.next_byte()?;
        let mut descriptor = lookup(Table::Primary, opcode);
        let mut table = Table::Primary;
        if descriptor.is_prefix {
            let opcode = self.next_byte()?;
            descriptor = lookup(Table::Prefixed, opcode);
            table = Table::Prefixed;
        }

        let operands = [
            self.read_operand(&descriptor.operand_a)?,
            self.read_operand(&descriptor.operand_b)?,
        ];

        let length = self.cursor.wrapping_sub(self.start);
        if length != u16::from(descriptor.byte_length) {
            return Err(Error::catalog_defect(format!(
                "{} opcode {:#04x} decoded to {} bytes, descriptor says {}",
                table, descriptor.opcode, length, descriptor.byte_length
            )));
        }

        trace!(
            "decoded {} at {:#06x} ({} bytes)",
            descriptor.assembly,
            self.start,
            length
        );

        Ok(DecodedInstruction {
            descriptor,
            address: self.start,
            length: descriptor.byte_length,
            operands,
        })
    }
}

/// Decodes the single instruction starting at `address`.
pub fn decode(memory: &mut dyn Addressable, address: u16) -> Result<DecodedInstruction> {
    Decoder::new(memory, address).decode()
}

/// Decodes `count` consecutive instructions starting at `address` without executing them.
pub fn disassemble(
    memory: &mut dyn Addressable,
    address: u16,
    count: usize,
) -> Result<Vec<DecodedInstruction>> {
    let mut instructions = Vec::with_capacity(count);
    let mut address = address;
    for _ in 0..count {
        let instruction = decode(memory, address)?;
        address = instruction.next_address();
        instructions.push(instruction);
    }
    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;

    fn decode_bytes(bytes: &[u8]) -> DecodedInstruction {
        let mut memory = MemoryBus::with_program(0x100, bytes).unwrap();
        decode(&mut memory, 0x100).unwrap()
    }

    #[test]
    fn test_decode_immediate_word_little_endian() {
        let instruction = decode_bytes(&[0x01, 0x34, 0x12]);
        assert_eq!(3, instruction.length());
        assert_eq!(OperandValue::Word(0x1234), instruction.operand_b());
        assert_eq!(0x103, instruction.next_address());
        assert_eq!("LD BC,$1234", instruction.to_string());
    }

    #[test]
    fn test_decode_prefixed_instruction() {
        let instruction = decode_bytes(&[0xcb, 0x40]);
        assert_eq!(2, instruction.length());
        assert_eq!(InstructionClass::Bit, instruction.descriptor().class);
        assert_eq!("BIT 0,B", instruction.to_string());
    }

    #[test]
    fn test_decode_displacement() {
        let instruction = decode_bytes(&[0x20, 0xfb]);
        assert_eq!(OperandValue::Displacement(-5), instruction.operand_b());
        assert_eq!("JR NZ,$00FD", instruction.to_string());

        let instruction = decode_bytes(&[0xf8, 0x05]);
        assert_eq!("LD HL,SP+5", instruction.to_string());

        let instruction = decode_bytes(&[0xe8, 0xfe]);
        assert_eq!("ADD SP,-2", instruction.to_string());
    }

    #[test]
    fn test_decode_wraps_at_end_of_memory() {
        let mut memory = MemoryBus::new();
        memory.data[0xffff] = 0xc3;
        memory.data[0x0000] = 0x50;
        memory.data[0x0001] = 0x01;
        let instruction = decode(&mut memory, 0xffff).unwrap();
        assert_eq!(OperandValue::Word(0x0150), instruction.operand_a());
        assert_eq!(0x0002, instruction.next_address());
    }

    #[test]
    fn test_disassemble_run() {
        let mut memory =
            MemoryBus::with_program(0x100, &[0x00, 0x3e, 0x42, 0xe0, 0x80, 0xc9]).unwrap();
        let listing: Vec<String> = disassemble(&mut memory, 0x100, 4)
            .unwrap()
            .iter()
            .map(|instruction| instruction.to_string())
            .collect();
        assert_eq!(vec!["NOP", "LD A,$42", "LDH ($80),A", "RET"], listing);
    }
}
