mod common;

use lr35902::cpu::{decode, lookup, InstructionClass, OperandType, Table, PREFIX_OPCODE};
use lr35902::MemoryBus;

#[test]
fn test_tables_are_total() {
    for opcode in 0..=u8::MAX {
        assert_eq!(opcode, lookup(Table::Primary, opcode).opcode);
        assert_eq!(opcode, lookup(Table::Prefixed, opcode).opcode);
    }
}

#[test]
fn test_only_cb_is_prefix() {
    for opcode in 0..=u8::MAX {
        assert_eq!(
            opcode == PREFIX_OPCODE,
            lookup(Table::Primary, opcode).is_prefix
        );
        assert!(!lookup(Table::Prefixed, opcode).is_prefix);
    }
}

#[test]
fn test_byte_length_matches_operand_shape() {
    for table in [Table::Primary, Table::Prefixed] {
        for opcode in 0..=u8::MAX {
            let descriptor = lookup(table, opcode);
            assert_eq!(
                descriptor.expected_length(table),
                descriptor.byte_length,
                "{} {:#04x} {}",
                table,
                opcode,
                descriptor.assembly
            );
            assert!((1..=3).contains(&descriptor.byte_length));
        }
    }
}

#[test]
fn test_decoded_length_of_synthetic_streams() {
    for opcode in 0..=u8::MAX {
        let mut memory = MemoryBus::with_program(common::ORIGIN, &[opcode, 0x12, 0x34]).unwrap();
        let decoded = decode(&mut memory, common::ORIGIN).unwrap();
        // The escape itself decodes to the prefixed instruction named by the next byte.
        let expected = if opcode == PREFIX_OPCODE {
            lookup(Table::Prefixed, 0x12).byte_length
        } else {
            lookup(Table::Primary, opcode).byte_length
        };
        assert_eq!(expected, decoded.length(), "{:#04x}", opcode);
        assert_eq!(
            common::ORIGIN + u16::from(expected),
            decoded.next_address()
        );
    }

    for opcode in 0..=u8::MAX {
        let mut memory = MemoryBus::with_program(common::ORIGIN, &[PREFIX_OPCODE, opcode]).unwrap();
        let decoded = decode(&mut memory, common::ORIGIN).unwrap();
        assert_eq!(2, decoded.length());
        assert_eq!(opcode, decoded.descriptor().opcode);
    }
}

#[test]
fn test_split_timing_only_on_conditional_entries() {
    for opcode in 0..=u8::MAX {
        let descriptor = lookup(Table::Primary, opcode);
        if descriptor.timing.taken != descriptor.timing.not_taken {
            assert!(descriptor.is_conditional(), "{}", descriptor.assembly);
            assert!(descriptor.timing.taken > descriptor.timing.not_taken);
        }
    }
}

#[test]
fn test_prefixed_timings_include_prefix_fetch() {
    for opcode in 0..=u8::MAX {
        let descriptor = lookup(Table::Prefixed, opcode);
        let via_hl = opcode & 0b111 == 6;
        let expected = match (via_hl, descriptor.class) {
            (false, _) => 8,
            (true, InstructionClass::Bit) => 12,
            (true, _) => 16,
        };
        assert_eq!(expected, descriptor.timing.taken, "{}", descriptor.assembly);
    }
}

#[test]
fn test_assembly_starts_with_mnemonic() {
    for table in [Table::Primary, Table::Prefixed] {
        for opcode in 0..=u8::MAX {
            let descriptor = lookup(table, opcode);
            assert!(
                descriptor.assembly.starts_with(descriptor.mnemonic),
                "{}",
                descriptor.assembly
            );
        }
    }
}

#[test]
fn test_illegal_opcodes_are_one_byte() {
    let illegal: Vec<u8> = (0..=u8::MAX)
        .filter(|&opcode| lookup(Table::Primary, opcode).class == InstructionClass::Invalid)
        .collect();
    assert_eq!(11, illegal.len());
    for opcode in illegal {
        let descriptor = lookup(Table::Primary, opcode);
        assert_eq!(1, descriptor.byte_length);
        assert_eq!("ILLEGAL", descriptor.mnemonic);
    }
}

#[test]
fn test_operand_types() {
    let ld_bc = lookup(Table::Primary, 0x01);
    assert_eq!(OperandType::Reg16, ld_bc.operand_a.kind());
    assert_eq!(OperandType::Imm16, ld_bc.operand_b.kind());

    let jr_nz = lookup(Table::Primary, 0x20);
    assert_eq!(OperandType::Condition, jr_nz.operand_a.kind());
    assert_eq!(OperandType::Disp8, jr_nz.operand_b.kind());

    let rst = lookup(Table::Primary, 0xdf);
    assert_eq!(OperandType::Vector, rst.operand_a.kind());
    assert_eq!(OperandType::None, rst.operand_b.kind());

    let bit = lookup(Table::Prefixed, 0x46);
    assert_eq!(OperandType::Bit, bit.operand_a.kind());
    assert_eq!(OperandType::Reg16, bit.operand_b.kind());
    assert!(bit.operand_b.is_memory());
}
