mod common;

use common::{run_until_halt, setup, step, ORIGIN, SCRATCH};
use lr35902::cpu::{lookup, Flag, InstructionClass, Reg, RunState, Table, WReg};
use lr35902::{Address, Addressable, Error, MemoryBus, Steppable};

const ALL_FLAGS: [Flag; 4] = [Flag::Zero, Flag::Subtract, Flag::HalfCarry, Flag::Carry];

fn flags_of(cpu: &lr35902::cpu::Cpu) -> [bool; 4] {
    ALL_FLAGS.map(|flag| cpu.flag(flag))
}

#[test]
fn test_add_half_carry() {
    let (mut cpu, mut memory) = setup(&[0x80]);
    cpu.set_register(Reg::A, 0x0f);
    cpu.set_register(Reg::B, 0x01);

    assert_eq!(4, step(&mut cpu, &mut memory));
    assert_eq!(0x10, cpu.get_register(Reg::A));
    assert_eq!([false, false, true, false], flags_of(&cpu));
}

#[test]
fn test_add_wraps_to_zero() {
    let (mut cpu, mut memory) = setup(&[0x80]);
    cpu.set_register(Reg::A, 0xff);
    cpu.set_register(Reg::B, 0x01);

    step(&mut cpu, &mut memory);
    assert_eq!(0x00, cpu.get_register(Reg::A));
    assert_eq!([true, false, true, true], flags_of(&cpu));
}

#[test]
fn test_halt_blocks_stepping_until_resumed() {
    let (mut cpu, mut memory) = setup(&[0x76, 0x00]);

    assert_eq!(4, step(&mut cpu, &mut memory));
    assert_eq!(RunState::Halted, cpu.run_state());
    assert_eq!(ORIGIN + 1, cpu.pc());

    assert_eq!(
        Err(Error::InvalidRunState(RunState::Halted)),
        cpu.step(&mut memory)
    );
    assert_eq!(ORIGIN + 1, cpu.pc());

    cpu.resume();
    assert_eq!(4, step(&mut cpu, &mut memory));
    assert_eq!(ORIGIN + 2, cpu.pc());
}

#[test]
fn test_stop_consumes_two_bytes() {
    let (mut cpu, mut memory) = setup(&[0x10, 0x00]);
    step(&mut cpu, &mut memory);
    assert_eq!(RunState::Stopped, cpu.run_state());
    assert_eq!(ORIGIN + 2, cpu.pc());
    assert!(cpu.step(&mut memory).is_err());
}

#[test]
fn test_jr_nz_not_taken() {
    let (mut cpu, mut memory) = setup(&[0x20, 0x05]);
    cpu.set_flag(Flag::Zero, true);

    assert_eq!(8, step(&mut cpu, &mut memory));
    assert_eq!(ORIGIN + 2, cpu.pc());
}

#[test]
fn test_jr_nz_taken() {
    let (mut cpu, mut memory) = setup(&[0x20, 0x05]);
    cpu.set_flag(Flag::Zero, false);

    assert_eq!(12, step(&mut cpu, &mut memory));
    assert_eq!(ORIGIN + 2 + 5, cpu.pc());
}

#[test]
fn test_jr_backwards() {
    let (mut cpu, mut memory) = setup(&[0x00, 0x18, 0xfd]);
    step(&mut cpu, &mut memory);
    assert_eq!(12, step(&mut cpu, &mut memory));
    assert_eq!(ORIGIN, cpu.pc());
}

#[test]
fn test_conditional_jp_and_call_timings() {
    let (mut cpu, mut memory) = setup(&[0xca, 0x00, 0x02, 0xc4, 0x00, 0x03]);
    cpu.set_flag(Flag::Zero, false);

    assert_eq!(12, step(&mut cpu, &mut memory));
    assert_eq!(ORIGIN + 3, cpu.pc());

    assert_eq!(24, step(&mut cpu, &mut memory));
    assert_eq!(0x0300, cpu.pc());
    assert_eq!(0xfffc, cpu.sp());
}

#[test]
fn test_bit_only_touches_its_flags() {
    let (mut cpu, mut memory) = setup(&[0xcb, 0x40]);
    cpu.set_register(Reg::B, 0xfe);
    cpu.set_flag(Flag::Subtract, true);
    cpu.set_flag(Flag::Carry, true);

    let descriptor = lookup(Table::Prefixed, 0x40);
    assert_eq!(2, descriptor.byte_length);
    assert_eq!(InstructionClass::Bit, descriptor.class);

    assert_eq!(8, step(&mut cpu, &mut memory));
    assert_eq!(0xfe, cpu.get_register(Reg::B));
    assert_eq!([true, false, true, true], flags_of(&cpu));
    assert_eq!(ORIGIN + 2, cpu.pc());
}

#[test]
fn test_untouched_flags_survive_repeated_execution() {
    for (table, opcode) in (0..=u8::MAX)
        .map(|opcode| (Table::Primary, opcode))
        .chain((0..=u8::MAX).map(|opcode| (Table::Prefixed, opcode)))
    {
        let descriptor = lookup(table, opcode);
        // The escape's own policy is never applied; its prefixed rows are covered below.
        if descriptor.class == InstructionClass::Invalid || descriptor.is_prefix {
            continue;
        }
        let program = match table {
            Table::Primary => [opcode, 0x12, 0x34],
            Table::Prefixed => [0xcb, opcode, 0x00],
        };

        for initial_f in [0x00u8, 0xf0, 0xa0, 0x50] {
            let (mut cpu, mut memory) = setup(&program);
            cpu.set_word_register(WReg::HL, SCRATCH);
            cpu.set_register(Reg::F, initial_f);

            for _ in 0..2 {
                cpu.set_word_register(WReg::PC, ORIGIN);
                cpu.resume();
                step(&mut cpu, &mut memory);
                let untouched = !descriptor.flag_mask & 0xf0;
                assert_eq!(
                    initial_f & untouched,
                    cpu.get_register(Reg::F) & untouched,
                    "{} with F={:#04x}",
                    descriptor.assembly,
                    initial_f
                );
            }
        }
    }
}

#[test]
fn test_pair_and_half_views_alias() {
    let (mut cpu, _) = setup(&[]);
    for (pair, high, low) in [
        (WReg::BC, Reg::B, Reg::C),
        (WReg::DE, Reg::D, Reg::E),
        (WReg::HL, Reg::H, Reg::L),
    ] {
        cpu.set_word_register(pair, 0xa55a);
        assert_eq!(0xa5, cpu.get_register(high));
        assert_eq!(0x5a, cpu.get_register(low));

        cpu.set_register(low, 0x01);
        assert_eq!(0xa501, cpu.get_word_register(pair));
    }

    cpu.set_word_register(WReg::AF, 0x12ff);
    assert_eq!(0x12f0, cpu.get_word_register(WReg::AF));
}

#[test]
fn test_illegal_opcode_is_an_error() {
    let (mut cpu, mut memory) = setup(&[0xfd]);
    assert_eq!(
        Err(Error::IllegalInstruction {
            opcode: 0xfd,
            address: ORIGIN
        }),
        cpu.step(&mut memory)
    );
}

#[test]
fn test_small_program() {
    // LD A,5; LD B,3; ADD A,B; LD HL,$C000; LD (HL),A; INC (HL); HALT
    let (mut cpu, mut memory) = setup(&[
        0x3e, 0x05, 0x06, 0x03, 0x80, 0x21, 0x00, 0xc0, 0x77, 0x34, 0x76,
    ]);
    let elapsed = run_until_halt(&mut cpu, &mut memory, 16);
    assert_eq!(8 + 8 + 4 + 12 + 8 + 12 + 4, elapsed);
    assert_eq!(0x09, memory.data[usize::from(SCRATCH)]);
    assert_eq!(0x08, cpu.get_register(Reg::A));
}

#[test]
fn test_countdown_loop() {
    // LD B,4; loop: DEC B; JR NZ,loop; HALT
    let (mut cpu, mut memory) = setup(&[0x06, 0x04, 0x05, 0x20, 0xfd, 0x76]);
    let elapsed = run_until_halt(&mut cpu, &mut memory, 32);
    assert_eq!(0, cpu.get_register(Reg::B));
    assert!(cpu.flag(Flag::Zero));
    assert_eq!(8 + 4 * 4 + 3 * 12 + 8 + 4, elapsed);
}

#[test]
fn test_push_pop_roundtrip() {
    // LD BC,$1234; PUSH BC; POP DE; HALT
    let (mut cpu, mut memory) = setup(&[0x01, 0x34, 0x12, 0xc5, 0xd1, 0x76]);
    run_until_halt(&mut cpu, &mut memory, 8);
    assert_eq!(0x1234, cpu.get_word_register(WReg::DE));
    assert_eq!(0xfffe, cpu.sp());
}

#[test]
fn test_serial_output() {
    // LD A,'O'; LDH ($01),A; LD A,$81; LDH ($02),A; HALT
    let (mut cpu, mut memory) = setup(&[0x3e, b'O', 0xe0, 0x01, 0x3e, 0x81, 0xe0, 0x02, 0x76]);
    run_until_halt(&mut cpu, &mut memory, 8);
    assert_eq!(b"O", memory.get_serial_port_data());
}

#[test]
fn test_interrupt_wakes_halted_core() {
    // EI; HALT; NOP
    let (mut cpu, mut memory) = setup(&[0xfb, 0x76, 0x00]);
    run_until_halt(&mut cpu, &mut memory, 4);
    assert!(cpu.interrupts_enabled());

    assert_eq!(20, cpu.service_interrupt(&mut memory, 0x0040).unwrap());
    assert_eq!(RunState::Running, cpu.run_state());
    assert_eq!(0x0040, cpu.pc());
    assert_eq!(0xfffc, cpu.sp());
    assert_eq!(0x02, memory.data[0xfffc]);
    assert_eq!(0x01, memory.data[0xfffd]);
}

#[test]
fn test_di_clears_interrupts() {
    let (mut cpu, mut memory) = setup(&[0xfb, 0xf3]);

    assert_eq!(4, step(&mut cpu, &mut memory));
    assert!(cpu.interrupts_enabled());
    assert_eq!(4, step(&mut cpu, &mut memory));
    assert!(!cpu.interrupts_enabled());
}

#[test]
fn test_res_register_and_memory() {
    // RES 0,A; RES 7,(HL)
    let (mut cpu, mut memory) = setup(&[0xcb, 0x87, 0xcb, 0xbe]);
    cpu.set_register(Reg::A, 0xff);
    cpu.set_register(Reg::F, 0xf0);
    cpu.set_word_register(WReg::HL, SCRATCH);
    memory.data[usize::from(SCRATCH)] = 0xff;

    assert_eq!(8, step(&mut cpu, &mut memory));
    assert_eq!(0xfe, cpu.get_register(Reg::A));
    assert_eq!(0xf0, cpu.get_register(Reg::F));

    assert_eq!(16, step(&mut cpu, &mut memory));
    assert_eq!(0x7f, memory.data[usize::from(SCRATCH)]);
    assert_eq!(0xf0, cpu.get_register(Reg::F));
}

#[test]
fn test_adc_adds_carry_in() {
    // ADC A,B; ADC A,B; ADC A,$00
    let (mut cpu, mut memory) = setup(&[0x88, 0x88, 0xce, 0x00]);
    cpu.set_register(Reg::A, 0x0e);
    cpu.set_register(Reg::B, 0x01);
    cpu.set_flag(Flag::Carry, true);

    assert_eq!(4, step(&mut cpu, &mut memory));
    assert_eq!(0x10, cpu.get_register(Reg::A));
    assert_eq!([false, false, true, false], flags_of(&cpu));

    step(&mut cpu, &mut memory);
    assert_eq!(0x11, cpu.get_register(Reg::A));
    assert_eq!([false, false, false, false], flags_of(&cpu));

    cpu.set_register(Reg::A, 0xff);
    cpu.set_flag(Flag::Carry, true);
    assert_eq!(8, step(&mut cpu, &mut memory));
    assert_eq!(0x00, cpu.get_register(Reg::A));
    assert_eq!([true, false, true, true], flags_of(&cpu));
}

#[test]
fn test_add_sp_signed_offset() {
    // ADD SP,-2; ADD SP,2
    let (mut cpu, mut memory) = setup(&[0xe8, 0xfe, 0xe8, 0x02]);
    cpu.set_flag(Flag::Zero, true);
    cpu.set_flag(Flag::Subtract, true);

    assert_eq!(16, step(&mut cpu, &mut memory));
    assert_eq!(0xfffc, cpu.sp());
    assert_eq!([false, false, true, true], flags_of(&cpu));

    assert_eq!(16, step(&mut cpu, &mut memory));
    assert_eq!(0xfffe, cpu.sp());
    assert_eq!([false, false, false, false], flags_of(&cpu));
}

#[test]
fn test_ld_absolute_address() {
    // LD ($C000),A; LD A,($C001)
    let (mut cpu, mut memory) = setup(&[0xea, 0x00, 0xc0, 0xfa, 0x01, 0xc0]);
    cpu.set_register(Reg::A, 0x5a);
    cpu.set_register(Reg::F, 0xa0);
    memory.data[0xc001] = 0x77;

    assert_eq!(16, step(&mut cpu, &mut memory));
    assert_eq!(0x5a, memory.data[0xc000]);

    assert_eq!(16, step(&mut cpu, &mut memory));
    assert_eq!(0x77, cpu.get_register(Reg::A));
    assert_eq!(0xa0, cpu.get_register(Reg::F));
    assert_eq!(ORIGIN + 6, cpu.pc());
}

/// A bus whose lower half is read-only.
struct ReadOnlyRom {
    memory: MemoryBus,
}

impl Addressable for ReadOnlyRom {
    fn read_u8(&mut self, address: Address) -> lr35902::Result<u8> {
        self.memory.read_u8(address)
    }

    fn write_u8(&mut self, address: Address, data: u8) -> lr35902::Result<()> {
        if address < 0x8000 {
            return Err(Error::from_address(address));
        }
        self.memory.write_u8(address, data)
    }
}

fn read_only_rom(program: &[u8]) -> (lr35902::cpu::Cpu, ReadOnlyRom) {
    let (cpu, memory) = setup(program);
    (cpu, ReadOnlyRom { memory })
}

#[test]
fn test_failed_call_leaves_core_untouched() {
    let (mut cpu, mut rom) = read_only_rom(&[0xcd, 0x00, 0x02]);
    cpu.set_word_register(WReg::SP, 0x1000);

    assert_eq!(Err(Error::from_address(0x0fff)), cpu.step(&mut rom));
    assert_eq!(ORIGIN, cpu.pc());
    assert_eq!(0x1000, cpu.sp());
}

#[test]
fn test_failed_push_keeps_stack_pointer() {
    let (mut cpu, mut rom) = read_only_rom(&[0xc5]);
    cpu.set_word_register(WReg::SP, 0x8001);
    cpu.set_word_register(WReg::BC, 0x1234);

    assert!(cpu.step(&mut rom).is_err());
    assert_eq!(ORIGIN, cpu.pc());
    assert_eq!(0x8001, cpu.sp());
}

#[test]
fn test_failed_ldi_keeps_hl() {
    let (mut cpu, mut rom) = read_only_rom(&[0x22]);
    cpu.set_word_register(WReg::HL, 0x2000);
    cpu.set_register(Reg::A, 0x42);

    assert_eq!(Err(Error::from_address(0x2000)), cpu.step(&mut rom));
    assert_eq!(ORIGIN, cpu.pc());
    assert_eq!(0x2000, cpu.get_word_register(WReg::HL));
    assert_eq!(0x00, rom.memory.data[0x2000]);
}
