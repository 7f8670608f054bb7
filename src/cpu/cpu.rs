use std::fmt;

use log::{debug, info, trace};
use strum_macros::Display;

use crate::component::{Addressable, ElapsedTime, Steppable};
use crate::cpu::catalog::Condition;
use crate::cpu::decoder::decode;
use crate::cpu::register::{Flag, Reg, RegisterFile, WReg};
use crate::error::{Error, Result};

/// T-cycles taken to push PC and jump to an interrupt vector.
const INTERRUPT_DISPATCH_CYCLES: ElapsedTime = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunState {
    Running,
    Halted,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub(crate) registers: RegisterFile,
    pub(crate) sp: u16,
    pub(crate) pc: u16,
    pub(crate) interrupt_enabled: bool,
    pub(crate) run_state: RunState,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A core with every register cleared, running, interrupts disabled.
    pub fn new() -> Cpu {
        Cpu {
            registers: RegisterFile::default(),
            sp: 0,
            pc: 0,
            interrupt_enabled: false,
            run_state: RunState::Running,
        }
    }

    /// Initialize the CPU's registers to post-bootrom values
    pub fn emulate_bootrom(&mut self) {
        self.set_word_register(WReg::AF, 0x01B0);
        self.set_word_register(WReg::BC, 0x0013);
        self.set_word_register(WReg::DE, 0x00D8);
        self.set_word_register(WReg::HL, 0x014D);
        self.sp = 0xFFFE;
        self.pc = 0x100;
    }

    pub fn get_register(&self, reg: Reg) -> u8 {
        self.registers.read(reg)
    }

    pub fn set_register(&mut self, reg: Reg, value: u8) {
        self.registers.write(reg, value);
    }

    pub fn get_word_register(&self, word_reg: WReg) -> u16 {
        match word_reg {
            WReg::AF => self.registers.get_af(),
            WReg::BC => self.registers.get_bc(),
            WReg::DE => self.registers.get_de(),
            WReg::HL => self.registers.get_hl(),
            WReg::SP => self.sp,
            WReg::PC => self.pc,
        }
    }

    pub fn set_word_register(&mut self, word_reg: WReg, value: u16) {
        match word_reg {
            WReg::AF => self.registers.set_af(value),
            WReg::BC => self.registers.set_bc(value),
            WReg::DE => self.registers.set_de(value),
            WReg::HL => self.registers.set_hl(value),
            WReg::SP => self.sp = value,
            WReg::PC => self.pc = value,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.registers.flag(flag)
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let mut flags = self.registers.flags();
        match flag {
            Flag::Zero => flags.zero = value,
            Flag::Subtract => flags.subtract = value,
            Flag::HalfCarry => flags.half_carry = value,
            Flag::Carry => flags.carry = value,
        }
        self.registers.set_flags(flags);
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_enabled
    }

    pub fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.interrupt_enabled = enabled;
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn set_run_state(&mut self, run_state: RunState) {
        if self.run_state != run_state {
            debug!("Run state {} -> {}", self.run_state, run_state);
            self.run_state = run_state;
        }
    }

    /// Wake hook for the surrounding loop once it sees a pending interrupt.
    pub fn resume(&mut self) {
        self.set_run_state(RunState::Running);
    }

    pub(crate) fn condition_holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::Zero => self.flag(Flag::Zero),
            Condition::NotZero => !self.flag(Flag::Zero),
            Condition::Carry => self.flag(Flag::Carry),
            Condition::NotCarry => !self.flag(Flag::Carry),
        }
    }

    /// Pushes a word so that its low byte ends up on top of the stack. SP only moves once
    /// both bytes are written.
    pub fn push_word(&mut self, memory: &mut dyn Addressable, value: u16) -> Result<()> {
        let [low, high] = value.to_le_bytes();
        let top = self.sp.wrapping_sub(2);
        memory.write_u8(top.wrapping_add(1).into(), high)?;
        memory.write_u8(top.into(), low)?;
        self.sp = top;
        Ok(())
    }

    pub fn pop_word(&mut self, memory: &mut dyn Addressable) -> Result<u16> {
        let low = memory.read_u8(self.sp.into())?;
        let high = memory.read_u8(self.sp.wrapping_add(1).into())?;
        self.sp = self.sp.wrapping_add(2);
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Enters an interrupt routine at `vector` if interrupts are enabled. The core is woken
    /// either way.
    pub fn service_interrupt(
        &mut self,
        memory: &mut dyn Addressable,
        vector: u16,
    ) -> Result<ElapsedTime> {
        self.resume();
        if !self.interrupt_enabled {
            debug!("ignoring interrupt {:#06x}, IME not set", vector);
            return Ok(0);
        }

        info!("Handling interrupt at {:#06x}", vector);
        self.push_word(memory, self.pc)?;
        self.interrupt_enabled = false;
        self.pc = vector;
        Ok(INTERRUPT_DISPATCH_CYCLES)
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AF: {:#06x} BC: {:#06x} DE: {:#06x} HL: {:#06x} SP: {:#06x} PC: {:#06x}",
            self.registers.get_af(),
            self.registers.get_bc(),
            self.registers.get_de(),
            self.registers.get_hl(),
            self.sp,
            self.pc
        )
    }
}

impl Steppable for Cpu {
    type Context = dyn Addressable;

    fn step(&mut self, memory: &mut Self::Context) -> Result<ElapsedTime> {
        if self.run_state != RunState::Running {
            return Err(Error::InvalidRunState(self.run_state));
        }

        let instruction = decode(memory, self.pc)?;
        trace!("{:#06x}: {}", instruction.address(), instruction);

        let elapsed = self.execute(memory, &instruction)?;
        trace!("{}", self);

        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;

    #[test]
    fn test_bootrom_state() {
        let mut cpu = Cpu::new();
        cpu.emulate_bootrom();
        assert_eq!(0x01B0, cpu.get_word_register(WReg::AF));
        assert_eq!(0x0013, cpu.get_word_register(WReg::BC));
        assert_eq!(0x00D8, cpu.get_word_register(WReg::DE));
        assert_eq!(0x014D, cpu.get_word_register(WReg::HL));
        assert_eq!(0xFFFE, cpu.sp());
        assert_eq!(0x0100, cpu.pc());
        assert!(cpu.flag(Flag::Zero));
        assert!(!cpu.flag(Flag::Subtract));
    }

    #[test]
    fn test_stack_is_little_endian() {
        let mut memory = MemoryBus::new();
        let mut cpu = Cpu::new();
        cpu.sp = 0xFFFE;
        cpu.push_word(&mut memory, 0x1234).unwrap();
        assert_eq!(0xFFFC, cpu.sp());
        assert_eq!(0x34, memory.data[0xFFFC]);
        assert_eq!(0x12, memory.data[0xFFFD]);
        assert_eq!(0x1234, cpu.pop_word(&mut memory).unwrap());
        assert_eq!(0xFFFE, cpu.sp());
    }

    #[test]
    fn test_service_interrupt() {
        let mut memory = MemoryBus::new();
        let mut cpu = Cpu::new();
        cpu.sp = 0xFFFE;
        cpu.pc = 0x0150;
        cpu.set_run_state(RunState::Halted);

        assert_eq!(0, cpu.service_interrupt(&mut memory, 0x40).unwrap());
        assert_eq!(RunState::Running, cpu.run_state());
        assert_eq!(0x0150, cpu.pc());

        cpu.set_interrupts_enabled(true);
        assert_eq!(20, cpu.service_interrupt(&mut memory, 0x40).unwrap());
        assert_eq!(0x0040, cpu.pc());
        assert!(!cpu.interrupts_enabled());
        assert_eq!(0x0150, cpu.pop_word(&mut memory).unwrap());
    }

    #[test]
    fn test_set_flag_keeps_others() {
        let mut cpu = Cpu::new();
        cpu.set_flag(Flag::Carry, true);
        cpu.set_flag(Flag::Zero, true);
        cpu.set_flag(Flag::Carry, false);
        assert_eq!(0x80, cpu.get_register(Reg::F));
    }
}
