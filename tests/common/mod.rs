#![allow(dead_code)]

use lr35902::cpu::{Cpu, RunState, WReg};
use lr35902::{ElapsedTime, MemoryBus, Steppable};

/// Where test programs are loaded and started.
pub const ORIGIN: u16 = 0x0100;

/// Scratch RAM used by programs that touch memory through (HL).
pub const SCRATCH: u16 = 0xc000;

/// A zeroed core with PC at the program and a stack at the top of memory.
pub fn setup(program: &[u8]) -> (Cpu, MemoryBus) {
    let memory = MemoryBus::with_program(ORIGIN, program).expect("program fits in memory");
    let mut cpu = Cpu::new();
    cpu.set_word_register(WReg::PC, ORIGIN);
    cpu.set_word_register(WReg::SP, 0xfffe);
    (cpu, memory)
}

pub fn step(cpu: &mut Cpu, memory: &mut MemoryBus) -> ElapsedTime {
    cpu.step(memory).expect("instruction executes")
}

/// Steps until the core halts or stops, returning the total T-cycles.
pub fn run_until_halt(cpu: &mut Cpu, memory: &mut MemoryBus, max_steps: usize) -> ElapsedTime {
    let mut elapsed = 0;
    for _ in 0..max_steps {
        elapsed += step(cpu, memory);
        if cpu.run_state() != RunState::Running {
            return elapsed;
        }
    }
    panic!("program did not halt within {} steps", max_steps);
}
