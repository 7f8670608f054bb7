use std::fs;

use clap::Parser;
use log::{debug, error, info, warn};

use lr35902::cpu::{disassemble, Cpu, RunState, WReg};
use lr35902::{Error, MemoryBus, Steppable};

/// Runs or disassembles a raw LR35902 program image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the program image
    #[arg(short = 'r', long = "rom", required = true)]
    rom_path: String,

    /// Load address of the image, in hex
    #[arg(long, default_value = "0100", value_parser = parse_hex_address)]
    origin: u16,

    /// Start from the post-bootrom register state instead of all zeros
    #[arg(long, default_value_t = false)]
    boot: bool,

    /// List instructions instead of running them
    #[arg(short, long, default_value_t = false)]
    disassemble: bool,

    /// Number of instructions to disassemble
    #[arg(short, long, default_value_t = 32)]
    count: usize,

    /// Maximum number of instructions to execute
    #[arg(short, long, default_value_t = 1_000_000)]
    steps: u64,
}

fn parse_hex_address(text: &str) -> Result<u16, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("{}: {}", text, e))
}

fn main() -> Result<(), String> {
    env_logger::init();

    let args = Args::parse();

    let bytes = fs::read(&args.rom_path).map_err(|e| format!("{}: {}", args.rom_path, e))?;
    let mut memory = MemoryBus::with_program(args.origin, &bytes).map_err(|e| e.to_string())?;
    info!(
        "Loaded {} bytes at {:#06x} from {}",
        bytes.len(),
        args.origin,
        args.rom_path
    );

    if args.disassemble {
        let listing =
            disassemble(&mut memory, args.origin, args.count).map_err(|e| e.to_string())?;
        for instruction in listing {
            println!("{:04X}: {}", instruction.address(), instruction);
        }
        return Ok(());
    }

    let mut cpu = Cpu::new();
    if args.boot {
        cpu.emulate_bootrom();
    }
    cpu.set_word_register(WReg::PC, args.origin);

    let mut total_cycles: u64 = 0;
    let mut executed: u64 = 0;
    while executed < args.steps {
        match cpu.step(&mut memory) {
            Ok(elapsed) => {
                total_cycles += u64::from(elapsed);
                executed += 1;
            }
            Err(Error::InvalidRunState(state)) => {
                debug!("Core is {}, stopping", state);
                break;
            }
            Err(err) if err.is_fatal() => {
                error!("{}", err);
                return Err(err.to_string());
            }
            Err(err) => {
                warn!("Execution stopped: {}", err);
                break;
            }
        }

        if cpu.run_state() != RunState::Running {
            // Nothing outside the core raises interrupts here, so a halted core stays halted.
            info!("Core entered {} at {:#06x}", cpu.run_state(), cpu.pc());
            break;
        }
    }

    println!("{}", cpu);
    println!("Executed {} instructions in {} T-cycles", executed, total_cycles);

    let serial = memory.get_serial_port_data();
    if !serial.is_empty() {
        println!("{}", String::from_utf8_lossy(serial));
    }

    Ok(())
}
