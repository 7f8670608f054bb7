/*!
 * A flat 64 KiB memory bus. Enough to host programs for the CPU core in tests, benches
 * and the command-line runner; banking and memory-mapped peripherals belong to the
 * surrounding device.
 */

use crate::component::{Address, Addressable};
use crate::error::{Error, Result};
use log::trace;

const MEMORY_SIZE: usize = 0x10000;
const SERIAL_DATA: Address = 0xff01;
const SERIAL_CONTROL: Address = 0xff02;

pub struct MemoryBus {
    pub data: Box<[u8]>,
    pub serial_port_data: Vec<u8>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            data: vec![0; MEMORY_SIZE].into_boxed_slice(),
            serial_port_data: Vec::new(),
        }
    }

    /// Builds a bus with `program` copied in starting at `origin`.
    pub fn with_program(origin: u16, program: &[u8]) -> Result<Self> {
        let mut memory_bus = Self::new();
        memory_bus.load(origin, program)?;
        Ok(memory_bus)
    }

    pub fn load(&mut self, origin: u16, program: &[u8]) -> Result<()> {
        let start = usize::from(origin);
        let end = start + program.len();
        if end > MEMORY_SIZE {
            return Err(Error::from_address_with_source(
                end - 1,
                format!("program of {} bytes at {:#06x}", program.len(), origin),
            ));
        }
        self.data[start..end].copy_from_slice(program);
        Ok(())
    }

    /// Bytes written out through the serial port so far.
    pub fn get_serial_port_data(&self) -> &[u8] {
        &self.serial_port_data
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Addressable for MemoryBus {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        self.data
            .get(address)
            .copied()
            .ok_or_else(|| Error::from_address(address))
    }

    fn write_u8(&mut self, address: Address, data: u8) -> Result<()> {
        // A transfer request on the serial port completes instantly.
        if address == SERIAL_CONTROL && data == 0x81 {
            let byte = self.data[SERIAL_DATA];
            trace!("serial out {:#04x}", byte);
            self.serial_port_data.push(byte);
        }

        let slot = self
            .data
            .get_mut(address)
            .ok_or_else(|| Error::from_address(address))?;
        *slot = data;
        Ok(())
    }
}
