use crate::error::Result;

pub type Address = usize;

/// Clock cycles (T-cycles) consumed by a step.
pub type ElapsedTime = u32;

/// Byte-addressable memory as seen by the CPU. Wider accesses are little-endian byte pairs.
pub trait Addressable {
    fn read_u8(&mut self, address: Address) -> Result<u8>;

    fn write_u8(&mut self, address: Address, data: u8) -> Result<()>;
}

pub trait Steppable {
    type Context: ?Sized;

    fn step(&mut self, context: &mut Self::Context) -> Result<ElapsedTime>;
}
