mod component;
mod error;
mod memory;
mod utils;

pub mod cpu;

pub use component::{Address, Addressable, ElapsedTime, Steppable};
pub use error::{Error, Result};
pub use memory::MemoryBus;
