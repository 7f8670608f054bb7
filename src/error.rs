use std::error::Error as StdError;

use crate::cpu::{InstructionClass, RunState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The instruction tables disagree with themselves or with a handler. Not recoverable.
    CatalogDefect(String),
    UnimplementedInstructionClass {
        class: InstructionClass,
        address: u16,
    },
    /// `step` was called while the core is halted or stopped.
    InvalidRunState(RunState),
    IllegalInstruction {
        opcode: u8,
        address: u16,
    },
    AddressingError {
        address: usize,
        source: Option<String>,
    },
    Message(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::CatalogDefect(msg) => write!(f, "instruction catalog defect: {}", msg),
            Error::UnimplementedInstructionClass { class, address } => {
                write!(
                    f,
                    "instruction class {} at {:#06x} has no handler",
                    class, address
                )
            }
            Error::InvalidRunState(state) => {
                write!(f, "cannot step a core in the {} state", state)
            }
            Error::IllegalInstruction { opcode, address } => {
                write!(f, "illegal opcode {:#04x} at {:#06x}", opcode, address)
            }
            Error::AddressingError { address, source } => {
                if let Some(source) = source {
                    write!(f, "AddressingError at {:x} from {}", address, source)
                } else {
                    write!(f, "AddressingError at {:x}", address)
                }
            }
            Error::Message(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn from_address(address: usize) -> Self {
        Error::AddressingError {
            address,
            source: None,
        }
    }

    pub fn from_address_with_source(address: usize, source: String) -> Self {
        Error::AddressingError {
            address,
            source: Some(source),
        }
    }

    pub fn from_message(msg: String) -> Self {
        Error::Message(msg)
    }

    pub fn catalog_defect(msg: impl Into<String>) -> Self {
        Error::CatalogDefect(msg.into())
    }

    /// Whether the error means the static instruction data can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CatalogDefect(_))
    }
}

impl From<String> for Error {
    fn from(str: String) -> Self {
        Error::from_message(str)
    }
}
