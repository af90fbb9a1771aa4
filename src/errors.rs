//! Codec and execution error types.

use std::fmt;
use thiserror::Error;

/// Structural errors raised by the DIF codec.
///
/// These abort the load or save operation that produced them; they are never
/// reported through the hardware facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifError {
    /// Opcode byte with no table entry.
    #[error("unknown opcode byte {0}")]
    UnknownOpcode(u8),
    /// Data byte encountered outside any instruction frame.
    #[error("byte {value:#04x} at offset {offset} outside any instruction frame")]
    StrayByte { value: u8, offset: usize },
    /// Stream ended between a frame-start byte and its opcode byte.
    #[error("stream ends inside an instruction header")]
    TruncatedHeader,
}

/// Component that detected an execution fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Processor-tier validation (operand counts, selectors, arithmetic).
    Cpu,
    /// Kernel-tier conditions (reserved opcodes, memory, labels).
    Kernel,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Cpu => write!(f, "CPU"),
            Component::Kernel => write!(f, "Kernel"),
        }
    }
}

/// Fatal condition detected while executing an instruction.
///
/// The processor returns the fault instead of halting on its own; the kernel
/// forwards the `(component, code)` pair to the hardware facade and decides
/// the consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{component} fault {code}")]
pub struct ExecutionFault {
    pub component: Component,
    pub code: i32,
}

impl ExecutionFault {
    /// Creates a processor-tier fault.
    pub const fn cpu(code: i32) -> Self {
        Self {
            component: Component::Cpu,
            code,
        }
    }

    /// Creates a kernel-tier fault.
    pub const fn kernel(code: i32) -> Self {
        Self {
            component: Component::Kernel,
            code,
        }
    }
}

/// Diagnostic codes carried by [`ExecutionFault`] and reported through the
/// hardware facade. The numeric values are stable; external tooling matches
/// on them.
pub mod codes {
    /// Opcode byte with no table entry (surfaces at decode time).
    pub const UNKNOWN_OPCODE: i32 = 0;
    /// `Interrupt` takes exactly one parameter byte.
    pub const INTERRUPT_ARITY: i32 = 1;
    /// Second `Divide` operand was zero.
    pub const DIVIDE_BY_ZERO: i32 = 2;
    /// Kernel-reserved opcode reached the processor.
    pub const RESERVED_OPCODE: i32 = 3;
    /// `Compare` takes at least three parameter bytes.
    pub const COMPARE_ARITY: i32 = 4;
    /// `Compare` selector byte outside `0..=3`.
    pub const COMPARE_SELECTOR: i32 = 5;
    /// Allocation request exceeds the kernel's memory budget.
    pub const OUT_OF_MEMORY: i32 = 6;
    /// Variable id used before being allocated.
    pub const UNBOUND_VARIABLE: i32 = 7;
    /// `Goto` target label was never defined.
    pub const UNDEFINED_LABEL: i32 = 8;
    /// Kernel-tier instruction with a malformed parameter list.
    pub const MALFORMED_PARAMS: i32 = 9;
}
