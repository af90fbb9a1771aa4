//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode table and invokes a callback macro for code generation, so the DIF
//! codec and the debug dump share one definition of the opcode byte mapping.
//!
//! This module generates:
//! - The [`Opcode`] enum with its wire-format byte discriminants
//! - `TryFrom<u8>` for decoding opcode bytes
//!
//! # Wire Format
//!
//! The byte assigned to each opcode is part of the DIF format and must never
//! change once programs have been persisted (see [`dif`](crate::dif)).

use crate::errors::DifError;
use std::fmt;

/// Invokes a callback macro with the complete opcode definition list.
///
/// This macro enables code generation for opcodes in multiple modules
/// without duplicating the table.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b ; add the two packed operands
            Add = 0, "ADD",
            /// SUB a, b ; subtract operand b from operand a
            Subtract = 1, "SUB",
            /// DIV a, b ; divide operand a by operand b
            Divide = 2, "DIV",
            /// MUL a, b ; multiply the two packed operands
            Multiply = 3, "MUL",
            /// ALLOC id, size ; reserve kernel memory for a variable
            Allocate = 4, "ALLOC",
            /// ASSIGN id, data ; write data into a variable
            Assign = 5, "ASSIGN",
            /// INT code ; raise a hardware interrupt
            Interrupt = 6, "INT",
            /// CMP sel, a, b ; compare the packed operands per selector
            Compare = 7, "CMP",
            /// MOVE dst, src ; copy one variable's bytes into another
            Move = 8, "MOVE",
            /// ADDR dst, src ; alias one variable to another's storage
            Addr = 9, "ADDR",
            /// LABEL id ; define a jump target
            Label = 10, "LABEL",
            /// GOTO id ; jump to a label
            Goto = 11, "GOTO",
            /// CLEAR id ; release a variable
            Clear = 12, "CLEAR",
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $byte:literal, $mnemonic:literal
        ),* $(,)?
    ) => {
        /// Operation tag for a single instruction.
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $byte,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = DifError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $byte => Ok(Opcode::$name), )*
                    _ => Err(DifError::UnknownOpcode(value)),
                }
            }
        }

        impl Opcode {
            /// Returns the mnemonic shown by the debug program dump.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the wire-format byte for this opcode.
            pub const fn as_byte(&self) -> u8 {
                *self as u8
            }
        }
    };
}

for_each_opcode!(define_opcodes);

/// One decoded instruction: an opcode plus its parameter bytes.
///
/// Parameters have no fixed schema; their meaning is opcode-specific
/// (operand packing, interrupt code, variable ids).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub params: Vec<u8>,
}

impl Instruction {
    /// Creates an instruction from an opcode and its parameter bytes.
    pub fn new(opcode: Opcode, params: Vec<u8>) -> Self {
        Self { opcode, params }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        for byte in &self.params {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}
