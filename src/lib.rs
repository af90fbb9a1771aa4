//! StrobeVM: a small virtual machine with a byte-level program format.
//!
//! Programs are ordered sequences of [`isa::Instruction`]s persisted in the
//! DIF wire format ([`dif`]). The [`kernel`] owns loaded programs and steps
//! each one instruction at a time against the [`processor`], which talks to
//! the host only through an injected [`hardware::Hardware`] facade.

pub mod dif;
pub mod errors;
pub mod hardware;
pub mod isa;
pub mod kernel;
pub mod operand;
pub mod processor;
pub mod utils;
