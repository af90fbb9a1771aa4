//! DIF wire codec: instruction sequences to and from flat byte streams.
//!
//! # Format
//!
//! ```text
//! stream      := instruction*
//! instruction := 0x00 opcodeByte paramByte* 0xFF
//! ```
//!
//! No header, length prefix, version tag, or checksum. Parameter bytes are
//! emitted verbatim with no escaping, which makes the format asymmetric:
//! a `0x00` parameter byte survives a round trip (it is only a frame start
//! when no instruction is open), but a `0xFF` parameter byte is misread as
//! the instruction terminator. That ambiguity is part of the wire contract
//! and is preserved here, not fixed; see the tests at the bottom.

use crate::errors::DifError;
use crate::isa::{Instruction, Opcode};

/// Frame byte opening an instruction.
const FRAME_START: u8 = 0x00;
/// Frame byte terminating an instruction.
const FRAME_END: u8 = 0xFF;

/// Decoder position within the byte stream.
enum State {
    /// Between instructions; only a frame-start byte is legal.
    Idle,
    /// Inside an instruction frame, accumulating parameter bytes.
    Open(Instruction),
}

/// Encodes a program into its DIF byte stream.
pub fn encode(program: &[Instruction]) -> Vec<u8> {
    let size = program.iter().map(|i| i.params.len() + 3).sum();
    let mut out = Vec::with_capacity(size);
    for instr in program {
        out.push(FRAME_START);
        out.push(instr.opcode.as_byte());
        out.extend_from_slice(&instr.params);
        out.push(FRAME_END);
    }
    out
}

/// Decodes a DIF byte stream back into a program.
///
/// Single left-to-right pass. A frame-start byte while an instruction is
/// already open is a parameter byte, not a new frame; a frame-end byte
/// always closes the open instruction. An instruction still open at
/// end-of-stream was never terminated and is discarded.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>, DifError> {
    let mut program = Vec::new();
    let mut state = State::Idle;
    let mut pos = 0;
    while pos < bytes.len() {
        state = match (state, bytes[pos]) {
            (State::Idle, FRAME_START) => {
                pos += 1;
                let byte = *bytes.get(pos).ok_or(DifError::TruncatedHeader)?;
                State::Open(Instruction::new(Opcode::try_from(byte)?, Vec::new()))
            }
            (State::Idle, value) => return Err(DifError::StrayByte { value, offset: pos }),
            (State::Open(instr), FRAME_END) => {
                program.push(instr);
                State::Idle
            }
            (State::Open(mut instr), byte) => {
                instr.params.push(byte);
                State::Open(instr)
            }
        };
        pos += 1;
    }
    Ok(program)
}
